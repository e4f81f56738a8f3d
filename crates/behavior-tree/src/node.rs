//! Node handles, node kinds, and the per-node record stored in the tree arena.

use std::fmt;

use crate::behavior::Behavior;
use crate::composite::Policy;
use crate::decorator::Decorator;
use crate::status::Status;

/// Stable handle to a node in a [`Tree`](crate::Tree).
///
/// Handles are generational: deleting a node bumps the generation of its
/// slot, so a handle kept across a delete never resolves to whatever node
/// reuses the slot later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) const fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}.{}", self.index, self.generation)
    }
}

/// Declared type of a node, as shown to editors and used as a registry key.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum NodeType {
    Root,
    Sequence,
    Selector,
    RandomSequence,
    RandomSelector,
    Inverter,
    Succeeder,
    Failer,
    Timed,
    FrameInterrupt,
    Leaf,
}

impl NodeType {
    /// Returns the stable snake_case identifier of this type.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Preferred on-screen size of a node, consumed by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(150.0, 75.0)
    }
}

/// What kind of node to create.
///
/// This is the construction payload handed to [`Tree::add_child`](crate::Tree::add_child)
/// and produced by registry factories. Children are attached separately.
pub enum NodeKind<C> {
    /// The perpetual round-robin driver. Only valid as the tree root.
    Root,
    /// An internal node with an ordered child list and a selection policy.
    Composite(Policy),
    /// An internal node with at most one child.
    Decorator(Decorator),
    /// A terminal node performing host work.
    Leaf(Box<dyn Behavior<C>>),
}

impl<C> NodeKind<C> {
    /// Boxes a behavior into a leaf kind.
    pub fn leaf(behavior: impl Behavior<C> + 'static) -> Self {
        NodeKind::Leaf(Box::new(behavior))
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Root => NodeType::Root,
            NodeKind::Composite(policy) => policy.node_type(),
            NodeKind::Decorator(decorator) => decorator.node_type(),
            NodeKind::Leaf(_) => NodeType::Leaf,
        }
    }
}

impl<C> fmt::Debug for NodeKind<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Root => f.write_str("Root"),
            NodeKind::Composite(policy) => f.debug_tuple("Composite").field(policy).finish(),
            NodeKind::Decorator(decorator) => {
                f.debug_tuple("Decorator").field(decorator).finish()
            }
            NodeKind::Leaf(behavior) => f.debug_tuple("Leaf").field(&behavior.type_name()).finish(),
        }
    }
}

/// Kind-specific payload of a stored node. Children live here, so a
/// decorator can hold at most one child by construction.
pub(crate) enum Body<C> {
    Root { children: Vec<NodeId> },
    Composite { policy: Policy, children: Vec<NodeId> },
    Decorator { decorator: Decorator, child: Option<NodeId> },
    Leaf { behavior: Box<dyn Behavior<C>> },
}

impl<C> From<NodeKind<C>> for Body<C> {
    fn from(kind: NodeKind<C>) -> Self {
        match kind {
            NodeKind::Root => Body::Root {
                children: Vec::new(),
            },
            NodeKind::Composite(policy) => Body::Composite {
                policy,
                children: Vec::new(),
            },
            NodeKind::Decorator(decorator) => Body::Decorator {
                decorator,
                child: None,
            },
            NodeKind::Leaf(behavior) => Body::Leaf { behavior },
        }
    }
}

/// A node stored in the tree arena.
pub struct Node<C> {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) body: Body<C>,
    pub(crate) active: bool,
    pub(crate) last_status: Option<Status>,
    pub(crate) size: Size,
}

impl<C> Node<C> {
    pub(crate) fn new(name: String, parent: Option<NodeId>, kind: NodeKind<C>) -> Self {
        Self {
            name,
            parent,
            body: kind.into(),
            active: false,
            last_status: None,
            size: Size::default(),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-owning back-reference to the parent; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in execution order. Always empty for leaves, at most one
    /// entry for decorators.
    pub fn children(&self) -> &[NodeId] {
        match &self.body {
            Body::Root { children } | Body::Composite { children, .. } => children,
            Body::Decorator { child, .. } => child.as_slice(),
            Body::Leaf { .. } => &[],
        }
    }

    pub fn node_type(&self) -> NodeType {
        match &self.body {
            Body::Root { .. } => NodeType::Root,
            Body::Composite { policy, .. } => policy.node_type(),
            Body::Decorator { decorator, .. } => decorator.node_type(),
            Body::Leaf { .. } => NodeType::Leaf,
        }
    }

    /// Declared type name; leaves report their behavior's own name.
    pub fn type_name(&self) -> &str {
        match &self.body {
            Body::Leaf { behavior } => behavior.type_name(),
            _ => self.node_type().as_str(),
        }
    }

    /// Whether this is a terminal node (a leaf behavior).
    pub fn is_leaf(&self) -> bool {
        matches!(self.body, Body::Leaf { .. })
    }

    /// Whether the node is currently executing. Polled by renderers.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Status reported by the most recent completed activation.
    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// The decorator payload, if this node is a decorator.
    pub fn decorator(&self) -> Option<&Decorator> {
        match &self.body {
            Body::Decorator { decorator, .. } => Some(decorator),
            _ => None,
        }
    }

    /// The composite policy, if this node is a composite.
    pub fn policy(&self) -> Option<Policy> {
        match &self.body {
            Body::Composite { policy, .. } => Some(*policy),
            _ => None,
        }
    }
}

impl<C> fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("type", &self.type_name())
            .field("parent", &self.parent)
            .field("children", &self.children())
            .field("active", &self.active)
            .field("last_status", &self.last_status)
            .finish()
    }
}
