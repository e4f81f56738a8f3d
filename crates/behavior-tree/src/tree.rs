//! Tree arena, structural edits, and integrity checks.
//!
//! Nodes live in a slot arena addressed by generational [`NodeId`]s. A parent
//! owns its children by id; the child's parent field is a plain back-reference
//! used for traversal and invariant checks only. Every structural edit
//! recomputes the derived depth and deepest leaf before it returns.

use std::collections::HashSet;

use tracing::debug;

use crate::behavior::{Behavior, Frame};
use crate::decorator::Bound;
use crate::error::{IntegrityError, TreeError};
use crate::node::{Body, Node, NodeId, NodeKind, Size};
use crate::store::Store;

struct Slot<C> {
    generation: u32,
    node: Option<Node<C>>,
}

/// A parent/child connector, as drawn by a rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
    /// Whether the child is currently executing.
    pub active: bool,
    /// Whether the child is a leaf.
    pub leaf: bool,
}

/// A behavior tree: one root driver, its descendants, and the shared store.
pub struct Tree<C> {
    slots: Vec<Slot<C>>,
    free: Vec<u32>,
    root: Option<NodeId>,
    depth: usize,
    deepest: Option<NodeId>,
    store: Store,
    store_frozen: bool,
}

impl<C> Default for Tree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Tree<C> {
    /// Creates an empty tree with an empty store.
    pub fn new() -> Self {
        Self::with_store(Store::new())
    }

    /// Creates an empty tree that owns `store`.
    pub fn with_store(store: Store) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            depth: 0,
            deepest: None,
            store,
            store_frozen: false,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<C>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<C>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes in the arena.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Children of `id` in execution order; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_active)
    }

    /// Number of levels in the tree: 1 for a lone root, 0 when empty.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The first node, in pre-order, on the deepest level.
    pub fn deepest_leaf(&self) -> Option<NodeId> {
        self.deepest
    }

    /// Distance from the root (the root itself is at 0).
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        let mut node = self.get(id)?;
        let mut depth = 0;
        while let Some(parent) = node.parent {
            node = self.get(parent)?;
            depth += 1;
            if depth > self.slots.len() {
                return None;
            }
        }
        Some(depth)
    }

    /// Live nodes reachable from the root, parents before children, siblings
    /// left to right.
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children().iter().rev().copied());
        }
        order
    }

    /// Parent/child connectors, one per reachable non-root node, ordered by
    /// the child's pre-order position.
    pub fn edges(&self) -> Vec<Edge> {
        self.pre_order()
            .into_iter()
            .skip(1)
            .filter_map(|child| {
                let node = self.get(child)?;
                Some(Edge {
                    parent: node.parent()?,
                    child,
                    active: node.is_active(),
                    leaf: node.is_leaf(),
                })
            })
            .collect()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable access to the shared store before execution starts.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StoreFrozen`] once a scheduler owns the tree.
    pub fn store_mut(&mut self) -> Result<&mut Store, TreeError> {
        if self.store_frozen {
            return Err(TreeError::StoreFrozen);
        }
        Ok(&mut self.store)
    }

    pub(crate) fn freeze_store(&mut self) {
        self.store_frozen = true;
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Creates the root driver.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RootExists`] if the tree already has a root.
    pub fn add_root(&mut self, name: impl Into<String>) -> Result<NodeId, TreeError> {
        if let Some(root) = self.root {
            return Err(TreeError::RootExists(root));
        }
        let id = self.alloc(Node::new(name.into(), None, NodeKind::Root));
        self.root = Some(id);
        self.recompute_depth();
        debug!(node = %id, "added root");
        Ok(id)
    }

    /// Creates a node of `kind` and appends it to `parent`'s children.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NodeNotFound`] if `parent` is not in the tree
    /// - [`TreeError::RootAsChild`] if `kind` is the root driver
    /// - [`TreeError::LeafParent`] if `parent` is a leaf
    /// - [`TreeError::DecoratorOccupied`] if `parent` is a decorator that
    ///   already has a child
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind<C>,
    ) -> Result<NodeId, TreeError> {
        self.check_attach(parent, &kind)?;

        let id = self.alloc(Node::new(name.into(), Some(parent), kind));
        if let Some(parent_node) = self.get_mut(parent) {
            match &mut parent_node.body {
                Body::Root { children } | Body::Composite { children, .. } => children.push(id),
                Body::Decorator { child, .. } => *child = Some(id),
                Body::Leaf { .. } => {}
            }
        }
        self.recompute_depth();
        debug!(node = %id, parent = %parent, "added child");
        Ok(id)
    }

    /// Checks that a node of `kind` could be appended to `parent` without
    /// changing anything.
    pub(crate) fn check_attach(&self, parent: NodeId, kind: &NodeKind<C>) -> Result<(), TreeError> {
        if matches!(kind, NodeKind::Root) {
            return Err(TreeError::RootAsChild);
        }
        let parent_node = self.get(parent).ok_or(TreeError::NodeNotFound(parent))?;
        match &parent_node.body {
            Body::Leaf { .. } => Err(TreeError::LeafParent(parent)),
            Body::Decorator {
                child: Some(existing),
                ..
            } => Err(TreeError::DecoratorOccupied {
                decorator: parent,
                existing: *existing,
            }),
            _ => Ok(()),
        }
    }

    /// Removes `id` and its whole subtree, returning how many nodes were removed.
    ///
    /// Deleting the root empties the tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if `id` is not in the tree.
    pub fn delete(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let parent = self.get(id).ok_or(TreeError::NodeNotFound(id))?.parent;
        if let Some(parent) = parent
            && let Some(parent_node) = self.get_mut(parent)
        {
            match &mut parent_node.body {
                Body::Root { children } | Body::Composite { children, .. } => {
                    children.retain(|child| *child != id);
                }
                Body::Decorator { child, .. } => {
                    if *child == Some(id) {
                        *child = None;
                    }
                }
                Body::Leaf { .. } => {}
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.release(next) {
                stack.extend_from_slice(node.children());
                removed += 1;
            }
        }
        self.recompute_depth();
        debug!(node = %id, removed, "deleted subtree");
        Ok(removed)
    }

    /// Changes a node's display name.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), TreeError> {
        let node = self.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        node.name = name.into();
        Ok(())
    }

    /// Sets the preferred on-screen size used by the layout engine.
    pub fn set_size(&mut self, id: NodeId, size: Size) -> Result<(), TreeError> {
        let node = self.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        node.size = size;
        Ok(())
    }

    /// Sets the explicit bound of a timed or frame-interrupt decorator, or of
    /// a leaf that accepts one (such as `wait` or `sleep`).
    ///
    /// Bounds set here win over the shared store and apply from the node's
    /// next activation; an activation already in flight keeps its bound.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NodeNotFound`] if `id` is not in the tree
    /// - [`TreeError::BoundRejected`] if the node takes no bound of that kind
    pub fn set_bound(&mut self, id: NodeId, bound: Bound) -> Result<(), TreeError> {
        let node = self.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        let accepted = match &mut node.body {
            Body::Decorator { decorator, .. } => match decorator.with_bound(bound) {
                Some(bounded) => {
                    *decorator = bounded;
                    true
                }
                None => false,
            },
            Body::Leaf { behavior } => behavior.set_bound(bound),
            Body::Root { .. } | Body::Composite { .. } => false,
        };
        if !accepted {
            return Err(TreeError::BoundRejected { node: id, bound });
        }
        debug!(node = %id, %bound, "bound set");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Checks that the tree is connected and every child entry is live.
    ///
    /// # Errors
    ///
    /// Returns the first [`IntegrityError`] found. The tree is never repaired.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        let root = self
            .root
            .filter(|root| self.contains(*root))
            .ok_or(IntegrityError::MissingRoot)?;

        let mut seen = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            for (slot, &child) in node.children().iter().enumerate() {
                let Some(child_node) = self.get(child) else {
                    return Err(IntegrityError::MissingChild { parent: id, slot });
                };
                if child_node.parent != Some(id) {
                    return Err(IntegrityError::ParentMismatch {
                        child,
                        listed_under: id,
                        recorded: child_node.parent,
                    });
                }
                if !seen.insert(child) {
                    return Err(IntegrityError::DuplicateChild(child));
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    /// `true` iff [`validate`](Self::validate) passes.
    pub fn integrity_check(&self) -> bool {
        self.validate().is_ok()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn alloc(&mut self, node: Node<C>) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn release(&mut self, id: NodeId) -> Option<Node<C>> {
        let slot = self
            .slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        Some(node)
    }

    fn recompute_depth(&mut self) {
        let mut depth = 0;
        let mut deepest = None;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((id, level)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if level > depth {
                depth = level;
                deepest = Some(id);
            }
            stack.extend(node.children().iter().rev().map(|&child| (child, level + 1)));
        }
        self.depth = depth;
        self.deepest = deepest;
    }

    /// Runs `f` against a leaf's behavior with a [`Frame`] borrowing the
    /// node's name and the shared store.
    pub(crate) fn with_leaf<R>(
        &mut self,
        id: NodeId,
        number: u64,
        now: std::time::Duration,
        f: impl FnOnce(&mut dyn Behavior<C>, &Frame<'_>) -> R,
    ) -> Option<R> {
        let Tree { slots, store, .. } = self;
        let node = slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())?
            .node
            .as_mut()?;
        let Node { name, body, .. } = node;
        let Body::Leaf { behavior } = body else {
            return None;
        };
        let frame = Frame::new(id, name, number, now, store);
        Some(f(&mut **behavior, &frame))
    }
}

impl<C> std::fmt::Debug for Tree<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("len", &self.len())
            .field("depth", &self.depth)
            .field("deepest", &self.deepest)
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::Policy;
    use crate::decorator::Decorator;
    use crate::leaves::Succeed;

    fn sequence() -> NodeKind<()> {
        NodeKind::Composite(Policy::Sequence)
    }

    #[test]
    fn lone_root_has_depth_one() {
        let mut tree: Tree<()> = Tree::new();
        assert_eq!(tree.depth(), 0);
        let root = tree.add_root("origin").unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.deepest_leaf(), Some(root));
        assert_eq!(tree.add_root("again"), Err(TreeError::RootExists(root)));
    }

    #[test]
    fn adding_children_tracks_depth_and_deepest() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let seq = tree.add_child(root, "seq", sequence()).unwrap();
        let leaf = tree.add_child(seq, "a", NodeKind::leaf(Succeed)).unwrap();

        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.deepest_leaf(), Some(leaf));
        assert_eq!(tree.depth_of(leaf), Some(2));
        assert_eq!(tree.children(seq), &[leaf]);
        assert_eq!(tree.parent(leaf), Some(seq));
    }

    #[test]
    fn decorators_reject_a_second_child() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let inv = tree
            .add_child(root, "inv", NodeKind::Decorator(Decorator::Inverter))
            .unwrap();
        let first = tree.add_child(inv, "first", NodeKind::leaf(Succeed)).unwrap();

        let err = tree.add_child(inv, "second", NodeKind::leaf(Succeed)).unwrap_err();
        assert_eq!(
            err,
            TreeError::DecoratorOccupied {
                decorator: inv,
                existing: first
            }
        );
        assert_eq!(tree.children(inv), &[first]);

        tree.delete(first).unwrap();
        let second = tree.add_child(inv, "second", NodeKind::leaf(Succeed)).unwrap();
        assert_eq!(tree.children(inv), &[second]);
    }

    #[test]
    fn leaves_and_root_kinds_are_rejected_as_parents_or_children() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let leaf = tree.add_child(root, "leaf", NodeKind::leaf(Succeed)).unwrap();

        assert_eq!(
            tree.add_child(leaf, "x", NodeKind::leaf(Succeed)),
            Err(TreeError::LeafParent(leaf))
        );
        assert_eq!(
            tree.add_child(root, "nested", NodeKind::Root),
            Err(TreeError::RootAsChild)
        );
    }

    #[test]
    fn deleting_the_deepest_leaf_recomputes_depth() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let shallow = tree.add_child(root, "shallow", NodeKind::leaf(Succeed)).unwrap();
        let seq = tree.add_child(root, "seq", sequence()).unwrap();
        let deep = tree.add_child(seq, "deep", NodeKind::leaf(Succeed)).unwrap();
        assert_eq!((tree.depth(), tree.deepest_leaf()), (3, Some(deep)));

        assert_eq!(tree.delete(deep), Ok(1));
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.deepest_leaf(), Some(shallow));
        assert!(!tree.contains(deep));
    }

    #[test]
    fn deleting_a_subtree_frees_every_descendant() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let seq = tree.add_child(root, "seq", sequence()).unwrap();
        tree.add_child(seq, "a", NodeKind::leaf(Succeed)).unwrap();
        tree.add_child(seq, "b", NodeKind::leaf(Succeed)).unwrap();

        assert_eq!(tree.delete(seq), Ok(3));
        assert_eq!(tree.len(), 1);
        assert!(tree.children(root).is_empty());
        assert!(tree.integrity_check());
    }

    #[test]
    fn stale_handles_do_not_resolve_after_slot_reuse() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let old = tree.add_child(root, "old", NodeKind::leaf(Succeed)).unwrap();
        tree.delete(old).unwrap();
        let new = tree.add_child(root, "new", NodeKind::leaf(Succeed)).unwrap();

        assert_eq!(old.index(), new.index());
        assert!(tree.get(old).is_none());
        assert_eq!(tree.get(new).map(Node::name), Some("new"));
        assert_eq!(tree.delete(old), Err(TreeError::NodeNotFound(old)));
    }

    #[test]
    fn deleting_the_root_empties_the_tree() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        tree.add_child(root, "a", NodeKind::leaf(Succeed)).unwrap();
        assert_eq!(tree.delete(root), Ok(2));
        assert_eq!(tree.root(), None);
        assert_eq!(tree.depth(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.validate(), Err(IntegrityError::MissingRoot));
    }

    #[test]
    fn integrity_check_detects_missing_child_entries() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let seq = tree.add_child(root, "seq", sequence()).unwrap();
        tree.add_child(seq, "a", NodeKind::leaf(Succeed)).unwrap();
        let b = tree.add_child(seq, "b", NodeKind::leaf(Succeed)).unwrap();
        assert!(tree.integrity_check());

        // Destroy `b` behind its parent's back.
        tree.release(b);
        assert_eq!(
            tree.validate(),
            Err(IntegrityError::MissingChild { parent: seq, slot: 1 })
        );
        assert!(!tree.integrity_check());
    }

    #[test]
    fn integrity_check_detects_broken_back_references() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let a = tree.add_child(root, "a", NodeKind::leaf(Succeed)).unwrap();
        tree.get_mut(a).unwrap().parent = None;
        assert_eq!(
            tree.validate(),
            Err(IntegrityError::ParentMismatch {
                child: a,
                listed_under: root,
                recorded: None
            })
        );
    }

    #[test]
    fn edges_follow_pre_order() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let seq = tree.add_child(root, "seq", sequence()).unwrap();
        let a = tree.add_child(seq, "a", NodeKind::leaf(Succeed)).unwrap();
        let b = tree.add_child(root, "b", NodeKind::leaf(Succeed)).unwrap();

        assert_eq!(tree.pre_order(), vec![root, seq, a, b]);
        let pairs: Vec<_> = tree.edges().iter().map(|e| (e.parent, e.child, e.leaf)).collect();
        assert_eq!(pairs, vec![(root, seq, false), (seq, a, true), (root, b, true)]);
    }

    #[test]
    fn bounds_are_set_on_decorators_and_accepting_leaves() {
        use crate::decorator::Bound;
        use crate::leaves::Wait;
        use crate::status::Status;
        use std::time::Duration;

        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let timer = tree
            .add_child(root, "timer", NodeKind::Decorator(Decorator::Timed { timeout: None }))
            .unwrap();
        let wait = tree.add_child(root, "wait", NodeKind::leaf(Wait::configured(Status::Success))).unwrap();
        let plain = tree.add_child(root, "plain", NodeKind::leaf(Succeed)).unwrap();

        let bound = Bound::Time(Duration::from_millis(250));
        tree.set_bound(timer, bound).unwrap();
        assert_eq!(tree.get(timer).and_then(|n| n.decorator()).and_then(|d| d.bound()), Some(bound));
        tree.set_bound(wait, Bound::Frames(3)).unwrap();

        for (node, bound) in [
            (timer, Bound::Frames(1)),
            (plain, Bound::Frames(1)),
            (root, Bound::Frames(1)),
        ] {
            assert_eq!(tree.set_bound(node, bound), Err(TreeError::BoundRejected { node, bound }));
        }
        tree.delete(plain).unwrap();
        assert_eq!(
            tree.set_bound(plain, Bound::Frames(1)),
            Err(TreeError::NodeNotFound(plain))
        );
    }

    #[test]
    fn store_freezes_once_execution_starts() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        tree.store_mut().unwrap().insert(root, 3_u32);
        tree.freeze_store();
        assert_eq!(tree.store_mut().err(), Some(TreeError::StoreFrozen));
        assert_eq!(tree.store().get::<u32>(root), Ok(&3));
    }
}
