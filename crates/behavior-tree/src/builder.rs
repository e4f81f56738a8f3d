//! Builder utilities for ergonomic behavior tree construction.
//!
//! This module provides helper functions to reduce boilerplate when building
//! trees. Instead of a chain of `add_child` calls threading parent ids around,
//! describe the shape with nested [`Blueprint`]s and hand them to
//! [`Tree::from_blueprints`] or [`Tree::attach`].
//!
//! ```
//! use behavior_tree::builder::{inverter, leaf, sequence};
//! use behavior_tree::leaves::{Fail, Succeed};
//! use behavior_tree::Tree;
//!
//! let tree: Tree<()> = Tree::from_blueprints(
//!     "origin",
//!     vec![sequence("patrol", vec![leaf("look", Succeed), inverter("not", leaf("fail", Fail))])],
//! )
//! .unwrap();
//! assert_eq!(tree.len(), 5);
//! ```

use std::time::Duration;

use crate::behavior::Behavior;
use crate::composite::Policy;
use crate::decorator::Decorator;
use crate::error::TreeError;
use crate::node::{NodeId, NodeKind};
use crate::tree::Tree;

/// A detached node description with its children.
pub struct Blueprint<C> {
    name: String,
    kind: NodeKind<C>,
    children: Vec<Blueprint<C>>,
}

impl<C> Blueprint<C> {
    pub fn new(name: impl Into<String>, kind: NodeKind<C>) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Appends a child description.
    pub fn with_child(mut self, child: Blueprint<C>) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C> std::fmt::Debug for Blueprint<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .finish()
    }
}

impl<C> Tree<C> {
    /// Builds a tree with a root driver named `root_name` over `children`.
    ///
    /// # Errors
    ///
    /// Returns the first [`TreeError`] raised while attaching a blueprint.
    pub fn from_blueprints(
        root_name: impl Into<String>,
        children: Vec<Blueprint<C>>,
    ) -> Result<Self, TreeError> {
        let mut tree = Tree::new();
        let root = tree.add_root(root_name)?;
        for child in children {
            tree.attach(root, child)?;
        }
        Ok(tree)
    }

    /// Attaches `blueprint` and its descendants under `parent`.
    pub fn attach(&mut self, parent: NodeId, blueprint: Blueprint<C>) -> Result<NodeId, TreeError> {
        let Blueprint {
            name,
            kind,
            children,
        } = blueprint;
        let id = self.add_child(parent, name, kind)?;
        for child in children {
            self.attach(id, child)?;
        }
        Ok(id)
    }
}

fn composite<C>(name: impl Into<String>, policy: Policy, children: Vec<Blueprint<C>>) -> Blueprint<C> {
    Blueprint {
        name: name.into(),
        kind: NodeKind::Composite(policy),
        children,
    }
}

fn decorator<C>(name: impl Into<String>, decorator: Decorator, child: Blueprint<C>) -> Blueprint<C> {
    Blueprint {
        name: name.into(),
        kind: NodeKind::Decorator(decorator),
        children: vec![child],
    }
}

/// Creates a sequence node.
#[inline]
pub fn sequence<C>(name: impl Into<String>, children: Vec<Blueprint<C>>) -> Blueprint<C> {
    composite(name, Policy::Sequence, children)
}

/// Creates a selector node.
#[inline]
pub fn selector<C>(name: impl Into<String>, children: Vec<Blueprint<C>>) -> Blueprint<C> {
    composite(name, Policy::Selector, children)
}

#[inline]
pub fn random_sequence<C>(name: impl Into<String>, children: Vec<Blueprint<C>>) -> Blueprint<C> {
    composite(name, Policy::RandomSequence, children)
}

#[inline]
pub fn random_selector<C>(name: impl Into<String>, children: Vec<Blueprint<C>>) -> Blueprint<C> {
    composite(name, Policy::RandomSelector, children)
}

/// Creates an inverter node.
#[inline]
pub fn inverter<C>(name: impl Into<String>, child: Blueprint<C>) -> Blueprint<C> {
    decorator(name, Decorator::Inverter, child)
}

/// Creates an always-succeed node.
#[inline]
pub fn succeeder<C>(name: impl Into<String>, child: Blueprint<C>) -> Blueprint<C> {
    decorator(name, Decorator::Succeeder, child)
}

#[inline]
pub fn failer<C>(name: impl Into<String>, child: Blueprint<C>) -> Blueprint<C> {
    decorator(name, Decorator::Failer, child)
}

/// Creates a timed node. `None` reads the bound from the shared store.
#[inline]
pub fn timed<C>(name: impl Into<String>, timeout: Option<Duration>, child: Blueprint<C>) -> Blueprint<C> {
    decorator(name, Decorator::Timed { timeout }, child)
}

/// Creates a frame-interrupt node. `None` reads the bound from the shared store.
#[inline]
pub fn frame_interrupt<C>(name: impl Into<String>, frames: Option<u32>, child: Blueprint<C>) -> Blueprint<C> {
    decorator(name, Decorator::FrameInterrupt { frames }, child)
}

/// Creates a leaf node.
#[inline]
pub fn leaf<C>(name: impl Into<String>, behavior: impl Behavior<C> + 'static) -> Blueprint<C> {
    Blueprint::new(name, NodeKind::leaf(behavior))
}
