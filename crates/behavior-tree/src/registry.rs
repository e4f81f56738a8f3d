//! Node type registry.
//!
//! Editors insert nodes by type id. The registry maps each id to a
//! zero-argument factory producing a fresh, unattached [`NodeKind`]. Types are
//! registered explicitly at startup; there is no discovery.

use std::collections::BTreeMap;
use std::fmt;

use crate::composite::Policy;
use crate::decorator::Decorator;
use crate::error::RegistryError;
use crate::leaves::{Fail, Sleep, Succeed, Wait};
use crate::node::NodeKind;
use crate::status::Status;

type Factory<C> = Box<dyn Fn() -> NodeKind<C> + Send + Sync>;

/// Type id to factory mapping.
pub struct Registry<C> {
    factories: BTreeMap<String, Factory<C>>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Registry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Produces a new, unattached node of `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownType`] if nothing is registered under
    /// `type_id`.
    pub fn create(&self, type_id: &str) -> Result<NodeKind<C>, RegistryError> {
        self.factories
            .get(type_id)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownType(type_id.to_owned()))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.factories.contains_key(type_id)
    }

    /// Registered ids in sorted order.
    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<C: 'static> Registry<C> {
    /// Creates a registry holding every built-in composite, decorator, and
    /// leaf. The root driver is never registered: a tree gets its root from
    /// [`Tree::add_root`](crate::Tree::add_root).
    ///
    /// Bounded decorators and configurable leaves are registered without an
    /// explicit bound and read it from the shared store at setup.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, fn() -> NodeKind<C>); 13] = [
            ("sequence", || NodeKind::Composite(Policy::Sequence)),
            ("selector", || NodeKind::Composite(Policy::Selector)),
            ("random_sequence", || NodeKind::Composite(Policy::RandomSequence)),
            ("random_selector", || NodeKind::Composite(Policy::RandomSelector)),
            ("inverter", || NodeKind::Decorator(Decorator::Inverter)),
            ("succeeder", || NodeKind::Decorator(Decorator::Succeeder)),
            ("failer", || NodeKind::Decorator(Decorator::Failer)),
            ("timed", || NodeKind::Decorator(Decorator::Timed { timeout: None })),
            ("frame_interrupt", || {
                NodeKind::Decorator(Decorator::FrameInterrupt { frames: None })
            }),
            ("succeed", || NodeKind::leaf(Succeed)),
            ("fail", || NodeKind::leaf(Fail)),
            ("wait", || NodeKind::leaf(Wait::configured(Status::Success))),
            ("sleep", || NodeKind::leaf(Sleep::configured(Status::Success))),
        ];
        for (type_id, factory) in builtins {
            registry
                .factories
                .insert(type_id.to_owned(), Box::new(factory));
        }
        registry
    }

    /// Registers `factory` under `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the id is taken.
    pub fn register(
        &mut self,
        type_id: impl Into<String>,
        factory: impl Fn() -> NodeKind<C> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        let type_id = type_id.into();
        if self.factories.contains_key(&type_id) {
            return Err(RegistryError::Duplicate(type_id));
        }
        self.factories.insert(type_id, Box::new(factory));
        Ok(())
    }
}

impl<C> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.type_ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    #[test]
    fn builtins_cover_every_non_root_node_type() {
        let registry: Registry<()> = Registry::with_builtins();
        for node_type in <NodeType as strum::IntoEnumIterator>::iter() {
            match node_type {
                NodeType::Root => assert!(!registry.contains("root")),
                NodeType::Leaf => {}
                other => {
                    let kind = registry.create(other.as_str()).unwrap();
                    assert_eq!(kind.node_type(), other);
                }
            }
        }
        assert!(registry.contains("wait"));
    }

    #[test]
    fn unknown_and_duplicate_ids_are_errors() {
        let mut registry: Registry<()> = Registry::new();
        assert!(registry.is_empty());
        registry.register("ping", || NodeKind::leaf(Succeed)).unwrap();
        assert_eq!(
            registry.register("ping", || NodeKind::leaf(Fail)),
            Err(RegistryError::Duplicate("ping".into()))
        );
        assert!(matches!(
            registry.create("pong"),
            Err(RegistryError::UnknownType(id)) if id == "pong"
        ));
    }

    #[test]
    fn factories_produce_fresh_instances() {
        let registry: Registry<()> = Registry::with_builtins();
        let first = registry.create("succeed").unwrap();
        let second = registry.create("succeed").unwrap();
        assert_eq!(first.node_type(), NodeType::Leaf);
        assert_eq!(second.node_type(), NodeType::Leaf);
        assert_eq!(registry.type_ids().next(), Some("fail"));
    }
}
