//! Shared configuration store.
//!
//! Every node of one tree reads out-of-band configuration (timeouts, frame
//! budgets, leaf parameters) from the same [`Store`]. Values are keyed by node
//! identity and typed at lookup, so a misspelled name or a value of the wrong
//! type is reported instead of silently defaulting.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;

use crate::error::ConfigError;
use crate::node::NodeId;

/// Typed, node-keyed configuration map owned by exactly one tree.
///
/// The store is not `Clone`: it moves into its tree and is
/// shared by reference with every node of that tree only.
#[derive(Default)]
pub struct Store {
    values: HashMap<NodeId, Box<dyn Any + Send + Sync>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `node`, returning whether a previous value was replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, node: NodeId, value: T) -> bool {
        self.values.insert(node, Box::new(value)).is_some()
    }

    /// Reads the value stored for `node`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] if nothing is stored for `node`
    /// - [`ConfigError::TypeMismatch`] if the stored value is not a `T`
    pub fn get<T: Any + Send + Sync>(&self, node: NodeId) -> Result<&T, ConfigError> {
        let value = self.values.get(&node).ok_or(ConfigError::Missing(node))?;
        value
            .downcast_ref::<T>()
            .ok_or(ConfigError::TypeMismatch {
                node,
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.values.contains_key(&node)
    }

    /// Removes the value stored for `node`, returning whether one existed.
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.values.remove(&node).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}
