//! Leaf behavior trait.
//!
//! This module defines the [`Behavior`] trait, the capability every terminal
//! node implements. The trait is generic over a host context type `C`, so
//! leaves can read and mutate agent state while they run. Internal nodes
//! (composites, decorators, the root driver) are not behaviors: their
//! semantics are fixed by the engine.

use std::any::Any;
use std::time::Duration;

use crate::decorator::Bound;
use crate::error::ConfigError;
use crate::node::NodeId;
use crate::status::{Progress, Status};
use crate::store::Store;

/// Per-call view handed to a leaf by the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    node: NodeId,
    name: &'a str,
    number: u64,
    now: Duration,
    store: &'a Store,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(
        node: NodeId,
        name: &'a str,
        number: u64,
        now: Duration,
        store: &'a Store,
    ) -> Self {
        Self {
            node,
            name,
            number,
            now,
            store,
        }
    }

    /// The node being executed.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Display name of the node being executed.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Scheduler step number (1-based).
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Clock reading for this step, measured from the scheduler's start.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// The tree's shared store.
    pub fn store(&self) -> &'a Store {
        self.store
    }

    /// Looks up this node's configuration value in the shared store.
    pub fn config<T: Any + Send + Sync>(&self) -> Result<&'a T, ConfigError> {
        self.store.get::<T>(self.node)
    }
}

/// A terminal node driven through the setup/tick/teardown lifecycle.
///
/// # Lifecycle
///
/// For every activation the scheduler calls `setup` once, then `tick` once
/// per step until it returns [`Progress::Complete`], then `teardown` once to
/// read the completion status. If the activation is cancelled (for example
/// by a timed decorator), `abort` is called instead of `teardown` and the
/// behavior is never ticked again for that activation.
///
/// The same instance is reused for later activations, so `setup` must reset
/// any per-activation state.
pub trait Behavior<C>: Send {
    /// Prepares per-activation state.
    ///
    /// # Errors
    ///
    /// A [`ConfigError`] is fatal to the activation and is surfaced to the
    /// caller driving the scheduler.
    fn setup(&mut self, _frame: &Frame<'_>, _ctx: &mut C) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Performs one step of work.
    ///
    /// # Returns
    ///
    /// - `Progress::Pending` to yield until the next scheduler step
    /// - `Progress::Complete` when the work is finished
    fn tick(&mut self, frame: &Frame<'_>, ctx: &mut C) -> Progress;

    /// Finalizes the activation and reports its status.
    fn teardown(&mut self, frame: &Frame<'_>, ctx: &mut C) -> Status;

    /// Called when an in-flight activation is cancelled.
    fn abort(&mut self, _frame: &Frame<'_>, _ctx: &mut C) {}

    /// Replaces the leaf's own bound, taking effect from its next activation.
    ///
    /// Returns `false` if the leaf has no bound of that kind.
    fn set_bound(&mut self, _bound: Bound) -> bool {
        false
    }

    /// Declared type name shown to editors.
    fn type_name(&self) -> &'static str {
        "leaf"
    }
}
