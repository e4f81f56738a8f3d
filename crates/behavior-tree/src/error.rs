//! Error types surfaced by the engine.
//!
//! Structural and configuration violations are returned to the caller as
//! errors and are never repaired automatically. Scheduler-level anomalies
//! (an empty composite, a decorator without a child) are not errors at all:
//! they are absorbed into [`Status::Failure`](crate::Status::Failure).

use thiserror::Error;

use crate::decorator::Bound;
use crate::node::NodeId;

/// A rejected structural edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist in this tree")]
    NodeNotFound(NodeId),

    #[error("tree already has a root ({0})")]
    RootExists(NodeId),

    #[error("the root driver may only be placed at the top of a tree")]
    RootAsChild,

    #[error("leaf {0} cannot have children")]
    LeafParent(NodeId),

    #[error("decorator {decorator} already has child {existing}; remove it first")]
    DecoratorOccupied { decorator: NodeId, existing: NodeId },

    #[error("shared store is frozen once the tree starts executing")]
    StoreFrozen,

    #[error("node {node} takes no bound of the form {bound}")]
    BoundRejected { node: NodeId, bound: Bound },
}

/// A failed integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("tree has no root")]
    MissingRoot,

    #[error("child slot {slot} of {parent} refers to a missing node")]
    MissingChild { parent: NodeId, slot: usize },

    #[error("{child} is listed under {listed_under} but points at parent {recorded:?}")]
    ParentMismatch {
        child: NodeId,
        listed_under: NodeId,
        recorded: Option<NodeId>,
    },

    #[error("{0} is reachable more than once")]
    DuplicateChild(NodeId),
}

/// A configuration lookup that could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no configuration value stored for {0}")]
    Missing(NodeId),

    #[error("configuration value for {node} is not a {expected}")]
    TypeMismatch {
        node: NodeId,
        expected: &'static str,
    },
}

/// Errors raised while driving a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("tree has no root to execute")]
    NoRoot,

    #[error("node {0} does not exist in this tree")]
    NodeNotFound(NodeId),

    #[error("tree failed its integrity check")]
    Integrity(#[from] IntegrityError),

    #[error("setup of {name:?} ({node}) failed")]
    Setup {
        node: NodeId,
        name: String,
        #[source]
        source: ConfigError,
    },

    #[error("an activation is already in flight")]
    Busy,

    #[error("{node} did not finish within {steps} steps")]
    StepLimit { node: NodeId, steps: u64 },
}

/// Errors raised by the node type registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown node type {0:?}")]
    UnknownType(String),

    #[error("node type {0:?} is already registered")]
    Duplicate(String),
}

/// Errors raised while applying an editor request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors raised by the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout blocked: tree failed its integrity check")]
    IntegrityCheckFailed(#[source] IntegrityError),
}
