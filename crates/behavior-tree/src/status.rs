//! Status values flowing between nodes and the scheduler.

/// The completion status of a node activation.
///
/// # Cooperative Semantics
///
/// A node may run across many scheduler steps, but once it finishes it
/// reports exactly one of these two values to its parent:
/// - Composites decide whether to continue or short-circuit on it
/// - Decorators may transform it before passing it further up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// The behavior completed successfully.
    ///
    /// For conditions: The condition was met.
    /// For actions: The action ran to completion.
    Success,

    /// The behavior failed.
    ///
    /// For conditions: The condition was not met.
    /// For actions: The action could not be completed (or was cut off by a bound).
    Failure,
}

impl Status {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// Inverts the status: Success becomes Failure and vice versa.
    ///
    /// This is what the inverter decorator applies to its child's result.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
        }
    }

    /// Maps `true` to `Success` and `false` to `Failure`.
    #[inline]
    pub fn from_bool(value: bool) -> Self {
        if value {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

impl From<bool> for Status {
    fn from(value: bool) -> Self {
        Status::from_bool(value)
    }
}

/// Outcome of a single leaf `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Progress {
    /// The leaf has more work; resume it on the next scheduler step.
    Pending,
    /// The leaf finished its work; its status is read from `teardown`.
    Complete,
}

/// Outcome of advancing a node's continuation by one scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// The node yielded and is waiting for the next step.
    Suspended,
    /// The node ran its teardown and reported a status.
    Done(Status),
}

impl Step {
    /// Returns the reported status, if the node finished.
    #[inline]
    pub fn status(self) -> Option<Status> {
        match self {
            Step::Suspended => None,
            Step::Done(status) => Some(status),
        }
    }
}
