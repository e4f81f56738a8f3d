//! Decorator nodes.
//!
//! Decorators wrap exactly one child and either transform its result or
//! bound how long it may run. This module provides the result transforms
//! ([`Decorator::Inverter`], [`Decorator::Succeeder`], [`Decorator::Failer`])
//! and the two bounds ([`Decorator::Timed`], [`Decorator::FrameInterrupt`]).
//! A [`Bound`] is the editor-facing value used to set either bound.

use std::time::Duration;

use crate::error::ConfigError;
use crate::node::{NodeId, NodeType};
use crate::status::Status;
use crate::store::Store;

/// An explicit bound supplied by an editor for a node whose bound would
/// otherwise be read from the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bound {
    /// A number of scheduler steps.
    Frames(u32),
    /// A clock duration.
    Time(Duration),
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Frames(frames) => write!(f, "{frames} frames"),
            Bound::Time(duration) => write!(f, "{duration:?}"),
        }
    }
}

/// Single-child wrapper applied to a child's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decorator {
    /// Reports the logical negation of the child's status.
    Inverter,

    /// Always reports `Success`, regardless of the child's result.
    ///
    /// Useful for optional behaviors that shouldn't cause a sequence to fail.
    Succeeder,

    /// Always reports `Failure`, regardless of the child's result.
    Failer,

    /// Races a wall-clock countdown against the child.
    ///
    /// When `timeout` is `None` the bound is read from the shared store (a
    /// [`Duration`] keyed by this node) at setup.
    Timed { timeout: Option<Duration> },

    /// Races a countdown of scheduler steps against the child.
    ///
    /// When `frames` is `None` the bound is read from the shared store (a
    /// `u32` keyed by this node) at setup.
    FrameInterrupt { frames: Option<u32> },
}

impl Decorator {
    /// A timed decorator with an explicit bound.
    pub fn timed(timeout: Duration) -> Self {
        Decorator::Timed {
            timeout: Some(timeout),
        }
    }

    /// A frame-interrupt decorator with an explicit bound.
    pub fn frame_interrupt(frames: u32) -> Self {
        Decorator::FrameInterrupt {
            frames: Some(frames),
        }
    }

    /// This decorator with its bound replaced by `bound`.
    ///
    /// Returns `None` when the decorator has no bound of that kind: timed
    /// decorators take [`Bound::Time`], frame interrupts take
    /// [`Bound::Frames`], and result transforms take neither.
    pub fn with_bound(self, bound: Bound) -> Option<Self> {
        match (self, bound) {
            (Decorator::Timed { .. }, Bound::Time(timeout)) => Some(Decorator::timed(timeout)),
            (Decorator::FrameInterrupt { .. }, Bound::Frames(frames)) => {
                Some(Decorator::frame_interrupt(frames))
            }
            _ => None,
        }
    }

    /// The explicit bound, if one is set on the decorator itself.
    pub fn bound(&self) -> Option<Bound> {
        match self {
            Decorator::Timed { timeout } => timeout.map(Bound::Time),
            Decorator::FrameInterrupt { frames } => frames.map(Bound::Frames),
            _ => None,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Decorator::Inverter => NodeType::Inverter,
            Decorator::Succeeder => NodeType::Succeeder,
            Decorator::Failer => NodeType::Failer,
            Decorator::Timed { .. } => NodeType::Timed,
            Decorator::FrameInterrupt { .. } => NodeType::FrameInterrupt,
        }
    }

    /// Maps the child's status to the status this decorator reports.
    pub fn transform(&self, child: Status) -> Status {
        match self {
            Decorator::Inverter => child.invert(),
            Decorator::Succeeder => Status::Success,
            Decorator::Failer => Status::Failure,
            Decorator::Timed { .. } | Decorator::FrameInterrupt { .. } => child,
        }
    }

    /// Resolves the bound for a new activation started at `now`.
    ///
    /// Returns `Ok(None)` for decorators without a bound.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the bound is not set on the decorator and
    /// the store has no value of the right type for `node`.
    pub(crate) fn arm(
        &self,
        node: NodeId,
        store: &Store,
        now: Duration,
    ) -> Result<Option<Deadline>, ConfigError> {
        let deadline = match self {
            Decorator::Timed { timeout } => {
                let timeout = match timeout {
                    Some(timeout) => *timeout,
                    None => *store.get::<Duration>(node)?,
                };
                Some(Deadline::At(now.saturating_add(timeout)))
            }
            Decorator::FrameInterrupt { frames } => {
                let limit = match frames {
                    Some(frames) => *frames,
                    None => *store.get::<u32>(node)?,
                };
                Some(Deadline::Frames { limit, waited: 0 })
            }
            _ => None,
        };
        Ok(deadline)
    }
}

/// Countdown raced against a bounded decorator's child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deadline {
    /// Fires once the clock reaches this reading.
    At(Duration),
    /// Fires once `limit` steps have passed since the activation step.
    Frames { limit: u32, waited: u32 },
}

impl Deadline {
    /// Advances the countdown by one step that the child survived.
    ///
    /// Returns `true` if the bound has fired. The caller checks the child
    /// first, so a child finishing in the same step wins the tie.
    pub(crate) fn expire(&mut self, now: Duration) -> bool {
        match self {
            Deadline::At(deadline) => now >= *deadline,
            Deadline::Frames { limit, waited } => {
                if *waited >= *limit {
                    return true;
                }
                *waited += 1;
                false
            }
        }
    }
}
