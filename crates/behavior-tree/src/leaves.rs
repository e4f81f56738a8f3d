//! Built-in leaf behaviors.
//!
//! These are host-agnostic leaves useful for wiring, demos, and tests. Real
//! agents implement [`Behavior`] for their own action and condition types.

use std::time::Duration;

use crate::behavior::{Behavior, Frame};
use crate::decorator::Bound;
use crate::error::ConfigError;
use crate::status::{Progress, Status};

/// Completes on its first tick with `Success`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Succeed;

impl<C> Behavior<C> for Succeed {
    fn tick(&mut self, _frame: &Frame<'_>, _ctx: &mut C) -> Progress {
        Progress::Complete
    }

    fn teardown(&mut self, _frame: &Frame<'_>, _ctx: &mut C) -> Status {
        Status::Success
    }

    fn type_name(&self) -> &'static str {
        "succeed"
    }
}

/// Completes on its first tick with `Failure`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fail;

impl<C> Behavior<C> for Fail {
    fn tick(&mut self, _frame: &Frame<'_>, _ctx: &mut C) -> Progress {
        Progress::Complete
    }

    fn teardown(&mut self, _frame: &Frame<'_>, _ctx: &mut C) -> Status {
        Status::Failure
    }

    fn type_name(&self) -> &'static str {
        "fail"
    }
}

/// Suspends for a number of scheduler steps, then reports `status`.
///
/// With `frames = Some(n)` the leaf is pending for `n` ticks and completes on
/// tick `n + 1`. With `None` the count is read from the shared store as a
/// `u32` keyed by this node.
#[derive(Debug, Clone)]
pub struct Wait {
    frames: Option<u32>,
    status: Status,
    remaining: u32,
}

impl Wait {
    pub fn new(frames: u32, status: Status) -> Self {
        Self {
            frames: Some(frames),
            status,
            remaining: 0,
        }
    }

    /// A wait whose frame count comes from the shared store.
    pub fn configured(status: Status) -> Self {
        Self {
            frames: None,
            status,
            remaining: 0,
        }
    }
}

impl<C> Behavior<C> for Wait {
    fn setup(&mut self, frame: &Frame<'_>, _ctx: &mut C) -> Result<(), ConfigError> {
        self.remaining = match self.frames {
            Some(frames) => frames,
            None => *frame.config::<u32>()?,
        };
        Ok(())
    }

    fn tick(&mut self, _frame: &Frame<'_>, _ctx: &mut C) -> Progress {
        if self.remaining == 0 {
            return Progress::Complete;
        }
        self.remaining -= 1;
        Progress::Pending
    }

    fn teardown(&mut self, _frame: &Frame<'_>, _ctx: &mut C) -> Status {
        self.status
    }

    fn set_bound(&mut self, bound: Bound) -> bool {
        let Bound::Frames(frames) = bound else {
            return false;
        };
        self.frames = Some(frames);
        true
    }

    fn type_name(&self) -> &'static str {
        "wait"
    }
}

/// Suspends until a clock duration has elapsed, then reports `status`.
///
/// With `duration = None` the duration is read from the shared store as a
/// [`Duration`] keyed by this node.
#[derive(Debug, Clone)]
pub struct Sleep {
    duration: Option<Duration>,
    status: Status,
    until: Duration,
}

impl Sleep {
    pub fn new(duration: Duration, status: Status) -> Self {
        Self {
            duration: Some(duration),
            status,
            until: Duration::ZERO,
        }
    }

    /// A sleep whose duration comes from the shared store.
    pub fn configured(status: Status) -> Self {
        Self {
            duration: None,
            status,
            until: Duration::ZERO,
        }
    }
}

impl<C> Behavior<C> for Sleep {
    fn setup(&mut self, frame: &Frame<'_>, _ctx: &mut C) -> Result<(), ConfigError> {
        let duration = match self.duration {
            Some(duration) => duration,
            None => *frame.config::<Duration>()?,
        };
        self.until = frame.now().saturating_add(duration);
        Ok(())
    }

    fn tick(&mut self, frame: &Frame<'_>, _ctx: &mut C) -> Progress {
        if frame.now() >= self.until {
            Progress::Complete
        } else {
            Progress::Pending
        }
    }

    fn teardown(&mut self, _frame: &Frame<'_>, _ctx: &mut C) -> Status {
        self.status
    }

    fn set_bound(&mut self, bound: Bound) -> bool {
        let Bound::Time(duration) = bound else {
            return false;
        };
        self.duration = Some(duration);
        true
    }

    fn type_name(&self) -> &'static str {
        "sleep"
    }
}
