//! Shared test fixtures: a recording host context and a scripted leaf.
#![allow(dead_code)]

use behavior_tree::{Behavior, ConfigError, Frame, NodeId, Progress, Status, Tree};

/// Host context that records every lifecycle call made on a [`Scripted`].
#[derive(Debug, Default)]
pub struct Log {
    pub events: Vec<String>,
}

impl Log {
    pub fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }
}

/// Leaf that stays pending for `pending` ticks, then reports `status`.
#[derive(Debug, Clone)]
pub struct Scripted {
    label: &'static str,
    pending: u32,
    status: Status,
    left: u32,
}

impl Scripted {
    pub fn new(label: &'static str, pending: u32, status: Status) -> Self {
        Self {
            label,
            pending,
            status,
            left: 0,
        }
    }

    pub fn ok(label: &'static str) -> Self {
        Self::new(label, 0, Status::Success)
    }

    pub fn fail(label: &'static str) -> Self {
        Self::new(label, 0, Status::Failure)
    }
}

impl Behavior<Log> for Scripted {
    fn setup(&mut self, _frame: &Frame<'_>, log: &mut Log) -> Result<(), ConfigError> {
        self.left = self.pending;
        log.events.push(format!("setup:{}", self.label));
        Ok(())
    }

    fn tick(&mut self, _frame: &Frame<'_>, log: &mut Log) -> Progress {
        log.events.push(format!("tick:{}", self.label));
        if self.left == 0 {
            return Progress::Complete;
        }
        self.left -= 1;
        Progress::Pending
    }

    fn teardown(&mut self, _frame: &Frame<'_>, log: &mut Log) -> Status {
        log.events.push(format!("teardown:{}", self.label));
        self.status
    }

    fn abort(&mut self, _frame: &Frame<'_>, log: &mut Log) {
        log.events.push(format!("abort:{}", self.label));
    }

    fn type_name(&self) -> &'static str {
        "scripted"
    }
}

/// First node in pre-order named `name`.
pub fn find<C>(tree: &Tree<C>, name: &str) -> NodeId {
    tree.pre_order()
        .into_iter()
        .find(|id| tree.get(*id).is_some_and(|node| node.name() == name))
        .unwrap_or_else(|| panic!("no node named {name:?}"))
}
