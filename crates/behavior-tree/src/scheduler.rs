//! Cooperative scheduler.
//!
//! The scheduler owns a [`Tree`] and drives it one step ("frame") at a time.
//! Every in-flight node is represented by an explicit continuation
//! (a task); a parent's continuation owns its running child's, so the whole
//! in-flight chain is a single owned path from the activation root down to a
//! leaf. Suspending means returning [`Step::Suspended`] and keeping the task;
//! cancelling means walking the task, aborting leaves, and dropping it.
//!
//! # Step semantics
//!
//! - Leaves are ticked once per step until they complete.
//! - Composites keep starting children within the same step for as long as
//!   children complete without suspending.
//! - The root driver starts at most one child per step and yields after that
//!   child completes, so a tree of instantly-completing leaves still advances
//!   one child per frame.
//! - Timed and frame-bounded decorators advance their child first and only
//!   then check the bound, so a child finishing in the step the bound expires
//!   wins the tie.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::composite::{Order, Policy};
use crate::decorator::{Bound, Deadline, Decorator};
use crate::error::{EditError, ExecError, TreeError};
use crate::node::{Body, NodeId};
use crate::registry::Registry;
use crate::status::{Progress, Status, Step};
use crate::tree::Tree;

/// Scheduler settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Seed for random composites. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

/// What happened during one scheduler step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepReport {
    /// Step number (1-based).
    pub frame: u64,
    /// Nodes that tore down this step, innermost first.
    pub completed: Vec<(NodeId, Status)>,
    /// Bounded decorators whose bound fired this step.
    pub timed_out: Vec<NodeId>,
    /// Nodes whose in-flight activation was cancelled this step.
    pub cancelled: Vec<NodeId>,
    /// Status of an explicitly activated subtree that completed this step.
    pub finished: Option<Status>,
}

impl StepReport {
    fn new(frame: u64) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    /// The status `node` completed with this step, if it completed.
    pub fn status_of(&self, node: NodeId) -> Option<Status> {
        self.completed
            .iter()
            .find(|(id, _)| *id == node)
            .map(|(_, status)| *status)
    }
}

/// A structural edit issued by an editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRequest {
    AddRoot { name: String },
    AddChild { parent: NodeId, type_id: String, name: String },
    Delete { node: NodeId },
    Rename { node: NodeId, name: String },
    /// Sets an explicit bound on a bounded decorator or an accepting leaf.
    SetBound { node: NodeId, bound: Bound },
}

/// Result of an applied [`EditRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Added(NodeId),
    Deleted { removed: usize },
    Renamed,
    Configured,
}

/// Continuation of one in-flight node.
#[derive(Debug)]
pub(crate) struct Task {
    node: NodeId,
    state: TaskState,
}

#[derive(Debug)]
enum TaskState {
    Leaf,
    Root {
        /// Index of the child to start next.
        cursor: usize,
        child: Option<Box<Task>>,
    },
    Composite {
        policy: Policy,
        order: Order,
        child: Option<Box<Task>>,
        ran_any: bool,
    },
    Decorator {
        decorator: Decorator,
        child: Option<Box<Task>>,
        deadline: Option<Deadline>,
    },
}

impl Task {
    fn child(&self) -> Option<&Task> {
        match &self.state {
            TaskState::Leaf => None,
            TaskState::Root { child, .. }
            | TaskState::Composite { child, .. }
            | TaskState::Decorator { child, .. } => child.as_deref(),
        }
    }

    fn is_root(&self) -> bool {
        matches!(self.state, TaskState::Root { .. })
    }
}

/// Borrowed execution context for one step.
struct Exec<'a, C> {
    tree: &'a mut Tree<C>,
    host: &'a mut C,
    rng: &'a mut StdRng,
    now: Duration,
    frame: u64,
    report: &'a mut StepReport,
}

impl<C> Exec<'_, C> {
    /// Runs setup for `node` and returns its fresh continuation.
    fn start(&mut self, node: NodeId) -> Result<Task, ExecError> {
        let entry = self.tree.get(node).ok_or(ExecError::NodeNotFound(node))?;
        let prepared = match &entry.body {
            Body::Root { .. } => Some(Ok(TaskState::Root {
                cursor: 0,
                child: None,
            })),
            Body::Composite { policy, children } => Some(Ok(TaskState::Composite {
                policy: *policy,
                order: Order::new(*policy, children.len()),
                child: None,
                ran_any: false,
            })),
            // A childless decorator fails on its first resume; its bound is
            // never consulted.
            Body::Decorator {
                decorator,
                child: None,
            } => Some(Ok(TaskState::Decorator {
                decorator: *decorator,
                child: None,
                deadline: None,
            })),
            Body::Decorator { decorator, .. } => Some(
                decorator
                    .arm(node, self.tree.store(), self.now)
                    .map(|deadline| TaskState::Decorator {
                        decorator: *decorator,
                        child: None,
                        deadline,
                    }),
            ),
            Body::Leaf { .. } => None,
        };
        let prepared = match prepared {
            Some(prepared) => prepared,
            None => {
                let host = &mut *self.host;
                self.tree
                    .with_leaf(node, self.frame, self.now, |behavior, frame| {
                        behavior.setup(frame, host)
                    })
                    .ok_or(ExecError::NodeNotFound(node))?
                    .map(|()| TaskState::Leaf)
            }
        };

        let state = match prepared {
            Ok(state) => state,
            Err(source) => {
                let name = self
                    .tree
                    .get(node)
                    .map(|entry| entry.name().to_owned())
                    .unwrap_or_default();
                warn!(node = %node, name = %name, error = %source, "setup failed");
                return Err(ExecError::Setup { node, name, source });
            }
        };

        if let Some(entry) = self.tree.get_mut(node) {
            entry.active = true;
            debug!(frame = self.frame, node = %node, name = %entry.name, "started");
        }
        Ok(Task { node, state })
    }

    /// Advances `task` by one step.
    fn resume(&mut self, task: &mut Task) -> Result<Step, ExecError> {
        let node = task.node;
        match &mut task.state {
            TaskState::Leaf => {
                let host = &mut *self.host;
                let outcome = self
                    .tree
                    .with_leaf(node, self.frame, self.now, |behavior, frame| {
                        match behavior.tick(frame, host) {
                            Progress::Pending => None,
                            Progress::Complete => Some(behavior.teardown(frame, host)),
                        }
                    })
                    .ok_or(ExecError::NodeNotFound(node))?;
                trace!(frame = self.frame, node = %node, done = outcome.is_some(), "ticked leaf");
                Ok(match outcome {
                    Some(status) => Step::Done(self.finish(node, status)),
                    None => Step::Suspended,
                })
            }

            // A failed child activation is cancelled and skipped; the driver
            // itself keeps running and moves on to the next child.
            TaskState::Root { cursor, child } => {
                if child.is_none() {
                    let children = self.tree.children(node);
                    if children.is_empty() {
                        return Ok(Step::Suspended);
                    }
                    let next = children[*cursor % children.len()];
                    match self.start(next) {
                        Ok(started) => *child = Some(Box::new(started)),
                        Err(err) => {
                            self.advance_cursor(node, cursor, next);
                            return Err(err);
                        }
                    }
                }
                let Some(running) = child.as_mut() else {
                    return Ok(Step::Suspended);
                };
                let current = running.node;
                match self.resume(running) {
                    Ok(step) => {
                        if step.status().is_some() {
                            *child = None;
                            self.advance_cursor(node, cursor, current);
                        }
                    }
                    Err(err) => {
                        if let Some(abandoned) = child.take() {
                            self.cancel(*abandoned);
                        }
                        self.advance_cursor(node, cursor, current);
                        return Err(err);
                    }
                }
                Ok(Step::Suspended)
            }

            TaskState::Composite {
                policy,
                order,
                child,
                ran_any,
            } => loop {
                if let Some(running) = child.as_mut() {
                    match self.resume(running)? {
                        Step::Suspended => return Ok(Step::Suspended),
                        Step::Done(status) => {
                            *child = None;
                            *ran_any = true;
                            if status == policy.short_circuit_on() {
                                return Ok(Step::Done(self.finish(node, status)));
                            }
                        }
                    }
                }
                let Some(index) = order.next_child(&mut *self.rng) else {
                    if !*ran_any {
                        warn!(node = %node, "composite has no children; failing");
                    }
                    let status = policy.exhausted(*ran_any);
                    return Ok(Step::Done(self.finish(node, status)));
                };
                let Some(&next) = self.tree.children(node).get(index) else {
                    continue;
                };
                *child = Some(Box::new(self.start(next)?));
            },

            TaskState::Decorator {
                decorator,
                child,
                deadline,
            } => {
                if child.is_none() {
                    let Some(&only) = self.tree.children(node).first() else {
                        warn!(node = %node, "decorator has no child; failing");
                        return Ok(Step::Done(self.finish(node, Status::Failure)));
                    };
                    *child = Some(Box::new(self.start(only)?));
                }
                let Some(running) = child.as_mut() else {
                    return Ok(Step::Done(self.finish(node, Status::Failure)));
                };
                match self.resume(running)? {
                    Step::Done(status) => {
                        *child = None;
                        let status = decorator.transform(status);
                        Ok(Step::Done(self.finish(node, status)))
                    }
                    Step::Suspended => {
                        let expired = deadline.as_mut().is_some_and(|d| d.expire(self.now));
                        if !expired {
                            return Ok(Step::Suspended);
                        }
                        if let Some(abandoned) = child.take() {
                            self.cancel(*abandoned);
                        }
                        warn!(frame = self.frame, node = %node, "bound expired; child cancelled");
                        self.report.timed_out.push(node);
                        Ok(Step::Done(self.finish(node, Status::Failure)))
                    }
                }
            }
        }
    }

    /// Points the root driver's cursor just past `child`.
    fn advance_cursor(&self, root: NodeId, cursor: &mut usize, child: NodeId) {
        if let Some(position) = self.tree.children(root).iter().position(|id| *id == child) {
            *cursor = position + 1;
        }
    }

    /// Tears `node` down to idle with `status` and records the completion.
    fn finish(&mut self, node: NodeId, status: Status) -> Status {
        if let Some(entry) = self.tree.get_mut(node) {
            entry.active = false;
            entry.last_status = Some(status);
            debug!(frame = self.frame, node = %node, name = %entry.name, ?status, "completed");
        }
        self.report.completed.push((node, status));
        status
    }

    /// Terminates `task` and everything below it, innermost first.
    fn cancel(&mut self, task: Task) {
        let Task { node, state } = task;
        match state {
            TaskState::Leaf => {
                let host = &mut *self.host;
                self.tree
                    .with_leaf(node, self.frame, self.now, |behavior, frame| {
                        behavior.abort(frame, host)
                    });
            }
            TaskState::Root { child, .. }
            | TaskState::Composite { child, .. }
            | TaskState::Decorator { child, .. } => {
                if let Some(child) = child {
                    self.cancel(*child);
                }
            }
        }
        if let Some(entry) = self.tree.get_mut(node) {
            entry.active = false;
        }
        debug!(frame = self.frame, node = %node, "cancelled");
        self.report.cancelled.push(node);
    }
}

/// Drives a [`Tree`] frame by frame against a host context `C`.
pub struct Scheduler<C> {
    tree: Tree<C>,
    task: Option<Task>,
    pending: Option<NodeId>,
    rng: StdRng,
    clock: Box<dyn Clock>,
    frame: u64,
}

impl<C> Scheduler<C> {
    /// Takes ownership of `tree` with default settings.
    pub fn new(tree: Tree<C>) -> Self {
        Self::with_config(tree, SchedulerConfig::default())
    }

    /// Takes ownership of `tree`. The tree's store is frozen from here on.
    pub fn with_config(mut tree: Tree<C>, config: SchedulerConfig) -> Self {
        tree.freeze_store();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            tree,
            task: None,
            pending: None,
            rng,
            clock: Box::new(SystemClock::new()),
            frame: 0,
        }
    }

    /// Replaces the time source used by timed decorators and sleeping leaves.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn tree(&self) -> &Tree<C> {
        &self.tree
    }

    /// Releases the tree. Anything still in flight is dropped without teardown.
    pub fn into_tree(self) -> Tree<C> {
        self.tree
    }

    /// Number of steps run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// `true` when nothing is in flight or queued.
    pub fn is_idle(&self) -> bool {
        self.task.is_none() && self.pending.is_none()
    }

    /// Node ids along the in-flight chain, outermost first.
    pub fn active_path(&self) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = self.task.as_ref();
        while let Some(task) = cursor {
            path.push(task.node);
            cursor = task.child();
        }
        path
    }

    /// Queues `node` as the next activation instead of the root driver.
    ///
    /// # Errors
    ///
    /// - [`ExecError::Busy`] if an activation is in flight or queued
    /// - [`ExecError::NodeNotFound`] if `node` is not in the tree
    pub fn activate(&mut self, node: NodeId) -> Result<(), ExecError> {
        if !self.is_idle() {
            return Err(ExecError::Busy);
        }
        if !self.tree.contains(node) {
            return Err(ExecError::NodeNotFound(node));
        }
        self.pending = Some(node);
        Ok(())
    }

    /// Runs one step.
    ///
    /// When idle, starts the queued activation (or the root driver) after
    /// validating the tree. An error cancels the failed activation. Under the
    /// root driver only the failing child's chain is cancelled, and the driver
    /// moves on to the next child on the following step.
    ///
    /// # Errors
    ///
    /// - [`ExecError::NoRoot`] if there is nothing to run
    /// - [`ExecError::Integrity`] if the tree fails validation
    /// - [`ExecError::Setup`] if a node could not resolve its configuration
    pub fn step(&mut self, host: &mut C) -> Result<StepReport, ExecError> {
        self.frame += 1;
        let now = self.clock.elapsed();
        let mut report = StepReport::new(self.frame);

        let started = match self.task.take() {
            Some(task) => Ok(task),
            None => self.start_activation(host, now, &mut report),
        };

        let mut exec = Exec {
            tree: &mut self.tree,
            host,
            rng: &mut self.rng,
            now,
            frame: self.frame,
            report: &mut report,
        };
        let mut task = started?;
        match exec.resume(&mut task) {
            Ok(Step::Suspended) => self.task = Some(task),
            Ok(Step::Done(status)) => {
                debug!(frame = self.frame, node = %task.node, ?status, "activation finished");
                report.finished = Some(status);
            }
            Err(err) => {
                // The root driver has already cancelled and skipped the
                // failed child; any other activation ends here.
                if task.is_root() {
                    self.task = Some(task);
                } else {
                    exec.cancel(task);
                }
                return Err(err);
            }
        }
        Ok(report)
    }

    fn start_activation(
        &mut self,
        host: &mut C,
        now: Duration,
        report: &mut StepReport,
    ) -> Result<Task, ExecError> {
        let target = match self.pending.take() {
            Some(node) => node,
            None => self.tree.root().ok_or(ExecError::NoRoot)?,
        };
        self.tree.validate()?;
        let mut exec = Exec {
            tree: &mut self.tree,
            host,
            rng: &mut self.rng,
            now,
            frame: self.frame,
            report,
        };
        exec.start(target)
    }

    /// Activates `node` and steps until it completes.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::StepLimit`] (after cancelling the activation) if
    /// `node` has not completed within `max_steps` steps, plus any error from
    /// [`activate`](Self::activate) or [`step`](Self::step).
    pub fn run_to_completion(
        &mut self,
        node: NodeId,
        host: &mut C,
        max_steps: u64,
    ) -> Result<Status, ExecError> {
        self.activate(node)?;
        for _ in 0..max_steps {
            if let Some(status) = self.step(host)?.finished {
                return Ok(status);
            }
        }
        self.stop(host);
        Err(ExecError::StepLimit {
            node,
            steps: max_steps,
        })
    }

    /// Cancels everything in flight, returning the cancelled node ids.
    pub fn stop(&mut self, host: &mut C) -> Vec<NodeId> {
        self.pending = None;
        let Some(task) = self.task.take() else {
            return Vec::new();
        };
        self.cancel_task(host, task)
    }

    /// Applies a structural edit between steps.
    ///
    /// In-flight work below the root driver is cancelled first; the driver
    /// keeps its place and restarts the interrupted child on the next step.
    /// Depth and deepest-leaf are recomputed before this returns.
    pub fn edit<R>(
        &mut self,
        host: &mut C,
        f: impl FnOnce(&mut Tree<C>) -> Result<R, TreeError>,
    ) -> Result<R, TreeError> {
        self.cancel_below_root(host);
        let result = f(&mut self.tree);
        self.drop_orphaned_task();
        result
    }

    /// Applies an editor request, cancelling only the in-flight work the
    /// edit touches.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Registry`] for an unknown type id and
    /// [`EditError::Tree`] for a rejected structural edit. Rejected requests
    /// leave the tree and the in-flight chain untouched.
    pub fn apply(
        &mut self,
        request: EditRequest,
        registry: &Registry<C>,
        host: &mut C,
    ) -> Result<EditOutcome, EditError> {
        debug!(?request, "applying edit");
        let outcome = match request {
            EditRequest::AddRoot { name } => EditOutcome::Added(self.tree.add_root(name)?),
            EditRequest::AddChild {
                parent,
                type_id,
                name,
            } => {
                if !self.tree.contains(parent) {
                    return Err(TreeError::NodeNotFound(parent).into());
                }
                let kind = registry.create(&type_id)?;
                self.tree.check_attach(parent, &kind)?;
                if self.touches_running_work(parent) {
                    self.cancel_below_root(host);
                }
                EditOutcome::Added(self.tree.add_child(parent, name, kind)?)
            }
            EditRequest::Delete { node } => {
                let parent = self.tree.get(node).ok_or(TreeError::NodeNotFound(node))?.parent();
                if Some(node) == self.tree.root() {
                    self.stop(host);
                } else if self.tree.is_active(node)
                    || parent.is_some_and(|parent| self.touches_running_work(parent))
                {
                    self.cancel_below_root(host);
                }
                let removed = self.tree.delete(node)?;
                self.drop_orphaned_task();
                EditOutcome::Deleted { removed }
            }
            EditRequest::Rename { node, name } => {
                self.tree.rename(node, name)?;
                EditOutcome::Renamed
            }
            // The running activation keeps the bound it was armed with.
            EditRequest::SetBound { node, bound } => {
                self.tree.set_bound(node, bound)?;
                EditOutcome::Configured
            }
        };
        Ok(outcome)
    }

    /// Whether an edit to `parent`'s child list would disturb a suspended
    /// activation. The root driver re-reads its children every step.
    fn touches_running_work(&self, parent: NodeId) -> bool {
        self.tree.is_active(parent) && Some(parent) != self.tree.root()
    }

    fn cancel_below_root(&mut self, host: &mut C) -> Vec<NodeId> {
        let Some(mut task) = self.task.take() else {
            return Vec::new();
        };
        if !task.is_root() {
            return self.cancel_task(host, task);
        }
        let TaskState::Root { child, .. } = &mut task.state else {
            return Vec::new();
        };
        let cancelled = match child.take() {
            Some(running) => self.cancel_task(host, *running),
            None => Vec::new(),
        };
        self.task = Some(task);
        cancelled
    }

    fn cancel_task(&mut self, host: &mut C, task: Task) -> Vec<NodeId> {
        let mut report = StepReport::new(self.frame);
        let mut exec = Exec {
            tree: &mut self.tree,
            host,
            rng: &mut self.rng,
            now: self.clock.elapsed(),
            frame: self.frame,
            report: &mut report,
        };
        exec.cancel(task);
        report.cancelled
    }

    fn drop_orphaned_task(&mut self) {
        if self
            .task
            .as_ref()
            .is_some_and(|task| !self.tree.contains(task.node))
        {
            self.task = None;
        }
        if self.pending.is_some_and(|node| !self.tree.contains(node)) {
            self.pending = None;
        }
    }
}

impl<C> std::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tree", &self.tree)
            .field("active_path", &self.active_path())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
