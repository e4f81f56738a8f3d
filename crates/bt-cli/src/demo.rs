//! The demo guard agent and its tree.
//!
//! The guard rests when its energy runs low, otherwise patrols under a frame
//! budget read from the shared store, then idles and keeps a timed lookout.

use std::time::Duration;

use anyhow::{Context, Result};
use behavior_tree::builder::{
    frame_interrupt, inverter, leaf, random_selector, selector, sequence, timed,
};
use behavior_tree::leaves::{Fail, Sleep, Succeed};
use behavior_tree::{
    Behavior, ConfigError, Frame, NodeId, NodeKind, Progress, Registry, Status, Tree,
};

/// Frame budget stored for the bounded patrol.
pub const PATROL_BUDGET: u32 = 3;

/// Host state the demo leaves read and mutate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub energy: u32,
    pub max_energy: u32,
    pub steps_walked: u32,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            energy: 4,
            max_energy: 4,
            steps_walked: 0,
        }
    }
}

/// Succeeds when the agent's energy is below a threshold.
#[derive(Debug, Clone, Copy)]
pub struct EnergyBelow(pub u32);

impl Behavior<Agent> for EnergyBelow {
    fn tick(&mut self, _frame: &Frame<'_>, _agent: &mut Agent) -> Progress {
        Progress::Complete
    }

    fn teardown(&mut self, _frame: &Frame<'_>, agent: &mut Agent) -> Status {
        Status::from_bool(agent.energy < self.0)
    }

    fn type_name(&self) -> &'static str {
        "energy_below"
    }
}

/// Regains one point of energy per frame until full.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recharge;

impl Behavior<Agent> for Recharge {
    fn tick(&mut self, _frame: &Frame<'_>, agent: &mut Agent) -> Progress {
        agent.energy = (agent.energy + 1).min(agent.max_energy);
        if agent.energy == agent.max_energy {
            Progress::Complete
        } else {
            Progress::Pending
        }
    }

    fn teardown(&mut self, _frame: &Frame<'_>, _agent: &mut Agent) -> Status {
        Status::Success
    }

    fn type_name(&self) -> &'static str {
        "recharge"
    }
}

/// Walks a fixed route, spending one point of energy per step.
#[derive(Debug, Clone, Copy)]
pub struct Patrol {
    route: u32,
    walked: u32,
}

impl Patrol {
    pub fn new(route: u32) -> Self {
        Self { route, walked: 0 }
    }
}

impl Behavior<Agent> for Patrol {
    fn setup(&mut self, _frame: &Frame<'_>, _agent: &mut Agent) -> Result<(), ConfigError> {
        self.walked = 0;
        Ok(())
    }

    fn tick(&mut self, _frame: &Frame<'_>, agent: &mut Agent) -> Progress {
        if agent.energy == 0 {
            return Progress::Complete;
        }
        agent.energy -= 1;
        agent.steps_walked += 1;
        self.walked += 1;
        if self.walked >= self.route {
            Progress::Complete
        } else {
            Progress::Pending
        }
    }

    fn teardown(&mut self, _frame: &Frame<'_>, _agent: &mut Agent) -> Status {
        Status::from_bool(self.walked >= self.route)
    }

    fn abort(&mut self, frame: &Frame<'_>, _agent: &mut Agent) {
        tracing::info!(node = %frame.node(), walked = self.walked, "patrol cut short");
    }

    fn type_name(&self) -> &'static str {
        "patrol"
    }
}

/// Builds the demo tree and stores the patrol's frame budget.
pub fn build() -> Result<Tree<Agent>> {
    let mut tree = Tree::from_blueprints(
        "guard",
        vec![
            selector(
                "duty",
                vec![
                    sequence(
                        "rest",
                        vec![leaf("tired?", EnergyBelow(2)), leaf("nap", Recharge)],
                    ),
                    frame_interrupt("bounded patrol", None, leaf("patrol", Patrol::new(5))),
                ],
            ),
            random_selector(
                "idle",
                vec![
                    leaf("whistle", Succeed),
                    inverter("stretch", leaf("yawn", Fail)),
                ],
            ),
            timed(
                "lookout",
                Some(Duration::from_millis(200)),
                leaf("scan", Sleep::new(Duration::from_millis(20), Status::Success)),
            ),
        ],
    )
    .context("failed to assemble demo tree")?;

    let bounded = find(&tree, "bounded patrol").context("demo tree lost its patrol bound")?;
    tree.store_mut()?.insert(bounded, PATROL_BUDGET);
    Ok(tree)
}

/// The built-in node types plus the demo's own leaves.
pub fn registry() -> Result<Registry<Agent>> {
    let mut registry = Registry::with_builtins();
    registry.register("energy_below", || NodeKind::leaf(EnergyBelow(2)))?;
    registry.register("recharge", || NodeKind::leaf(Recharge))?;
    registry.register("patrol", || NodeKind::leaf(Patrol::new(5)))?;
    Ok(registry)
}

/// First node in pre-order named `name`.
pub fn find<C>(tree: &Tree<C>, name: &str) -> Option<NodeId> {
    tree.pre_order()
        .into_iter()
        .find(|id| tree.get(*id).is_some_and(|node| node.name() == name))
}

/// Display names along `path`, joined for printing.
pub fn describe_path<C>(tree: &Tree<C>, path: &[NodeId]) -> String {
    path.iter()
        .filter_map(|id| tree.get(*id).map(|node| node.name().to_owned()))
        .collect::<Vec<_>>()
        .join(" > ")
}

#[cfg(test)]
mod tests {
    use behavior_tree::{ManualClock, Scheduler, SchedulerConfig};

    use super::*;

    #[test]
    fn demo_tree_passes_integrity_and_has_a_stored_budget() {
        let tree = build().unwrap();
        assert!(tree.integrity_check());
        let bounded = find(&tree, "bounded patrol").unwrap();
        assert_eq!(tree.store().get::<u32>(bounded), Ok(&PATROL_BUDGET));
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn patrol_is_cut_off_by_its_frame_budget() {
        let tree = build().unwrap();
        let bounded = find(&tree, "bounded patrol").unwrap();
        let patrol = find(&tree, "patrol").unwrap();
        let mut scheduler =
            Scheduler::with_config(tree, SchedulerConfig { seed: Some(3) }).with_clock(ManualClock::new());
        let mut agent = Agent {
            energy: 10,
            max_energy: 10,
            steps_walked: 0,
        };

        let mut timed_out = None;
        for _ in 0..10 {
            let report = scheduler.step(&mut agent).unwrap();
            if report.timed_out.contains(&bounded) {
                assert!(report.cancelled.contains(&patrol));
                timed_out = Some(agent.steps_walked);
                break;
            }
        }
        // Budget N allows N + 1 ticks before the cutoff.
        assert_eq!(timed_out, Some(PATROL_BUDGET + 1));
    }

    #[test]
    fn registry_lists_demo_leaves() {
        let registry = registry().unwrap();
        assert!(registry.contains("patrol"));
        assert!(registry.contains("sequence"));
        assert!(!registry.contains("root"));
    }
}
