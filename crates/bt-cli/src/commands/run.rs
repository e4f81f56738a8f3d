//! Step the demo tree frame by frame.

use anyhow::{Context, Result};
use behavior_tree::{NodeId, Scheduler, SchedulerConfig, Status, StepReport, Tree};
use clap::Parser;
use console::style;

use crate::config::DemoConfig;
use crate::demo::{self, Agent};

/// Step the demo tree and print what happened each frame
#[derive(Parser, Debug)]
pub struct Run {
    /// Frames to run (overrides BT_FRAMES)
    #[arg(long)]
    pub frames: Option<u64>,

    /// RNG seed for random composites (overrides BT_SEED)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Milliseconds to wait between frames (overrides BT_FRAME_MS)
    #[arg(long)]
    pub frame_ms: Option<u64>,
}

impl Run {
    pub fn execute(self) -> Result<()> {
        let config = DemoConfig::from_env().with_overrides(self.frames, self.seed, self.frame_ms);
        tracing::debug!(?config, "starting demo run");

        let tree = demo::build()?;
        let mut scheduler = Scheduler::with_config(tree, SchedulerConfig { seed: config.seed });
        let mut agent = Agent::default();

        for _ in 0..config.frames {
            let report = scheduler
                .step(&mut agent)
                .with_context(|| format!("frame {} failed", scheduler.frame()))?;
            print_frame(scheduler.tree(), &report, &scheduler.active_path(), &agent);

            if !config.frame_interval.is_zero() {
                std::thread::sleep(config.frame_interval);
            }
        }

        println!(
            "{} {} frames, {} steps walked",
            style("done").green().bold(),
            scheduler.frame(),
            agent.steps_walked
        );
        Ok(())
    }
}

fn print_frame(tree: &Tree<Agent>, report: &StepReport, path: &[NodeId], agent: &Agent) {
    println!(
        "{} energy={} {}",
        style(format!("#{:03}", report.frame)).dim(),
        agent.energy,
        style(demo::describe_path(tree, path)).cyan()
    );
    for (node, status) in &report.completed {
        let name = tree.get(*node).map(|n| n.name()).unwrap_or("?");
        let mark = match status {
            Status::Success => style("ok").green(),
            Status::Failure => style("fail").red(),
        };
        println!("      {mark} {name}");
    }
    for node in &report.timed_out {
        let name = tree.get(*node).map(|n| n.name()).unwrap_or("?");
        println!("      {} {name}", style("timeout").yellow().bold());
    }
}
