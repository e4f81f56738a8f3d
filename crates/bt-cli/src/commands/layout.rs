//! Print the demo tree's layout.

use anyhow::{Context, Result};
use behavior_tree::LayoutConfig;
use behavior_tree::layout;
use clap::Parser;
use console::style;

use crate::demo;

/// Print the demo tree's layout
#[derive(Parser, Debug)]
pub struct Layout {
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Horizontal spacing multiplier
    #[arg(long, default_value_t = LayoutConfig::default().horizontal_spacing)]
    pub horizontal_spacing: f64,

    /// Vertical spacing multiplier
    #[arg(long, default_value_t = LayoutConfig::default().vertical_spacing)]
    pub vertical_spacing: f64,
}

impl Layout {
    pub fn execute(self) -> Result<()> {
        let tree = demo::build()?;
        let config = LayoutConfig {
            horizontal_spacing: self.horizontal_spacing,
            vertical_spacing: self.vertical_spacing,
            ..LayoutConfig::default()
        };
        let layout = layout::compute(&tree, &config).context("layout failed")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&layout)?);
            return Ok(());
        }

        println!(
            "{:<16} {:<16} {:<14} {:>8} {:>8} {:>10} {:>10}",
            style("name").bold(),
            style("type").bold(),
            style("detail").bold(),
            style("x").bold(),
            style("y").bold(),
            style("left").bold(),
            style("top").bold()
        );
        for placement in &layout {
            let Some(node) = tree.get(placement.node) else {
                continue;
            };
            let depth = tree.depth_of(placement.node).unwrap_or(0);
            // Composite policy, or a decorator's explicit bound.
            let detail = match (node.policy(), node.decorator()) {
                (Some(policy), _) => format!("{policy:?}"),
                (None, Some(decorator)) => decorator
                    .bound()
                    .map_or_else(|| "-".to_owned(), |bound| bound.to_string()),
                (None, None) => "-".to_owned(),
            };
            println!(
                "{:<16} {:<16} {:<14} {:>8.2} {:>8.2} {:>10.1} {:>10.1}",
                format!("{}{}", "  ".repeat(depth), node.name()),
                node.type_name(),
                detail,
                placement.x,
                placement.y,
                placement.rect.x,
                placement.rect.y
            );
        }
        if let Some(bounds) = layout.bounds() {
            println!(
                "{} {:.1} x {:.1}, {} edges",
                style("canvas").dim(),
                bounds.right(),
                bounds.bottom(),
                tree.edges().len()
            );
        }
        Ok(())
    }
}
