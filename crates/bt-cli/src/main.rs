//! Behavior tree demo driver.
//!
//! Runs a small guard-agent tree frame by frame, prints its layout, and lists
//! the node types an editor could insert.
//! Run with: `cargo run -p behavior-tree-cli -- <command>`

mod commands;
mod config;
mod demo;

use anyhow::Result;
use clap::Parser;
use commands::{Layout, Run, Types};

/// Behavior tree demo driver
#[derive(Parser)]
#[command(name = "bt")]
#[command(about = "Run, lay out, and inspect a demo behavior tree", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Step the demo tree and print what happened each frame
    Run(Run),

    /// Print the demo tree's layout
    Layout(Layout),

    /// List registered node types
    Types(Types),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for BT_FRAMES, BT_SEED, RUST_LOG)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(cmd) => cmd.execute(),
        Command::Layout(cmd) => cmd.execute(),
        Command::Types(cmd) => cmd.execute(),
    }
}
