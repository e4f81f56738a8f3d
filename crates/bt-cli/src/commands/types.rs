//! List registered node types.

use anyhow::Result;
use clap::Parser;
use console::style;

use crate::demo;

/// List registered node types
#[derive(Parser, Debug)]
pub struct Types {}

impl Types {
    pub fn execute(self) -> Result<()> {
        let registry = demo::registry()?;
        for type_id in registry.type_ids() {
            let kind = registry.create(type_id)?;
            println!("{:<18} {}", style(type_id).cyan(), style(kind.node_type()).dim());
        }
        println!("{} types", registry.len());
        Ok(())
    }
}
