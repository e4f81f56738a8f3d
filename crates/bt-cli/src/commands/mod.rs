//! Command implementations for the demo driver
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod layout;
mod run;
mod types;

pub use layout::Layout;
pub use run::Run;
pub use types::Types;
