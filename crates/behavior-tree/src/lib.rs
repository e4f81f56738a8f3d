//! Cooperative behavior tree engine with a linear-time tree layout.
//!
//! Trees are built in an arena of generational handles and driven frame by
//! frame by a [`Scheduler`]. Every in-flight node keeps an explicit
//! continuation, so a bounded decorator can cancel its child's suspended
//! work outright when the bound fires first.
//!
//! - **Suspending leaves**: a leaf's `tick` may return `Pending` and resume on
//!   the next frame
//! - **Explicit cancellation**: cancelled leaves get `abort` and never tick
//!   again for that activation
//! - **Typed shared store**: per-node configuration keyed by node identity
//! - **Deterministic layout**: Buchheim/Walker positions for rendering
//!
//! # Architecture
//!
//! - [`Tree`]: node arena, structural edits, integrity checks
//! - [`Behavior`]: trait implemented by leaves
//! - [`Policy`]: composite child selection (sequence, selector, random variants)
//! - [`Decorator`]: single-child wrappers (inverter, succeeder, failer, timed,
//!   frame interrupt)
//! - [`Scheduler`]: frame-by-frame execution and scoped edits
//! - [`Registry`]: type id to node factory mapping for editors
//! - [`layout::compute`]: tree drawing
//!
//! # Example
//!
//! ```
//! use behavior_tree::builder::{leaf, sequence};
//! use behavior_tree::leaves::{Succeed, Wait};
//! use behavior_tree::{Scheduler, SchedulerConfig, Status, Tree};
//!
//! let tree: Tree<()> = Tree::from_blueprints(
//!     "origin",
//!     vec![sequence("patrol", vec![leaf("wait", Wait::new(1, Status::Success)), leaf("done", Succeed)])],
//! )
//! .unwrap();
//! let patrol = tree.children(tree.root().unwrap())[0];
//!
//! let mut scheduler = Scheduler::with_config(tree, SchedulerConfig { seed: Some(1) });
//! assert_eq!(scheduler.run_to_completion(patrol, &mut (), 10), Ok(Status::Success));
//! ```

pub mod behavior;
pub mod builder;
pub mod clock;
pub mod composite;
pub mod decorator;
pub mod error;
pub mod layout;
pub mod leaves;
pub mod node;
pub mod registry;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod tree;

// Re-export core types for ergonomic API
pub use behavior::{Behavior, Frame};
pub use clock::{Clock, ManualClock, SystemClock};
pub use composite::Policy;
pub use decorator::{Bound, Decorator};
pub use error::{
    ConfigError, EditError, ExecError, IntegrityError, LayoutError, RegistryError, TreeError,
};
pub use layout::{Layout, LayoutConfig, Placement, Rect};
pub use node::{Node, NodeId, NodeKind, NodeType, Size};
pub use registry::Registry;
pub use scheduler::{EditOutcome, EditRequest, Scheduler, SchedulerConfig, StepReport};
pub use status::{Progress, Status, Step};
pub use store::Store;
pub use tree::{Edge, Tree};
