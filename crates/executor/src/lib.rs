//! Minimal execution engine for SkiffSQL: a tree-walking interpreter for
//! generated expression trees plus the drivers that run aggregate and
//! window-aggregate state machines over rows.

pub mod aggregate;
pub mod eval;
pub mod window;

pub use aggregate::Aggregator;
pub use eval::{Evaluator, PartitionCtx, convert_value};
pub use window::WindowExec;
