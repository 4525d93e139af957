//! The line evaluator, its memo ledger, aggregation kernels, and the
//! cycle-breaking primitive.
pub mod engine;
pub mod kernel;
pub mod ledger;
pub mod restricted;

pub use engine::{EvalLimits, Evaluator, Result};
pub use ledger::{ComputationError, Ledger};
pub use restricted::{CycleBreak, CYCLE_BREAKS};
