//! Tax-return form graph.
//!
//! Forms are nodes whose lines pull values from sibling forms on demand.
//! Each line is evaluated at most once per pass and memoized on its form.
//! The registry decides which forms attach to a return and orders them by
//! attachment sequence; attached forms flatten to position-ordered field
//! lists for the PDF-filling collaborator.

pub mod analysis;
pub mod compute;
pub mod config;
pub mod display;
pub mod forms;
pub mod input;
pub mod output;
pub mod pass;
pub mod scenario;
pub mod store;

pub use compute::{ComputationError, CycleBreak, EvalLimits, Result, CYCLE_BREAKS};
pub use config::{TaxConfig, YearConfig};
pub use input::{FilingStatus, InputError, ReturnInput};
pub use output::{ComputedReturn, Field, FieldValue, ReturnSummary};
pub use pass::TaxReturn;
pub use scenario::{run_scenarios, Scenario, ScenarioOutcome};
pub use store::{FormRegistry, FormTag, IncludedForm, LineId, Value};
