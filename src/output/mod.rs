//! What leaves the engine: field lists, summary values, and the bundled
//! computed return.
pub mod fields;
pub mod summary;

pub use fields::{Field, FieldLayout, FieldValue};
pub use summary::{ComputedReturn, FormOutput, ReturnSummary};
