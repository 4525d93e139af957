//! Identity types for forms and lines, and the registry that selects which
//! forms attach to a return.
pub mod registry;
pub mod types;

pub use registry::FormRegistry;
pub use types::{FormTag, IncludedForm, LineId, LineValue, Rate, Value};
