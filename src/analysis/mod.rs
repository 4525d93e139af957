//! Pass telemetry and dependency-graph checks.
pub mod telemetry;
pub mod topology;

pub use telemetry::{PassReport, PassStats};
pub use topology::{analyze_catalog, BreakViolation, CatalogReport, LineGraph};
