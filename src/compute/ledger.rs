//! ledger.rs
//! Per-form memo storage and the error type shared by every evaluation path.

use crate::store::{FormTag, LineId, Value};
use std::cell::RefCell;
use std::collections::HashMap;

pub use self::error::ComputationError;
mod error {
    use super::*;
    use thiserror::Error;

    fn format_path(path: &[LineId]) -> String {
        path.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" -> ")
    }

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum ComputationError {
        #[error("Cycle detected at line '{line}': {}", format_path(.path))]
        CycleDetected { line: LineId, path: Vec<LineId> },
        #[error("Evaluation depth {depth} exceeded at line '{line}'")]
        DepthExceeded { line: LineId, depth: usize },
        #[error("Restricted line '{restricted}' reached fenced deduction '{deduction}'")]
        RestrictedDependency { restricted: LineId, deduction: LineId },
        #[error("Form '{form}' has no line '{line}'")]
        UnknownLine { form: FormTag, line: String },
        #[error("Line '{line}' produced a {actual} value where a {expected} was expected")]
        TypeMismatch { line: LineId, expected: &'static str, actual: &'static str },
        #[error("Attachment of '{form}' queried before inclusion was settled")]
        InclusionNotSettled { form: FormTag },
        #[error("Form '{form}' is not attached to this return")]
        NotAttached { form: FormTag },
        #[error("Field layout for '{form}' ({year}) lists {actual} lines but the form has {expected} fillable positions")]
        LayoutMismatch { form: FormTag, year: u16, expected: usize, actual: usize },
        #[error("No field layout for '{form}' in tax year {year}")]
        MissingLayout { form: FormTag, year: u16 },
        #[error("No configuration for tax year {0}")]
        UnsupportedYear(u16),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    /// The line's body is running somewhere on the active call stack.
    InProgress,
    Ready(Value),
}

/// Memoized line results for one form instance, valid for one pass.
///
/// Single-threaded by construction: the `RefCell` keeps a pass `!Sync`, so a
/// ledger can never be shared between concurrent scenarios.
#[derive(Debug, Default)]
pub struct Ledger {
    slots: RefCell<HashMap<&'static str, Slot>>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    /// Returns a resolved value, if the line has already completed.
    pub fn get(&self, line: &str) -> Option<Value> {
        match self.slots.borrow().get(line) {
            Some(Slot::Ready(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Number of lines resolved so far.
    pub fn resolved(&self) -> usize {
        self.slots.borrow().values().filter(|s| matches!(s, Slot::Ready(_))).count()
    }

    pub(crate) fn slot(&self, line: &str) -> Option<Slot> {
        self.slots.borrow().get(line).cloned()
    }

    pub(crate) fn begin(&self, line: &'static str) {
        self.slots.borrow_mut().insert(line, Slot::InProgress);
    }

    pub(crate) fn complete(&self, line: &'static str, value: Value) {
        self.slots.borrow_mut().insert(line, Slot::Ready(value));
    }

    pub(crate) fn abandon(&self, line: &str) {
        self.slots.borrow_mut().remove(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lifecycle() {
        let ledger = Ledger::new();
        assert!(ledger.slot("7").is_none());

        ledger.begin("7");
        assert_eq!(ledger.slot("7"), Some(Slot::InProgress));
        assert_eq!(ledger.get("7"), None);

        ledger.complete("7", Value::Amount(12.5));
        assert_eq!(ledger.get("7"), Some(Value::Amount(12.5)));
        assert_eq!(ledger.resolved(), 1);

        ledger.abandon("7");
        assert!(ledger.slot("7").is_none());
    }

    #[test]
    fn test_cycle_error_lists_path() {
        let a = LineId::new(FormTag::F1040, "15");
        let b = LineId::new(FormTag::Form8995, "15");
        let err = ComputationError::CycleDetected { line: a, path: vec![a, b, a] };
        assert_eq!(
            err.to_string(),
            "Cycle detected at line 'f1040.15': f1040.15 -> form_8995.15 -> f1040.15"
        );
    }
}
