//! Structural cycle-breaking between a deduction and the income figure that
//! limits it.
//!
//! A deduction whose limitation reads "income" cannot call the full income
//! chain, because that chain subtracts the deduction. Instead the limiter
//! exposes a *restricted* line: the same income measure computed with the
//! deduction excluded. The deduction consumes the restricted line; the full
//! line consumes the deduction. While the restricted line runs, the
//! deduction is fenced and any path back to it is a modeling error.

use crate::store::{FormTag, LineId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleBreak {
    pub name: &'static str,
    /// The limited deduction.
    pub deduction: LineId,
    /// Income before the deduction; read by the deduction's limitation.
    pub restricted: LineId,
    /// The full measure that subtracts the deduction.
    pub limited: LineId,
}

/// Qualified business income deduction, limited to 20% of taxable income
/// before that deduction.
pub const QBI_DEDUCTION: CycleBreak = CycleBreak {
    name: "qbi_deduction",
    deduction: LineId::new(FormTag::Form8995, "15"),
    restricted: LineId::new(FormTag::F1040, "taxable_income_before_qbi"),
    limited: LineId::new(FormTag::F1040, "15"),
};

/// Student loan interest, phased out by modified AGI figured without the
/// interest deduction itself.
pub const STUDENT_LOAN_INTEREST: CycleBreak = CycleBreak {
    name: "student_loan_interest",
    deduction: LineId::new(FormTag::Schedule1, "21"),
    restricted: LineId::new(FormTag::Schedule1, "magi_before_student_loan"),
    limited: LineId::new(FormTag::F1040, "11"),
};

/// Every cycle break declared by the shipped catalog.
pub const CYCLE_BREAKS: &[CycleBreak] = &[QBI_DEDUCTION, STUDENT_LOAN_INTEREST];
