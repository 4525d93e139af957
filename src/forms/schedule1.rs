//! Schedule 1, additional income and adjustments to income.

use super::{unknown_line, Form8889, FormNode, Forms, Inclusion, Lines, ScheduleC, ScheduleSe, F1040};
use crate::compute::kernel::{phase_out, sum};
use crate::compute::restricted::STUDENT_LOAN_INTEREST;
use crate::compute::{Ledger, Result};
use crate::input::FilingStatus;
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct Schedule1 {
    ledger: Ledger,
}

impl FormNode for Schedule1 {
    const TAG: FormTag = FormTag::Schedule1;
    const SEQUENCE: u32 = 1;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_1 }
}

impl Inclusion for Schedule1 {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(self.additional_income(r)? != 0.0 || self.total_adjustments(r)? != 0.0)
    }
}

impl Schedule1 {
    // Part I

    pub fn business_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3", || r.form::<ScheduleC>().net_profit(r))
    }

    pub fn other_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8z", || Ok(sum(r.input().other_income.iter().map(|o| o.amount))))
    }

    pub fn total_other_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "9", || self.other_income(r))
    }

    /// Line 10, carried to Form 1040 line 8.
    pub fn additional_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "10", || Ok(self.business_income(r)? + self.total_other_income(r)?))
    }

    // Part II

    /// Capped per eligible educator; each filer gets their own cap.
    pub fn educator_expenses(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || {
            let cap = r.config().educator_expense_limit * r.input().filers().count() as f64;
            Ok(r.input().adjustments.educator_expenses.min(cap))
        })
    }

    pub fn hsa_deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || r.form::<Form8889>().deduction(r))
    }

    pub fn self_employment_deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "15", || r.form::<ScheduleSe>().deduction(r))
    }

    /// Interest paid, capped before any income phase-out.
    pub fn student_loan_unlimited(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "student_loan_unlimited", || {
            let cap = r.config().student_loan_interest.max_deduction;
            Ok(r.input().adjustments.student_loan_interest.clamp(0.0, cap))
        })
    }

    /// Modified AGI for the student loan phase-out: total income less every
    /// other adjustment. It must not reach line 21.
    pub fn magi_before_student_loan(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.restricted_line(self, STUDENT_LOAN_INTEREST, || {
            let total_income = r.form::<F1040>().total_income(r)?;
            Ok(total_income
                - (self.educator_expenses(r)?
                    + self.hsa_deduction(r)?
                    + self.self_employment_deduction(r)?))
        })
    }

    /// Line 21. Not available when married filing separately.
    pub fn student_loan_interest(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "21", || {
            let status = r.filing_status();
            if status == FilingStatus::MarriedFilingSeparately {
                return Ok(0.0);
            }
            let unlimited = self.student_loan_unlimited(r)?;
            if unlimited == 0.0 {
                return Ok(0.0);
            }
            let cfg = &r.config().student_loan_interest;
            Ok(phase_out(
                unlimited,
                self.magi_before_student_loan(r)?,
                *cfg.phase_out_start.get(status),
                *cfg.phase_out_range.get(status),
            ))
        })
    }

    /// Line 26, carried to Form 1040 line 10.
    pub fn total_adjustments(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "26", || {
            Ok(self.educator_expenses(r)?
                + self.hsa_deduction(r)?
                + self.self_employment_deduction(r)?
                + self.student_loan_interest(r)?)
        })
    }
}

const LINES: &[&str] = &[
    "3", "8z", "9", "10", "11", "13", "15",
    "student_loan_unlimited", "magi_before_student_loan", "21", "26",
];

const FIELDS: &[&str] = &["3", "8z", "9", "10", "11", "13", "15", "21", "26"];

impl Lines for Schedule1 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "3" => self.business_income(r)?.into_value(),
            "8z" => self.other_income(r)?.into_value(),
            "9" => self.total_other_income(r)?.into_value(),
            "10" => self.additional_income(r)?.into_value(),
            "11" => self.educator_expenses(r)?.into_value(),
            "13" => self.hsa_deduction(r)?.into_value(),
            "15" => self.self_employment_deduction(r)?.into_value(),
            "student_loan_unlimited" => self.student_loan_unlimited(r)?.into_value(),
            "magi_before_student_loan" => self.magi_before_student_loan(r)?.into_value(),
            "21" => self.student_loan_interest(r)?.into_value(),
            "26" => self.total_adjustments(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(FIELDS, 9)),
            _ => None,
        }
    }
}
