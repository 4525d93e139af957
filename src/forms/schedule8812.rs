//! Schedule 8812, credits for qualifying children and other dependents.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines, F1040};
use crate::compute::kernel::{ceil_to_step, clamp_floor_zero};
use crate::compute::{Ledger, Result};
use crate::input::age_at_year_end;
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct Schedule8812 {
    ledger: Ledger,
}

impl FormNode for Schedule8812 {
    const TAG: FormTag = FormTag::Schedule8812;
    const SEQUENCE: u32 = 47;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_8812 }
}

impl Inclusion for Schedule8812 {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(self.credit(r)? > 0.0)
    }
}

impl Schedule8812 {
    /// Dependents under the age limit at year end. A dependent without a
    /// birth date never qualifies as a child.
    pub fn qualifying_children(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "4", || {
            let limit = r.config().child_tax_credit.child_age_limit;
            let count = r
                .input()
                .dependents
                .iter()
                .filter(|d| age_at_year_end(d.date_of_birth, r.tax_year()).is_some_and(|a| a < limit))
                .count();
            Ok(count as f64)
        })
    }

    pub fn child_amount(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5", || {
            Ok(self.qualifying_children(r)? * r.config().child_tax_credit.per_child)
        })
    }

    pub fn other_dependents(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "6", || {
            Ok(r.input().dependents.len() as f64 - self.qualifying_children(r)?)
        })
    }

    pub fn other_dependent_amount(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "7", || {
            Ok(self.other_dependents(r)? * r.config().child_tax_credit.per_other_dependent)
        })
    }

    pub fn credit_before_phase_out(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8", || Ok(self.child_amount(r)? + self.other_dependent_amount(r)?))
    }

    pub fn phase_out_threshold(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "9", || {
            Ok(*r.config().child_tax_credit.phase_out_threshold.get(r.filing_status()))
        })
    }

    /// Excess AGI, rounded up to the next whole step.
    pub fn excess_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "10", || {
            let agi = r.form::<F1040>().adjusted_gross_income(r)?;
            let excess = clamp_floor_zero(agi - self.phase_out_threshold(r)?);
            Ok(ceil_to_step(excess, r.config().child_tax_credit.phase_out_step))
        })
    }

    pub fn reduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || {
            Ok(self.excess_income(r)? * r.config().child_tax_credit.phase_out_rate)
        })
    }

    pub fn credit_after_phase_out(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || {
            Ok(clamp_floor_zero(self.credit_before_phase_out(r)? - self.reduction(r)?))
        })
    }

    pub fn tax_limit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || r.form::<F1040>().tax_before_credits(r))
    }

    /// Line 14, carried to Form 1040 line 19.
    pub fn credit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "14", || Ok(self.credit_after_phase_out(r)?.min(self.tax_limit(r)?)))
    }
}

const LINES: &[&str] = &["4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14"];

impl Lines for Schedule8812 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "4" => self.qualifying_children(r)?.into_value(),
            "5" => self.child_amount(r)?.into_value(),
            "6" => self.other_dependents(r)?.into_value(),
            "7" => self.other_dependent_amount(r)?.into_value(),
            "8" => self.credit_before_phase_out(r)?.into_value(),
            "9" => self.phase_out_threshold(r)?.into_value(),
            "10" => self.excess_income(r)?.into_value(),
            "11" => self.reduction(r)?.into_value(),
            "12" => self.credit_after_phase_out(r)?.into_value(),
            "13" => self.tax_limit(r)?.into_value(),
            "14" => self.credit(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(LINES, 11)),
            _ => None,
        }
    }
}
