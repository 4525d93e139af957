//! Form 8995, the simplified qualified business income deduction.
//!
//! Line 15 is the deduction side of a cycle break: it is limited by taxable
//! income before the deduction, which Form 1040 computes without line 13.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines, ScheduleC, ScheduleD, ScheduleSe, F1040};
use crate::compute::kernel::clamp_floor_zero;
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct Form8995 {
    ledger: Ledger,
}

impl FormNode for Form8995 {
    const TAG: FormTag = FormTag::Form8995;
    const SEQUENCE: u32 = 55;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.form_8995 }
}

impl Inclusion for Form8995 {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        let has_activity = self.business_income(r)? != 0.0 || self.loss_carryforward(r)? != 0.0;
        Ok(has_activity && self.within_threshold(r)?)
    }
}

impl Form8995 {
    /// Schedule C profit less the deductible part of self-employment tax.
    pub fn business_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1", || {
            Ok(r.form::<ScheduleC>().net_profit(r)? - r.form::<ScheduleSe>().deduction(r)?)
        })
    }

    pub fn total_business_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2", || self.business_income(r))
    }

    pub fn loss_carryforward(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3", || Ok(-r.input().carryforwards.qualified_business_loss.abs()))
    }

    pub fn net_business_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "4", || {
            Ok(clamp_floor_zero(self.total_business_income(r)? + self.loss_carryforward(r)?))
        })
    }

    pub fn income_component(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5", || {
            Ok(self.net_business_income(r)? * r.config().qualified_business_income.rate)
        })
    }

    pub fn taxable_income_before_deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || r.form::<F1040>().taxable_income_before_qbi(r))
    }

    pub fn net_capital_gain(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || {
            Ok(r.form::<F1040>().qualified_dividends(r)? + r.form::<ScheduleD>().net_capital_gain(r)?)
        })
    }

    pub fn income_limit_base(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || {
            Ok(clamp_floor_zero(self.taxable_income_before_deduction(r)? - self.net_capital_gain(r)?))
        })
    }

    pub fn income_limitation(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "14", || {
            Ok(self.income_limit_base(r)? * r.config().qualified_business_income.rate)
        })
    }

    /// Above the threshold the deduction needs Form 8995-A.
    pub fn within_threshold(&self, r: &TaxReturn<'_>) -> Result<bool> {
        r.line(self, "within_threshold", || {
            let threshold = *r.config().qualified_business_income.threshold.get(r.filing_status());
            Ok(self.taxable_income_before_deduction(r)? <= threshold)
        })
    }

    /// Line 15, carried to Form 1040 line 13.
    pub fn deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "15", || {
            if !self.within_threshold(r)? {
                return Ok(0.0);
            }
            Ok(self.income_component(r)?.min(self.income_limitation(r)?))
        })
    }

    /// Line 16, the loss carried to next year (zero or negative).
    pub fn loss_to_carry(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "16", || {
            Ok((self.total_business_income(r)? + self.loss_carryforward(r)?).min(0.0))
        })
    }
}

const LINES: &[&str] = &["1", "2", "3", "4", "5", "11", "12", "13", "14", "within_threshold", "15", "16"];

const FIELDS: &[&str] = &["1", "2", "3", "4", "5", "11", "12", "13", "14", "15", "16"];

impl Lines for Form8995 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "1" => self.business_income(r)?.into_value(),
            "2" => self.total_business_income(r)?.into_value(),
            "3" => self.loss_carryforward(r)?.into_value(),
            "4" => self.net_business_income(r)?.into_value(),
            "5" => self.income_component(r)?.into_value(),
            "11" => self.taxable_income_before_deduction(r)?.into_value(),
            "12" => self.net_capital_gain(r)?.into_value(),
            "13" => self.income_limit_base(r)?.into_value(),
            "14" => self.income_limitation(r)?.into_value(),
            "within_threshold" => self.within_threshold(r)?.into_value(),
            "15" => self.deduction(r)?.into_value(),
            "16" => self.loss_to_carry(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(FIELDS, 11)),
            _ => None,
        }
    }
}
