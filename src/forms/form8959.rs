//! Form 8959, Additional Medicare Tax.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines, ScheduleSe};
use crate::compute::kernel::{clamp_floor_zero, sum};
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct Form8959 {
    ledger: Ledger,
}

impl FormNode for Form8959 {
    const TAG: FormTag = FormTag::Form8959;
    const SEQUENCE: u32 = 71;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.form_8959 }
}

impl Inclusion for Form8959 {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(self.total_tax(r)? > 0.0 || self.additional_withholding(r)? > 0.0)
    }
}

impl Form8959 {
    fn threshold(&self, r: &TaxReturn<'_>) -> f64 {
        *r.config().payroll.additional_medicare_threshold.get(r.filing_status())
    }

    // Part I: Medicare wages

    pub fn medicare_wages(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1", || Ok(sum(r.input().w2s.iter().map(|w| w.medicare_wages))))
    }

    pub fn total_wages(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "4", || self.medicare_wages(r))
    }

    pub fn wage_threshold(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5", || Ok(self.threshold(r)))
    }

    pub fn excess_wages(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "6", || Ok(clamp_floor_zero(self.total_wages(r)? - self.wage_threshold(r)?)))
    }

    pub fn wage_tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "7", || {
            Ok(self.excess_wages(r)? * r.config().payroll.additional_medicare_rate)
        })
    }

    // Part II: self-employment income

    pub fn self_employment_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8", || Ok(clamp_floor_zero(r.form::<ScheduleSe>().taxable_earnings(r)?)))
    }

    pub fn self_employment_threshold(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "9", || Ok(self.threshold(r)))
    }

    pub fn wages_applied(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "10", || self.total_wages(r))
    }

    pub fn remaining_threshold(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || {
            Ok(clamp_floor_zero(self.self_employment_threshold(r)? - self.wages_applied(r)?))
        })
    }

    pub fn excess_self_employment(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || {
            Ok(clamp_floor_zero(self.self_employment_income(r)? - self.remaining_threshold(r)?))
        })
    }

    pub fn self_employment_tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || {
            Ok(self.excess_self_employment(r)? * r.config().payroll.additional_medicare_rate)
        })
    }

    /// Line 18, carried to Schedule 2 line 11.
    pub fn total_tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "18", || Ok(self.wage_tax(r)? + self.self_employment_tax(r)?))
    }

    // Part V: withholding reconciliation

    pub fn medicare_withheld(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "19", || Ok(sum(r.input().w2s.iter().map(|w| w.medicare_withheld))))
    }

    pub fn withholding_wages(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "20", || self.medicare_wages(r))
    }

    pub fn regular_medicare_withholding(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "21", || {
            Ok(self.withholding_wages(r)? * r.config().payroll.employee_medicare_rate)
        })
    }

    pub fn additional_withheld_on_wages(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "22", || {
            Ok(clamp_floor_zero(self.medicare_withheld(r)? - self.regular_medicare_withholding(r)?))
        })
    }

    /// Line 24, carried to Form 1040 line 25c.
    pub fn additional_withholding(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "24", || self.additional_withheld_on_wages(r))
    }
}

const LINES: &[&str] = &[
    "1", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "18", "19", "20", "21", "22", "24",
];

impl Lines for Form8959 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "1" => self.medicare_wages(r)?.into_value(),
            "4" => self.total_wages(r)?.into_value(),
            "5" => self.wage_threshold(r)?.into_value(),
            "6" => self.excess_wages(r)?.into_value(),
            "7" => self.wage_tax(r)?.into_value(),
            "8" => self.self_employment_income(r)?.into_value(),
            "9" => self.self_employment_threshold(r)?.into_value(),
            "10" => self.wages_applied(r)?.into_value(),
            "11" => self.remaining_threshold(r)?.into_value(),
            "12" => self.excess_self_employment(r)?.into_value(),
            "13" => self.self_employment_tax(r)?.into_value(),
            "18" => self.total_tax(r)?.into_value(),
            "19" => self.medicare_withheld(r)?.into_value(),
            "20" => self.withholding_wages(r)?.into_value(),
            "21" => self.regular_medicare_withholding(r)?.into_value(),
            "22" => self.additional_withheld_on_wages(r)?.into_value(),
            "24" => self.additional_withholding(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(LINES, 17)),
            _ => None,
        }
    }
}
