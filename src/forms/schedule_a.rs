//! Schedule A, itemized deductions.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines, F1040};
use crate::compute::kernel::clamp_floor_zero;
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct ScheduleA {
    ledger: Ledger,
}

impl FormNode for ScheduleA {
    const TAG: FormTag = FormTag::ScheduleA;
    const SEQUENCE: u32 = 7;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_a }
}

impl Inclusion for ScheduleA {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        self.itemizes(r)
    }
}

impl ScheduleA {
    // Medical and dental

    pub fn medical_expenses(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1", || Ok(r.input().itemized.medical_expenses))
    }

    pub fn agi(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2", || r.form::<F1040>().adjusted_gross_income(r))
    }

    pub fn medical_floor(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3", || Ok(clamp_floor_zero(self.agi(r)?) * r.config().itemized.medical_agi_floor))
    }

    pub fn medical_deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "4", || Ok(clamp_floor_zero(self.medical_expenses(r)? - self.medical_floor(r)?)))
    }

    // Taxes paid

    pub fn state_local_income_taxes(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5a", || Ok(r.input().itemized.state_local_income_taxes))
    }

    pub fn real_estate_taxes(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5b", || Ok(r.input().itemized.real_estate_taxes))
    }

    pub fn state_local_taxes(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5d", || Ok(self.state_local_income_taxes(r)? + self.real_estate_taxes(r)?))
    }

    pub fn capped_state_local_taxes(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5e", || {
            let cap = *r.config().itemized.salt_cap.get(r.filing_status());
            Ok(self.state_local_taxes(r)?.min(cap))
        })
    }

    pub fn taxes_paid(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "7", || self.capped_state_local_taxes(r))
    }

    // Interest

    pub fn mortgage_interest(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8a", || Ok(r.input().itemized.mortgage_interest))
    }

    pub fn interest_paid(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "10", || self.mortgage_interest(r))
    }

    // Gifts to charity

    /// Cash gifts, limited to a share of AGI.
    pub fn cash_gifts(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || {
            let limit = clamp_floor_zero(self.agi(r)?) * r.config().itemized.cash_charity_agi_limit;
            Ok(r.input().itemized.charitable_cash.min(limit))
        })
    }

    pub fn noncash_gifts(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || Ok(r.input().itemized.charitable_noncash))
    }

    pub fn gifts(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "14", || Ok(self.cash_gifts(r)? + self.noncash_gifts(r)?))
    }

    /// Line 17.
    pub fn total_itemized(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "17", || {
            Ok(self.medical_deduction(r)?
                + self.taxes_paid(r)?
                + self.interest_paid(r)?
                + self.gifts(r)?)
        })
    }

    /// Line 18: itemize when elected or when it beats the standard deduction.
    pub fn itemizes(&self, r: &TaxReturn<'_>) -> Result<bool> {
        r.line(self, "18", || {
            if r.input().elections.force_itemize {
                return Ok(true);
            }
            Ok(self.total_itemized(r)? > r.form::<F1040>().standard_deduction(r)?)
        })
    }
}

const LINES: &[&str] = &[
    "1", "2", "3", "4", "5a", "5b", "5d", "5e", "7", "8a", "10", "11", "12", "14", "17", "18",
];

impl Lines for ScheduleA {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "1" => self.medical_expenses(r)?.into_value(),
            "2" => self.agi(r)?.into_value(),
            "3" => self.medical_floor(r)?.into_value(),
            "4" => self.medical_deduction(r)?.into_value(),
            "5a" => self.state_local_income_taxes(r)?.into_value(),
            "5b" => self.real_estate_taxes(r)?.into_value(),
            "5d" => self.state_local_taxes(r)?.into_value(),
            "5e" => self.capped_state_local_taxes(r)?.into_value(),
            "7" => self.taxes_paid(r)?.into_value(),
            "8a" => self.mortgage_interest(r)?.into_value(),
            "10" => self.interest_paid(r)?.into_value(),
            "11" => self.cash_gifts(r)?.into_value(),
            "12" => self.noncash_gifts(r)?.into_value(),
            "14" => self.gifts(r)?.into_value(),
            "17" => self.total_itemized(r)?.into_value(),
            "18" => self.itemizes(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(LINES, 16)),
            _ => None,
        }
    }
}
