//! Schedule B, interest and ordinary dividends.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines};
use crate::compute::kernel::sum;
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct ScheduleB {
    ledger: Ledger,
}

impl FormNode for ScheduleB {
    const TAG: FormTag = FormTag::ScheduleB;
    const SEQUENCE: u32 = 8;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_b }
}

impl Inclusion for ScheduleB {
    /// Required over the reporting threshold, or whenever the foreign
    /// account question must be answered yes.
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        let threshold = r.config().interest_dividend_schedule_threshold;
        Ok(self.total_interest(r)? > threshold
            || self.total_dividends(r)? > threshold
            || self.foreign_accounts(r)?)
    }
}

impl ScheduleB {
    pub fn interest(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1", || {
            Ok(sum(r.input().interest.iter().map(|i| i.interest + i.us_savings_bond_interest)))
        })
    }

    pub fn taxable_interest(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2", || self.interest(r))
    }

    /// Line 4, carried to Form 1040 line 2b. Excludable savings bond
    /// interest (line 3) is not modeled.
    pub fn total_interest(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "4", || self.taxable_interest(r))
    }

    pub fn dividends(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5", || Ok(sum(r.input().dividends.iter().map(|d| d.ordinary_dividends))))
    }

    /// Line 6, carried to Form 1040 line 3b.
    pub fn total_dividends(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "6", || self.dividends(r))
    }

    pub fn foreign_accounts(&self, r: &TaxReturn<'_>) -> Result<bool> {
        r.line(self, "7a", || Ok(r.input().elections.foreign_financial_accounts))
    }
}

const LINES: &[&str] = &["1", "2", "4", "5", "6", "7a"];

impl Lines for ScheduleB {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "1" => self.interest(r)?.into_value(),
            "2" => self.taxable_interest(r)?.into_value(),
            "4" => self.total_interest(r)?.into_value(),
            "5" => self.dividends(r)?.into_value(),
            "6" => self.total_dividends(r)?.into_value(),
            "7a" => self.foreign_accounts(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(LINES, 6)),
            _ => None,
        }
    }
}
