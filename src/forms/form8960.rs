//! Form 8960, Net Investment Income Tax.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines, F1040};
use crate::compute::kernel::clamp_floor_zero;
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct Form8960 {
    ledger: Ledger,
}

impl FormNode for Form8960 {
    const TAG: FormTag = FormTag::Form8960;
    const SEQUENCE: u32 = 72;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.form_8960 }
}

impl Inclusion for Form8960 {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(self.tax(r)? > 0.0)
    }
}

impl Form8960 {
    pub fn interest(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1", || r.form::<F1040>().taxable_interest(r))
    }

    pub fn dividends(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2", || r.form::<F1040>().ordinary_dividends(r))
    }

    pub fn capital_gain(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5a", || r.form::<F1040>().capital_gain(r))
    }

    pub fn total_investment_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8", || Ok(self.interest(r)? + self.dividends(r)? + self.capital_gain(r)?))
    }

    /// Line 12. Investment expenses (lines 9-11) are not modeled.
    pub fn net_investment_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || Ok(clamp_floor_zero(self.total_investment_income(r)?)))
    }

    pub fn modified_agi(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || r.form::<F1040>().adjusted_gross_income(r))
    }

    pub fn threshold(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "14", || {
            Ok(*r.config().investment_income_tax.threshold.get(r.filing_status()))
        })
    }

    pub fn excess_agi(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "15", || Ok(clamp_floor_zero(self.modified_agi(r)? - self.threshold(r)?)))
    }

    pub fn taxable_base(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "16", || Ok(self.net_investment_income(r)?.min(self.excess_agi(r)?)))
    }

    /// Line 17, carried to Schedule 2 line 12.
    pub fn tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "17", || Ok(self.taxable_base(r)? * r.config().investment_income_tax.rate))
    }
}

const LINES: &[&str] = &["1", "2", "5a", "8", "12", "13", "14", "15", "16", "17"];

impl Lines for Form8960 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "1" => self.interest(r)?.into_value(),
            "2" => self.dividends(r)?.into_value(),
            "5a" => self.capital_gain(r)?.into_value(),
            "8" => self.total_investment_income(r)?.into_value(),
            "12" => self.net_investment_income(r)?.into_value(),
            "13" => self.modified_agi(r)?.into_value(),
            "14" => self.threshold(r)?.into_value(),
            "15" => self.excess_agi(r)?.into_value(),
            "16" => self.taxable_base(r)?.into_value(),
            "17" => self.tax(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(LINES, 10)),
            _ => None,
        }
    }
}
