//! Schedule 2, additional taxes.

use super::{unknown_line, Form8959, Form8960, FormNode, Forms, Inclusion, Lines, ScheduleSe};
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct Schedule2 {
    ledger: Ledger,
}

impl FormNode for Schedule2 {
    const TAG: FormTag = FormTag::Schedule2;
    const SEQUENCE: u32 = 2;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_2 }
}

impl Inclusion for Schedule2 {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(self.other_taxes(r)? > 0.0)
    }
}

impl Schedule2 {
    pub fn self_employment_tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "4", || r.form::<ScheduleSe>().tax(r))
    }

    pub fn additional_medicare_tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || r.form::<Form8959>().total_tax(r))
    }

    pub fn net_investment_income_tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || r.form::<Form8960>().tax(r))
    }

    /// Line 21, carried to Form 1040 line 23.
    pub fn other_taxes(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "21", || {
            Ok(self.self_employment_tax(r)?
                + self.additional_medicare_tax(r)?
                + self.net_investment_income_tax(r)?)
        })
    }
}

const LINES: &[&str] = &["4", "11", "12", "21"];

impl Lines for Schedule2 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "4" => self.self_employment_tax(r)?.into_value(),
            "11" => self.additional_medicare_tax(r)?.into_value(),
            "12" => self.net_investment_income_tax(r)?.into_value(),
            "21" => self.other_taxes(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(LINES, 4)),
            _ => None,
        }
    }
}
