//! Schedule C, profit or loss from business.
//!
//! All businesses on the return are reported on one aggregate schedule.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines};
use crate::compute::kernel::sum;
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct ScheduleC {
    ledger: Ledger,
}

impl FormNode for ScheduleC {
    const TAG: FormTag = FormTag::ScheduleC;
    const SEQUENCE: u32 = 9;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_c }
}

impl Inclusion for ScheduleC {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(!r.input().businesses.is_empty())
    }
}

impl ScheduleC {
    pub fn business_name(&self, r: &TaxReturn<'_>) -> Result<String> {
        r.line(self, "name", || {
            let names: Vec<&str> = r.input().businesses.iter().map(|b| b.name.as_str()).collect();
            Ok(names.join("; "))
        })
    }

    pub fn gross_receipts(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1", || Ok(sum(r.input().businesses.iter().map(|b| b.gross_receipts))))
    }

    pub fn returns_and_allowances(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2", || {
            Ok(sum(r.input().businesses.iter().map(|b| b.returns_and_allowances)))
        })
    }

    pub fn net_receipts(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3", || Ok(self.gross_receipts(r)? - self.returns_and_allowances(r)?))
    }

    pub fn cost_of_goods_sold(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "4", || Ok(sum(r.input().businesses.iter().map(|b| b.cost_of_goods_sold))))
    }

    pub fn gross_profit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "5", || Ok(self.net_receipts(r)? - self.cost_of_goods_sold(r)?))
    }

    /// Line 7. Line 6 (other income) is not modeled.
    pub fn gross_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "7", || self.gross_profit(r))
    }

    pub fn total_expenses(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "28", || Ok(sum(r.input().businesses.iter().map(|b| b.expenses))))
    }

    /// Line 31, net profit or (loss).
    pub fn net_profit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "31", || Ok(self.gross_income(r)? - self.total_expenses(r)?))
    }
}

const LINES: &[&str] = &["name", "1", "2", "3", "4", "5", "7", "28", "31"];

impl Lines for ScheduleC {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "name" => self.business_name(r)?.into_value(),
            "1" => self.gross_receipts(r)?.into_value(),
            "2" => self.returns_and_allowances(r)?.into_value(),
            "3" => self.net_receipts(r)?.into_value(),
            "4" => self.cost_of_goods_sold(r)?.into_value(),
            "5" => self.gross_profit(r)?.into_value(),
            "7" => self.gross_income(r)?.into_value(),
            "28" => self.total_expenses(r)?.into_value(),
            "31" => self.net_profit(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(LINES, 9)),
            _ => None,
        }
    }
}
