//! Schedule 3, additional credits and payments.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines};
use crate::compute::kernel::{clamp_floor_zero, sum};
use crate::compute::{Ledger, Result};
use crate::input::{FilingStatus, Owner};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct Schedule3 {
    ledger: Ledger,
}

impl FormNode for Schedule3 {
    const TAG: FormTag = FormTag::Schedule3;
    const SEQUENCE: u32 = 3;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_3 }
}

impl Inclusion for Schedule3 {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(self.nonrefundable_credits(r)? > 0.0 || self.other_payments(r)? > 0.0)
    }
}

impl Schedule3 {
    /// Line 1. Claimed directly only while foreign tax stays within the
    /// election limit; larger amounts need Form 1116, which is not modeled.
    pub fn foreign_tax_credit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1", || {
            let paid = sum(r.input().dividends.iter().map(|d| d.foreign_tax_paid));
            let limit = *r.config().foreign_tax_credit_direct_limit.get(r.filing_status());
            Ok(if paid <= limit { paid } else { 0.0 })
        })
    }

    /// Line 8, carried to Form 1040 line 20.
    pub fn nonrefundable_credits(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8", || self.foreign_tax_credit(r))
    }

    /// Line 11. Computed per person, and only for people with more than one
    /// employer.
    pub fn excess_social_security(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || {
            let input = r.input();
            let mut owners = vec![Owner::Taxpayer];
            if input.filing_status == FilingStatus::MarriedFilingJointly {
                owners.push(Owner::Spouse);
            }
            let max = r.config().max_social_security_tax();
            Ok(sum(owners.into_iter().map(|owner| {
                let w2s: Vec<_> = input.w2s_of(owner).collect();
                if w2s.len() < 2 {
                    return 0.0;
                }
                clamp_floor_zero(sum(w2s.iter().map(|w| w.social_security_withheld)) - max)
            })))
        })
    }

    /// Line 15, carried to Form 1040 line 31.
    pub fn other_payments(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "15", || self.excess_social_security(r))
    }
}

const LINES: &[&str] = &["1", "8", "11", "15"];

impl Lines for Schedule3 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "1" => self.foreign_tax_credit(r)?.into_value(),
            "8" => self.nonrefundable_credits(r)?.into_value(),
            "11" => self.excess_social_security(r)?.into_value(),
            "15" => self.other_payments(r)?.into_value(),
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
