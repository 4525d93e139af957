//! Schedule SE, self-employment tax.
//!
//! Self-employment income is reported for the taxpayer; W-2 Social Security
//! wages of the taxpayer reduce the remaining wage base.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines, ScheduleC};
use crate::compute::kernel::{clamp_floor_zero, sum};
use crate::compute::{Ledger, Result};
use crate::input::Owner;
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Rate, Value};

#[derive(Debug, Default)]
pub struct ScheduleSe {
    ledger: Ledger,
}

impl FormNode for ScheduleSe {
    const TAG: FormTag = FormTag::ScheduleSe;
    const SEQUENCE: u32 = 17;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_se }
}

impl Inclusion for ScheduleSe {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(self.tax(r)? > 0.0)
    }
}

impl ScheduleSe {
    pub fn business_profit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2", || r.form::<ScheduleC>().net_profit(r))
    }

    pub fn combined(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3", || self.business_profit(r))
    }

    /// Share of profit treated as net earnings, printed beside line 4a.
    pub fn earnings_factor(&self, r: &TaxReturn<'_>) -> Result<Rate> {
        r.line(self, "earnings_factor", || Ok(Rate(r.config().self_employment.earnings_factor)))
    }

    pub fn net_earnings(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "4a", || {
            let combined = self.combined(r)?;
            Ok(if combined > 0.0 { combined * self.earnings_factor(r)?.0 } else { combined })
        })
    }

    /// Line 6. Below the minimum there is no self-employment tax at all.
    pub fn taxable_earnings(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "6", || {
            let earnings = self.net_earnings(r)?;
            Ok(if earnings < r.config().self_employment.minimum_earnings { 0.0 } else { earnings })
        })
    }

    pub fn wage_base(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "7", || Ok(r.config().payroll.social_security_wage_base))
    }

    pub fn social_security_wages(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8a", || {
            Ok(sum(r.input().w2s_of(Owner::Taxpayer).map(|w| w.social_security_wages)))
        })
    }

    pub fn remaining_wage_base(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "9", || Ok(clamp_floor_zero(self.wage_base(r)? - self.social_security_wages(r)?)))
    }

    pub fn social_security_portion(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "10", || {
            let base = self.taxable_earnings(r)?.min(self.remaining_wage_base(r)?);
            Ok(base * r.config().self_employment.social_security_rate)
        })
    }

    pub fn medicare_portion(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || {
            Ok(self.taxable_earnings(r)? * r.config().self_employment.medicare_rate)
        })
    }

    /// Line 12, carried to Schedule 2 line 4.
    pub fn tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || Ok(self.social_security_portion(r)? + self.medicare_portion(r)?))
    }

    /// Line 13, carried to Schedule 1 line 15.
    pub fn deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || Ok(self.tax(r)? * r.config().self_employment.deductible_share))
    }
}

const LINES: &[&str] = &["2", "3", "earnings_factor", "4a", "6", "7", "8a", "9", "10", "11", "12", "13"];

impl Lines for ScheduleSe {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "2" => self.business_profit(r)?.into_value(),
            "3" => self.combined(r)?.into_value(),
            "earnings_factor" => self.earnings_factor(r)?.into_value(),
            "4a" => self.net_earnings(r)?.into_value(),
            "6" => self.taxable_earnings(r)?.into_value(),
            "7" => self.wage_base(r)?.into_value(),
            "8a" => self.social_security_wages(r)?.into_value(),
            "9" => self.remaining_wage_base(r)?.into_value(),
            "10" => self.social_security_portion(r)?.into_value(),
            "11" => self.medicare_portion(r)?.into_value(),
            "12" => self.tax(r)?.into_value(),
            "13" => self.deduction(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(LINES, 12)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Business, FilingStatus, ReturnInput, W2};
    use crate::output::FieldValue;
    use crate::store::FormRegistry;

    fn consultant(profit: f64) -> ReturnInput {
        let mut input = ReturnInput::new(2024, FilingStatus::Single);
        input.businesses.push(Business { gross_receipts: profit, ..Business::default() });
        input
    }

    #[test]
    fn test_tax_and_half_deduction() {
        let input = consultant(100_000.0);
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        let se = r.form::<ScheduleSe>();
        let earnings = 100_000.0 * 0.9235;
        let expected = earnings * 0.124 + earnings * 0.029;
        assert!((se.tax(&r).unwrap() - expected).abs() < 1e-6);
        assert!((se.deduction(&r).unwrap() - expected / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_earnings_factor_keeps_its_precision_in_fields() {
        let input = consultant(20_000.0);
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        r.attach().unwrap();
        let fields = r.fields(FormTag::ScheduleSe).unwrap();
        let factor = fields.iter().find(|f| f.line == "earnings_factor").unwrap();
        assert_eq!(factor.index, 2);
        assert_eq!(factor.value, FieldValue::Decimal(0.9235));
        let net = fields.iter().find(|f| f.line == "4a").unwrap();
        assert_eq!(net.value, FieldValue::Amount(18_470));
    }

    #[test]
    fn test_below_minimum_earnings() {
        let input = consultant(400.0);
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        let se = r.form::<ScheduleSe>();
        assert_eq!(se.tax(&r).unwrap(), 0.0);
        assert!(!se.is_needed(&r).unwrap());
    }

    #[test]
    fn test_wages_consume_the_social_security_base() {
        let mut input = consultant(50_000.0);
        input.w2s.push(W2 { wages: 168_600.0, social_security_wages: 168_600.0, ..W2::default() });
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        let se = r.form::<ScheduleSe>();
        assert_eq!(se.social_security_portion(&r).unwrap(), 0.0);
        assert!(se.medicare_portion(&r).unwrap() > 0.0);
    }
}
