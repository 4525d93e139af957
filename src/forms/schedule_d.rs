//! Schedule D, capital gains and losses.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines};
use crate::compute::kernel::{clamp_floor_zero, sum};
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct ScheduleD {
    ledger: Ledger,
}

impl FormNode for ScheduleD {
    const TAG: FormTag = FormTag::ScheduleD;
    const SEQUENCE: u32 = 12;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.schedule_d }
}

impl Inclusion for ScheduleD {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        let input = r.input();
        Ok(!input.capital_transactions.is_empty()
            || input.carryforwards.short_term_capital_loss > 0.0
            || input.carryforwards.long_term_capital_loss > 0.0
            || self.capital_gain_distributions(r)? > 0.0)
    }
}

impl ScheduleD {
    fn transactions(&self, r: &TaxReturn<'_>, long_term: bool) -> f64 {
        sum(r
            .input()
            .capital_transactions
            .iter()
            .filter(|t| t.long_term == long_term)
            .map(|t| t.gain()))
    }

    // Part I: short term

    pub fn short_term_transactions(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3", || Ok(self.transactions(r, false)))
    }

    pub fn short_term_carryover(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "6", || Ok(-r.input().carryforwards.short_term_capital_loss.abs()))
    }

    pub fn net_short_term(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "7", || Ok(self.short_term_transactions(r)? + self.short_term_carryover(r)?))
    }

    // Part II: long term

    pub fn long_term_transactions(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "10", || Ok(self.transactions(r, true)))
    }

    pub fn capital_gain_distributions(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || {
            Ok(sum(r.input().dividends.iter().map(|d| d.capital_gain_distributions)))
        })
    }

    pub fn long_term_carryover(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "14", || Ok(-r.input().carryforwards.long_term_capital_loss.abs()))
    }

    pub fn net_long_term(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "15", || {
            Ok(self.long_term_transactions(r)?
                + self.capital_gain_distributions(r)?
                + self.long_term_carryover(r)?)
        })
    }

    // Part III

    pub fn net_gain(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "16", || Ok(self.net_short_term(r)? + self.net_long_term(r)?))
    }

    /// Line 21: the deductible part of a net loss, as a negative amount.
    pub fn allowed_loss(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "21", || {
            let net = self.net_gain(r)?;
            if net >= 0.0 {
                return Ok(0.0);
            }
            let limit = *r.config().capital_loss_limit.get(r.filing_status());
            Ok(-(net.abs().min(limit)))
        })
    }

    /// The smaller of net long-term gain and total net gain, never negative.
    /// This is the part of income eligible for preferential rates.
    pub fn net_capital_gain(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "net_capital_gain", || {
            Ok(clamp_floor_zero(self.net_long_term(r)?.min(self.net_gain(r)?)))
        })
    }

    /// Gain from line 16, or the limited loss from line 21.
    pub fn amount_for_1040(&self, r: &TaxReturn<'_>) -> Result<f64> {
        let net = self.net_gain(r)?;
        if net >= 0.0 { Ok(net) } else { self.allowed_loss(r) }
    }
}

const LINES: &[&str] = &["3", "6", "7", "10", "13", "14", "15", "16", "21", "net_capital_gain"];

const FIELDS: &[&str] = &["3", "6", "7", "10", "13", "14", "15", "16", "21"];

impl Lines for ScheduleD {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "3" => self.short_term_transactions(r)?.into_value(),
            "6" => self.short_term_carryover(r)?.into_value(),
            "7" => self.net_short_term(r)?.into_value(),
            "10" => self.long_term_transactions(r)?.into_value(),
            "13" => self.capital_gain_distributions(r)?.into_value(),
            "14" => self.long_term_carryover(r)?.into_value(),
            "15" => self.net_long_term(r)?.into_value(),
            "16" => self.net_gain(r)?.into_value(),
            "21" => self.allowed_loss(r)?.into_value(),
            "net_capital_gain" => self.net_capital_gain(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(FIELDS, 9)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::F1040;
    use crate::input::{CapitalTransaction, FilingStatus, ReturnInput};
    use crate::store::FormRegistry;
    use rstest::rstest;

    fn trade(proceeds: f64, cost_basis: f64, long_term: bool) -> CapitalTransaction {
        CapitalTransaction { description: "shares".into(), proceeds, cost_basis, long_term }
    }

    #[rstest]
    #[case(FilingStatus::Single, -3_000.0)]
    #[case(FilingStatus::MarriedFilingSeparately, -1_500.0)]
    fn test_loss_limited_by_status(#[case] status: FilingStatus, #[case] expected: f64) {
        let mut input = ReturnInput::new(2023, status);
        input.capital_transactions.push(trade(2_000.0, 10_000.0, false));
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        let d = r.form::<ScheduleD>();
        assert_eq!(d.net_gain(&r).unwrap(), -8_000.0);
        assert_eq!(d.allowed_loss(&r).unwrap(), expected);
        assert_eq!(r.form::<F1040>().capital_gain(&r).unwrap(), expected);
        assert_eq!(d.net_capital_gain(&r).unwrap(), 0.0);
    }

    #[test]
    fn test_net_capital_gain_offsets_short_term_loss() {
        let mut input = ReturnInput::new(2024, FilingStatus::Single);
        input.capital_transactions.push(trade(15_000.0, 5_000.0, true));
        input.capital_transactions.push(trade(1_000.0, 4_000.0, false));
        input.carryforwards.long_term_capital_loss = 1_000.0;
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        let d = r.form::<ScheduleD>();
        assert_eq!(d.net_long_term(&r).unwrap(), 9_000.0);
        assert_eq!(d.net_gain(&r).unwrap(), 6_000.0);
        assert_eq!(d.net_capital_gain(&r).unwrap(), 6_000.0);
        assert!(d.is_needed(&r).unwrap());
    }
}
