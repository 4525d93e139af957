//! Form 8889, health savings accounts.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines};
use crate::compute::kernel::clamp_floor_zero;
use crate::compute::{Ledger, Result};
use crate::input::HsaCoverage;
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};

#[derive(Debug, Default)]
pub struct Form8889 {
    ledger: Ledger,
}

impl FormNode for Form8889 {
    const TAG: FormTag = FormTag::Form8889;
    const SEQUENCE: u32 = 52;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.form_8889 }
}

impl Inclusion for Form8889 {
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool> {
        Ok(self.contributions(r)? > 0.0 || self.employer_contributions(r)? > 0.0)
    }
}

impl Form8889 {
    pub fn coverage(&self, r: &TaxReturn<'_>) -> Result<String> {
        r.line(self, "1", || {
            Ok(match r.input().adjustments.hsa_coverage {
                Some(HsaCoverage::SelfOnly) => "self-only".to_string(),
                Some(HsaCoverage::Family) => "family".to_string(),
                None => String::new(),
            })
        })
    }

    pub fn contributions(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2", || Ok(r.input().adjustments.hsa_contributions))
    }

    pub fn coverage_limit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3", || {
            let cfg = &r.config().health_savings;
            Ok(match r.input().adjustments.hsa_coverage {
                Some(HsaCoverage::SelfOnly) => cfg.self_only_limit,
                Some(HsaCoverage::Family) => cfg.family_limit,
                None => 0.0,
            })
        })
    }

    /// Line 6. Archer MSA contributions (lines 4-5) are not modeled.
    pub fn limit_after_msa(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "6", || self.coverage_limit(r))
    }

    pub fn catch_up(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "7", || {
            let cfg = &r.config().health_savings;
            if r.input().adjustments.hsa_coverage.is_none() {
                return Ok(0.0);
            }
            let age = r.input().taxpayer.age_at_year_end(r.tax_year());
            Ok(if age.is_some_and(|a| a >= cfg.catch_up_age) { cfg.catch_up } else { 0.0 })
        })
    }

    pub fn total_limit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8", || Ok(self.limit_after_msa(r)? + self.catch_up(r)?))
    }

    pub fn employer_contributions(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "9", || Ok(r.input().adjustments.hsa_employer_contributions))
    }

    pub fn remaining_limit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || {
            Ok(clamp_floor_zero(self.total_limit(r)? - self.employer_contributions(r)?))
        })
    }

    /// Line 13, carried to Schedule 1 line 13.
    pub fn deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || Ok(self.contributions(r)?.min(self.remaining_limit(r)?)))
    }
}

const LINES: &[&str] = &["1", "2", "3", "6", "7", "8", "9", "12", "13"];

impl Lines for Form8889 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "1" => self.coverage(r)?.into_value(),
            "2" => self.contributions(r)?.into_value(),
            "3" => self.coverage_limit(r)?.into_value(),
            "6" => self.limit_after_msa(r)?.into_value(),
            "7" => self.catch_up(r)?.into_value(),
            "8" => self.total_limit(r)?.into_value(),
            "9" => self.employer_contributions(r)?.into_value(),
            "12" => self.remaining_limit(r)?.into_value(),
            "13" => self.deduction(r)?.into_value(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{FilingStatus, Person, ReturnInput};
    use crate::store::FormRegistry;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case(HsaCoverage::SelfOnly, None, 0.0, 4_150.0)]
    #[case(HsaCoverage::Family, None, 1_000.0, 7_300.0)]
    #[case(HsaCoverage::SelfOnly, NaiveDate::from_ymd_opt(1965, 1, 1), 0.0, 5_000.0)]
    fn test_deduction_limits(
        #[case] coverage: HsaCoverage,
        #[case] dob: Option<NaiveDate>,
        #[case] employer: f64,
        #[case] expected: f64,
    ) {
        let mut input = ReturnInput::new(2024, FilingStatus::Single);
        input.taxpayer = Person { date_of_birth: dob, ..Person::default() };
        input.adjustments.hsa_coverage = Some(coverage);
        input.adjustments.hsa_contributions = 10_000.0;
        input.adjustments.hsa_employer_contributions = employer;
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        assert_eq!(r.form::<Form8889>().deduction(&r).unwrap(), expected);
    }
}
