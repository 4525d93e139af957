//! Form 1040, the root of every return.

use super::{
    unknown_line, Form8959, Form8995, FormNode, Forms, Inclusion, Lines, Schedule1, Schedule2,
    Schedule3, Schedule8812, ScheduleA, ScheduleB, ScheduleD,
};
use crate::compute::kernel::{bracket_tax, clamp_floor_zero, preferential_rate_tax, sum, sum_defined};
use crate::compute::restricted::QBI_DEDUCTION;
use crate::compute::{Ledger, Result};
use crate::input::{age_at_year_end, FilingStatus};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, LineValue, Value};
use chrono::NaiveDate;

#[derive(Debug, Default)]
pub struct F1040 {
    ledger: Ledger,
}

impl FormNode for F1040 {
    const TAG: FormTag = FormTag::F1040;
    const SEQUENCE: u32 = 0;
    const PARENT: Option<FormTag> = None;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.f1040 }
}

impl Inclusion for F1040 {
    fn is_needed(&self, _r: &TaxReturn<'_>) -> Result<bool> {
        Ok(true)
    }
}

impl F1040 {
    // --- Header ---

    pub fn first_name(&self, r: &TaxReturn<'_>) -> Result<String> {
        r.line(self, "first_name", || Ok(r.input().taxpayer.first_name.clone()))
    }

    pub fn last_name(&self, r: &TaxReturn<'_>) -> Result<String> {
        r.line(self, "last_name", || Ok(r.input().taxpayer.last_name.clone()))
    }

    pub fn ssn(&self, r: &TaxReturn<'_>) -> Result<String> {
        r.line(self, "ssn", || Ok(r.input().taxpayer.ssn.clone()))
    }

    /// Blank unless filing jointly or separately from a named spouse.
    pub fn spouse_name(&self, r: &TaxReturn<'_>) -> Result<String> {
        r.line(self, "spouse_name", || {
            Ok(match (&r.input().spouse, r.filing_status().is_married()) {
                (Some(s), true) => s.full_name(),
                _ => String::new(),
            })
        })
    }

    pub fn spouse_ssn(&self, r: &TaxReturn<'_>) -> Result<String> {
        r.line(self, "spouse_ssn", || {
            Ok(match (&r.input().spouse, r.filing_status().is_married()) {
                (Some(s), true) => s.ssn.clone(),
                _ => String::new(),
            })
        })
    }

    fn status_flag(&self, r: &TaxReturn<'_>, line: &'static str, status: FilingStatus) -> Result<bool> {
        r.line(self, line, || Ok(r.filing_status() == status))
    }

    pub fn taxpayer_birth_date(&self, r: &TaxReturn<'_>) -> Result<Option<NaiveDate>> {
        r.line(self, "taxpayer_dob", || Ok(r.input().taxpayer.date_of_birth))
    }

    pub fn taxpayer_senior(&self, r: &TaxReturn<'_>) -> Result<bool> {
        r.line(self, "taxpayer_senior", || {
            let dob = self.taxpayer_birth_date(r)?;
            let age = age_at_year_end(dob, r.tax_year());
            Ok(age.is_some_and(|a| a >= r.config().standard_deduction.senior_age))
        })
    }

    pub fn taxpayer_blind(&self, r: &TaxReturn<'_>) -> Result<bool> {
        r.line(self, "taxpayer_blind", || Ok(r.input().taxpayer.blind))
    }

    /// Spouse conditions only count on a joint return.
    pub fn spouse_senior(&self, r: &TaxReturn<'_>) -> Result<bool> {
        r.line(self, "spouse_senior", || {
            let senior_age = r.config().standard_deduction.senior_age;
            Ok(r.input().filers().skip(1).any(|s| {
                s.age_at_year_end(r.tax_year()).is_some_and(|a| a >= senior_age)
            }))
        })
    }

    pub fn spouse_blind(&self, r: &TaxReturn<'_>) -> Result<bool> {
        r.line(self, "spouse_blind", || Ok(r.input().filers().skip(1).any(|s| s.blind)))
    }

    // --- Income ---

    /// Line 1a: wages from every W-2.
    pub fn w2_wages(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1a", || Ok(sum(r.input().w2s.iter().map(|w| w.wages))))
    }

    /// Line 1z. Only W-2 wages are modeled among lines 1a-1h.
    pub fn wages(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "1z", || self.w2_wages(r))
    }

    pub fn tax_exempt_interest(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2a", || Ok(sum(r.input().interest.iter().map(|i| i.tax_exempt_interest))))
    }

    pub fn taxable_interest(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "2b", || r.form::<ScheduleB>().total_interest(r))
    }

    pub fn qualified_dividends(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3a", || Ok(sum(r.input().dividends.iter().map(|d| d.qualified_dividends))))
    }

    pub fn ordinary_dividends(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "3b", || r.form::<ScheduleB>().total_dividends(r))
    }

    pub fn capital_gain(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "7", || r.form::<ScheduleD>().amount_for_1040(r))
    }

    pub fn additional_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "8", || r.form::<Schedule1>().additional_income(r))
    }

    /// Line 9.
    pub fn total_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "9", || {
            Ok(self.wages(r)?
                + self.taxable_interest(r)?
                + self.ordinary_dividends(r)?
                + self.capital_gain(r)?
                + self.additional_income(r)?)
        })
    }

    pub fn adjustments(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "10", || r.form::<Schedule1>().total_adjustments(r))
    }

    /// Line 11.
    pub fn adjusted_gross_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "11", || Ok(self.total_income(r)? - self.adjustments(r)?))
    }

    // --- Deductions & taxable income ---

    pub fn standard_deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "standard_deduction", || {
            let cfg = &r.config().standard_deduction;
            let status = r.filing_status();
            let conditions = [
                self.taxpayer_senior(r)?,
                self.taxpayer_blind(r)?,
                self.spouse_senior(r)?,
                self.spouse_blind(r)?,
            ]
            .iter()
            .filter(|c| **c)
            .count() as f64;
            let per_condition = if status.is_married() || status == FilingStatus::QualifyingSurvivingSpouse {
                cfg.additional_married
            } else {
                cfg.additional_unmarried
            };
            Ok(cfg.base.get(status) + conditions * per_condition)
        })
    }

    /// Line 12: the larger of itemized and standard, unless itemizing was elected.
    pub fn deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "12", || {
            let schedule_a = r.form::<ScheduleA>();
            if schedule_a.itemizes(r)? {
                schedule_a.total_itemized(r)
            } else {
                self.standard_deduction(r)
            }
        })
    }

    pub fn qbi_deduction(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "13", || r.form::<Form8995>().deduction(r))
    }

    /// Taxable income before the qualified business income deduction. Form
    /// 8995 limits its deduction with this figure, so it must not reach line 13.
    pub fn taxable_income_before_qbi(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.restricted_line(self, QBI_DEDUCTION, || {
            Ok(clamp_floor_zero(self.adjusted_gross_income(r)? - self.deduction(r)?))
        })
    }

    pub fn total_deductions(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "14", || Ok(self.deduction(r)? + self.qbi_deduction(r)?))
    }

    /// Line 15.
    pub fn taxable_income(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "15", || {
            Ok(clamp_floor_zero(self.adjusted_gross_income(r)? - self.total_deductions(r)?))
        })
    }

    // --- Tax & credits ---

    /// Line 16. Qualified dividends and net capital gain get preferential rates.
    pub fn tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "16", || {
            let status = r.filing_status();
            let brackets = r.config().brackets.get(status);
            let taxable = self.taxable_income(r)?;
            let preferential =
                self.qualified_dividends(r)? + r.form::<ScheduleD>().net_capital_gain(r)?;
            if preferential > 0.0 {
                let cg = r.config().capital_gains.get(status);
                Ok(preferential_rate_tax(
                    taxable,
                    preferential,
                    brackets,
                    cg.zero_rate_top,
                    cg.fifteen_rate_top,
                ))
            } else {
                Ok(bracket_tax(taxable, brackets))
            }
        })
    }

    /// Line 18. Line 17 (Schedule 2, Part I) is not modeled.
    pub fn tax_before_credits(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "18", || self.tax(r))
    }

    pub fn child_credit(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "19", || r.form::<Schedule8812>().credit(r))
    }

    pub fn other_nonrefundable_credits(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "20", || {
            Ok(sum_defined(&[attached_amount(r, |s3: &Schedule3| s3.nonrefundable_credits(r))?]))
        })
    }

    pub fn total_credits(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "21", || Ok(self.child_credit(r)? + self.other_nonrefundable_credits(r)?))
    }

    pub fn tax_after_credits(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "22", || {
            Ok(clamp_floor_zero(self.tax_before_credits(r)? - self.total_credits(r)?))
        })
    }

    pub fn other_taxes(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "23", || r.form::<Schedule2>().other_taxes(r))
    }

    /// Line 24.
    pub fn total_tax(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "24", || Ok(self.tax_after_credits(r)? + self.other_taxes(r)?))
    }

    // --- Payments ---

    pub fn w2_withholding(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "25a", || Ok(sum(r.input().w2s.iter().map(|w| w.federal_withholding))))
    }

    pub fn form_1099_withholding(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "25b", || {
            let input = r.input();
            Ok(sum(input.interest.iter().map(|i| i.federal_withholding))
                + sum(input.dividends.iter().map(|d| d.federal_withholding)))
        })
    }

    /// Line 25c. Additional Medicare Tax withheld is claimed only by filing 8959.
    pub fn other_withholding(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "25c", || {
            Ok(sum_defined(&[attached_amount(r, |f: &Form8959| f.additional_withholding(r))?]))
        })
    }

    /// Line 25d.
    pub fn total_withholding(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "25d", || {
            Ok(self.w2_withholding(r)? + self.form_1099_withholding(r)? + self.other_withholding(r)?)
        })
    }

    pub fn estimated_payments(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "26", || Ok(sum(r.input().estimated_payments.iter().map(|p| p.amount))))
    }

    pub fn schedule_3_payments(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "31", || {
            Ok(sum_defined(&[attached_amount(r, |s3: &Schedule3| s3.other_payments(r))?]))
        })
    }

    /// Line 32. Earned income and education credits are not modeled.
    pub fn refundable_credits(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "32", || self.schedule_3_payments(r))
    }

    /// Line 33.
    pub fn total_payments(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "33", || {
            Ok(self.total_withholding(r)? + self.estimated_payments(r)? + self.refundable_credits(r)?)
        })
    }

    /// Line 34.
    pub fn overpaid(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "34", || Ok(clamp_floor_zero(self.total_payments(r)? - self.total_tax(r)?)))
    }

    /// Line 37.
    pub fn amount_owed(&self, r: &TaxReturn<'_>) -> Result<f64> {
        r.line(self, "37", || Ok(clamp_floor_zero(self.total_tax(r)? - self.total_payments(r)?)))
    }
}

/// An amount carried from `T`, defined only when `T` is attached.
fn attached_amount<T: FormNode>(
    r: &TaxReturn<'_>,
    amount: impl FnOnce(&T) -> Result<f64>,
) -> Result<Option<f64>> {
    r.attached::<T>()?.map(amount).transpose()
}

const LINES: &[&str] = &[
    "first_name", "last_name", "ssn", "spouse_name", "spouse_ssn",
    "single", "married_joint", "married_separate", "head_of_household", "surviving_spouse",
    "taxpayer_dob", "taxpayer_senior", "taxpayer_blind", "spouse_senior", "spouse_blind",
    "1a", "1z", "2a", "2b", "3a", "3b", "7", "8", "9", "10", "11",
    "standard_deduction", "12", "13", "taxable_income_before_qbi", "14", "15",
    "16", "18", "19", "20", "21", "22", "23", "24",
    "25a", "25b", "25c", "25d", "26", "31", "32", "33", "34", "37",
];

const FIELDS: &[&str] = &[
    "first_name", "last_name", "ssn", "spouse_name", "spouse_ssn",
    "single", "married_joint", "married_separate", "head_of_household", "surviving_spouse",
    "taxpayer_senior", "taxpayer_blind", "spouse_senior", "spouse_blind",
    "1a", "1z", "2a", "2b", "3a", "3b", "7", "8", "9", "10", "11",
    "12", "13", "14", "15", "16", "18", "19", "20", "21", "22", "23", "24",
    "25a", "25b", "25c", "25d", "26", "31", "32", "33", "34", "37",
];

impl Lines for F1040 {
    fn line_names(&self) -> &'static [&'static str] { LINES }

    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Ok(match line {
            "first_name" => self.first_name(r)?.into_value(),
            "last_name" => self.last_name(r)?.into_value(),
            "ssn" => self.ssn(r)?.into_value(),
            "spouse_name" => self.spouse_name(r)?.into_value(),
            "spouse_ssn" => self.spouse_ssn(r)?.into_value(),
            "single" => self.status_flag(r, "single", FilingStatus::Single)?.into_value(),
            "married_joint" => self
                .status_flag(r, "married_joint", FilingStatus::MarriedFilingJointly)?
                .into_value(),
            "married_separate" => self
                .status_flag(r, "married_separate", FilingStatus::MarriedFilingSeparately)?
                .into_value(),
            "head_of_household" => self
                .status_flag(r, "head_of_household", FilingStatus::HeadOfHousehold)?
                .into_value(),
            "surviving_spouse" => self
                .status_flag(r, "surviving_spouse", FilingStatus::QualifyingSurvivingSpouse)?
                .into_value(),
            "taxpayer_dob" => self.taxpayer_birth_date(r)?.into_value(),
            "taxpayer_senior" => self.taxpayer_senior(r)?.into_value(),
            "taxpayer_blind" => self.taxpayer_blind(r)?.into_value(),
            "spouse_senior" => self.spouse_senior(r)?.into_value(),
            "spouse_blind" => self.spouse_blind(r)?.into_value(),
            "1a" => self.w2_wages(r)?.into_value(),
            "1z" => self.wages(r)?.into_value(),
            "2a" => self.tax_exempt_interest(r)?.into_value(),
            "2b" => self.taxable_interest(r)?.into_value(),
            "3a" => self.qualified_dividends(r)?.into_value(),
            "3b" => self.ordinary_dividends(r)?.into_value(),
            "7" => self.capital_gain(r)?.into_value(),
            "8" => self.additional_income(r)?.into_value(),
            "9" => self.total_income(r)?.into_value(),
            "10" => self.adjustments(r)?.into_value(),
            "11" => self.adjusted_gross_income(r)?.into_value(),
            "standard_deduction" => self.standard_deduction(r)?.into_value(),
            "12" => self.deduction(r)?.into_value(),
            "13" => self.qbi_deduction(r)?.into_value(),
            "taxable_income_before_qbi" => self.taxable_income_before_qbi(r)?.into_value(),
            "14" => self.total_deductions(r)?.into_value(),
            "15" => self.taxable_income(r)?.into_value(),
            "16" => self.tax(r)?.into_value(),
            "18" => self.tax_before_credits(r)?.into_value(),
            "19" => self.child_credit(r)?.into_value(),
            "20" => self.other_nonrefundable_credits(r)?.into_value(),
            "21" => self.total_credits(r)?.into_value(),
            "22" => self.tax_after_credits(r)?.into_value(),
            "23" => self.other_taxes(r)?.into_value(),
            "24" => self.total_tax(r)?.into_value(),
            "25a" => self.w2_withholding(r)?.into_value(),
            "25b" => self.form_1099_withholding(r)?.into_value(),
            "25c" => self.other_withholding(r)?.into_value(),
            "25d" => self.total_withholding(r)?.into_value(),
            "26" => self.estimated_payments(r)?.into_value(),
            "31" => self.schedule_3_payments(r)?.into_value(),
            "32" => self.refundable_credits(r)?.into_value(),
            "33" => self.total_payments(r)?.into_value(),
            "34" => self.overpaid(r)?.into_value(),
            "37" => self.amount_owed(r)?.into_value(),
            _ => return Err(unknown_line(Self::TAG, line)),
        })
    }

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout> {
        match tax_year {
            2023 | 2024 => Some(FieldLayout::new(FIELDS, 47)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxConfig;
    use crate::input::{Person, ReturnInput, W2};
    use crate::store::FormRegistry;

    #[test]
    fn test_standard_deduction_counts_conditions() {
        let registry = FormRegistry::new(TaxConfig::builtin());
        let mut input = ReturnInput::new(2024, FilingStatus::MarriedFilingJointly);
        input.taxpayer = Person {
            date_of_birth: NaiveDate::from_ymd_opt(1955, 3, 1),
            ..Person::default()
        };
        input.spouse = Some(Person { blind: true, ..Person::default() });
        let r = registry.prepare(&input).unwrap();
        let f = r.form::<F1040>();
        assert!(f.taxpayer_senior(&r).unwrap());
        assert!(f.spouse_blind(&r).unwrap());
        assert_eq!(f.standard_deduction(&r).unwrap(), 29_200.0 + 2.0 * 1_550.0);
    }

    #[test]
    fn test_spouse_conditions_ignored_when_filing_separately() {
        let registry = FormRegistry::new(TaxConfig::builtin());
        let mut input = ReturnInput::new(2023, FilingStatus::MarriedFilingSeparately);
        input.spouse = Some(Person { blind: true, first_name: "Sam".into(), ..Person::default() });
        let r = registry.prepare(&input).unwrap();
        let f = r.form::<F1040>();
        assert!(!f.spouse_blind(&r).unwrap());
        assert_eq!(f.spouse_name(&r).unwrap(), "Sam");
        assert_eq!(f.standard_deduction(&r).unwrap(), 13_850.0);
    }

    #[test]
    fn test_schedule_3_amounts_count_only_when_attached() {
        let registry = FormRegistry::new(TaxConfig::builtin());
        let w2 = |ss: f64| W2 {
            wages: 120_000.0,
            social_security_wages: 120_000.0,
            social_security_withheld: ss,
            ..W2::default()
        };

        let mut one_employer = ReturnInput::new(2024, FilingStatus::Single);
        one_employer.w2s.push(w2(7_440.0));
        let r = registry.prepare(&one_employer).unwrap();
        r.attach().unwrap();
        assert!(!r.is_attached(FormTag::Schedule3).unwrap());
        assert_eq!(r.form::<F1040>().schedule_3_payments(&r).unwrap(), 0.0);
        assert_eq!(r.form::<F1040>().other_nonrefundable_credits(&r).unwrap(), 0.0);

        let mut two_employers = one_employer.clone();
        two_employers.w2s.push(w2(7_440.0));
        let r = registry.prepare(&two_employers).unwrap();
        r.attach().unwrap();
        assert!(r.is_attached(FormTag::Schedule3).unwrap());
        let excess = r.form::<Schedule3>().other_payments(&r).unwrap();
        assert!(excess > 0.0);
        assert_eq!(r.form::<F1040>().schedule_3_payments(&r).unwrap(), excess);
    }

    #[test]
    fn test_attached_amount_before_inclusion_is_an_error() {
        let registry = FormRegistry::new(TaxConfig::builtin());
        let input = ReturnInput::new(2024, FilingStatus::Single);
        let r = registry.prepare(&input).unwrap();
        let err = r.form::<F1040>().other_withholding(&r).unwrap_err();
        assert!(matches!(err, crate::compute::ComputationError::InclusionNotSettled { .. }));
    }

    #[test]
    fn test_unknown_line() {
        let registry = FormRegistry::new(TaxConfig::builtin());
        let input = ReturnInput::new(2023, FilingStatus::Single);
        let r = registry.prepare(&input).unwrap();
        let err = r.form::<F1040>().evaluate(&r, "99").unwrap_err();
        assert_eq!(err, unknown_line(FormTag::F1040, "99"));
    }
}
