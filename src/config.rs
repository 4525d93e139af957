//! Versioned per-year constants.
//!
//! Every bracket, threshold and rate a line body needs lives here, keyed by
//! tax year. Line bodies read `r.config()`; a new tax year is a new
//! `YearConfig`, never an edit to a form.

use crate::compute::engine::EvalLimits;
use crate::compute::ledger::ComputationError;
use crate::input::FilingStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One value per filing status. Qualifying surviving spouses use the joint
/// figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByStatus<T> {
    pub single: T,
    pub married_joint: T,
    pub married_separate: T,
    pub head_of_household: T,
}

impl<T> ByStatus<T> {
    pub fn get(&self, status: FilingStatus) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedFilingJointly | FilingStatus::QualifyingSurvivingSpouse => {
                &self.married_joint
            }
            FilingStatus::MarriedFilingSeparately => &self.married_separate,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
        }
    }
}

impl<T: Clone> ByStatus<T> {
    fn uniform(value: T) -> Self {
        Self {
            single: value.clone(),
            married_joint: value.clone(),
            married_separate: value.clone(),
            head_of_household: value,
        }
    }
}

/// A marginal rate applying to income above `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub floor: f64,
    pub rate: f64,
}

fn brackets(floors: [f64; 6]) -> Vec<Bracket> {
    let rates = [0.10, 0.12, 0.22, 0.24, 0.32, 0.35, 0.37];
    std::iter::once(0.0)
        .chain(floors)
        .zip(rates)
        .map(|(floor, rate)| Bracket { floor, rate })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsBreakpoints {
    pub zero_rate_top: f64,
    pub fifteen_rate_top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardDeduction {
    pub base: ByStatus<f64>,
    /// Added per age-65 or blindness condition, unmarried filers.
    pub additional_unmarried: f64,
    /// Added per condition per spouse, married filers.
    pub additional_married: f64,
    pub senior_age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfEmployment {
    pub earnings_factor: f64,
    pub social_security_rate: f64,
    pub medicare_rate: f64,
    pub minimum_earnings: f64,
    pub deductible_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payroll {
    pub social_security_wage_base: f64,
    pub employee_social_security_rate: f64,
    pub employee_medicare_rate: f64,
    pub additional_medicare_rate: f64,
    pub additional_medicare_threshold: ByStatus<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentIncomeTax {
    pub rate: f64,
    pub threshold: ByStatus<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifiedBusinessIncome {
    pub rate: f64,
    /// Above this taxable income the simplified computation does not apply.
    pub threshold: ByStatus<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentLoanInterest {
    pub max_deduction: f64,
    pub phase_out_start: ByStatus<f64>,
    pub phase_out_range: ByStatus<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildTaxCredit {
    pub per_child: f64,
    pub per_other_dependent: f64,
    pub child_age_limit: u32,
    pub phase_out_threshold: ByStatus<f64>,
    pub phase_out_rate: f64,
    pub phase_out_step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSavings {
    pub self_only_limit: f64,
    pub family_limit: f64,
    pub catch_up: f64,
    pub catch_up_age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemized {
    pub salt_cap: ByStatus<f64>,
    pub medical_agi_floor: f64,
    pub cash_charity_agi_limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearConfig {
    pub tax_year: u16,
    pub brackets: ByStatus<Vec<Bracket>>,
    pub capital_gains: ByStatus<CapitalGainsBreakpoints>,
    pub standard_deduction: StandardDeduction,
    pub self_employment: SelfEmployment,
    pub payroll: Payroll,
    pub investment_income_tax: InvestmentIncomeTax,
    pub qualified_business_income: QualifiedBusinessIncome,
    pub student_loan_interest: StudentLoanInterest,
    pub child_tax_credit: ChildTaxCredit,
    pub health_savings: HealthSavings,
    pub itemized: Itemized,
    pub capital_loss_limit: ByStatus<f64>,
    pub educator_expense_limit: f64,
    pub interest_dividend_schedule_threshold: f64,
    /// Foreign tax credit claimable without Form 1116.
    pub foreign_tax_credit_direct_limit: ByStatus<f64>,
}

impl YearConfig {
    /// Maximum employee Social Security tax for a single person.
    pub fn max_social_security_tax(&self) -> f64 {
        self.payroll.social_security_wage_base * self.payroll.employee_social_security_rate
    }
}

/// The full configuration handed to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    pub years: BTreeMap<u16, YearConfig>,
    #[serde(default)]
    pub limits: EvalLimits,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TaxConfig {
    /// Tables for every tax year shipped with the crate.
    pub fn builtin() -> Self {
        let years = [year_2023(), year_2024()]
            .into_iter()
            .map(|y| (y.tax_year, y))
            .collect();
        Self { years, limits: EvalLimits::default() }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn year(&self, tax_year: u16) -> Result<&YearConfig, ComputationError> {
        self.years.get(&tax_year).ok_or(ComputationError::UnsupportedYear(tax_year))
    }

    pub fn supported_years(&self) -> impl Iterator<Item = u16> + '_ {
        self.years.keys().copied()
    }

    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }
}

fn year_2023() -> YearConfig {
    YearConfig {
        tax_year: 2023,
        brackets: ByStatus {
            single: brackets([11_000.0, 44_725.0, 95_375.0, 182_100.0, 231_250.0, 578_125.0]),
            married_joint: brackets([22_000.0, 89_450.0, 190_750.0, 364_200.0, 462_500.0, 693_750.0]),
            married_separate: brackets([11_000.0, 44_725.0, 95_375.0, 182_100.0, 231_250.0, 346_875.0]),
            head_of_household: brackets([15_700.0, 59_850.0, 95_350.0, 182_100.0, 231_250.0, 578_100.0]),
        },
        capital_gains: ByStatus {
            single: CapitalGainsBreakpoints { zero_rate_top: 44_625.0, fifteen_rate_top: 492_300.0 },
            married_joint: CapitalGainsBreakpoints { zero_rate_top: 89_250.0, fifteen_rate_top: 553_850.0 },
            married_separate: CapitalGainsBreakpoints { zero_rate_top: 44_625.0, fifteen_rate_top: 276_900.0 },
            head_of_household: CapitalGainsBreakpoints { zero_rate_top: 59_750.0, fifteen_rate_top: 523_050.0 },
        },
        standard_deduction: StandardDeduction {
            base: ByStatus {
                single: 13_850.0,
                married_joint: 27_700.0,
                married_separate: 13_850.0,
                head_of_household: 20_800.0,
            },
            additional_unmarried: 1_850.0,
            additional_married: 1_500.0,
            senior_age: 65,
        },
        self_employment: self_employment(),
        payroll: Payroll {
            social_security_wage_base: 160_200.0,
            employee_social_security_rate: 0.062,
            employee_medicare_rate: 0.0145,
            additional_medicare_rate: 0.009,
            additional_medicare_threshold: high_income_thresholds(),
        },
        investment_income_tax: InvestmentIncomeTax { rate: 0.038, threshold: high_income_thresholds() },
        qualified_business_income: QualifiedBusinessIncome {
            rate: 0.20,
            threshold: ByStatus {
                single: 182_100.0,
                married_joint: 364_200.0,
                married_separate: 182_100.0,
                head_of_household: 182_100.0,
            },
        },
        student_loan_interest: StudentLoanInterest {
            max_deduction: 2_500.0,
            phase_out_start: ByStatus {
                single: 75_000.0,
                married_joint: 155_000.0,
                married_separate: 0.0,
                head_of_household: 75_000.0,
            },
            phase_out_range: ByStatus {
                single: 15_000.0,
                married_joint: 30_000.0,
                married_separate: 0.0,
                head_of_household: 15_000.0,
            },
        },
        child_tax_credit: child_tax_credit(),
        health_savings: HealthSavings {
            self_only_limit: 3_850.0,
            family_limit: 7_750.0,
            catch_up: 1_000.0,
            catch_up_age: 55,
        },
        itemized: itemized(),
        capital_loss_limit: capital_loss_limit(),
        educator_expense_limit: 300.0,
        interest_dividend_schedule_threshold: 1_500.0,
        foreign_tax_credit_direct_limit: foreign_tax_credit_direct_limit(),
    }
}

fn year_2024() -> YearConfig {
    YearConfig {
        tax_year: 2024,
        brackets: ByStatus {
            single: brackets([11_600.0, 47_150.0, 100_525.0, 191_950.0, 243_725.0, 609_350.0]),
            married_joint: brackets([23_200.0, 94_300.0, 201_050.0, 383_900.0, 487_450.0, 731_200.0]),
            married_separate: brackets([11_600.0, 47_150.0, 100_525.0, 191_950.0, 243_725.0, 365_600.0]),
            head_of_household: brackets([16_550.0, 63_100.0, 100_500.0, 191_950.0, 243_700.0, 609_350.0]),
        },
        capital_gains: ByStatus {
            single: CapitalGainsBreakpoints { zero_rate_top: 47_025.0, fifteen_rate_top: 518_900.0 },
            married_joint: CapitalGainsBreakpoints { zero_rate_top: 94_050.0, fifteen_rate_top: 583_750.0 },
            married_separate: CapitalGainsBreakpoints { zero_rate_top: 47_025.0, fifteen_rate_top: 291_850.0 },
            head_of_household: CapitalGainsBreakpoints { zero_rate_top: 63_000.0, fifteen_rate_top: 551_350.0 },
        },
        standard_deduction: StandardDeduction {
            base: ByStatus {
                single: 14_600.0,
                married_joint: 29_200.0,
                married_separate: 14_600.0,
                head_of_household: 21_900.0,
            },
            additional_unmarried: 1_950.0,
            additional_married: 1_550.0,
            senior_age: 65,
        },
        self_employment: self_employment(),
        payroll: Payroll {
            social_security_wage_base: 168_600.0,
            employee_social_security_rate: 0.062,
            employee_medicare_rate: 0.0145,
            additional_medicare_rate: 0.009,
            additional_medicare_threshold: high_income_thresholds(),
        },
        investment_income_tax: InvestmentIncomeTax { rate: 0.038, threshold: high_income_thresholds() },
        qualified_business_income: QualifiedBusinessIncome {
            rate: 0.20,
            threshold: ByStatus {
                single: 191_950.0,
                married_joint: 383_900.0,
                married_separate: 191_950.0,
                head_of_household: 191_950.0,
            },
        },
        student_loan_interest: StudentLoanInterest {
            max_deduction: 2_500.0,
            phase_out_start: ByStatus {
                single: 80_000.0,
                married_joint: 165_000.0,
                married_separate: 0.0,
                head_of_household: 80_000.0,
            },
            phase_out_range: ByStatus {
                single: 15_000.0,
                married_joint: 30_000.0,
                married_separate: 0.0,
                head_of_household: 15_000.0,
            },
        },
        child_tax_credit: child_tax_credit(),
        health_savings: HealthSavings {
            self_only_limit: 4_150.0,
            family_limit: 8_300.0,
            catch_up: 1_000.0,
            catch_up_age: 55,
        },
        itemized: itemized(),
        capital_loss_limit: capital_loss_limit(),
        educator_expense_limit: 300.0,
        interest_dividend_schedule_threshold: 1_500.0,
        foreign_tax_credit_direct_limit: foreign_tax_credit_direct_limit(),
    }
}

// Statutory figures that are not indexed for inflation.

fn self_employment() -> SelfEmployment {
    SelfEmployment {
        earnings_factor: 0.9235,
        social_security_rate: 0.124,
        medicare_rate: 0.029,
        minimum_earnings: 400.0,
        deductible_share: 0.5,
    }
}

fn high_income_thresholds() -> ByStatus<f64> {
    ByStatus {
        single: 200_000.0,
        married_joint: 250_000.0,
        married_separate: 125_000.0,
        head_of_household: 200_000.0,
    }
}

fn child_tax_credit() -> ChildTaxCredit {
    ChildTaxCredit {
        per_child: 2_000.0,
        per_other_dependent: 500.0,
        child_age_limit: 17,
        phase_out_threshold: ByStatus {
            single: 200_000.0,
            married_joint: 400_000.0,
            married_separate: 200_000.0,
            head_of_household: 200_000.0,
        },
        phase_out_rate: 0.05,
        phase_out_step: 1_000.0,
    }
}

fn itemized() -> Itemized {
    Itemized {
        salt_cap: ByStatus { married_separate: 5_000.0, ..ByStatus::uniform(10_000.0) },
        medical_agi_floor: 0.075,
        cash_charity_agi_limit: 0.60,
    }
}

fn capital_loss_limit() -> ByStatus<f64> {
    ByStatus { married_separate: 1_500.0, ..ByStatus::uniform(3_000.0) }
}

fn foreign_tax_credit_direct_limit() -> ByStatus<f64> {
    ByStatus { married_joint: 600.0, ..ByStatus::uniform(300.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_years() {
        let cfg = TaxConfig::builtin();
        assert_eq!(cfg.supported_years().collect::<Vec<_>>(), vec![2023, 2024]);
        assert_eq!(cfg.year(2022).unwrap_err(), ComputationError::UnsupportedYear(2022));
    }

    #[test]
    fn test_brackets_are_ascending() {
        let cfg = TaxConfig::builtin();
        for year in cfg.years.values() {
            for status in [
                FilingStatus::Single,
                FilingStatus::MarriedFilingJointly,
                FilingStatus::MarriedFilingSeparately,
                FilingStatus::HeadOfHousehold,
            ] {
                let b = year.brackets.get(status);
                assert_eq!(b.len(), 7);
                assert!(b.windows(2).all(|w| w[0].floor < w[1].floor && w[0].rate < w[1].rate));
            }
        }
    }

    #[test]
    fn test_surviving_spouse_uses_joint_figures() {
        let cfg = TaxConfig::builtin();
        let y = cfg.year(2024).unwrap();
        assert_eq!(
            y.standard_deduction.base.get(FilingStatus::QualifyingSurvivingSpouse),
            &29_200.0
        );
    }

    #[test]
    fn test_json_round_trip_preserves_overrides() {
        let mut cfg = TaxConfig::builtin();
        cfg.limits.max_depth = 64;
        let json = serde_json::to_string(&cfg).unwrap();
        let back = TaxConfig::from_json(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
