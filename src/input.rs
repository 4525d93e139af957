//! The taxpayer's structured source data for one tax year.
//!
//! Shape is guaranteed by the upstream validation collaborator; this crate
//! only defaults what is absent. Every collection and amount is optional in
//! the serialized form.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read return input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed return input: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
    QualifyingSurvivingSpouse,
}

impl FilingStatus {
    pub fn is_married(&self) -> bool {
        matches!(self, FilingStatus::MarriedFilingJointly | FilingStatus::MarriedFilingSeparately)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    #[default]
    Taxpayer,
    Spouse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub ssn: String,
    pub date_of_birth: Option<NaiveDate>,
    pub blind: bool,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Whole years of age on December 31 of `tax_year`.
    pub fn age_at_year_end(&self, tax_year: u16) -> Option<u32> {
        age_at_year_end(self.date_of_birth, tax_year)
    }
}

pub(crate) fn age_at_year_end(dob: Option<NaiveDate>, tax_year: u16) -> Option<u32> {
    let dob = dob?;
    let years = i32::from(tax_year) - dob.year();
    u32::try_from(years).ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependent {
    pub first_name: String,
    pub last_name: String,
    pub ssn: String,
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct W2 {
    pub employer: String,
    pub owner: Owner,
    pub wages: f64,
    pub federal_withholding: f64,
    pub social_security_wages: f64,
    pub social_security_withheld: f64,
    pub medicare_wages: f64,
    pub medicare_withheld: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Int {
    pub payer: String,
    pub interest: f64,
    pub us_savings_bond_interest: f64,
    pub tax_exempt_interest: f64,
    pub federal_withholding: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Div {
    pub payer: String,
    pub ordinary_dividends: f64,
    pub qualified_dividends: f64,
    pub capital_gain_distributions: f64,
    pub foreign_tax_paid: f64,
    pub federal_withholding: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapitalTransaction {
    pub description: String,
    pub proceeds: f64,
    pub cost_basis: f64,
    pub long_term: bool,
}

impl CapitalTransaction {
    pub fn gain(&self) -> f64 {
        self.proceeds - self.cost_basis
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Business {
    pub name: String,
    pub owner: Owner,
    pub gross_receipts: f64,
    pub returns_and_allowances: f64,
    pub cost_of_goods_sold: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HsaCoverage {
    SelfOnly,
    Family,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub educator_expenses: f64,
    pub student_loan_interest: f64,
    pub hsa_contributions: f64,
    pub hsa_employer_contributions: f64,
    pub hsa_coverage: Option<HsaCoverage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemizedInput {
    pub medical_expenses: f64,
    pub state_local_income_taxes: f64,
    pub real_estate_taxes: f64,
    pub mortgage_interest: f64,
    pub charitable_cash: f64,
    pub charitable_noncash: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Elections {
    pub force_itemize: bool,
    /// Interest in or authority over a foreign financial account.
    pub foreign_financial_accounts: bool,
}

/// Amounts carried in from the prior year's return, entered as positive
/// numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Carryforwards {
    pub short_term_capital_loss: f64,
    pub long_term_capital_loss: f64,
    pub qualified_business_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedPayment {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherIncome {
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnInput {
    pub tax_year: u16,
    pub filing_status: FilingStatus,
    pub taxpayer: Person,
    pub spouse: Option<Person>,
    pub dependents: Vec<Dependent>,
    pub w2s: Vec<W2>,
    pub interest: Vec<Form1099Int>,
    pub dividends: Vec<Form1099Div>,
    pub capital_transactions: Vec<CapitalTransaction>,
    pub businesses: Vec<Business>,
    pub other_income: Vec<OtherIncome>,
    pub adjustments: Adjustments,
    pub itemized: ItemizedInput,
    pub elections: Elections,
    pub carryforwards: Carryforwards,
    pub estimated_payments: Vec<EstimatedPayment>,
}

impl ReturnInput {
    pub fn new(tax_year: u16, filing_status: FilingStatus) -> Self {
        Self { tax_year, filing_status, ..Self::default() }
    }

    pub fn from_json(json: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The people whose own conditions count toward this return: the
    /// taxpayer, and the spouse on a joint return.
    pub fn filers(&self) -> impl Iterator<Item = &Person> {
        let spouse = match self.filing_status {
            FilingStatus::MarriedFilingJointly => self.spouse.as_ref(),
            _ => None,
        };
        std::iter::once(&self.taxpayer).chain(spouse)
    }

    pub fn w2s_of(&self, owner: Owner) -> impl Iterator<Item = &W2> {
        self.w2s.iter().filter(move |w| w.owner == owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_sections_default() {
        let input = ReturnInput::from_json(r#"{"tax_year": 2024}"#).unwrap();
        assert_eq!(input.filing_status, FilingStatus::Single);
        assert!(input.w2s.is_empty());
        assert_eq!(input.adjustments.student_loan_interest, 0.0);
        assert!(input.spouse.is_none());
    }

    #[test]
    fn test_partial_documents_default_missing_boxes() {
        let json = r#"{
            "tax_year": 2023,
            "filing_status": "married_filing_jointly",
            "w2s": [{"employer": "Acme", "wages": 50000, "owner": "spouse"}]
        }"#;
        let input = ReturnInput::from_json(json).unwrap();
        assert_eq!(input.w2s[0].wages, 50_000.0);
        assert_eq!(input.w2s[0].federal_withholding, 0.0);
        assert_eq!(input.w2s_of(Owner::Spouse).count(), 1);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tax_year": 2024, "taxpayer": {{"first_name": "Ada"}}}}"#).unwrap();
        let input = ReturnInput::from_path(file.path()).unwrap();
        assert_eq!(input.taxpayer.first_name, "Ada");
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let err = ReturnInput::from_json(r#"{"tax_year": "soon"}"#).unwrap_err();
        assert!(matches!(err, InputError::Json(_)));
    }

    #[test]
    fn test_age_at_year_end() {
        let p = Person {
            date_of_birth: NaiveDate::from_ymd_opt(1958, 12, 31),
            ..Person::default()
        };
        assert_eq!(p.age_at_year_end(2023), Some(65));
        assert_eq!(Person::default().age_at_year_end(2023), None);
    }

    #[test]
    fn test_spouse_only_files_on_joint_return() {
        let mut input = ReturnInput::new(2024, FilingStatus::MarriedFilingSeparately);
        input.spouse = Some(Person::default());
        assert_eq!(input.filers().count(), 1);
        input.filing_status = FilingStatus::MarriedFilingJointly;
        assert_eq!(input.filers().count(), 2);
    }
}
