//! Cross-form summary values and the assembled output of a pass.

use crate::analysis::telemetry::PassStats;
use crate::compute::kernel::round_half_up;
use crate::compute::Result;
use crate::forms::F1040;
use crate::output::fields::Field;
use crate::pass::TaxReturn;
use crate::store::{FormTag, IncludedForm};
use serde::Serialize;

/// Whole-unit headline figures for the return-summary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReturnSummary {
    pub total_income: i64,
    pub adjusted_gross_income: i64,
    pub taxable_income: i64,
    pub total_tax: i64,
    pub total_withholding: i64,
    pub total_payments: i64,
    pub refund: i64,
    pub amount_owed: i64,
}

pub(crate) fn summarize(r: &TaxReturn<'_>) -> Result<ReturnSummary> {
    let f = r.form::<F1040>();
    let whole = |v: f64| round_half_up(v) as i64;
    Ok(ReturnSummary {
        total_income: whole(f.total_income(r)?),
        adjusted_gross_income: whole(f.adjusted_gross_income(r)?),
        taxable_income: whole(f.taxable_income(r)?),
        total_tax: whole(f.total_tax(r)?),
        total_withholding: whole(f.total_withholding(r)?),
        total_payments: whole(f.total_payments(r)?),
        refund: whole(f.overpaid(r)?),
        amount_owed: whole(f.amount_owed(r)?),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormOutput {
    pub tag: FormTag,
    pub sequence: u32,
    pub fields: Vec<Field>,
}

/// Everything a pass hands to downstream collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedReturn {
    pub tax_year: u16,
    pub forms: Vec<FormOutput>,
    pub summary: ReturnSummary,
    pub stats: PassStats,
}

impl ComputedReturn {
    pub(crate) fn collect(r: &TaxReturn<'_>) -> Result<Self> {
        let included: Vec<IncludedForm> = r.attach()?.to_vec();
        let forms = included
            .iter()
            .map(|f| {
                Ok(FormOutput { tag: f.tag, sequence: f.sequence, fields: r.fields(f.tag)? })
            })
            .collect::<Result<Vec<_>>>()?;
        let summary = r.summary()?;
        Ok(Self { tax_year: r.tax_year(), forms, summary, stats: r.stats() })
    }

    pub fn form(&self, tag: FormTag) -> Option<&FormOutput> {
        self.forms.iter().find(|f| f.tag == tag)
    }

    pub fn included_tags(&self) -> Vec<FormTag> {
        self.forms.iter().map(|f| f.tag).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
