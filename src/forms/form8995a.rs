//! Form 8995-A, the full qualified business income computation.
//!
//! Registered so the catalog and its sequence are complete, but it has no
//! wired data source: it never attaches and exposes no lines. Returns above
//! the Form 8995 threshold get no deduction.

use super::{unknown_line, FormNode, Forms, Inclusion, Lines};
use crate::compute::{Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, Value};

#[derive(Debug, Default)]
pub struct Form8995A {
    ledger: Ledger,
}

impl FormNode for Form8995A {
    const TAG: FormTag = FormTag::Form8995A;
    const SEQUENCE: u32 = 55;
    const PLACEHOLDER: bool = true;

    fn ledger(&self) -> &Ledger { &self.ledger }
    fn select(forms: &Forms) -> &Self { &forms.form_8995a }
}

impl Inclusion for Form8995A {
    fn is_needed(&self, _r: &TaxReturn<'_>) -> Result<bool> {
        Ok(false)
    }
}

impl Lines for Form8995A {
    fn line_names(&self) -> &'static [&'static str] { &[] }

    fn evaluate(&self, _r: &TaxReturn<'_>, line: &str) -> Result<Value> {
        Err(unknown_line(Self::TAG, line))
    }

    fn field_layout(&self, _tax_year: u16) -> Option<FieldLayout> {
        None
    }
}
