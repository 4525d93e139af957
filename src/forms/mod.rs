//! Form nodes and the capability traits they are assembled from.
//!
//! A form is not a subclass of anything. It composes three capabilities:
//! - [`FormNode`]: identity, its memo ledger, and its parent link.
//! - [`Inclusion`]: whether it attaches to this return.
//! - [`Lines`]: its named lines and how they lay out as output fields.
//!
//! [`Form`] is the object-safe union the registry iterates over.

mod f1040;
mod form8889;
mod form8959;
mod form8960;
mod form8995;
mod form8995a;
mod schedule1;
mod schedule2;
mod schedule3;
mod schedule8812;
mod schedule_a;
mod schedule_b;
mod schedule_c;
mod schedule_d;
mod schedule_se;

pub use f1040::F1040;
pub use form8889::Form8889;
pub use form8959::Form8959;
pub use form8960::Form8960;
pub use form8995::Form8995;
pub use form8995a::Form8995A;
pub use schedule1::Schedule1;
pub use schedule2::Schedule2;
pub use schedule3::Schedule3;
pub use schedule8812::Schedule8812;
pub use schedule_a::ScheduleA;
pub use schedule_b::ScheduleB;
pub use schedule_c::ScheduleC;
pub use schedule_d::ScheduleD;
pub use schedule_se::ScheduleSe;

use crate::compute::{ComputationError, Ledger, Result};
use crate::output::fields::FieldLayout;
use crate::pass::TaxReturn;
use crate::store::{FormTag, Value};

pub trait FormNode: Sized {
    const TAG: FormTag;
    /// Attachment sequence; orders output only, never evaluation.
    const SEQUENCE: u32;
    /// The form this one attaches to. Only the root has none.
    const PARENT: Option<FormTag> = Some(FormTag::F1040);
    /// A placeholder with no wired data source; it never attaches.
    const PLACEHOLDER: bool = false;

    fn ledger(&self) -> &Ledger;

    /// The single shared instance of this form within a pass.
    fn select(forms: &Forms) -> &Self;
}

pub trait Inclusion {
    /// Side-effect free. May read any form's lines, never any form's
    /// inclusion status.
    fn is_needed(&self, r: &TaxReturn<'_>) -> Result<bool>;
}

pub trait Lines {
    fn line_names(&self) -> &'static [&'static str];

    /// Resolves a line by name.
    fn evaluate(&self, r: &TaxReturn<'_>, line: &str) -> Result<Value>;

    fn field_layout(&self, tax_year: u16) -> Option<FieldLayout>;
}

/// Object-safe view of a complete form.
pub trait Form: Inclusion + Lines {
    fn tag(&self) -> FormTag;
    fn sequence(&self) -> u32;
    fn parent(&self) -> Option<FormTag>;
    fn placeholder(&self) -> bool;
    fn memo(&self) -> &Ledger;
}

impl<T: FormNode + Inclusion + Lines> Form for T {
    fn tag(&self) -> FormTag { T::TAG }
    fn sequence(&self) -> u32 { T::SEQUENCE }
    fn parent(&self) -> Option<FormTag> { T::PARENT }
    fn placeholder(&self) -> bool { T::PLACEHOLDER }
    fn memo(&self) -> &Ledger { self.ledger() }
}

pub(crate) fn unknown_line(form: FormTag, line: &str) -> ComputationError {
    ComputationError::UnknownLine { form, line: line.to_string() }
}

/// Every form node of one pass. Nodes are created together, unconditionally;
/// attachment is decided afterwards.
#[derive(Debug, Default)]
pub struct Forms {
    pub(crate) f1040: F1040,
    pub(crate) schedule_1: Schedule1,
    pub(crate) schedule_2: Schedule2,
    pub(crate) schedule_3: Schedule3,
    pub(crate) schedule_a: ScheduleA,
    pub(crate) schedule_b: ScheduleB,
    pub(crate) schedule_c: ScheduleC,
    pub(crate) schedule_d: ScheduleD,
    pub(crate) schedule_se: ScheduleSe,
    pub(crate) schedule_8812: Schedule8812,
    pub(crate) form_8889: Form8889,
    pub(crate) form_8995: Form8995,
    pub(crate) form_8995a: Form8995A,
    pub(crate) form_8959: Form8959,
    pub(crate) form_8960: Form8960,
}

impl Forms {
    pub fn new() -> Self { Self::default() }

    /// The catalog in registration order.
    pub fn catalog(&self) -> [&dyn Form; 15] {
        [
            &self.f1040,
            &self.schedule_1,
            &self.schedule_2,
            &self.schedule_3,
            &self.schedule_a,
            &self.schedule_b,
            &self.schedule_c,
            &self.schedule_d,
            &self.schedule_se,
            &self.schedule_8812,
            &self.form_8889,
            &self.form_8995,
            &self.form_8995a,
            &self.form_8959,
            &self.form_8960,
        ]
    }

    pub fn by_tag(&self, tag: FormTag) -> &dyn Form {
        match tag {
            FormTag::F1040 => &self.f1040,
            FormTag::Schedule1 => &self.schedule_1,
            FormTag::Schedule2 => &self.schedule_2,
            FormTag::Schedule3 => &self.schedule_3,
            FormTag::ScheduleA => &self.schedule_a,
            FormTag::ScheduleB => &self.schedule_b,
            FormTag::ScheduleC => &self.schedule_c,
            FormTag::ScheduleD => &self.schedule_d,
            FormTag::ScheduleSe => &self.schedule_se,
            FormTag::Schedule8812 => &self.schedule_8812,
            FormTag::Form8889 => &self.form_8889,
            FormTag::Form8995 => &self.form_8995,
            FormTag::Form8995A => &self.form_8995a,
            FormTag::Form8959 => &self.form_8959,
            FormTag::Form8960 => &self.form_8960,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_tags_are_unique_and_addressable() {
        let forms = Forms::new();
        let tags: Vec<FormTag> = forms.catalog().iter().map(|f| f.tag()).collect();
        let unique: HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
        for tag in tags {
            assert_eq!(forms.by_tag(tag).tag(), tag);
        }
    }

    #[test]
    fn test_only_the_root_has_no_parent() {
        let forms = Forms::new();
        let roots: Vec<FormTag> = forms
            .catalog()
            .iter()
            .filter(|f| f.parent().is_none())
            .map(|f| f.tag())
            .collect();
        assert_eq!(roots, vec![FormTag::F1040]);
    }
}
