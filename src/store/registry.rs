//! The form registry: the universe of form types, inclusion, and output order.

use crate::compute::{ComputationError, Result};
use crate::config::TaxConfig;
use crate::forms::Forms;
use crate::input::ReturnInput;
use crate::output::fields;
use crate::output::summary::ComputedReturn;
use crate::pass::TaxReturn;
use crate::store::{FormTag, IncludedForm};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    config: TaxConfig,
}

impl FormRegistry {
    pub fn new(config: TaxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaxConfig { &self.config }

    /// Every known form as `(tag, sequence)`, in registration order.
    pub fn catalog() -> Vec<(FormTag, u32)> {
        Forms::new().catalog().iter().map(|f| (f.tag(), f.sequence())).collect()
    }

    /// Instantiates every form node for `input`'s tax year. Inclusion is not
    /// decided yet; see [`TaxReturn::attach`].
    pub fn prepare<'a>(&'a self, input: &'a ReturnInput) -> Result<TaxReturn<'a>> {
        let year = self.config.year(input.tax_year)?;
        Ok(TaxReturn::new(input, year, self.config.limits))
    }

    /// Runs a full pass: inclusion, every attached form's fields, summary.
    pub fn compute(&self, input: &ReturnInput) -> Result<ComputedReturn> {
        let r = self.prepare(input)?;
        let out = ComputedReturn::collect(&r)?;
        info!(
            tax_year = out.tax_year,
            forms = out.forms.len(),
            lines = out.stats.lines_evaluated,
            "return computed"
        );
        Ok(out)
    }

    /// Checks every form's field layout for every configured year.
    /// Placeholders carry no layout and are skipped.
    pub fn verify_layouts(&self) -> std::result::Result<(), Vec<ComputationError>> {
        let forms = Forms::new();
        let errors: Vec<ComputationError> = self
            .config
            .supported_years()
            .flat_map(|year| {
                forms
                    .catalog()
                    .into_iter()
                    .filter(|f| !f.placeholder())
                    .filter_map(move |f| fields::checked_layout(f, year).err())
                    .collect::<Vec<_>>()
            })
            .collect();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Evaluates every form's predicate once and orders the survivors by
/// `(sequence, tag)`.
///
/// Predicates read other forms' data but never their inclusion, so the
/// result does not depend on the order predicates run in.
pub(crate) fn select_forms(r: &TaxReturn<'_>) -> Result<Vec<IncludedForm>> {
    let mut included = Vec::new();
    for form in r.forms() {
        let needed = !form.placeholder() && form.is_needed(r)?;
        debug!(form = %form.tag(), needed, "inclusion decided");
        if needed {
            included.push(IncludedForm {
                tag: form.tag(),
                sequence: form.sequence(),
                parent: form.parent(),
            });
        }
    }
    included.sort_by_key(|f| (f.sequence, f.tag));
    Ok(included)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{FilingStatus, W2};

    fn wage_input() -> ReturnInput {
        let mut input = ReturnInput::new(2023, FilingStatus::Single);
        input.w2s.push(W2 { wages: 50_000.0, federal_withholding: 5_000.0, ..W2::default() });
        input
    }

    #[test]
    fn test_catalog_sequences() {
        let catalog = FormRegistry::catalog();
        assert_eq!(catalog.len(), 15);
        assert_eq!(catalog[0], (FormTag::F1040, 0));
        assert!(catalog.contains(&(FormTag::ScheduleSe, 17)));
    }

    #[test]
    fn test_unsupported_year() {
        let registry = FormRegistry::default();
        let input = ReturnInput::new(1999, FilingStatus::Single);
        assert_eq!(registry.prepare(&input).err(), Some(ComputationError::UnsupportedYear(1999)));
    }

    #[test]
    fn test_root_always_included_and_order_is_by_sequence() {
        let registry = FormRegistry::default();
        let input = wage_input();
        let r = registry.prepare(&input).unwrap();
        let included = r.attach().unwrap();
        assert_eq!(included[0].tag, FormTag::F1040);
        assert!(included.windows(2).all(|w| w[0].sequence <= w[1].sequence));
    }

    #[test]
    fn test_selection_is_repeatable() {
        let registry = FormRegistry::default();
        let input = wage_input();
        let first = registry.prepare(&input).unwrap().attach().unwrap().to_vec();
        let second = registry.prepare(&input).unwrap().attach().unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_attach_is_idempotent_within_a_pass() {
        let registry = FormRegistry::default();
        let input = wage_input();
        let r = registry.prepare(&input).unwrap();
        let first = r.attach().unwrap().to_vec();
        let evaluated = r.stats().lines_evaluated;
        assert_eq!(r.attach().unwrap(), first.as_slice());
        assert_eq!(r.stats().lines_evaluated, evaluated);
    }

    #[test]
    fn test_shipped_layouts_are_consistent() {
        assert_eq!(FormRegistry::default().verify_layouts(), Ok(()));
    }
}
