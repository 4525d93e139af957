//! One computation pass over one return.
//!
//! `TaxReturn` is the root every form reaches its siblings through. It owns
//! the form nodes and the evaluator for exactly one pass; dropping it drops
//! every memoized value.

use crate::analysis::telemetry::PassStats;
use crate::compute::{ComputationError, CycleBreak, EvalLimits, Evaluator, Result};
use crate::config::YearConfig;
use crate::forms::{Form, FormNode, Forms};
use crate::input::{FilingStatus, ReturnInput};
use crate::output::fields::{self, Field};
use crate::output::summary::{self, ReturnSummary};
use crate::store::registry;
use crate::store::{FormTag, IncludedForm, LineId, LineValue, Value};
use std::cell::OnceCell;
use tracing::debug;

pub struct TaxReturn<'a> {
    input: &'a ReturnInput,
    config: &'a YearConfig,
    forms: Forms,
    evaluator: Evaluator,
    included: OnceCell<Vec<IncludedForm>>,
}

impl<'a> TaxReturn<'a> {
    pub(crate) fn new(input: &'a ReturnInput, config: &'a YearConfig, limits: EvalLimits) -> Self {
        debug!(tax_year = input.tax_year, status = ?input.filing_status, "pass started");
        Self {
            input,
            config,
            forms: Forms::new(),
            evaluator: Evaluator::new(limits),
            included: OnceCell::new(),
        }
    }

    pub fn input(&self) -> &'a ReturnInput { self.input }

    pub fn config(&self) -> &'a YearConfig { self.config }

    pub fn tax_year(&self) -> u16 { self.input.tax_year }

    pub fn filing_status(&self) -> FilingStatus { self.input.filing_status }

    // --- Attachment linkage ---

    /// The shared instance of `T`, attached or not. Safe to use from
    /// inclusion predicates: it exposes data, not inclusion status.
    pub fn form<T: FormNode>(&self) -> &T {
        T::select(&self.forms)
    }

    /// The shared instance of `T` if it is attached to this return.
    pub fn attached<T: FormNode>(&self) -> Result<Option<&T>> {
        Ok(self.is_attached(T::TAG)?.then(|| self.form::<T>()))
    }

    pub fn is_attached(&self, tag: FormTag) -> Result<bool> {
        let included = self
            .included
            .get()
            .ok_or(ComputationError::InclusionNotSettled { form: tag })?;
        Ok(included.iter().any(|f| f.tag == tag))
    }

    pub fn forms(&self) -> impl Iterator<Item = &dyn Form> + '_ {
        self.forms.catalog().into_iter()
    }

    pub fn form_by_tag(&self, tag: FormTag) -> &dyn Form {
        self.forms.by_tag(tag)
    }

    // --- Line evaluation ---

    /// Memoized evaluation of one of `form`'s lines.
    pub fn line<F: FormNode, T: LineValue>(
        &self,
        form: &F,
        line: &'static str,
        body: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        self.evaluator.evaluate(LineId::new(F::TAG, line), form.ledger(), body)
    }

    /// Memoized evaluation of the restricted side of a cycle break. The
    /// break's deduction is unreachable while `body` runs.
    pub fn restricted_line<F: FormNode>(
        &self,
        form: &F,
        brk: CycleBreak,
        body: impl FnOnce() -> Result<f64>,
    ) -> Result<f64> {
        if brk.restricted.form != F::TAG {
            return Err(ComputationError::UnknownLine {
                form: F::TAG,
                line: brk.restricted.line.to_string(),
            });
        }
        self.evaluator.evaluate(brk.restricted, form.ledger(), || {
            self.evaluator.fenced(brk, body)
        })
    }

    /// Resolves any line by address.
    pub fn value(&self, id: LineId) -> Result<Value> {
        self.form_by_tag(id.form).evaluate(self, id.line)
    }

    /// The memoized value of a line, without evaluating it.
    pub fn cached(&self, id: LineId) -> Option<Value> {
        self.form_by_tag(id.form).memo().get(id.line)
    }

    // --- Registry & output ---

    /// Decides inclusion once for the whole pass. Later calls return the
    /// settled set.
    pub fn attach(&self) -> Result<&[IncludedForm]> {
        if self.included.get().is_none() {
            let selected = registry::select_forms(self)?;
            let _ = self.included.set(selected);
        }
        self.included()
    }

    pub fn included(&self) -> Result<&[IncludedForm]> {
        self.included
            .get()
            .map(Vec::as_slice)
            .ok_or(ComputationError::InclusionNotSettled { form: FormTag::F1040 })
    }

    /// The ordered field list of an attached form.
    pub fn fields(&self, tag: FormTag) -> Result<Vec<Field>> {
        if !self.is_attached(tag)? {
            return Err(ComputationError::NotAttached { form: tag });
        }
        fields::serialize_fields(self.form_by_tag(tag), self)
    }

    pub fn summary(&self) -> Result<ReturnSummary> {
        summary::summarize(self)
    }

    pub fn dependency_edges(&self) -> Vec<(LineId, LineId)> {
        self.evaluator.edges()
    }

    pub fn stats(&self) -> PassStats {
        self.evaluator.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxConfig;
    use crate::forms::{ScheduleC, F1040};
    use crate::input::Business;

    fn input() -> ReturnInput {
        let mut input = ReturnInput::new(2024, FilingStatus::Single);
        input.businesses.push(Business {
            name: "Studio".into(),
            gross_receipts: 30_000.0,
            expenses: 10_000.0,
            ..Business::default()
        });
        input
    }

    #[test]
    fn test_sibling_lookup_returns_shared_instance() {
        let cfg = TaxConfig::builtin();
        let input = input();
        let r = TaxReturn::new(&input, cfg.year(2024).unwrap(), EvalLimits::default());

        let a: *const ScheduleC = r.form::<ScheduleC>();
        let b: *const ScheduleC = r.form::<ScheduleC>();
        assert_eq!(a, b);

        let first = r.form::<ScheduleC>().net_profit(&r).unwrap();
        let runs_before = r.stats().lines_evaluated;
        let again = r.value(LineId::new(FormTag::ScheduleC, "31")).unwrap();
        assert_eq!(again, Value::Amount(first));
        assert_eq!(r.stats().lines_evaluated, runs_before);
    }

    #[test]
    fn test_attached_requires_settled_inclusion() {
        let cfg = TaxConfig::builtin();
        let input = input();
        let r = TaxReturn::new(&input, cfg.year(2024).unwrap(), EvalLimits::default());

        let err = r.attached::<ScheduleC>().unwrap_err();
        assert_eq!(err, ComputationError::InclusionNotSettled { form: FormTag::ScheduleC });

        r.attach().unwrap();
        assert!(r.attached::<ScheduleC>().unwrap().is_some());
        assert!(r.attached::<F1040>().unwrap().is_some());
    }

    #[test]
    fn test_fields_of_unattached_form_is_an_error() {
        let cfg = TaxConfig::builtin();
        let input = input();
        let r = TaxReturn::new(&input, cfg.year(2024).unwrap(), EvalLimits::default());
        r.attach().unwrap();
        let err = r.fields(FormTag::Schedule8812).unwrap_err();
        assert_eq!(err, ComputationError::NotAttached { form: FormTag::Schedule8812 });
    }

    #[test]
    fn test_restricted_line_must_belong_to_form() {
        let cfg = TaxConfig::builtin();
        let input = input();
        let r = TaxReturn::new(&input, cfg.year(2024).unwrap(), EvalLimits::default());
        let err = r
            .restricted_line(r.form::<ScheduleC>(), crate::compute::restricted::QBI_DEDUCTION, || Ok(0.0))
            .unwrap_err();
        assert!(matches!(err, ComputationError::UnknownLine { form: FormTag::ScheduleC, .. }));
    }
}
