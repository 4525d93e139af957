use crate::compute::kernel::ratio_or_zero;
use crate::pass::TaxReturn;
use crate::store::FormTag;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters kept by the evaluator over one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Line bodies actually run. With memoization this never exceeds the
    /// number of distinct lines.
    pub lines_evaluated: usize,
    /// Requests answered from a ledger without running the body.
    pub cache_hits: usize,
    /// Deepest evaluation stack reached.
    pub deepest_stack: usize,
}

impl PassStats {
    /// Share of line requests served from the memo ledgers.
    pub fn hit_rate(&self) -> f64 {
        ratio_or_zero(self.cache_hits as f64, (self.cache_hits + self.lines_evaluated) as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub stats: PassStats,
    /// Resolved lines per form. Forms with nothing resolved are omitted.
    pub resolved_by_form: BTreeMap<FormTag, usize>,
    pub dependency_edges: usize,
    /// Edges whose consumer and dependency sit on different forms.
    pub cross_form_edges: usize,
}

impl PassReport {
    pub fn analyze(r: &TaxReturn<'_>) -> Self {
        let resolved_by_form = r
            .forms()
            .map(|f| (f.tag(), f.memo().resolved()))
            .filter(|&(_, n)| n > 0)
            .collect();

        let edges = r.dependency_edges();
        let cross_form_edges = edges.iter().filter(|(from, to)| from.form != to.form).count();

        Self {
            stats: r.stats(),
            resolved_by_form,
            dependency_edges: edges.len(),
            cross_form_edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::F1040;
    use crate::input::{FilingStatus, ReturnInput, W2};
    use crate::store::FormRegistry;

    #[test]
    fn test_report_after_summary() {
        let mut input = ReturnInput::new(2024, FilingStatus::Single);
        input.w2s.push(W2 { wages: 50_000.0, ..W2::default() });
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        r.attach().unwrap();
        r.form::<F1040>().total_tax(&r).unwrap();

        let report = PassReport::analyze(&r);
        assert_eq!(report.stats, r.stats());
        assert!(report.resolved_by_form[&FormTag::F1040] > 0);
        assert!(report.cross_form_edges > 0);
        assert!(report.cross_form_edges <= report.dependency_edges);
        let resolved: usize = report.resolved_by_form.values().sum();
        assert_eq!(resolved, report.stats.lines_evaluated);
    }

    #[test]
    fn test_hit_rate() {
        let stats = PassStats { lines_evaluated: 3, cache_hits: 1, deepest_stack: 2 };
        assert_eq!(stats.hit_rate(), 0.25);
        assert_eq!(PassStats::default().hit_rate(), 0.0);
    }
}
