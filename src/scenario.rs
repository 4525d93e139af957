//! What-if batches: independent returns computed in parallel.
//!
//! A `TaxReturn` holds interior-mutable caches and never crosses threads.
//! Each scenario gets its own pass; workers share only the registry.

use crate::compute::Result;
use crate::input::ReturnInput;
use crate::output::summary::{ComputedReturn, ReturnSummary};
use crate::store::FormRegistry;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub input: ReturnInput,
}

impl Scenario {
    pub fn new(name: impl Into<String>, input: ReturnInput) -> Self {
        Self { name: name.into(), input }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: Result<ComputedReturn>,
}

impl ScenarioOutcome {
    pub fn summary(&self) -> Option<&ReturnSummary> {
        self.result.as_ref().ok().map(|r| &r.summary)
    }
}

/// Computes every scenario. Outcomes come back in input order; one
/// scenario failing does not affect the others.
pub fn run_scenarios(registry: &FormRegistry, scenarios: &[Scenario]) -> Vec<ScenarioOutcome> {
    info!(count = scenarios.len(), "running scenarios");
    scenarios
        .par_iter()
        .map(|s| {
            let result = registry.compute(&s.input);
            debug!(scenario = %s.name, ok = result.is_ok(), "scenario finished");
            ScenarioOutcome { name: s.name.clone(), result }
        })
        .collect()
}

/// Summary deltas of each outcome against a baseline summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SummaryDelta {
    pub adjusted_gross_income: i64,
    pub taxable_income: i64,
    pub total_tax: i64,
    pub refund: i64,
    pub amount_owed: i64,
}

impl SummaryDelta {
    pub fn between(baseline: &ReturnSummary, other: &ReturnSummary) -> Self {
        Self {
            adjusted_gross_income: other.adjusted_gross_income - baseline.adjusted_gross_income,
            taxable_income: other.taxable_income - baseline.taxable_income,
            total_tax: other.total_tax - baseline.total_tax,
            refund: other.refund - baseline.refund,
            amount_owed: other.amount_owed - baseline.amount_owed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::ComputationError;
    use crate::input::{FilingStatus, W2};

    fn wages(amount: f64) -> ReturnInput {
        let mut input = ReturnInput::new(2024, FilingStatus::Single);
        input.w2s.push(W2 { wages: amount, federal_withholding: amount * 0.1, ..W2::default() });
        input
    }

    #[test]
    fn test_parallel_matches_sequential_and_keeps_order() {
        let registry = FormRegistry::default();
        let scenarios: Vec<Scenario> = (1..=8)
            .map(|i| Scenario::new(format!("wages-{i}"), wages(i as f64 * 15_000.0)))
            .collect();

        let outcomes = run_scenarios(&registry, &scenarios);
        assert_eq!(outcomes.len(), scenarios.len());
        for (outcome, scenario) in outcomes.iter().zip(&scenarios) {
            assert_eq!(outcome.name, scenario.name);
            assert_eq!(outcome.result, registry.compute(&scenario.input));
        }
    }

    #[test]
    fn test_failure_is_isolated() {
        let registry = FormRegistry::default();
        let scenarios = vec![
            Scenario::new("ok", wages(40_000.0)),
            Scenario::new("bad-year", ReturnInput::new(1990, FilingStatus::Single)),
        ];
        let outcomes = run_scenarios(&registry, &scenarios);
        assert!(outcomes[0].summary().is_some());
        assert_eq!(outcomes[1].result, Err(ComputationError::UnsupportedYear(1990)));
    }

    #[test]
    fn test_delta_against_baseline() {
        let registry = FormRegistry::default();
        let outcomes = run_scenarios(
            &registry,
            &[Scenario::new("base", wages(50_000.0)), Scenario::new("raise", wages(60_000.0))],
        );
        let base = outcomes[0].summary().unwrap();
        let raise = outcomes[1].summary().unwrap();
        let delta = SummaryDelta::between(base, raise);
        assert_eq!(delta.adjusted_gross_income, 10_000);
        assert!(delta.total_tax > 0);
    }
}
