//! A synchronous, single-threaded, pull-based line evaluator.
//!
//! Lines are evaluated on demand, depth first. Each result is memoized in the
//! owning form's `Ledger`; a request for a line whose body is still on the
//! active call stack is a cycle and aborts the pass.

use crate::analysis::telemetry::PassStats;
use crate::compute::ledger::{ComputationError, Ledger, Slot};
use crate::compute::restricted::CycleBreak;
use crate::store::{LineId, LineValue};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use tracing::{trace, warn};

pub type Result<T> = std::result::Result<T, ComputationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalLimits {
    /// Deepest permitted chain of nested line requests.
    pub max_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

#[derive(Debug, Default)]
pub struct Evaluator {
    limits: EvalLimits,
    stack: RefCell<SmallVec<[LineId; 32]>>,
    fences: RefCell<SmallVec<[CycleBreak; 2]>>,
    // (consumer, dependency)
    edges: RefCell<BTreeSet<(LineId, LineId)>>,
    stats: Cell<PassStats>,
}

impl Evaluator {
    pub fn new(limits: EvalLimits) -> Self {
        Self { limits, ..Self::default() }
    }

    /// Resolves `id`, running `body` at most once per pass.
    pub fn evaluate<T: LineValue>(
        &self,
        id: LineId,
        ledger: &Ledger,
        body: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        if let Some(&caller) = self.stack.borrow().last() {
            self.edges.borrow_mut().insert((caller, id));
        }

        if let Some(fence) = self.fences.borrow().iter().find(|f| f.deduction == id) {
            warn!(restricted = %fence.restricted, deduction = %id, "restricted line reached its deduction");
            return Err(ComputationError::RestrictedDependency {
                restricted: fence.restricted,
                deduction: id,
            });
        }

        match ledger.slot(id.line) {
            Some(Slot::Ready(value)) => {
                self.bump(|s| s.cache_hits += 1);
                trace!(line = %id, "cache hit");
                return T::from_value(&value).ok_or(ComputationError::TypeMismatch {
                    line: id,
                    expected: T::KIND,
                    actual: value.kind(),
                });
            }
            Some(Slot::InProgress) => {
                let stack = self.stack.borrow();
                let start = stack.iter().position(|&l| l == id).unwrap_or(0);
                let mut path: Vec<LineId> = stack[start..].to_vec();
                path.push(id);
                warn!(line = %id, depth = stack.len(), "re-entrant line evaluation");
                return Err(ComputationError::CycleDetected { line: id, path });
            }
            None => {}
        }

        let depth = self.stack.borrow().len();
        if depth >= self.limits.max_depth {
            warn!(line = %id, depth, "evaluation depth guard tripped");
            return Err(ComputationError::DepthExceeded { line: id, depth });
        }

        ledger.begin(id.line);
        self.stack.borrow_mut().push(id);
        self.bump(|s| s.deepest_stack = s.deepest_stack.max(depth + 1));

        let result = body();
        self.stack.borrow_mut().pop();

        match result {
            Ok(v) => {
                let value = v.clone().into_value();
                trace!(line = %id, %value, "line evaluated");
                ledger.complete(id.line, value);
                self.bump(|s| s.lines_evaluated += 1);
                Ok(v)
            }
            Err(e) => {
                ledger.abandon(id.line);
                Err(e)
            }
        }
    }

    /// Runs `body` with the break's deduction fenced off.
    pub fn fenced<T>(&self, brk: CycleBreak, body: impl FnOnce() -> Result<T>) -> Result<T> {
        self.fences.borrow_mut().push(brk);
        let result = body();
        self.fences.borrow_mut().pop();
        result
    }

    pub fn edges(&self) -> Vec<(LineId, LineId)> {
        self.edges.borrow().iter().copied().collect()
    }

    pub fn stats(&self) -> PassStats {
        self.stats.get()
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    fn bump(&self, f: impl FnOnce(&mut PassStats)) {
        let mut s = self.stats.get();
        f(&mut s);
        self.stats.set(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FormTag, Value};

    const A: LineId = LineId::new(FormTag::F1040, "a");
    const B: LineId = LineId::new(FormTag::F1040, "b");

    #[test]
    fn test_memoizes_body() {
        let eval = Evaluator::default();
        let ledger = Ledger::new();
        let runs = Cell::new(0);
        let body = || {
            runs.set(runs.get() + 1);
            Ok(41.0 + 1.0)
        };
        assert_eq!(eval.evaluate(A, &ledger, body).unwrap(), 42.0);
        assert_eq!(eval.evaluate(A, &ledger, || Ok(0.0)).unwrap(), 42.0);
        assert_eq!(runs.get(), 1);
        assert_eq!(eval.stats().lines_evaluated, 1);
        assert_eq!(eval.stats().cache_hits, 1);
    }

    #[test]
    fn test_reentrant_request_is_a_cycle() {
        let eval = Evaluator::default();
        let ledger = Ledger::new();
        let err = eval
            .evaluate(A, &ledger, || {
                eval.evaluate(B, &ledger, || eval.evaluate::<f64>(A, &ledger, || Ok(1.0)))
            })
            .unwrap_err();
        assert_eq!(err, ComputationError::CycleDetected { line: A, path: vec![A, B, A] });
        // Failed lines are not left half-resolved.
        assert!(ledger.slot("a").is_none());
        assert!(ledger.slot("b").is_none());
        assert_eq!(eval.depth(), 0);
    }

    #[test]
    fn test_records_dependency_edges() {
        let eval = Evaluator::default();
        let ledger = Ledger::new();
        eval.evaluate(A, &ledger, || eval.evaluate(B, &ledger, || Ok(2.0)))
            .unwrap();
        assert_eq!(eval.edges(), vec![(A, B)]);
    }

    #[test]
    fn test_depth_guard() {
        let eval = Evaluator::new(EvalLimits { max_depth: 1 });
        let ledger = Ledger::new();
        let err = eval
            .evaluate(A, &ledger, || eval.evaluate(B, &ledger, || Ok(2.0)))
            .unwrap_err();
        assert!(matches!(err, ComputationError::DepthExceeded { line, depth: 1 } if line == B));
    }

    #[test]
    fn test_type_mismatch_on_cached_value() {
        let eval = Evaluator::default();
        let ledger = Ledger::new();
        ledger.complete("a", Value::Flag(true));
        let err = eval.evaluate::<f64>(A, &ledger, || Ok(0.0)).unwrap_err();
        assert!(matches!(err, ComputationError::TypeMismatch { expected: "amount", actual: "flag", .. }));
    }

    #[test]
    fn test_fence_blocks_deduction() {
        let brk = CycleBreak { name: "t", deduction: B, restricted: A, limited: A };
        let eval = Evaluator::default();
        let ledger = Ledger::new();
        let err = eval
            .evaluate(A, &ledger, || {
                eval.fenced(brk, || eval.evaluate(B, &ledger, || Ok(1.0)))
            })
            .unwrap_err();
        assert_eq!(err, ComputationError::RestrictedDependency { restricted: A, deduction: B });

        // Outside the fence the deduction is reachable again.
        assert_eq!(eval.evaluate(B, &ledger, || Ok(1.0)).unwrap(), 1.0);
    }
}
