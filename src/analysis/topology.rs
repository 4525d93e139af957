//! Static checks over the line dependency graph.
//!
//! Dependencies are discovered by evaluation: a pass records an edge each
//! time one line body requests another. [`catalog_graph`] runs passes over
//! sample returns, evaluates every line of every form, and merges what they
//! recorded into one petgraph graph.

use crate::compute::{ComputationError, CycleBreak, Result};
use crate::input::{
    Business, CapitalTransaction, Dependent, FilingStatus, Form1099Div, Form1099Int, HsaCoverage,
    OtherIncome, Person, ReturnInput, W2,
};
use crate::store::{FormRegistry, LineId};
use chrono::NaiveDate;
use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use tracing::{info, warn};

/// Edges run from a dependency to its consumer, so a topological order is
/// an evaluation order.
pub type LineGraph = DiGraphMap<LineId, ()>;

/// Builds a graph from `(consumer, dependency)` pairs as recorded by a pass.
pub fn build_graph(edges: &[(LineId, LineId)]) -> LineGraph {
    let mut graph = LineGraph::new();
    for &(consumer, dependency) in edges {
        graph.add_edge(dependency, consumer, ());
    }
    graph
}

/// Every strongly connected component that forms a cycle.
pub fn find_cycles(graph: &LineGraph) -> Vec<Vec<LineId>> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .collect()
}

/// Dependencies first.
pub fn evaluation_order(graph: &LineGraph) -> Result<Vec<LineId>> {
    toposort(graph, None).map_err(|cycle| {
        let line = cycle.node_id();
        let mut path = find_cycles(graph)
            .into_iter()
            .find(|scc| scc.contains(&line))
            .unwrap_or_default();
        path.push(line);
        ComputationError::CycleDetected { line, path }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreakViolation {
    /// Neither side of the break appears in the graph.
    NotExercised(&'static str),
    /// The restricted line depends on the deduction it exists to exclude.
    RestrictedReachesDeduction(&'static str),
    /// The deduction does not read its restricted line.
    DeductionIgnoresRestricted(&'static str),
    /// The limited line never consumes the deduction.
    LimitedBypassesDeduction(&'static str),
}

/// Checks each declared break against the graph.
pub fn verify_cycle_breaks(graph: &LineGraph, breaks: &[CycleBreak]) -> Vec<BreakViolation> {
    let mut violations = Vec::new();
    for brk in breaks {
        if !graph.contains_node(brk.deduction) || !graph.contains_node(brk.restricted) {
            violations.push(BreakViolation::NotExercised(brk.name));
            continue;
        }
        if has_path_connecting(graph, brk.deduction, brk.restricted, None) {
            violations.push(BreakViolation::RestrictedReachesDeduction(brk.name));
        }
        if !has_path_connecting(graph, brk.restricted, brk.deduction, None) {
            violations.push(BreakViolation::DeductionIgnoresRestricted(brk.name));
        }
        if !graph.contains_node(brk.limited)
            || !has_path_connecting(graph, brk.deduction, brk.limited, None)
        {
            violations.push(BreakViolation::LimitedBypassesDeduction(brk.name));
        }
    }
    violations
}

/// Evaluates every line of every form for each sample and merges the
/// recorded dependencies. Every catalog line appears as a node, even if
/// nothing consumes it.
pub fn catalog_graph(registry: &FormRegistry, samples: &[ReturnInput]) -> Result<LineGraph> {
    let mut graph = LineGraph::new();
    for input in samples {
        let r = registry.prepare(input)?;
        r.attach()?;
        for form in r.forms() {
            for &line in form.line_names() {
                graph.add_node(LineId::new(form.tag(), line));
                form.evaluate(&r, line)?;
            }
        }
        for (consumer, dependency) in r.dependency_edges() {
            graph.add_edge(dependency, consumer, ());
        }
    }
    Ok(graph)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogReport {
    pub lines: usize,
    pub edges: usize,
    pub cycles: Vec<Vec<LineId>>,
    pub violations: Vec<BreakViolation>,
}

impl CatalogReport {
    pub fn is_sound(&self) -> bool {
        self.cycles.is_empty() && self.violations.is_empty()
    }
}

/// Builds the catalog graph over [`sample_returns`] and checks it.
pub fn analyze_catalog(
    registry: &FormRegistry,
    tax_year: u16,
    breaks: &[CycleBreak],
) -> Result<CatalogReport> {
    let graph = catalog_graph(registry, &sample_returns(tax_year))?;
    let report = CatalogReport {
        lines: graph.node_count(),
        edges: graph.edge_count(),
        cycles: find_cycles(&graph),
        violations: verify_cycle_breaks(&graph, breaks),
    };
    if report.is_sound() {
        info!(tax_year, lines = report.lines, edges = report.edges, "catalog graph is acyclic");
    } else {
        warn!(
            tax_year,
            cycles = report.cycles.len(),
            violations = report.violations.len(),
            "catalog graph failed verification"
        );
    }
    Ok(report)
}

/// Returns that between them attach every wired form and take both sides of
/// the main branches (itemized vs. standard, gain vs. loss).
pub fn sample_returns(tax_year: u16) -> Vec<ReturnInput> {
    let dob = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);

    let mut busy = ReturnInput::new(tax_year, FilingStatus::Single);
    busy.taxpayer = Person {
        first_name: "Robin".into(),
        last_name: "Vale".into(),
        ssn: "000-00-0001".into(),
        date_of_birth: dob(1958, 4, 2),
        blind: false,
    };
    busy.dependents.push(Dependent {
        first_name: "Ash".into(),
        relationship: "child".into(),
        date_of_birth: dob(tax_year as i32 - 8, 9, 1),
        ..Dependent::default()
    });
    for employer in ["North Mill", "Harbor Works"] {
        busy.w2s.push(W2 {
            employer: employer.into(),
            wages: 130_000.0,
            federal_withholding: 24_000.0,
            social_security_wages: 130_000.0,
            social_security_withheld: 8_060.0,
            medicare_wages: 130_000.0,
            medicare_withheld: 1_885.0,
            ..W2::default()
        });
    }
    busy.interest.push(Form1099Int {
        payer: "Credit Union".into(),
        interest: 2_400.0,
        tax_exempt_interest: 300.0,
        ..Form1099Int::default()
    });
    busy.dividends.push(Form1099Div {
        payer: "Index Fund".into(),
        ordinary_dividends: 4_000.0,
        qualified_dividends: 3_000.0,
        capital_gain_distributions: 600.0,
        foreign_tax_paid: 120.0,
        ..Form1099Div::default()
    });
    busy.capital_transactions = vec![
        CapitalTransaction { description: "ETF".into(), proceeds: 12_000.0, cost_basis: 7_000.0, long_term: true },
        CapitalTransaction { description: "Options".into(), proceeds: 1_000.0, cost_basis: 2_500.0, long_term: false },
    ];
    busy.businesses.push(Business {
        name: "Vale Consulting".into(),
        gross_receipts: 45_000.0,
        expenses: 9_000.0,
        ..Business::default()
    });
    busy.other_income.push(OtherIncome { description: "Jury duty".into(), amount: 400.0 });
    busy.adjustments.educator_expenses = 250.0;
    busy.adjustments.student_loan_interest = 1_800.0;
    busy.adjustments.hsa_contributions = 3_000.0;
    busy.adjustments.hsa_coverage = Some(HsaCoverage::SelfOnly);
    busy.itemized.state_local_income_taxes = 14_000.0;
    busy.itemized.mortgage_interest = 16_000.0;
    busy.itemized.charitable_cash = 2_000.0;
    busy.elections.foreign_financial_accounts = true;
    busy.carryforwards.qualified_business_loss = 1_000.0;

    let mut modest = ReturnInput::new(tax_year, FilingStatus::MarriedFilingJointly);
    modest.spouse = Some(Person { first_name: "Lee".into(), blind: true, ..Person::default() });
    modest.dependents.push(Dependent {
        first_name: "Kit".into(),
        relationship: "child".into(),
        date_of_birth: dob(tax_year as i32 - 4, 2, 14),
        ..Dependent::default()
    });
    modest.w2s.push(W2 { wages: 48_000.0, federal_withholding: 3_100.0, ..W2::default() });
    modest.capital_transactions.push(CapitalTransaction {
        description: "Shares".into(),
        proceeds: 2_000.0,
        cost_basis: 9_000.0,
        long_term: true,
    });
    modest.businesses.push(Business { name: "Stall".into(), gross_receipts: 6_000.0, ..Business::default() });
    modest.adjustments.student_loan_interest = 900.0;

    vec![busy, modest]
}
