use rstest::rstest;
use chrono::NaiveDate;
use std::io::Write;
use taxgraph_core::analysis::topology::analyze_catalog;
use taxgraph_core::compute::restricted::{QBI_DEDUCTION, STUDENT_LOAN_INTEREST};
use taxgraph_core::forms::{Form8995, Schedule1, F1040};
use taxgraph_core::input::{Business, Dependent, Form1099Int, W2};
use taxgraph_core::{
    ComputationError, ComputedReturn, EvalLimits, FieldValue, FilingStatus, FormRegistry, FormTag,
    ReturnInput, ReturnSummary, TaxConfig, CYCLE_BREAKS,
};

fn registry() -> FormRegistry {
    FormRegistry::new(TaxConfig::builtin())
}

fn field(out: &ComputedReturn, tag: FormTag, line: &str) -> FieldValue {
    out.form(tag)
        .and_then(|f| f.fields.iter().find(|x| x.line == line))
        .map(|x| x.value.clone())
        .unwrap_or_else(|| panic!("no field {tag}.{line}"))
}

fn wage_earner(year: u16, wages: f64, withheld: f64) -> ReturnInput {
    let mut input = ReturnInput::new(year, FilingStatus::Single);
    input.w2s.push(W2 {
        employer: "Acme".into(),
        wages,
        federal_withholding: withheld,
        social_security_wages: wages,
        social_security_withheld: wages * 0.062,
        medicare_wages: wages,
        medicare_withheld: wages * 0.0145,
        ..W2::default()
    });
    input
}

#[rstest]
#[case(2023)]
#[case(2024)]
fn zero_income_return_only_attaches_the_root(#[case] year: u16) {
    let out = registry().compute(&ReturnInput::new(year, FilingStatus::Single)).unwrap();
    assert_eq!(out.included_tags(), vec![FormTag::F1040]);
    assert_eq!(out.summary, ReturnSummary::default());
    assert_eq!(field(&out, FormTag::F1040, "1z"), FieldValue::Amount(0));
    assert_eq!(field(&out, FormTag::F1040, "single"), FieldValue::Flag(true));
}

#[rstest]
#[case(2023, FilingStatus::HeadOfHousehold)]
#[case(2024, FilingStatus::HeadOfHousehold)]
#[case(2024, FilingStatus::MarriedFilingJointly)]
fn zero_income_with_dependents_only_attaches_the_root(
    #[case] year: u16,
    #[case] status: FilingStatus,
) {
    let mut input = ReturnInput::new(year, status);
    input.dependents = vec![
        Dependent {
            first_name: "Rowan".into(),
            date_of_birth: NaiveDate::from_ymd_opt(i32::from(year) - 6, 5, 20),
            ..Dependent::default()
        },
        Dependent { first_name: "Gran".into(), relationship: "parent".into(), ..Dependent::default() },
    ];
    let out = registry().compute(&input).unwrap();
    assert_eq!(out.included_tags(), vec![FormTag::F1040]);
    assert_eq!(out.summary, ReturnSummary::default());
    assert_eq!(field(&out, FormTag::F1040, "19"), FieldValue::Amount(0));
}

#[test]
fn wages_and_withholding_flow_to_the_summary() {
    let out = registry().compute(&wage_earner(2024, 50_000.0, 5_000.0)).unwrap();

    assert_eq!(out.included_tags(), vec![FormTag::F1040]);
    assert_eq!(field(&out, FormTag::F1040, "1z"), FieldValue::Amount(50_000));
    assert_eq!(field(&out, FormTag::F1040, "25a"), FieldValue::Amount(5_000));
    assert_eq!(
        out.summary,
        ReturnSummary {
            total_income: 50_000,
            adjusted_gross_income: 50_000,
            taxable_income: 35_400,
            total_tax: 4_016,
            total_withholding: 5_000,
            total_payments: 5_000,
            refund: 984,
            amount_owed: 0,
        }
    );
}

#[test]
fn qbi_deduction_and_taxable_income_resolve_together() {
    let mut input = ReturnInput::new(2023, FilingStatus::Single);
    input.businesses.push(Business {
        name: "Workshop".into(),
        gross_receipts: 90_000.0,
        expenses: 15_000.0,
        ..Business::default()
    });
    let registry = registry();
    let r = registry.prepare(&input).unwrap();
    let f8995 = r.form::<Form8995>();
    let f1040 = r.form::<F1040>();

    let deduction = f8995.deduction(&r).unwrap();
    assert!(deduction > 0.0);
    assert!(deduction <= f8995.income_component(&r).unwrap());
    assert!(deduction <= 0.2 * f1040.taxable_income_before_qbi(&r).unwrap());
    assert!(f1040.taxable_income(&r).unwrap() <= f1040.taxable_income_before_qbi(&r).unwrap());

    let included = r.attach().unwrap();
    let seq = included.iter().find(|f| f.tag == FormTag::Form8995).map(|f| f.sequence);
    assert_eq!(seq, Some(55));
}

#[test]
fn student_loan_deduction_is_bounded_by_its_unlimited_amount() {
    let mut input = wage_earner(2024, 86_000.0, 9_000.0);
    input.adjustments.student_loan_interest = 2_500.0;
    let registry = registry();
    let r = registry.prepare(&input).unwrap();
    let s1 = r.form::<Schedule1>();
    let f1040 = r.form::<F1040>();

    let agi = f1040.adjusted_gross_income(&r).unwrap();
    let deduction = s1.student_loan_interest(&r).unwrap();
    assert!(deduction > 0.0 && deduction < s1.student_loan_unlimited(&r).unwrap());
    assert!(agi >= 86_000.0 - 2_500.0);
    assert!(agi <= s1.magi_before_student_loan(&r).unwrap());
    assert_eq!(agi, f1040.total_income(&r).unwrap() - s1.total_adjustments(&r).unwrap());
}

#[test]
fn foreign_account_election_adds_exactly_schedule_b() {
    let mut base = wage_earner(2024, 70_000.0, 8_000.0);
    base.interest.push(Form1099Int { payer: "Bank".into(), interest: 200.0, ..Form1099Int::default() });
    let mut elected = base.clone();
    elected.elections.foreign_financial_accounts = true;

    let registry = registry();
    let before = registry.compute(&base).unwrap();
    let after = registry.compute(&elected).unwrap();

    let mut expected = before.included_tags();
    expected.push(FormTag::ScheduleB);
    expected.sort_by_key(|t| FormRegistry::catalog().iter().find(|(c, _)| c == t).map(|(_, s)| *s));
    assert_eq!(after.included_tags(), expected);
    assert_eq!(after.form(FormTag::ScheduleB).unwrap().sequence, 8);
    assert_eq!(field(&after, FormTag::ScheduleB, "7a"), FieldValue::Flag(true));
    assert_eq!(before.form(FormTag::F1040), after.form(FormTag::F1040));
    assert_eq!(before.summary, after.summary);
}

#[test]
fn repeated_passes_are_identical() {
    let mut input = wage_earner(2023, 140_000.0, 21_000.0);
    input.businesses.push(Business { gross_receipts: 30_000.0, ..Business::default() });
    input.adjustments.student_loan_interest = 1_200.0;
    let registry = registry();
    let first = registry.compute(&input).unwrap();
    let second = registry.compute(&input).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn output_is_ordered_by_sequence_and_serializes() {
    let mut input = wage_earner(2024, 60_000.0, 6_000.0);
    input.businesses.push(Business { name: "Side".into(), gross_receipts: 12_000.0, ..Business::default() });
    let out = registry().compute(&input).unwrap();

    assert_eq!(out.forms[0].tag, FormTag::F1040);
    assert!(out.forms.windows(2).all(|w| w[0].sequence <= w[1].sequence));

    let json: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
    assert_eq!(json["tax_year"], 2024);
    assert_eq!(json["forms"][0]["tag"], "f1040");
    assert_eq!(json["summary"]["total_income"], out.summary.total_income);

    assert_eq!(field(&out, FormTag::ScheduleSe, "earnings_factor"), FieldValue::Decimal(0.9235));
    let se = json["forms"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["tag"] == "schedule_se")
        .unwrap();
    assert_eq!(se["fields"][2]["value"], serde_json::json!({"kind": "decimal", "value": 0.9235}));
}

#[test]
fn every_shipped_layout_matches_its_form() {
    assert_eq!(registry().verify_layouts(), Ok(()));
}

#[test]
fn catalog_has_no_cycles_and_breaks_hold() {
    let registry = registry();
    for year in registry.config().supported_years() {
        let report = analyze_catalog(&registry, year, CYCLE_BREAKS).unwrap();
        assert!(report.is_sound(), "{report:?}");
    }
    assert_eq!(CYCLE_BREAKS, &[QBI_DEDUCTION, STUDENT_LOAN_INTEREST]);
}

#[test]
fn depth_guard_aborts_the_pass() {
    let config = TaxConfig::builtin().with_limits(EvalLimits { max_depth: 3 });
    let registry = FormRegistry::new(config);
    let err = registry.compute(&wage_earner(2024, 50_000.0, 0.0)).unwrap_err();
    assert!(matches!(err, ComputationError::DepthExceeded { depth: 3, .. }));
}

#[test]
fn input_loaded_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "tax_year": 2024,
            "filing_status": "single",
            "taxpayer": {{"first_name": "Ada", "last_name": "Byron"}},
            "w2s": [{{"wages": 50000, "federal_withholding": 5000}}]
        }}"#
    )
    .unwrap();
    let input = ReturnInput::from_path(file.path()).unwrap();
    let out = registry().compute(&input).unwrap();
    assert_eq!(out.summary.refund, 984);
    assert_eq!(field(&out, FormTag::F1040, "first_name"), FieldValue::Text("Ada".into()));
}

#[test]
fn what_if_batch_reports_the_raise() {
    use taxgraph_core::scenario::SummaryDelta;
    use taxgraph_core::{run_scenarios, Scenario};

    let registry = registry();
    let outcomes = run_scenarios(
        &registry,
        &[
            Scenario::new("current", wage_earner(2024, 50_000.0, 5_000.0)),
            Scenario::new("raise", wage_earner(2024, 55_000.0, 5_000.0)),
        ],
    );
    let delta = SummaryDelta::between(outcomes[0].summary().unwrap(), outcomes[1].summary().unwrap());
    assert_eq!(delta.adjusted_gross_income, 5_000);
    assert_eq!(delta.taxable_income, 5_000);
    assert!(delta.total_tax > 0);
}

#[test]
fn pass_report_and_trace_follow_the_same_pass() {
    use taxgraph_core::analysis::PassReport;
    use taxgraph_core::display::format_trace;
    use taxgraph_core::LineId;

    let input = wage_earner(2024, 50_000.0, 5_000.0);
    let registry = registry();
    let r = registry.prepare(&input).unwrap();
    r.attach().unwrap();
    r.summary().unwrap();

    let report = PassReport::analyze(&r);
    assert!(report.stats.lines_evaluated > 0);
    assert!(report.resolved_by_form.contains_key(&FormTag::F1040));
    assert!(report.dependency_edges >= report.cross_form_edges);

    let trace = format_trace(&r, LineId::new(FormTag::F1040, "15"));
    assert!(trace.starts_with("AUDIT TRACE for line 'f1040.15':"));
    assert!(trace.contains("[L1] f1040.15 [35400.00]"));
}
