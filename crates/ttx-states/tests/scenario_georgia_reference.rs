//! Scenario: Georgia reference return
//!
//! GREEN when:
//! - Single filer, $100,000 wages, full-year GA: taxable 8,800,000 cents,
//!   tax 456,720 cents.
//! - Same filer moving in 2025-07-01: ratio 184/365 (strictly between 0.49
//!   and 0.51) and tax strictly below the full-year tax.
//! - The GA graph references the federal AGI node and resolves once the
//!   federal graph is absorbed first.
//! - A net negative GA withholding line is floored at zero, and the traced
//!   withholding node carries the same amount the balance was computed from.

use ttx_config::TaxTables;
use ttx_money::{Cents, ResidencyWindow};
use ttx_provenance::ProvenanceGraph;
use ttx_schemas::{
    DeductionElection, FederalResult, FilingStatus, IncomeDocuments, Person, StateAmount,
    StateReturnConfig, TaxpayerModel, W2,
};
use ttx_states::{StateCode, StateModule, StateRulesModule};

fn taxpayer() -> TaxpayerModel {
    TaxpayerModel {
        tax_year: 2025,
        filing_status: FilingStatus::Single,
        taxpayer: Person::new("Dana", "Reyes"),
        spouse: None,
        dependents: Vec::new(),
        income: IncomeDocuments {
            w2s: vec![W2 {
                employer: "Peach Logistics".to_string(),
                wages: Cents::new(10_000_000),
                federal_withholding: Cents::new(1_400_000),
                state_lines: vec![StateAmount {
                    state_code: "GA".to_string(),
                    state_income: Cents::new(10_000_000),
                    state_withholding: Cents::new(500_000),
                }],
            }],
            ..IncomeDocuments::default()
        },
        deduction: DeductionElection::Standard,
        prior_year_state: None,
        state_returns: Vec::new(),
    }
}

fn setup() -> (TaxTables, TaxpayerModel, FederalResult, StateModule) {
    let tables = TaxTables::builtin().unwrap();
    let tp = taxpayer();
    let federal = ttx_federal::compute_federal(&tp, &tables.federal);
    let ga = StateModule::build(StateCode::Ga, &tables.states).unwrap();
    (tables, tp, federal, ga)
}

#[test]
fn full_year_georgia_matches_reference_cents() {
    let (_, tp, federal, ga) = setup();
    assert_eq!(federal.agi, Cents::new(10_000_000));

    let cfg = StateReturnConfig::new("GA", ResidencyWindow::full_year());
    let r = ga.compute(&tp, &federal, &cfg);

    assert_eq!(r.state_code, StateCode::Ga);
    assert_eq!(r.form_label, "Form 500");
    assert!(r.apportionment_ratio.is_full());
    assert_eq!(r.state_taxable_income, Cents::new(8_800_000));
    assert_eq!(r.state_tax_before_credits, Cents::new(456_720));
    assert_eq!(r.tax_after_credits, Cents::new(456_720));
    assert_eq!(r.state_withholding, Cents::new(500_000));
    assert_eq!(r.overpaid, Cents::new(43_280));
    assert_eq!(r.owed, Cents::ZERO);
}

#[test]
fn part_year_georgia_is_apportioned() {
    let (_, tp, federal, ga) = setup();
    let full = ga.compute(
        &tp,
        &federal,
        &StateReturnConfig::new("GA", ResidencyWindow::full_year()),
    );
    let part = ga.compute(
        &tp,
        &federal,
        &StateReturnConfig::new("GA", ResidencyWindow::part_year(Some("2025-07-01"), None)),
    );

    assert_eq!(part.apportionment_ratio.resident_days, 184);
    assert_eq!(part.apportionment_ratio.days_in_year, 365);
    let ratio = part.apportionment_ratio.as_f64();
    assert!(ratio > 0.49 && ratio < 0.51, "ratio {ratio}");

    assert_eq!(part.state_taxable_income, Cents::new(4_436_164));
    assert_eq!(part.state_tax_before_credits, Cents::new(230_237));
    assert!(part.tax_after_credits < full.tax_after_credits);
}

#[test]
fn georgia_graph_resolves_against_federal() {
    let (_, tp, federal, ga) = setup();
    let r = ga.compute(
        &tp,
        &federal,
        &StateReturnConfig::new("GA", ResidencyWindow::full_year()),
    );
    let state_graph = ga.collect_traced_values(&r).unwrap();
    assert!(state_graph
        .external_references()
        .iter()
        .any(|id| id.to_string() == "f1040.agi"));

    // Absorbing the state graph alone must fail: f1040.agi is not present.
    let mut alone = ProvenanceGraph::combined();
    assert!(alone.absorb(&state_graph).is_err());

    let mut combined = ProvenanceGraph::combined();
    combined
        .absorb(&ttx_federal::collect_traced_values(&federal).unwrap())
        .unwrap();
    combined.absorb(&state_graph).unwrap();
    assert_eq!(
        combined.find("ga500.tax").map(|n| n.amount),
        Some(Cents::new(456_720))
    );
    combined.topological_order().unwrap();
}

#[test]
fn negative_withholding_is_floored_in_result_and_trail() {
    let (tables, mut tp, _, ga) = setup();
    tp.income.w2s[0].wages = Cents::new(5_000_000);
    tp.income.w2s[0].state_lines[0].state_withholding = Cents::new(-12_345);
    let federal = ttx_federal::compute_federal(&tp, &tables.federal);

    let r = ga.compute(
        &tp,
        &federal,
        &StateReturnConfig::new("GA", ResidencyWindow::full_year()),
    );
    assert_eq!(r.state_withholding, Cents::ZERO);
    assert_eq!(r.owed, r.tax_after_credits);
    assert_eq!(r.overpaid, Cents::ZERO);

    let g = ga.collect_traced_values(&r).unwrap();
    assert_eq!(
        g.find("ga500.withholding").map(|n| n.amount),
        Some(r.state_withholding)
    );
    assert_eq!(g.find("ga500.owed").map(|n| n.amount), Some(r.owed));
}
