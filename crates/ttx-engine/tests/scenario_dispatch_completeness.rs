//! Scenario: dispatcher completeness and order
//!
//! GREEN when:
//! - N requested states with N distinct registered codes yield exactly N
//!   results, in the caller's order, for any ordering of any subset.
//! - Each result carries the module's own code and form label.
//! - The combined provenance graph contains the federal namespace first and
//!   then one namespace per requested state, in request order.

use proptest::prelude::*;
use ttx_config::TaxTables;
use ttx_engine::{compute_return, compute_state_returns, ModuleRegistry};
use ttx_money::{Cents, ResidencyWindow};
use ttx_schemas::{
    DeductionElection, FilingStatus, IncomeDocuments, Person, StateReturnConfig, TaxpayerModel, W2,
};
use ttx_states::{StateCode, StateRulesModule};

fn taxpayer(codes: &[StateCode]) -> TaxpayerModel {
    TaxpayerModel {
        tax_year: 2025,
        filing_status: FilingStatus::MarriedFilingJointly,
        taxpayer: Person::new("Sam", "Okafor"),
        spouse: Some(Person::new("Ada", "Okafor")),
        dependents: Vec::new(),
        income: IncomeDocuments {
            w2s: vec![W2 {
                employer: "Delta Works".to_string(),
                wages: Cents::new(14_250_000),
                federal_withholding: Cents::new(1_500_000),
                state_lines: Vec::new(),
            }],
            ..IncomeDocuments::default()
        },
        deduction: DeductionElection::Standard,
        prior_year_state: None,
        state_returns: codes
            .iter()
            .map(|c| StateReturnConfig::new(c.as_str(), ResidencyWindow::full_year()))
            .collect(),
    }
}

fn ordered_subset() -> impl Strategy<Value = Vec<StateCode>> {
    Just(StateCode::ALL.to_vec())
        .prop_shuffle()
        .prop_flat_map(|all| (0..=all.len()).prop_map(move |n| all[..n].to_vec()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn results_match_requests_one_to_one(codes in ordered_subset()) {
        let tables = TaxTables::builtin().unwrap();
        let reg = ModuleRegistry::builtin(&tables).unwrap();
        let tp = taxpayer(&codes);
        let federal = ttx_federal::compute_federal(&tp, &tables.federal);

        let results = compute_state_returns(&reg, &tp, &federal).unwrap();
        prop_assert_eq!(results.len(), codes.len());
        for (result, code) in results.iter().zip(&codes) {
            prop_assert_eq!(result.state_code, *code);
            prop_assert_eq!(result.form_label, reg.get(*code).unwrap().meta().form_label);
        }
    }
}

#[test]
fn combined_graph_follows_request_order() {
    let tables = TaxTables::builtin().unwrap();
    let reg = ModuleRegistry::builtin(&tables).unwrap();
    let requested = [StateCode::Ok, StateCode::Ga, StateCode::Ut];
    let run = compute_return(&reg, &tables.federal, &taxpayer(&requested)).unwrap();

    let mut seen: Vec<&str> = Vec::new();
    for node in run.provenance.iter() {
        let ns = node.id.namespace().as_str();
        if seen.last() != Some(&ns) {
            seen.push(ns);
        }
    }
    let expected: Vec<&str> = std::iter::once("f1040")
        .chain(
            requested
                .iter()
                .map(|c| reg.get(*c).unwrap().meta().namespace.as_str()),
        )
        .collect();
    assert_eq!(seen, expected);
}
