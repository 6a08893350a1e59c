//! Scenario: review metadata is consistent with traced values
//!
//! GREEN when, for every module:
//! - Every node the module emits has a node label.
//! - Every review line names a node the module emits.
//! - Exactly one result line is visible for a computed result.
//! - PartYearOnly lines appear only for part-year filers.

use ttx_config::TaxTables;
use ttx_money::{Cents, ResidencyWindow};
use ttx_schemas::{
    DeductionElection, FilingStatus, IncomeDocuments, Person, StateReturnConfig, TaxpayerModel, W2,
};
use ttx_states::{ResultKind, StateCode, StateModule, StateRulesModule, Visibility};

fn wage_earner() -> TaxpayerModel {
    TaxpayerModel {
        tax_year: 2025,
        filing_status: FilingStatus::Single,
        taxpayer: Person::new("Lee", "Park"),
        spouse: None,
        dependents: Vec::new(),
        income: IncomeDocuments {
            w2s: vec![W2 {
                employer: "Any".to_string(),
                wages: Cents::new(7_500_000),
                federal_withholding: Cents::ZERO,
                state_lines: Vec::new(),
            }],
            ..IncomeDocuments::default()
        },
        deduction: DeductionElection::Standard,
        prior_year_state: None,
        state_returns: Vec::new(),
    }
}

#[test]
fn labels_and_layout_cover_emitted_nodes() {
    let tables = TaxTables::builtin().unwrap();
    let tp = wage_earner();
    let federal = ttx_federal::compute_federal(&tp, &tables.federal);

    for code in StateCode::ALL {
        let module = StateModule::build(code, &tables.states).unwrap();
        let meta = module.meta();
        assert_eq!(meta.code, code);

        let r = module.compute(
            &tp,
            &federal,
            &StateReturnConfig::new(code.as_str(), ResidencyWindow::full_year()),
        );
        let g = module.collect_traced_values(&r).unwrap();

        for node in g.iter() {
            assert!(
                meta.node_label(node.id.key()).is_some(),
                "{code}: no label for {}",
                node.id
            );
        }
        for section in meta.review_layout.sections {
            for line in section.lines {
                assert!(
                    g.get(&meta.namespace.id(line.key)).is_some(),
                    "{code}: review line {} has no node",
                    line.key
                );
            }
        }

        let visible: Vec<_> = meta
            .result_lines
            .iter()
            .filter(|l| (l.visible)(&r))
            .collect();
        assert_eq!(visible.len(), 1, "{code}: result lines {visible:?}");
        // No withholding on this return, so tax is owed wherever any is due.
        let expected = if r.owed.is_zero() {
            ResultKind::ZeroBalance
        } else {
            ResultKind::Owed
        };
        assert_eq!(meta.result_line(&r).map(|l| l.kind), Some(expected));
    }
}

#[test]
fn part_year_lines_follow_residency() {
    let tables = TaxTables::builtin().unwrap();
    let tp = wage_earner();
    let federal = ttx_federal::compute_federal(&tp, &tables.federal);
    let ga = StateModule::build(StateCode::Ga, &tables.states).unwrap();
    let meta = ga.meta();

    let part_year_keys: Vec<&str> = meta
        .review_layout
        .sections
        .iter()
        .flat_map(|s| s.lines.iter())
        .filter(|l| l.visibility == Visibility::PartYearOnly)
        .map(|l| l.key)
        .collect();
    assert!(!part_year_keys.is_empty());

    let full = ga.compute(
        &tp,
        &federal,
        &StateReturnConfig::new("GA", ResidencyWindow::full_year()),
    );
    let rows = meta.review_rows(&full, &ga.collect_traced_values(&full).unwrap());
    assert!(rows.iter().all(|row| !part_year_keys.contains(&row.key)));

    let part = ga.compute(
        &tp,
        &federal,
        &StateReturnConfig::new("GA", ResidencyWindow::part_year(None, Some("2025-03-31"))),
    );
    let rows = meta.review_rows(&part, &ga.collect_traced_values(&part).unwrap());
    assert!(rows.iter().any(|row| part_year_keys.contains(&row.key)));
}
