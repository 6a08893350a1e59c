//! Scenario: a family moving from Georgia to South Carolina mid-year
//!
//! GREEN when:
//! - The JSON fixture loads and computes against the built-in tables.
//! - The GA and SC resident periods partition the year (227 + 138 = 365).
//! - Every state result satisfies the non-negativity and single-balance
//!   invariants, and withholding follows the W-2 state boxes.
//! - The combined graph and its elided view are both topologically valid.
//! - The federal result handed to the states is unchanged by dispatch.

use ttx_engine::compute_state_returns;
use ttx_money::Cents;
use ttx_provenance::ElisionPolicy;
use ttx_states::StateCode;
use ttx_testkit::{
    assert_state_invariants, assert_topological, builtin_engine, fixture_path,
    load_taxpayer_json, run_builtin,
};

#[test]
fn family_move_computes_cleanly() {
    let tp = load_taxpayer_json(&fixture_path("family_ga_to_sc.json")).unwrap();
    assert_eq!(tp.qualifying_children(), 2);

    let run = run_builtin(&tp).unwrap();
    assert_eq!(run.states.len(), 2);

    let ga = run.state(StateCode::Ga).unwrap();
    let sc = run.state(StateCode::Sc).unwrap();
    assert_eq!(ga.apportionment_ratio.resident_days, 227);
    assert_eq!(sc.apportionment_ratio.resident_days, 138);
    assert_eq!(ga.state_withholding, Cents::new(210_000));
    assert_eq!(sc.state_withholding, Cents::new(55_000));

    for r in &run.states {
        assert_state_invariants(r);
        assert!(r.is_part_year());
    }

    assert!(run.federal.self_employment_tax > Cents::ZERO);
    assert!(run.federal.child_tax_credit > Cents::ZERO);

    assert_topological(&run.provenance);
    assert_topological(&run.provenance_view(ElisionPolicy::ElideZero));
}

#[test]
fn dispatch_leaves_federal_result_untouched() {
    let tp = load_taxpayer_json(&fixture_path("family_ga_to_sc.json")).unwrap();
    let (tables, registry) = builtin_engine().unwrap();
    let federal = ttx_federal::compute_federal(&tp, &tables.federal);
    let before = federal.clone();

    compute_state_returns(&registry, &tp, &federal).unwrap();
    assert_eq!(federal, before);
}
