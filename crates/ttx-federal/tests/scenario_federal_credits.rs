//! Scenario: federal credits and balance lines
//!
//! GREEN when:
//! - A low-income single parent gets the EITC plateau and a CTC limited to tax.
//! - Tax after credits never goes below zero.
//! - Exactly one of refund / amount owed is non-zero (or both zero).
//! - A JSON-intake model computes the same as a struct-built one.
//! - Wages near the i64 range saturate instead of overflowing.

use ttx_config::TaxTables;
use ttx_federal::compute_federal;
use ttx_money::Cents;
use ttx_schemas::TaxpayerModel;

fn parent_json(wages: i64, withheld: i64) -> serde_json::Value {
    serde_json::json!({
        "tax_year": 2025,
        "filing_status": "single",
        "taxpayer": { "first_name": "Sam", "last_name": "Lee" },
        "dependents": [
            {
                "person": { "first_name": "Kit", "last_name": "Lee", "date_of_birth": "2018-04-02" },
                "relationship": "daughter"
            }
        ],
        "income": {
            "w2s": [ { "employer": "Diner", "wages": wages, "federal_withholding": withheld } ]
        }
    })
}

fn compute(v: serde_json::Value) -> ttx_schemas::FederalResult {
    let model: TaxpayerModel = serde_json::from_value(v).unwrap();
    compute_federal(&model, &TaxTables::builtin().unwrap().federal)
}

#[test]
fn low_income_parent_gets_eitc_plateau_and_limited_ctc() {
    let r = compute(parent_json(2_000_000, 50_000));
    assert_eq!(r.qualifying_children, 1);
    // 20,000 - 15,750 = 4,250 taxable, 10% bracket.
    assert_eq!(r.taxable_income, Cents::new(425_000));
    assert_eq!(r.income_tax, Cents::new(42_500));
    assert_eq!(r.child_tax_credit, Cents::new(42_500));
    assert_eq!(r.tax_after_credits, Cents::ZERO);
    assert_eq!(r.earned_income_credit, Cents::new(432_800));
    assert_eq!(r.refund, Cents::new(482_800));
    assert_eq!(r.amount_owed, Cents::ZERO);
}

#[test]
fn balance_lines_are_exclusive() {
    for wages in [0_i64, 1_000_000, 5_000_000, 25_000_000] {
        for withheld in [0_i64, 300_000, 6_000_000] {
            let r = compute(parent_json(wages, withheld));
            assert!(r.tax_after_credits >= Cents::ZERO);
            assert!(r.refund.is_zero() || r.amount_owed.is_zero());
            assert_eq!(
                r.refund - r.amount_owed,
                r.total_payments - r.total_tax,
                "wages={wages} withheld={withheld}"
            );
        }
    }
}

#[test]
fn extreme_wages_saturate_without_panicking() {
    let half = i64::MAX / 2 + 1;
    let mut v = parent_json(half, 0);
    v["income"]["w2s"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({ "employer": "Second", "wages": half }));

    let r = compute(v);
    assert_eq!(r.wages, Cents::MAX);
    assert_eq!(r.child_tax_credit, Cents::ZERO);
    assert_eq!(r.earned_income_credit, Cents::ZERO);
    assert!(r.tax_after_credits > Cents::ZERO);
    assert!(r.refund.is_zero());
}
