use ttx_provenance::{ProvenanceError, ProvenanceGraph};
use ttx_schemas::{DeductionKind, FederalResult};

use crate::NAMESPACE;

/// Display labels for every `f1040.*` key, in emission order.
pub const NODE_LABELS: &[(&str, &str)] = &[
    ("wages", "Wages, salaries, tips (line 1a)"),
    ("taxable_interest", "Taxable interest (line 2b)"),
    ("ordinary_dividends", "Ordinary dividends (line 3b)"),
    ("business_income", "Nonemployee compensation (Schedule C)"),
    ("retirement_income", "Taxable pensions and IRA distributions (lines 4b/5b)"),
    ("unemployment_compensation", "Unemployment compensation (Schedule 1)"),
    ("total_income", "Total income (line 9)"),
    ("self_employment_tax", "Self-employment tax (Schedule SE)"),
    ("se_tax_deduction", "Deductible part of self-employment tax"),
    ("adjustments", "Adjustments to income (line 10)"),
    ("agi", "Adjusted gross income (line 11)"),
    ("deduction", "Standard or itemized deduction (line 12)"),
    ("taxable_income", "Taxable income (line 15)"),
    ("income_tax", "Tax (line 16)"),
    ("child_tax_credit", "Child tax credit (line 19)"),
    ("tax_after_credits", "Tax after nonrefundable credits (line 22)"),
    ("total_tax", "Total tax (line 24)"),
    ("withholding", "Federal income tax withheld (line 25d)"),
    ("earned_income", "Earned income"),
    ("earned_income_credit", "Earned income credit (line 27)"),
    ("total_payments", "Total payments (line 33)"),
    ("refund", "Refund (line 35a)"),
    ("amount_owed", "Amount you owe (line 37)"),
];

pub fn node_label(key: &str) -> Option<&'static str> {
    NODE_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}

/// Build the `f1040.*` provenance graph for a federal result.
///
/// The graph is complete: zero lines are recorded too.  Hide them with
/// `ProvenanceGraph::elided`.
pub fn collect_traced_values(r: &FederalResult) -> Result<ProvenanceGraph, ProvenanceError> {
    let ns = NAMESPACE;
    let mut g = ProvenanceGraph::scoped(ns);

    let wages = g.record(r.wages, ns.id("wages"), &[], "W-2 box 1, all employers")?;
    let interest = g.record(
        r.taxable_interest,
        ns.id("taxable_interest"),
        &[],
        "1099-INT boxes 1 and 3",
    )?;
    let dividends = g.record(
        r.ordinary_dividends,
        ns.id("ordinary_dividends"),
        &[],
        "1099-DIV box 1a",
    )?;
    let business = g.record(
        r.business_income,
        ns.id("business_income"),
        &[],
        "1099-NEC box 1",
    )?;
    let retirement = g.record(
        r.retirement_income,
        ns.id("retirement_income"),
        &[],
        "1099-R box 2a",
    )?;
    let unemployment = g.record(
        r.unemployment_compensation,
        ns.id("unemployment_compensation"),
        &[],
        "1099-G box 1",
    )?;
    let total_income = g.record(
        r.total_income,
        ns.id("total_income"),
        &[
            &wages,
            &interest,
            &dividends,
            &business,
            &retirement,
            &unemployment,
        ],
        "Sum of income lines",
    )?;

    let se_tax = g.record(
        r.self_employment_tax,
        ns.id("self_employment_tax"),
        &[&business, &wages],
        "Net SE earnings x (social security up to wage base + Medicare)",
    )?;
    let se_deduction = g.record(
        r.se_tax_deduction,
        ns.id("se_tax_deduction"),
        &[&se_tax],
        "Half of self-employment tax",
    )?;
    let adjustments = g.record(
        r.adjustments,
        ns.id("adjustments"),
        &[&se_deduction],
        "Schedule 1 adjustments",
    )?;
    let agi = g.record(
        r.agi,
        ns.id("agi"),
        &[&total_income, &adjustments],
        "Total income minus adjustments, floored at zero",
    )?;

    let deduction_desc = match r.deduction_kind {
        DeductionKind::Standard => format!("Standard deduction ({})", r.filing_status.as_str()),
        DeductionKind::Itemized => "Itemized deductions (larger than standard)".to_string(),
    };
    let deduction = g.record(r.deduction, ns.id("deduction"), &[], deduction_desc)?;
    let taxable = g.record(
        r.taxable_income,
        ns.id("taxable_income"),
        &[&agi, &deduction],
        "AGI minus deduction, floored at zero",
    )?;
    let income_tax = g.record(
        r.income_tax,
        ns.id("income_tax"),
        &[&taxable],
        format!("Progressive brackets ({})", r.filing_status.as_str()),
    )?;
    let ctc = g.record(
        r.child_tax_credit,
        ns.id("child_tax_credit"),
        &[&agi, &income_tax],
        format!(
            "{} qualifying child(ren), phased out above threshold, limited to tax",
            r.qualifying_children
        ),
    )?;
    let after_credits = g.record(
        r.tax_after_credits,
        ns.id("tax_after_credits"),
        &[&income_tax, &ctc],
        "Tax minus nonrefundable credits, floored at zero",
    )?;
    let total_tax = g.record(
        r.total_tax,
        ns.id("total_tax"),
        &[&after_credits, &se_tax],
        "Tax after credits plus self-employment tax",
    )?;

    let withholding = g.record(
        r.withholding,
        ns.id("withholding"),
        &[],
        "Federal withholding, all documents",
    )?;
    let earned = g.record(
        r.earned_income,
        ns.id("earned_income"),
        &[&wages, &business, &se_deduction],
        "Wages plus net self-employment earnings",
    )?;
    let eic = g.record(
        r.earned_income_credit,
        ns.id("earned_income_credit"),
        &[&earned, &agi],
        format!(
            "EITC schedule for {} qualifying child(ren)",
            r.qualifying_children
        ),
    )?;
    let payments = g.record(
        r.total_payments,
        ns.id("total_payments"),
        &[&withholding, &eic],
        "Withholding plus refundable credits",
    )?;

    g.record(
        r.refund,
        ns.id("refund"),
        &[&payments, &total_tax],
        "Payments in excess of total tax",
    )?;
    g.record(
        r.amount_owed,
        ns.id("amount_owed"),
        &[&total_tax, &payments],
        "Total tax in excess of payments",
    )?;

    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_federal;
    use ttx_config::TaxTables;
    use ttx_money::Cents;
    use ttx_provenance::ElisionPolicy;
    use ttx_schemas::{
        DeductionElection, FilingStatus, IncomeDocuments, Person, TaxpayerModel, W2,
    };

    fn wage_earner() -> FederalResult {
        let model = TaxpayerModel {
            tax_year: 2025,
            filing_status: FilingStatus::Single,
            taxpayer: Person::new("Pat", "Doe"),
            spouse: None,
            dependents: Vec::new(),
            income: IncomeDocuments {
                w2s: vec![W2 {
                    employer: "Acme".to_string(),
                    wages: Cents::new(10_000_000),
                    federal_withholding: Cents::new(1_500_000),
                    state_lines: Vec::new(),
                }],
                ..IncomeDocuments::default()
            },
            deduction: DeductionElection::Standard,
            prior_year_state: None,
            state_returns: Vec::new(),
        };
        compute_federal(&model, &TaxTables::builtin().unwrap().federal)
    }

    #[test]
    fn every_label_has_a_node_and_back() {
        let g = collect_traced_values(&wage_earner()).unwrap();
        assert_eq!(g.len(), NODE_LABELS.len());
        for node in g.iter() {
            assert!(node_label(node.id.key()).is_some(), "no label for {}", node.id);
        }
    }

    #[test]
    fn graph_sorts_topologically() {
        let g = collect_traced_values(&wage_earner()).unwrap();
        let order = g.topological_order().unwrap();
        assert_eq!(order.len(), g.len());
    }

    #[test]
    fn elision_keeps_zero_nodes_that_retained_nodes_need() {
        let g = collect_traced_values(&wage_earner()).unwrap();
        let view = g.elided(ElisionPolicy::ElideZero);
        assert!(view.find("f1040.amount_owed").is_none());
        assert!(view.find("f1040.refund").is_some());
        // Zero, but total_income depends on it.
        assert!(view.find("f1040.taxable_interest").is_some());
        view.topological_order().unwrap();
    }

    #[test]
    fn agi_lineage_reaches_wages() {
        let g = collect_traced_values(&wage_earner()).unwrap();
        let lineage = g.lineage_of("f1040.agi").unwrap();
        assert!(lineage.iter().any(|n| n.id.key() == "wages"));
        assert_eq!(lineage.last().map(|n| n.id.key()), Some("agi"));
    }
}
