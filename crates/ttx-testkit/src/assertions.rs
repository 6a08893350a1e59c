use std::collections::HashSet;
use ttx_money::Cents;
use ttx_provenance::{ProvenanceGraph, TraceId};
use ttx_states::StateComputeResult;

/// Every node's dependencies appear before it, or are declared external to
/// the graph, and Kahn's sort covers every node.
pub fn assert_topological(graph: &ProvenanceGraph) {
    let external: HashSet<&TraceId> = graph.external_references().into_iter().collect();
    let mut seen: HashSet<&TraceId> = HashSet::new();
    for node in graph.iter() {
        for dep in &node.derived_from {
            assert!(
                seen.contains(dep) || external.contains(dep),
                "{} derives from {} which is neither earlier nor external",
                node.id,
                dep
            );
        }
        seen.insert(&node.id);
    }
    let order = graph
        .topological_order()
        .unwrap_or_else(|e| panic!("topological sort failed: {e}"));
    assert_eq!(order.len(), graph.len());
}

/// Non-negative exposed amounts and a single balance line.
pub fn assert_state_invariants(r: &StateComputeResult) {
    let code = r.state_code;
    for (name, v) in [
        ("state_agi", r.state_agi),
        ("state_taxable_income", r.state_taxable_income),
        ("state_tax_before_credits", r.state_tax_before_credits),
        ("total_credits", r.total_credits),
        ("tax_after_credits", r.tax_after_credits),
        ("state_withholding", r.state_withholding),
        ("overpaid", r.overpaid),
        ("owed", r.owed),
    ] {
        assert!(v >= Cents::ZERO, "{code} {name} is negative: {v}");
    }
    assert!(
        r.overpaid.is_zero() || r.owed.is_zero(),
        "{code} reports both overpaid {} and owed {}",
        r.overpaid,
        r.owed
    );
    assert!(r.tax_after_credits <= r.state_tax_before_credits);
}
