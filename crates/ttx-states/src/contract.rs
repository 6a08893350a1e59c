//! The interface every jurisdiction implements, and the uniform result shape
//! it returns.

use serde::Serialize;
use ttx_money::{ApportionmentRatio, Cents, ResidencyType};
use ttx_provenance::{Namespace, ProvenanceError, ProvenanceGraph, TraceId};
use ttx_schemas::{FederalResult, StateReturnConfig, TaxpayerModel};

use crate::review::{ResultLine, ReviewLayout};
use crate::{StateCode, StateDetail};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One jurisdiction's computation plus its provenance and review metadata.
///
/// Implementations are stateless apart from their tax tables.  `compute` is
/// total for every well-formed model: floors clamp at zero instead of
/// failing.
pub trait StateRulesModule: Send + Sync {
    fn meta(&self) -> &'static ModuleMeta;

    fn compute(
        &self,
        taxpayer: &TaxpayerModel,
        federal: &FederalResult,
        config: &StateReturnConfig,
    ) -> StateComputeResult;

    /// Complete graph for `result`, every id in `meta().namespace`.
    /// Upstream `f1040.*` references resolve when the graph is absorbed into
    /// a combined return graph.
    fn collect_traced_values(
        &self,
        result: &StateComputeResult,
    ) -> Result<ProvenanceGraph, RulesError>;
}

/// Static description of a module.
#[derive(Debug)]
pub struct ModuleMeta {
    pub code: StateCode,
    pub state_name: &'static str,
    pub form_label: &'static str,
    pub namespace: Namespace,
    /// Trace key -> display label.
    pub node_labels: &'static [(&'static str, &'static str)],
    pub review_layout: ReviewLayout,
    pub result_lines: &'static [ResultLine],
}

impl ModuleMeta {
    pub fn node_label(&self, key: &str) -> Option<&'static str> {
        self.node_labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| *label)
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Uniform per-state output.  Built once per state per run and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateComputeResult {
    pub state_code: StateCode,
    pub form_label: &'static str,
    pub residency_type: ResidencyType,
    /// Federal AGI carried to the state, before apportionment.
    pub state_agi: Cents,
    /// After apportionment where the module apportions income.
    pub state_taxable_income: Cents,
    pub state_tax_before_credits: Cents,
    pub total_credits: Cents,
    pub tax_after_credits: Cents,
    pub state_withholding: Cents,
    pub apportionment_ratio: ApportionmentRatio,
    pub overpaid: Cents,
    pub owed: Cents,
    pub dependents: i64,
    pub detail: StateDetail,
}

impl StateComputeResult {
    pub fn is_part_year(&self) -> bool {
        self.residency_type == ResidencyType::PartYear
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("{module} module was handed a {found} result")]
    DetailMismatch {
        module: StateCode,
        found: StateCode,
    },

    #[error("no tax tables configured for {code}")]
    MissingTables { code: StateCode },

    #[error(transparent)]
    Provenance(#[from] ProvenanceError),
}

// ---------------------------------------------------------------------------
// Credit ordering and balance
// ---------------------------------------------------------------------------

/// Tax after credits and the final balance.
///
/// Nonrefundable credits are capped at the tax.  Refundable credits apply
/// after that floor; whatever they exceed the remaining tax by is paid out
/// with withholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Balance {
    pub nonrefundable_applied: Cents,
    pub refundable: Cents,
    pub total_credits: Cents,
    pub tax_after_credits: Cents,
    pub overpaid: Cents,
    pub owed: Cents,
}

pub(crate) fn settle(
    tax: Cents,
    nonrefundable: Cents,
    refundable: Cents,
    withholding: Cents,
) -> Balance {
    let tax = tax.floor_zero();
    let nonrefundable_applied = nonrefundable.floor_zero().min(tax);
    let after_nonrefundable = tax - nonrefundable_applied;

    let refundable = refundable.floor_zero();
    let pre_floor = after_nonrefundable - refundable;
    let tax_after_credits = pre_floor.floor_zero();
    let refundable_excess = (-pre_floor).floor_zero();

    let payments = withholding.floor_zero() + refundable_excess;
    Balance {
        nonrefundable_applied,
        refundable,
        total_credits: nonrefundable_applied + refundable,
        tax_after_credits,
        overpaid: (payments - tax_after_credits).floor_zero(),
        owed: (tax_after_credits - payments).floor_zero(),
    }
}

/// Record the shared tail of every state graph:
/// tax after credits, withholding, overpaid, owed.
pub(crate) fn record_balance(
    g: &mut ProvenanceGraph,
    ns: Namespace,
    r: &StateComputeResult,
    tax: &TraceId,
    credits: &[&TraceId],
) -> Result<(), ProvenanceError> {
    let mut deps: Vec<&TraceId> = vec![tax];
    deps.extend_from_slice(credits);
    let after = g.record(
        r.tax_after_credits,
        ns.id("tax_after_credits"),
        &deps,
        "Tax minus credits, floored at zero",
    )?;
    let withholding = g.record(
        r.state_withholding,
        ns.id("withholding"),
        &[],
        format!("{} withholding, all documents", r.state_code),
    )?;

    let mut balance_deps: Vec<&TraceId> = vec![&withholding, &after];
    balance_deps.extend_from_slice(credits);
    g.record(
        r.overpaid,
        ns.id("overpaid"),
        &balance_deps,
        "Payments in excess of tax",
    )?;
    g.record(
        r.owed,
        ns.id("owed"),
        &balance_deps,
        "Tax in excess of payments",
    )?;
    Ok(())
}

/// Ratio as it reads in a description: `"x 184/365 resident days"`.
pub(crate) fn ratio_note(ratio: &ApportionmentRatio) -> String {
    if ratio.is_full() {
        "full year".to_string()
    } else {
        format!("x {ratio} resident days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(v: i64) -> Cents {
        Cents::new(v)
    }

    #[test]
    fn nonrefundable_never_below_zero() {
        let b = settle(c(100), c(500), Cents::ZERO, c(0));
        assert_eq!(b.nonrefundable_applied, c(100));
        assert_eq!(b.tax_after_credits, Cents::ZERO);
        assert_eq!(b.overpaid, Cents::ZERO);
        assert_eq!(b.owed, Cents::ZERO);
    }

    #[test]
    fn refundable_excess_is_paid_out() {
        let b = settle(c(100), Cents::ZERO, c(250), c(40));
        assert_eq!(b.tax_after_credits, Cents::ZERO);
        assert_eq!(b.overpaid, c(190));
        assert_eq!(b.owed, Cents::ZERO);
        assert_eq!(b.total_credits, c(250));
    }

    #[test]
    fn refundable_applies_after_nonrefundable_floor() {
        // nonrefundable eats all tax; refundable is paid out in full
        let b = settle(c(100), c(300), c(50), Cents::ZERO);
        assert_eq!(b.tax_after_credits, Cents::ZERO);
        assert_eq!(b.overpaid, c(50));
    }

    #[test]
    fn owed_when_withholding_short() {
        let b = settle(c(1_000), c(100), Cents::ZERO, c(200));
        assert_eq!(b.tax_after_credits, c(900));
        assert_eq!(b.owed, c(700));
        assert_eq!(b.overpaid, Cents::ZERO);
    }
}
