//! Review-layout descriptors.
//!
//! Pure data handed to review UIs.  A line names a trace key in the owning
//! module's namespace; its amount comes from the provenance graph, so the
//! review screen and the audit trail can never disagree.

use serde::Serialize;
use ttx_money::Cents;
use ttx_provenance::ProvenanceGraph;

use crate::{ModuleMeta, StateComputeResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Always,
    NonZero,
    PartYearOnly,
    HasDependents,
}

impl Visibility {
    pub fn applies(&self, amount: Cents, result: &StateComputeResult) -> bool {
        match self {
            Visibility::Always => true,
            Visibility::NonZero => !amount.is_zero(),
            Visibility::PartYearOnly => result.is_part_year(),
            Visibility::HasDependents => result.dependents > 0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewLine {
    pub key: &'static str,
    pub label: &'static str,
    pub visibility: Visibility,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewSection {
    pub title: &'static str,
    pub lines: &'static [ReviewLine],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewLayout {
    pub sections: &'static [ReviewSection],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Refund,
    Owed,
    ZeroBalance,
}

#[derive(Copy, Clone, Debug, Serialize)]
pub struct ResultLine {
    pub kind: ResultKind,
    pub label: &'static str,
    #[serde(skip)]
    pub visible: fn(&StateComputeResult) -> bool,
}

/// The standard refund / owed / zero-balance trio.
pub(crate) const fn result_lines(
    refund: &'static str,
    owed: &'static str,
) -> [ResultLine; 3] {
    [
        ResultLine {
            kind: ResultKind::Refund,
            label: refund,
            visible: shows_refund,
        },
        ResultLine {
            kind: ResultKind::Owed,
            label: owed,
            visible: shows_owed,
        },
        ResultLine {
            kind: ResultKind::ZeroBalance,
            label: "No balance due",
            visible: shows_zero_balance,
        },
    ]
}

fn shows_refund(r: &StateComputeResult) -> bool {
    !r.overpaid.is_zero()
}

fn shows_owed(r: &StateComputeResult) -> bool {
    !r.owed.is_zero()
}

fn shows_zero_balance(r: &StateComputeResult) -> bool {
    r.overpaid.is_zero() && r.owed.is_zero()
}

/// One resolved review row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewRow {
    pub section: &'static str,
    pub key: &'static str,
    pub label: &'static str,
    pub amount: Cents,
}

impl ModuleMeta {
    /// Visible review rows for `result`, amounts read from `graph`.
    /// Lines whose node is absent from `graph` are skipped.
    pub fn review_rows(
        &self,
        result: &StateComputeResult,
        graph: &ProvenanceGraph,
    ) -> Vec<ReviewRow> {
        let mut out = Vec::new();
        for section in self.review_layout.sections {
            for line in section.lines {
                let id = self.namespace.id(line.key);
                let Some(node) = graph.get(&id) else {
                    continue;
                };
                if line.visibility.applies(node.amount, result) {
                    out.push(ReviewRow {
                        section: section.title,
                        key: line.key,
                        label: line.label,
                        amount: node.amount,
                    });
                }
            }
        }
        out
    }

    /// The first result line whose predicate holds.
    pub fn result_line(&self, result: &StateComputeResult) -> Option<&'static ResultLine> {
        self.result_lines.iter().find(|l| (l.visible)(result))
    }
}
