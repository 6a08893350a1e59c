//! Missouri MO-1040.
//!
//! Federal AGI less the deduction taken on the federal return, bracket
//! schedule.  Part-year filers prorate the tax by resident days.

use serde::Serialize;
use ttx_config::MissouriTables;
use ttx_money::{compute_apportionment_ratio, Cents};
use ttx_provenance::{Namespace, ProvenanceGraph};
use ttx_schemas::{DeductionKind, FederalResult, StateReturnConfig, TaxpayerModel};

use crate::contract::{ratio_note, record_balance, settle};
use crate::review::{result_lines, ResultLine, ReviewLayout, ReviewLine, ReviewSection, Visibility};
use crate::{
    ModuleMeta, RulesError, StateCode, StateComputeResult, StateDetail, StateRulesModule,
};

pub const NAMESPACE: Namespace = Namespace::new("mo1040");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissouriDetail {
    pub federal_agi: Cents,
    pub deduction_kind: DeductionKind,
    pub deduction: Cents,
    pub full_year_tax: Cents,
}

static NODE_LABELS: &[(&str, &str)] = &[
    ("federal_agi", "Federal adjusted gross income (line 6)"),
    ("deduction", "Federal standard or itemized deduction (line 14)"),
    ("taxable_income", "Missouri taxable income (line 21)"),
    ("full_year_tax", "Tax on full-year income (line 24)"),
    ("tax", "Missouri tax after resident percentage (line 26)"),
    ("tax_after_credits", "Tax after credits (line 29)"),
    ("withholding", "Missouri income tax withheld (line 31)"),
    ("overpaid", "Overpayment (line 44)"),
    ("owed", "Amount due (line 47)"),
];

static SECTIONS: &[ReviewSection] = &[
    ReviewSection {
        title: "Income",
        lines: &[
            ReviewLine {
                key: "federal_agi",
                label: "Federal AGI",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "deduction",
                label: "Deduction",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "taxable_income",
                label: "Missouri taxable income",
                visibility: Visibility::Always,
            },
        ],
    },
    ReviewSection {
        title: "Tax and payments",
        lines: &[
            ReviewLine {
                key: "full_year_tax",
                label: "Tax before resident percentage",
                visibility: Visibility::PartYearOnly,
            },
            ReviewLine {
                key: "tax",
                label: "Missouri tax",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "withholding",
                label: "Missouri withholding",
                visibility: Visibility::NonZero,
            },
        ],
    },
];

static RESULT_LINES: [ResultLine; 3] = result_lines("Missouri overpayment", "Missouri amount due");

static META: ModuleMeta = ModuleMeta {
    code: StateCode::Mo,
    state_name: "Missouri",
    form_label: "MO-1040",
    namespace: NAMESPACE,
    node_labels: NODE_LABELS,
    review_layout: ReviewLayout { sections: SECTIONS },
    result_lines: &RESULT_LINES,
};

#[derive(Debug, Clone)]
pub struct MissouriModule {
    tables: MissouriTables,
}

impl MissouriModule {
    pub fn new(tables: MissouriTables) -> Self {
        Self { tables }
    }
}

impl StateRulesModule for MissouriModule {
    fn meta(&self) -> &'static ModuleMeta {
        &META
    }

    fn compute(
        &self,
        taxpayer: &TaxpayerModel,
        federal: &FederalResult,
        config: &StateReturnConfig,
    ) -> StateComputeResult {
        let ratio = compute_apportionment_ratio(&config.residency, taxpayer.tax_year);

        let federal_agi = federal.agi.floor_zero();
        let deduction = federal.deduction.floor_zero();
        let taxable = (federal_agi - deduction).floor_zero();
        let full_year_tax = self.tables.brackets.tax_on(taxable);
        let tax = ratio.apply(full_year_tax);

        let withholding = taxpayer.state_withholding(META.code.as_str());
        let balance = settle(tax, Cents::ZERO, Cents::ZERO, withholding);

        StateComputeResult {
            state_code: META.code,
            form_label: META.form_label,
            residency_type: config.residency.residency_type,
            state_agi: federal_agi,
            state_taxable_income: taxable,
            state_tax_before_credits: tax,
            total_credits: balance.total_credits,
            tax_after_credits: balance.tax_after_credits,
            state_withholding: withholding,
            apportionment_ratio: ratio,
            overpaid: balance.overpaid,
            owed: balance.owed,
            dependents: taxpayer.dependent_count(),
            detail: StateDetail::Missouri(MissouriDetail {
                federal_agi,
                deduction_kind: federal.deduction_kind,
                deduction,
                full_year_tax,
            }),
        }
    }

    fn collect_traced_values(
        &self,
        r: &StateComputeResult,
    ) -> Result<ProvenanceGraph, RulesError> {
        let StateDetail::Missouri(d) = &r.detail else {
            return Err(RulesError::DetailMismatch {
                module: META.code,
                found: r.detail.code(),
            });
        };
        let fed = ttx_federal::NAMESPACE;
        let ns = NAMESPACE;
        let mut g = ProvenanceGraph::scoped(ns).with_upstream(fed);

        let agi = g.record(
            d.federal_agi,
            ns.id("federal_agi"),
            &[&fed.id("agi")],
            "Federal AGI carried to Missouri",
        )?;
        let deduction_desc = match d.deduction_kind {
            DeductionKind::Standard => "Federal standard deduction",
            DeductionKind::Itemized => "Federal itemized deductions",
        };
        let deduction = g.record(
            d.deduction,
            ns.id("deduction"),
            &[&fed.id("deduction")],
            deduction_desc,
        )?;
        let taxable = g.record(
            r.state_taxable_income,
            ns.id("taxable_income"),
            &[&agi, &deduction],
            "AGI minus deduction, floored at zero",
        )?;
        let full_year_tax = g.record(
            d.full_year_tax,
            ns.id("full_year_tax"),
            &[&taxable],
            "Missouri bracket schedule",
        )?;
        let tax = g.record(
            r.state_tax_before_credits,
            ns.id("tax"),
            &[&full_year_tax],
            format!("Tax, {}", ratio_note(&r.apportionment_ratio)),
        )?;
        record_balance(&mut g, ns, r, &tax, &[])?;
        Ok(g)
    }
}
