//! Georgia Form 500.
//!
//! Federal AGI, less the Georgia standard deduction (or federal itemized
//! deductions when the federal return itemized), less a per-dependent
//! exemption.  Part-year filers apportion taxable income by resident days.
//! Flat rate, no credits modeled.

use serde::Serialize;
use ttx_config::GeorgiaTables;
use ttx_money::{compute_apportionment_ratio, Cents, Rate};
use ttx_provenance::{Namespace, ProvenanceGraph};
use ttx_schemas::{DeductionKind, FederalResult, StateReturnConfig, TaxpayerModel};

use crate::contract::{ratio_note, record_balance, settle};
use crate::review::{result_lines, ResultLine, ReviewLayout, ReviewLine, ReviewSection, Visibility};
use crate::{
    ModuleMeta, RulesError, StateCode, StateComputeResult, StateDetail, StateRulesModule,
};

pub const NAMESPACE: Namespace = Namespace::new("ga500");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeorgiaDetail {
    pub federal_agi: Cents,
    pub deduction_kind: DeductionKind,
    pub deduction: Cents,
    pub dependent_exemptions: Cents,
    pub full_year_taxable_income: Cents,
    pub rate: Rate,
}

static NODE_LABELS: &[(&str, &str)] = &[
    ("federal_agi", "Federal adjusted gross income (line 8)"),
    ("deduction", "Standard or itemized deduction (line 11)"),
    ("dependent_exemptions", "Dependent exemptions (line 12)"),
    ("full_year_taxable_income", "Taxable income before apportionment"),
    ("taxable_income", "Georgia taxable income (line 15)"),
    ("tax", "Income tax (line 16)"),
    ("tax_after_credits", "Tax after credits (line 19)"),
    ("withholding", "Georgia income tax withheld (line 20)"),
    ("overpaid", "Refund (line 29)"),
    ("owed", "Amount you owe (line 35)"),
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
                key: "dependent_exemptions",
                label: "Dependent exemptions",
                visibility: Visibility::HasDependents,
            },
            ReviewLine {
                key: "full_year_taxable_income",
                label: "Taxable income (full year)",
                visibility: Visibility::PartYearOnly,
            },
            ReviewLine {
                key: "taxable_income",
                label: "Georgia taxable income",
                visibility: Visibility::Always,
            },
        ],
    },
    ReviewSection {
        title: "Tax and payments",
        lines: &[
            ReviewLine {
                key: "tax",
                label: "Income tax",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "withholding",
                label: "Georgia withholding",
                visibility: Visibility::NonZero,
            },
        ],
    },
];

static RESULT_LINES: [ResultLine; 3] = result_lines("Georgia refund", "Georgia balance due");

static META: ModuleMeta = ModuleMeta {
    code: StateCode::Ga,
    state_name: "Georgia",
    form_label: "Form 500",
    namespace: NAMESPACE,
    node_labels: NODE_LABELS,
    review_layout: ReviewLayout { sections: SECTIONS },
    result_lines: &RESULT_LINES,
};

#[derive(Debug, Clone)]
pub struct GeorgiaModule {
    tables: GeorgiaTables,
}

impl GeorgiaModule {
    pub fn new(tables: GeorgiaTables) -> Self {
        Self { tables }
    }
}

impl StateRulesModule for GeorgiaModule {
    fn meta(&self) -> &'static ModuleMeta {
        &META
    }

    fn compute(
        &self,
        taxpayer: &TaxpayerModel,
        federal: &FederalResult,
        config: &StateReturnConfig,
    ) -> StateComputeResult {
        let t = &self.tables;
        let ratio = compute_apportionment_ratio(&config.residency, taxpayer.tax_year);

        let federal_agi = federal.agi.floor_zero();
        let (deduction_kind, deduction) = match federal.deduction_kind {
            DeductionKind::Itemized => (DeductionKind::Itemized, federal.itemized_deductions),
            DeductionKind::Standard => (
                DeductionKind::Standard,
                *t.standard_deduction.get(taxpayer.filing_status),
            ),
        };
        let dependents = taxpayer.dependent_count();
        let dependent_exemptions = t.dependent_exemption.times(dependents);
        let full_year_taxable_income =
            (federal_agi - deduction - dependent_exemptions).floor_zero();

        let taxable = ratio.apply(full_year_taxable_income);
        let tax = taxable.apply_rate(t.rate);
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
            dependents,
            detail: StateDetail::Georgia(GeorgiaDetail {
                federal_agi,
                deduction_kind,
                deduction,
                dependent_exemptions,
                full_year_taxable_income,
                rate: t.rate,
            }),
        }
    }

    fn collect_traced_values(
        &self,
        r: &StateComputeResult,
    ) -> Result<ProvenanceGraph, RulesError> {
        let StateDetail::Georgia(d) = &r.detail else {
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
            "Federal AGI carried to Georgia",
        )?;
        let deduction = match d.deduction_kind {
            DeductionKind::Itemized => g.record(
                d.deduction,
                ns.id("deduction"),
                &[&fed.id("deduction")],
                "Federal itemized deductions",
            )?,
            DeductionKind::Standard => g.record(
                d.deduction,
                ns.id("deduction"),
                &[],
                "Georgia standard deduction",
            )?,
        };
        let exemptions = g.record(
            d.dependent_exemptions,
            ns.id("dependent_exemptions"),
            &[],
            format!("{} dependent(s) x exemption", r.dependents),
        )?;
        let full_year = g.record(
            d.full_year_taxable_income,
            ns.id("full_year_taxable_income"),
            &[&agi, &deduction, &exemptions],
            "AGI minus deduction and exemptions, floored at zero",
        )?;
        let taxable = g.record(
            r.state_taxable_income,
            ns.id("taxable_income"),
            &[&full_year],
            format!("Taxable income, {}", ratio_note(&r.apportionment_ratio)),
        )?;
        let tax = g.record(
            r.state_tax_before_credits,
            ns.id("tax"),
            &[&taxable],
            format!("Taxable income x {}", d.rate),
        )?;
        record_balance(&mut g, ns, r, &tax, &[])?;
        Ok(g)
    }
}
