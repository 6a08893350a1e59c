//! South Carolina SC1040.
//!
//! Starts from federal taxable income, less a per-dependent deduction.
//! Part-year filers apportion the base by resident days before the bracket
//! schedule runs.  The South Carolina EITC is a multiple of the federal
//! credit and is nonrefundable: it stops at zero tax.

use serde::Serialize;
use ttx_config::SouthCarolinaTables;
use ttx_money::{compute_apportionment_ratio, Cents, Rate};
use ttx_provenance::{Namespace, ProvenanceGraph};
use ttx_schemas::{FederalResult, StateReturnConfig, TaxpayerModel};

use crate::contract::{ratio_note, record_balance, settle};
use crate::review::{result_lines, ResultLine, ReviewLayout, ReviewLine, ReviewSection, Visibility};
use crate::{
    ModuleMeta, RulesError, StateCode, StateComputeResult, StateDetail, StateRulesModule,
};

pub const NAMESPACE: Namespace = Namespace::new("sc1040");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SouthCarolinaDetail {
    pub federal_taxable_income: Cents,
    pub dependent_deduction: Cents,
    pub full_year_taxable_income: Cents,
    pub federal_eitc: Cents,
    pub eitc_rate: Rate,
    /// Before the nonrefundable cap.
    pub eitc_allowed: Cents,
    pub eitc_applied: Cents,
}

static NODE_LABELS: &[(&str, &str)] = &[
    ("federal_taxable_income", "Federal taxable income (line 1)"),
    ("dependent_deduction", "Dependent deduction (line w)"),
    ("full_year_taxable_income", "Taxable income before apportionment"),
    ("taxable_income", "South Carolina income subject to tax (line 5)"),
    ("tax", "Tax (line 6)"),
    ("federal_eitc", "Federal earned income credit"),
    ("earned_income_credit", "SC earned income tax credit (nonrefundable)"),
    ("tax_after_credits", "Tax after nonrefundable credits (line 16)"),
    ("withholding", "South Carolina income tax withheld (line 17)"),
    ("overpaid", "Refund (line 29)"),
    ("owed", "Balance due (line 34)"),
];

static SECTIONS: &[ReviewSection] = &[
    ReviewSection {
        title: "Income",
        lines: &[
            ReviewLine {
                key: "federal_taxable_income",
                label: "Federal taxable income",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "dependent_deduction",
                label: "Dependent deduction",
                visibility: Visibility::HasDependents,
            },
            ReviewLine {
                key: "taxable_income",
                label: "South Carolina taxable income",
                visibility: Visibility::Always,
            },
        ],
    },
    ReviewSection {
        title: "Tax and credits",
        lines: &[
            ReviewLine {
                key: "tax",
                label: "Tax",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "earned_income_credit",
                label: "SC earned income tax credit",
                visibility: Visibility::NonZero,
            },
            ReviewLine {
                key: "withholding",
                label: "South Carolina withholding",
                visibility: Visibility::NonZero,
            },
        ],
    },
];

static RESULT_LINES: [ResultLine; 3] =
    result_lines("South Carolina refund", "South Carolina balance due");

static META: ModuleMeta = ModuleMeta {
    code: StateCode::Sc,
    state_name: "South Carolina",
    form_label: "SC1040",
    namespace: NAMESPACE,
    node_labels: NODE_LABELS,
    review_layout: ReviewLayout { sections: SECTIONS },
    result_lines: &RESULT_LINES,
};

#[derive(Debug, Clone)]
pub struct SouthCarolinaModule {
    tables: SouthCarolinaTables,
}

impl SouthCarolinaModule {
    pub fn new(tables: SouthCarolinaTables) -> Self {
        Self { tables }
    }
}

impl StateRulesModule for SouthCarolinaModule {
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

        let federal_taxable_income = federal.taxable_income.floor_zero();
        let dependents = taxpayer.dependent_count();
        let dependent_deduction = t.dependent_deduction.times(dependents);
        let full_year_taxable_income = (federal_taxable_income - dependent_deduction).floor_zero();

        let taxable = ratio.apply(full_year_taxable_income);
        let tax = t.brackets.tax_on(taxable);

        let federal_eitc = federal.earned_income_credit.floor_zero();
        let eitc_allowed = ratio.apply(federal_eitc.apply_rate(t.eitc_rate));

        let withholding = taxpayer.state_withholding(META.code.as_str());
        let balance = settle(tax, eitc_allowed, Cents::ZERO, withholding);

        StateComputeResult {
            state_code: META.code,
            form_label: META.form_label,
            residency_type: config.residency.residency_type,
            state_agi: federal.agi.floor_zero(),
            state_taxable_income: taxable,
            state_tax_before_credits: tax,
            total_credits: balance.total_credits,
            tax_after_credits: balance.tax_after_credits,
            state_withholding: withholding,
            apportionment_ratio: ratio,
            overpaid: balance.overpaid,
            owed: balance.owed,
            dependents,
            detail: StateDetail::SouthCarolina(SouthCarolinaDetail {
                federal_taxable_income,
                dependent_deduction,
                full_year_taxable_income,
                federal_eitc,
                eitc_rate: t.eitc_rate,
                eitc_allowed,
                eitc_applied: balance.nonrefundable_applied,
            }),
        }
    }

    fn collect_traced_values(
        &self,
        r: &StateComputeResult,
    ) -> Result<ProvenanceGraph, RulesError> {
        let StateDetail::SouthCarolina(d) = &r.detail else {
            return Err(RulesError::DetailMismatch {
                module: META.code,
                found: r.detail.code(),
            });
        };
        let fed = ttx_federal::NAMESPACE;
        let ns = NAMESPACE;
        let mut g = ProvenanceGraph::scoped(ns).with_upstream(fed);

        let base = g.record(
            d.federal_taxable_income,
            ns.id("federal_taxable_income"),
            &[&fed.id("taxable_income")],
            "Federal taxable income carried to South Carolina",
        )?;
        let dependents = g.record(
            d.dependent_deduction,
            ns.id("dependent_deduction"),
            &[],
            format!("{} dependent(s) x deduction", r.dependents),
        )?;
        let full_year = g.record(
            d.full_year_taxable_income,
            ns.id("full_year_taxable_income"),
            &[&base, &dependents],
            "Federal taxable income minus dependent deduction, floored at zero",
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
            "South Carolina bracket schedule",
        )?;
        let federal_eitc = g.record(
            d.federal_eitc,
            ns.id("federal_eitc"),
            &[&fed.id("earned_income_credit")],
            "Federal EITC carried to South Carolina",
        )?;
        let eitc = g.record(
            d.eitc_applied,
            ns.id("earned_income_credit"),
            &[&federal_eitc, &tax],
            format!(
                "Federal EITC x {}, {}; nonrefundable, limited to tax",
                d.eitc_rate,
                ratio_note(&r.apportionment_ratio)
            ),
        )?;
        record_balance(&mut g, ns, r, &tax, &[&eitc])?;
        Ok(g)
    }
}
