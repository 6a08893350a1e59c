//! Louisiana IT-540.
//!
//! Federal AGI less the Louisiana standard deduction, flat rate.  Part-year
//! filers prorate the tax by resident days.  The Louisiana earned income
//! credit is a share of the federal EITC and is refundable: it applies after
//! the nonrefundable floor and any excess is paid out.

use serde::Serialize;
use ttx_config::LouisianaTables;
use ttx_money::{compute_apportionment_ratio, Cents, Rate};
use ttx_provenance::{Namespace, ProvenanceGraph};
use ttx_schemas::{FederalResult, StateReturnConfig, TaxpayerModel};

use crate::contract::{ratio_note, record_balance, settle};
use crate::review::{result_lines, ResultLine, ReviewLayout, ReviewLine, ReviewSection, Visibility};
use crate::{
    ModuleMeta, RulesError, StateCode, StateComputeResult, StateDetail, StateRulesModule,
};

pub const NAMESPACE: Namespace = Namespace::new("it540");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LouisianaDetail {
    pub federal_agi: Cents,
    pub standard_deduction: Cents,
    pub full_year_taxable_income: Cents,
    pub full_year_tax: Cents,
    pub rate: Rate,
    pub federal_eitc: Cents,
    pub eitc_rate: Rate,
    pub earned_income_credit: Cents,
}

static NODE_LABELS: &[(&str, &str)] = &[
    ("federal_agi", "Federal adjusted gross income (line 7)"),
    ("standard_deduction", "Standard deduction (line 8)"),
    ("taxable_income", "Louisiana taxable income (line 9)"),
    ("full_year_tax", "Tax on full-year income"),
    ("tax", "Louisiana income tax (line 10)"),
    ("federal_eitc", "Federal earned income credit"),
    ("earned_income_credit", "Louisiana earned income credit (refundable)"),
    ("tax_after_credits", "Tax after credits"),
    ("withholding", "Louisiana income tax withheld"),
    ("overpaid", "Refund"),
    ("owed", "Amount you owe"),
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
                key: "standard_deduction",
                label: "Standard deduction",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "taxable_income",
                label: "Louisiana taxable income",
                visibility: Visibility::Always,
            },
        ],
    },
    ReviewSection {
        title: "Tax",
        lines: &[
            ReviewLine {
                key: "full_year_tax",
                label: "Tax before proration",
                visibility: Visibility::PartYearOnly,
            },
            ReviewLine {
                key: "tax",
                label: "Louisiana tax",
                visibility: Visibility::Always,
            },
        ],
    },
    ReviewSection {
        title: "Credits and payments",
        lines: &[
            ReviewLine {
                key: "earned_income_credit",
                label: "Louisiana earned income credit",
                visibility: Visibility::NonZero,
            },
            ReviewLine {
                key: "withholding",
                label: "Louisiana withholding",
                visibility: Visibility::NonZero,
            },
        ],
    },
];

static RESULT_LINES: [ResultLine; 3] = result_lines("Louisiana refund", "Louisiana balance due");

static META: ModuleMeta = ModuleMeta {
    code: StateCode::La,
    state_name: "Louisiana",
    form_label: "IT-540",
    namespace: NAMESPACE,
    node_labels: NODE_LABELS,
    review_layout: ReviewLayout { sections: SECTIONS },
    result_lines: &RESULT_LINES,
};

#[derive(Debug, Clone)]
pub struct LouisianaModule {
    tables: LouisianaTables,
}

impl LouisianaModule {
    pub fn new(tables: LouisianaTables) -> Self {
        Self { tables }
    }
}

impl StateRulesModule for LouisianaModule {
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
        let standard_deduction = *t.standard_deduction.get(taxpayer.filing_status);
        let taxable = (federal_agi - standard_deduction).floor_zero();
        let full_year_tax = taxable.apply_rate(t.rate);
        let tax = ratio.apply(full_year_tax);

        let federal_eitc = federal.earned_income_credit.floor_zero();
        let earned_income_credit = ratio.apply(federal_eitc.apply_rate(t.eitc_rate));

        let withholding = taxpayer.state_withholding(META.code.as_str());
        let balance = settle(tax, Cents::ZERO, earned_income_credit, withholding);

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
            detail: StateDetail::Louisiana(LouisianaDetail {
                federal_agi,
                standard_deduction,
                full_year_taxable_income: taxable,
                full_year_tax,
                rate: t.rate,
                federal_eitc,
                eitc_rate: t.eitc_rate,
                earned_income_credit: balance.refundable,
            }),
        }
    }

    fn collect_traced_values(
        &self,
        r: &StateComputeResult,
    ) -> Result<ProvenanceGraph, RulesError> {
        let StateDetail::Louisiana(d) = &r.detail else {
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
            "Federal AGI carried to Louisiana",
        )?;
        let deduction = g.record(
            d.standard_deduction,
            ns.id("standard_deduction"),
            &[],
            "Louisiana standard deduction",
        )?;
        let taxable = g.record(
            d.full_year_taxable_income,
            ns.id("taxable_income"),
            &[&agi, &deduction],
            "AGI minus standard deduction, floored at zero",
        )?;
        let full_year_tax = g.record(
            d.full_year_tax,
            ns.id("full_year_tax"),
            &[&taxable],
            format!("Taxable income x {}", d.rate),
        )?;
        let tax = g.record(
            r.state_tax_before_credits,
            ns.id("tax"),
            &[&full_year_tax],
            format!("Tax, {}", ratio_note(&r.apportionment_ratio)),
        )?;
        let federal_eitc = g.record(
            d.federal_eitc,
            ns.id("federal_eitc"),
            &[&fed.id("earned_income_credit")],
            "Federal EITC carried to Louisiana",
        )?;
        let eitc = g.record(
            d.earned_income_credit,
            ns.id("earned_income_credit"),
            &[&federal_eitc],
            format!(
                "Federal EITC x {}, {}; refundable",
                d.eitc_rate,
                ratio_note(&r.apportionment_ratio)
            ),
        )?;
        record_balance(&mut g, ns, r, &tax, &[&eitc])?;
        Ok(g)
    }
}
