//! Oklahoma Form 511.
//!
//! Federal AGI less the Oklahoma standard deduction and per-person
//! exemptions, bracket schedule by filing status.  Part-year filers prorate
//! tax and credit by resident days.  The child credit is a share of the
//! federal child tax credit, nonrefundable, and unavailable above an AGI
//! limit.

use serde::Serialize;
use ttx_config::OklahomaTables;
use ttx_money::{compute_apportionment_ratio, Cents, Rate};
use ttx_provenance::{Namespace, ProvenanceGraph};
use ttx_schemas::{FederalResult, StateReturnConfig, TaxpayerModel};

use crate::contract::{ratio_note, record_balance, settle};
use crate::review::{result_lines, ResultLine, ReviewLayout, ReviewLine, ReviewSection, Visibility};
use crate::{
    ModuleMeta, RulesError, StateCode, StateComputeResult, StateDetail, StateRulesModule,
};

pub const NAMESPACE: Namespace = Namespace::new("ok511");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OklahomaDetail {
    pub federal_agi: Cents,
    pub standard_deduction: Cents,
    pub exemption_count: i64,
    pub exemptions: Cents,
    pub full_year_tax: Cents,
    pub federal_child_tax_credit: Cents,
    pub child_credit_rate: Rate,
    /// False when federal AGI is over the limit.
    pub child_credit_eligible: bool,
    pub child_credit_applied: Cents,
}

static NODE_LABELS: &[(&str, &str)] = &[
    ("federal_agi", "Federal adjusted gross income (line 1)"),
    ("standard_deduction", "Oklahoma standard deduction (line 10)"),
    ("exemptions", "Exemptions (line 11)"),
    ("taxable_income", "Oklahoma taxable income (line 13)"),
    ("full_year_tax", "Tax on full-year income"),
    ("tax", "Oklahoma income tax (line 14)"),
    ("federal_child_tax_credit", "Federal child tax credit"),
    ("child_credit", "Oklahoma child tax credit (line 16)"),
    ("tax_after_credits", "Tax after credits (line 20)"),
    ("withholding", "Oklahoma income tax withheld (line 24)"),
    ("overpaid", "Refund (line 34)"),
    ("owed", "Tax due (line 39)"),
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
                key: "exemptions",
                label: "Exemptions",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "taxable_income",
                label: "Oklahoma taxable income",
                visibility: Visibility::Always,
            },
        ],
    },
    ReviewSection {
        title: "Tax and credits",
        lines: &[
            ReviewLine {
                key: "full_year_tax",
                label: "Tax before proration",
                visibility: Visibility::PartYearOnly,
            },
            ReviewLine {
                key: "tax",
                label: "Oklahoma tax",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "child_credit",
                label: "Child tax credit",
                visibility: Visibility::HasDependents,
            },
            ReviewLine {
                key: "withholding",
                label: "Oklahoma withholding",
                visibility: Visibility::NonZero,
            },
        ],
    },
];

static RESULT_LINES: [ResultLine; 3] = result_lines("Oklahoma refund", "Oklahoma tax due");

static META: ModuleMeta = ModuleMeta {
    code: StateCode::Ok,
    state_name: "Oklahoma",
    form_label: "Form 511",
    namespace: NAMESPACE,
    node_labels: NODE_LABELS,
    review_layout: ReviewLayout { sections: SECTIONS },
    result_lines: &RESULT_LINES,
};

#[derive(Debug, Clone)]
pub struct OklahomaModule {
    tables: OklahomaTables,
}

impl OklahomaModule {
    pub fn new(tables: OklahomaTables) -> Self {
        Self { tables }
    }
}

impl StateRulesModule for OklahomaModule {
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
        let status = taxpayer.filing_status;
        let ratio = compute_apportionment_ratio(&config.residency, taxpayer.tax_year);

        let federal_agi = federal.agi.floor_zero();
        let standard_deduction = *t.standard_deduction.get(status);
        let exemption_count = taxpayer.exemption_count();
        let exemptions = t.exemption.times(exemption_count);
        let taxable = (federal_agi - standard_deduction - exemptions).floor_zero();
        let full_year_tax = t.brackets.get(status).tax_on(taxable);
        let tax = ratio.apply(full_year_tax);

        let federal_child_tax_credit = federal.child_tax_credit.floor_zero();
        let child_credit_eligible = federal_agi <= t.child_credit_agi_limit;
        let child_credit = if child_credit_eligible {
            ratio.apply(federal_child_tax_credit.apply_rate(t.child_credit_rate))
        } else {
            Cents::ZERO
        };

        let withholding = taxpayer.state_withholding(META.code.as_str());
        let balance = settle(tax, child_credit, Cents::ZERO, withholding);

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
            detail: StateDetail::Oklahoma(OklahomaDetail {
                federal_agi,
                standard_deduction,
                exemption_count,
                exemptions,
                full_year_tax,
                federal_child_tax_credit,
                child_credit_rate: t.child_credit_rate,
                child_credit_eligible,
                child_credit_applied: balance.nonrefundable_applied,
            }),
        }
    }

    fn collect_traced_values(
        &self,
        r: &StateComputeResult,
    ) -> Result<ProvenanceGraph, RulesError> {
        let StateDetail::Oklahoma(d) = &r.detail else {
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
            "Federal AGI carried to Oklahoma",
        )?;
        let deduction = g.record(
            d.standard_deduction,
            ns.id("standard_deduction"),
            &[],
            "Oklahoma standard deduction",
        )?;
        let exemptions = g.record(
            d.exemptions,
            ns.id("exemptions"),
            &[],
            format!("{} exemption(s)", d.exemption_count),
        )?;
        let taxable = g.record(
            r.state_taxable_income,
            ns.id("taxable_income"),
            &[&agi, &deduction, &exemptions],
            "AGI minus deduction and exemptions, floored at zero",
        )?;
        let full_year_tax = g.record(
            d.full_year_tax,
            ns.id("full_year_tax"),
            &[&taxable],
            "Oklahoma bracket schedule",
        )?;
        let tax = g.record(
            r.state_tax_before_credits,
            ns.id("tax"),
            &[&full_year_tax],
            format!("Tax, {}", ratio_note(&r.apportionment_ratio)),
        )?;
        let federal_ctc = g.record(
            d.federal_child_tax_credit,
            ns.id("federal_child_tax_credit"),
            &[&fed.id("child_tax_credit")],
            "Federal child tax credit carried to Oklahoma",
        )?;
        let credit_desc = if d.child_credit_eligible {
            format!(
                "Federal credit x {}, {}; nonrefundable, limited to tax",
                d.child_credit_rate,
                ratio_note(&r.apportionment_ratio)
            )
        } else {
            "Federal AGI over limit; no credit".to_string()
        };
        let credit = g.record(
            d.child_credit_applied,
            ns.id("child_credit"),
            &[&federal_ctc, &agi, &tax],
            credit_desc,
        )?;
        record_balance(&mut g, ns, r, &tax, &[&credit])?;
        Ok(g)
    }
}
