//! Utah TC-40.
//!
//! Flat tax on federal AGI.  The taxpayer tax credit is a rate applied to
//! the federal deduction plus a per-dependent exemption, phased out above a
//! filing-status base.  Part-year filers prorate tax and credit by resident
//! days.

use serde::Serialize;
use ttx_config::UtahTables;
use ttx_money::{compute_apportionment_ratio, Cents, Rate};
use ttx_provenance::{Namespace, ProvenanceGraph};
use ttx_schemas::{FederalResult, StateReturnConfig, TaxpayerModel};

use crate::contract::{ratio_note, record_balance, settle};
use crate::review::{result_lines, ResultLine, ReviewLayout, ReviewLine, ReviewSection, Visibility};
use crate::{
    ModuleMeta, RulesError, StateCode, StateComputeResult, StateDetail, StateRulesModule,
};

pub const NAMESPACE: Namespace = Namespace::new("tc40");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtahDetail {
    pub federal_agi: Cents,
    pub rate: Rate,
    pub full_year_tax: Cents,
    pub federal_deduction: Cents,
    pub personal_exemptions: Cents,
    pub initial_credit: Cents,
    pub phaseout_base: Cents,
    pub credit_phaseout: Cents,
    pub full_year_credit: Cents,
    pub credit_applied: Cents,
}

static NODE_LABELS: &[(&str, &str)] = &[
    ("federal_agi", "Federal adjusted gross income (line 4)"),
    ("full_year_tax", "Utah tax on income (line 10)"),
    ("tax", "Utah tax after proration"),
    ("federal_deduction", "Federal standard or itemized deduction (line 11)"),
    ("personal_exemptions", "Personal exemptions (line 12)"),
    ("initial_credit", "Initial credit before phaseout (line 14)"),
    ("credit_phaseout", "Credit phaseout (line 17)"),
    ("full_year_credit", "Taxpayer tax credit (line 19)"),
    ("taxpayer_credit", "Taxpayer tax credit applied"),
    ("tax_after_credits", "Tax after credits (line 22)"),
    ("withholding", "Utah income tax withheld (line 31)"),
    ("overpaid", "Refund (line 38)"),
    ("owed", "Tax due (line 39)"),
];

static SECTIONS: &[ReviewSection] = &[
    ReviewSection {
        title: "Tax",
        lines: &[
            ReviewLine {
                key: "federal_agi",
                label: "Federal AGI",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "full_year_tax",
                label: "Utah tax (full year)",
                visibility: Visibility::PartYearOnly,
            },
            ReviewLine {
                key: "tax",
                label: "Utah tax",
                visibility: Visibility::Always,
            },
        ],
    },
    ReviewSection {
        title: "Taxpayer tax credit",
        lines: &[
            ReviewLine {
                key: "personal_exemptions",
                label: "Personal exemptions",
                visibility: Visibility::HasDependents,
            },
            ReviewLine {
                key: "initial_credit",
                label: "Initial credit",
                visibility: Visibility::Always,
            },
            ReviewLine {
                key: "credit_phaseout",
                label: "Phaseout",
                visibility: Visibility::NonZero,
            },
            ReviewLine {
                key: "taxpayer_credit",
                label: "Credit applied",
                visibility: Visibility::Always,
            },
        ],
    },
    ReviewSection {
        title: "Payments",
        lines: &[ReviewLine {
            key: "withholding",
            label: "Utah withholding",
            visibility: Visibility::NonZero,
        }],
    },
];

static RESULT_LINES: [ResultLine; 3] = result_lines("Utah refund", "Utah tax due");

static META: ModuleMeta = ModuleMeta {
    code: StateCode::Ut,
    state_name: "Utah",
    form_label: "TC-40",
    namespace: NAMESPACE,
    node_labels: NODE_LABELS,
    review_layout: ReviewLayout { sections: SECTIONS },
    result_lines: &RESULT_LINES,
};

#[derive(Debug, Clone)]
pub struct UtahModule {
    tables: UtahTables,
}

impl UtahModule {
    pub fn new(tables: UtahTables) -> Self {
        Self { tables }
    }
}

impl StateRulesModule for UtahModule {
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
        let full_year_tax = federal_agi.apply_rate(t.rate);

        let dependents = taxpayer.dependent_count();
        let federal_deduction = federal.deduction.floor_zero();
        let personal_exemptions = t.personal_exemption.times(dependents);
        let initial_credit = (federal_deduction + personal_exemptions).apply_rate(t.credit_rate);
        let phaseout_base = *t.phaseout_base.get(taxpayer.filing_status);
        let credit_phaseout = (federal_agi - phaseout_base)
            .floor_zero()
            .apply_rate(t.phaseout_rate);
        let full_year_credit = (initial_credit - credit_phaseout).floor_zero();

        let tax = ratio.apply(full_year_tax);
        let credit = ratio.apply(full_year_credit);
        let withholding = taxpayer.state_withholding(META.code.as_str());
        let balance = settle(tax, credit, Cents::ZERO, withholding);

        StateComputeResult {
            state_code: META.code,
            form_label: META.form_label,
            residency_type: config.residency.residency_type,
            state_agi: federal_agi,
            state_taxable_income: federal_agi,
            state_tax_before_credits: tax,
            total_credits: balance.total_credits,
            tax_after_credits: balance.tax_after_credits,
            state_withholding: withholding,
            apportionment_ratio: ratio,
            overpaid: balance.overpaid,
            owed: balance.owed,
            dependents,
            detail: StateDetail::Utah(UtahDetail {
                federal_agi,
                rate: t.rate,
                full_year_tax,
                federal_deduction,
                personal_exemptions,
                initial_credit,
                phaseout_base,
                credit_phaseout,
                full_year_credit,
                credit_applied: balance.nonrefundable_applied,
            }),
        }
    }

    fn collect_traced_values(
        &self,
        r: &StateComputeResult,
    ) -> Result<ProvenanceGraph, RulesError> {
        let StateDetail::Utah(d) = &r.detail else {
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
            "Federal AGI carried to Utah",
        )?;
        let full_year_tax = g.record(
            d.full_year_tax,
            ns.id("full_year_tax"),
            &[&agi],
            format!("AGI x {}", d.rate),
        )?;
        let tax = g.record(
            r.state_tax_before_credits,
            ns.id("tax"),
            &[&full_year_tax],
            format!("Tax, {}", ratio_note(&r.apportionment_ratio)),
        )?;
        let deduction = g.record(
            d.federal_deduction,
            ns.id("federal_deduction"),
            &[&fed.id("deduction")],
            "Federal deduction carried to Utah",
        )?;
        let exemptions = g.record(
            d.personal_exemptions,
            ns.id("personal_exemptions"),
            &[],
            format!("{} dependent(s) x exemption", r.dependents),
        )?;
        let initial = g.record(
            d.initial_credit,
            ns.id("initial_credit"),
            &[&deduction, &exemptions],
            "Credit rate x (federal deduction + exemptions)",
        )?;
        let phaseout = g.record(
            d.credit_phaseout,
            ns.id("credit_phaseout"),
            &[&agi],
            format!("AGI over {} x phaseout rate", d.phaseout_base),
        )?;
        let full_year_credit = g.record(
            d.full_year_credit,
            ns.id("full_year_credit"),
            &[&initial, &phaseout],
            "Initial credit minus phaseout, floored at zero",
        )?;
        let credit = g.record(
            d.credit_applied,
            ns.id("taxpayer_credit"),
            &[&full_year_credit, &tax],
            format!(
                "Credit, {}; nonrefundable, limited to tax",
                ratio_note(&r.apportionment_ratio)
            ),
        )?;
        record_balance(&mut g, ns, r, &tax, &[&credit])?;
        Ok(g)
    }
}
