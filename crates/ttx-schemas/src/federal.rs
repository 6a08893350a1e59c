use serde::{Deserialize, Serialize};
use ttx_money::Cents;

use crate::FilingStatus;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    Standard,
    Itemized,
}

/// Named Form 1040 line amounts.
///
/// Produced once per run by the federal module and shared read-only with
/// every state module.  Every amount is non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalResult {
    pub tax_year: i32,
    pub filing_status: FilingStatus,

    // Income (lines 1-9)
    pub wages: Cents,
    pub taxable_interest: Cents,
    pub ordinary_dividends: Cents,
    pub qualified_dividends: Cents,
    pub business_income: Cents,
    pub retirement_income: Cents,
    pub unemployment_compensation: Cents,
    pub total_income: Cents,

    // Adjustments and AGI (lines 10-11)
    pub se_tax_deduction: Cents,
    pub adjustments: Cents,
    pub agi: Cents,

    // Deductions and taxable income (lines 12-15)
    pub deduction_kind: DeductionKind,
    pub standard_deduction: Cents,
    pub itemized_deductions: Cents,
    pub deduction: Cents,
    pub taxable_income: Cents,

    // Tax and credits (lines 16-24)
    pub income_tax: Cents,
    pub qualifying_children: i64,
    pub child_tax_credit: Cents,
    pub tax_after_credits: Cents,
    pub self_employment_tax: Cents,
    pub total_tax: Cents,

    // Payments and balance (lines 25-37)
    pub withholding: Cents,
    pub earned_income: Cents,
    pub earned_income_credit: Cents,
    pub total_payments: Cents,
    pub refund: Cents,
    pub amount_owed: Cents,
}
