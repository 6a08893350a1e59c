use ttx_config::{ChildTaxCreditTables, FederalTables, SelfEmploymentTables};
use ttx_money::Cents;
use ttx_schemas::{
    DeductionElection, DeductionKind, FederalResult, FilingStatus, IncomeDocuments, TaxpayerModel,
};

/// Compute Form 1040 line amounts.
///
/// Total for every well-formed model: each floor clamps at zero, so no line
/// in the result is negative.
pub fn compute_federal(taxpayer: &TaxpayerModel, tables: &FederalTables) -> FederalResult {
    let status = taxpayer.filing_status;
    let income = IncomeLines::collect(&taxpayer.income);

    let total_income = income.total();

    let se_tax = self_employment_tax(income.business, income.wages, &tables.self_employment);
    let se_tax_deduction = se_tax.apply_rate(tables.self_employment.deductible_share);
    let adjustments = se_tax_deduction;
    let agi = (total_income - adjustments).floor_zero();

    let standard_deduction = *tables.standard_deduction.get(status);
    let itemized_deductions = match &taxpayer.deduction {
        DeductionElection::Standard => Cents::ZERO,
        DeductionElection::Itemized { amount } => amount.floor_zero(),
    };
    let (deduction_kind, deduction) = if itemized_deductions > standard_deduction {
        (DeductionKind::Itemized, itemized_deductions)
    } else {
        (DeductionKind::Standard, standard_deduction)
    };
    let taxable_income = (agi - deduction).floor_zero();

    let income_tax = tables.brackets.get(status).tax_on(taxable_income);

    let qualifying_children = taxpayer.qualifying_children();
    let child_tax_credit =
        child_tax_credit(qualifying_children, agi, status, &tables.child_tax_credit)
            .min(income_tax);
    let tax_after_credits = (income_tax - child_tax_credit).floor_zero();
    let total_tax = tax_after_credits + se_tax;

    let withholding = taxpayer.total_federal_withholding();
    let earned_income = income.wages + (income.business - se_tax_deduction).floor_zero();
    let earned_income_credit = earned_income_credit(
        earned_income,
        agi,
        income.investment(),
        qualifying_children,
        status,
        tables,
    );
    let total_payments = withholding + earned_income_credit;

    let refund = (total_payments - total_tax).floor_zero();
    let amount_owed = (total_tax - total_payments).floor_zero();

    tracing::debug!(
        agi = %agi,
        taxable_income = %taxable_income,
        total_tax = %total_tax,
        "federal return computed"
    );

    FederalResult {
        tax_year: taxpayer.tax_year,
        filing_status: status,
        wages: income.wages,
        taxable_interest: income.interest,
        ordinary_dividends: income.ordinary_dividends,
        qualified_dividends: income.qualified_dividends,
        business_income: income.business,
        retirement_income: income.retirement,
        unemployment_compensation: income.unemployment,
        total_income,
        se_tax_deduction,
        adjustments,
        agi,
        deduction_kind,
        standard_deduction,
        itemized_deductions,
        deduction,
        taxable_income,
        income_tax,
        qualifying_children,
        child_tax_credit,
        tax_after_credits,
        self_employment_tax: se_tax,
        total_tax,
        withholding,
        earned_income,
        earned_income_credit,
        total_payments,
        refund,
        amount_owed,
    }
}

/// Document totals, each floored at zero.
struct IncomeLines {
    wages: Cents,
    interest: Cents,
    ordinary_dividends: Cents,
    qualified_dividends: Cents,
    business: Cents,
    retirement: Cents,
    unemployment: Cents,
}

impl IncomeLines {
    fn collect(docs: &IncomeDocuments) -> Self {
        let ordinary_dividends = floored_sum(docs.dividends.iter().map(|d| d.ordinary_dividends));
        Self {
            wages: floored_sum(docs.w2s.iter().map(|w| w.wages)),
            interest: floored_sum(
                docs.interest
                    .iter()
                    .map(|d| d.interest + d.us_treasury_interest),
            ),
            ordinary_dividends,
            qualified_dividends: floored_sum(docs.dividends.iter().map(|d| d.qualified_dividends))
                .min(ordinary_dividends),
            business: floored_sum(docs.nonemployee.iter().map(|d| d.nonemployee_compensation)),
            retirement: floored_sum(docs.retirement.iter().map(|d| d.taxable_amount)),
            unemployment: floored_sum(docs.government.iter().map(|d| d.unemployment_compensation)),
        }
    }

    fn total(&self) -> Cents {
        self.wages
            + self.interest
            + self.ordinary_dividends
            + self.business
            + self.retirement
            + self.unemployment
    }

    fn investment(&self) -> Cents {
        self.interest + self.ordinary_dividends
    }
}

fn floored_sum(amounts: impl Iterator<Item = Cents>) -> Cents {
    amounts.sum::<Cents>().floor_zero()
}

/// Schedule SE.  Social security stops at the wage base less W-2 wages.
fn self_employment_tax(business: Cents, wages: Cents, t: &SelfEmploymentTables) -> Cents {
    let net_earnings = business.floor_zero().apply_rate(t.earnings_factor);
    if net_earnings < t.minimum_earnings {
        return Cents::ZERO;
    }
    let ss_room = (t.social_security_wage_base - wages).floor_zero();
    let social_security = net_earnings.min(ss_room).apply_rate(t.social_security_rate);
    let medicare = net_earnings.apply_rate(t.medicare_rate);
    social_security + medicare
}

/// Credit before the nonrefundable limit.  Reduced per started step of AGI
/// over the threshold.
fn child_tax_credit(
    children: i64,
    agi: Cents,
    status: FilingStatus,
    t: &ChildTaxCreditTables,
) -> Cents {
    if children <= 0 {
        return Cents::ZERO;
    }
    let full = t.per_child.times(children);
    let excess = (agi - *t.phaseout_threshold.get(status)).floor_zero();
    let step = t.phaseout_step.raw().max(1);
    let steps = excess.raw() / step + i64::from(excess.raw() % step != 0);
    (full - t.phaseout_per_step.times(steps)).floor_zero()
}

fn earned_income_credit(
    earned_income: Cents,
    agi: Cents,
    investment_income: Cents,
    children: i64,
    status: FilingStatus,
    tables: &FederalTables,
) -> Cents {
    let eitc = &tables.earned_income_credit;
    if status == FilingStatus::MarriedFilingSeparately
        || investment_income > eitc.investment_income_limit
        || earned_income.is_zero()
    {
        return Cents::ZERO;
    }
    eitc.schedule_for(children)
        .credit(earned_income, agi, status.is_joint())
}
