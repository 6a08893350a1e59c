use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ttx_money::{Cents, ResidencyWindow};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
    QualifyingSurvivingSpouse,
}

impl FilingStatus {
    pub fn is_joint(&self) -> bool {
        matches!(self, FilingStatus::MarriedFilingJointly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedFilingJointly => "married_filing_jointly",
            FilingStatus::MarriedFilingSeparately => "married_filing_separately",
            FilingStatus::HeadOfHousehold => "head_of_household",
            FilingStatus::QualifyingSurvivingSpouse => "qualifying_surviving_spouse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: None,
        }
    }

    /// Age on December 31 of `tax_year`.
    pub fn age_at_year_end(&self, tax_year: i32) -> Option<i32> {
        let dob = self.date_of_birth?;
        Some((tax_year - dob.year()).max(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    pub person: Person,
    pub relationship: String,
    /// Months the dependent lived with the filer during the year.
    #[serde(default = "full_year_months")]
    pub months_in_home: u8,
}

fn full_year_months() -> u8 {
    12
}

impl Dependent {
    /// Under 17 at year end and in the home more than half the year.
    pub fn is_qualifying_child(&self, tax_year: i32) -> bool {
        let young = self
            .person
            .age_at_year_end(tax_year)
            .map(|a| a < 17)
            .unwrap_or(false);
        young && self.months_in_home > 6
    }
}

// ---------------------------------------------------------------------------
// Income documents
// ---------------------------------------------------------------------------

/// Per-state box group (W-2 boxes 15-17, 1099 state boxes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAmount {
    pub state_code: String,
    #[serde(default)]
    pub state_income: Cents,
    #[serde(default)]
    pub state_withholding: Cents,
}

/// Common surface of every income document.
pub trait IncomeDocument {
    fn federal_withholding(&self) -> Cents;
    fn state_lines(&self) -> &[StateAmount];

    fn state_withholding(&self, state_code: &str) -> Cents {
        self.state_lines()
            .iter()
            .filter(|l| l.state_code.eq_ignore_ascii_case(state_code))
            .map(|l| l.state_withholding)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct W2 {
    pub employer: String,
    /// Box 1.
    pub wages: Cents,
    /// Box 2.
    #[serde(default)]
    pub federal_withholding: Cents,
    #[serde(default)]
    pub state_lines: Vec<StateAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form1099Int {
    pub payer: String,
    /// Box 1.
    pub interest: Cents,
    /// Box 3.
    #[serde(default)]
    pub us_treasury_interest: Cents,
    #[serde(default)]
    pub federal_withholding: Cents,
    #[serde(default)]
    pub state_lines: Vec<StateAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form1099Div {
    pub payer: String,
    /// Box 1a.
    pub ordinary_dividends: Cents,
    /// Box 1b.
    #[serde(default)]
    pub qualified_dividends: Cents,
    #[serde(default)]
    pub federal_withholding: Cents,
    #[serde(default)]
    pub state_lines: Vec<StateAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form1099Nec {
    pub payer: String,
    /// Box 1.
    pub nonemployee_compensation: Cents,
    #[serde(default)]
    pub federal_withholding: Cents,
    #[serde(default)]
    pub state_lines: Vec<StateAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form1099R {
    pub payer: String,
    /// Box 1.
    pub gross_distribution: Cents,
    /// Box 2a.
    pub taxable_amount: Cents,
    #[serde(default)]
    pub federal_withholding: Cents,
    #[serde(default)]
    pub state_lines: Vec<StateAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form1099G {
    pub payer: String,
    /// Box 1.
    pub unemployment_compensation: Cents,
    #[serde(default)]
    pub federal_withholding: Cents,
    #[serde(default)]
    pub state_lines: Vec<StateAmount>,
}

macro_rules! impl_income_document {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IncomeDocument for $ty {
                fn federal_withholding(&self) -> Cents {
                    self.federal_withholding
                }
                fn state_lines(&self) -> &[StateAmount] {
                    &self.state_lines
                }
            }
        )*
    };
}

impl_income_document!(W2, Form1099Int, Form1099Div, Form1099Nec, Form1099R, Form1099G);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeDocuments {
    #[serde(default)]
    pub w2s: Vec<W2>,
    #[serde(default)]
    pub interest: Vec<Form1099Int>,
    #[serde(default)]
    pub dividends: Vec<Form1099Div>,
    #[serde(default)]
    pub nonemployee: Vec<Form1099Nec>,
    #[serde(default)]
    pub retirement: Vec<Form1099R>,
    #[serde(default)]
    pub government: Vec<Form1099G>,
}

impl IncomeDocuments {
    /// Every document behind the common trait, in a fixed order.
    pub fn all(&self) -> impl Iterator<Item = &dyn IncomeDocument> {
        let w2s = self.w2s.iter().map(|d| d as &dyn IncomeDocument);
        let ints = self.interest.iter().map(|d| d as &dyn IncomeDocument);
        let divs = self.dividends.iter().map(|d| d as &dyn IncomeDocument);
        let necs = self.nonemployee.iter().map(|d| d as &dyn IncomeDocument);
        let rets = self.retirement.iter().map(|d| d as &dyn IncomeDocument);
        let govs = self.government.iter().map(|d| d as &dyn IncomeDocument);
        w2s.chain(ints).chain(divs).chain(necs).chain(rets).chain(govs)
    }
}

// ---------------------------------------------------------------------------
// Elections and state requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeductionElection {
    #[default]
    Standard,
    Itemized {
        amount: Cents,
    },
}

/// One requested state return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReturnConfig {
    pub state_code: String,
    #[serde(flatten)]
    pub residency: ResidencyWindow,
}

impl StateReturnConfig {
    pub fn new(state_code: impl Into<String>, residency: ResidencyWindow) -> Self {
        Self {
            state_code: state_code.into(),
            residency,
        }
    }
}

// ---------------------------------------------------------------------------
// TaxpayerModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxpayerModel {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    pub taxpayer: Person,
    #[serde(default)]
    pub spouse: Option<Person>,
    #[serde(default)]
    pub dependents: Vec<Dependent>,
    #[serde(default)]
    pub income: IncomeDocuments,
    #[serde(default)]
    pub deduction: DeductionElection,
    #[serde(default)]
    pub prior_year_state: Option<String>,
    #[serde(default)]
    pub state_returns: Vec<StateReturnConfig>,
}

impl TaxpayerModel {
    pub fn total_wages(&self) -> Cents {
        self.income.w2s.iter().map(|w| w.wages).sum()
    }

    pub fn total_federal_withholding(&self) -> Cents {
        self.income
            .all()
            .map(|d| d.federal_withholding())
            .sum::<Cents>()
            .floor_zero()
    }

    /// State income tax withheld for `state_code` across every document,
    /// floored at zero.  A net negative correction is not a payment.
    pub fn state_withholding(&self, state_code: &str) -> Cents {
        self.income
            .all()
            .map(|d| d.state_withholding(state_code))
            .sum::<Cents>()
            .floor_zero()
    }

    pub fn dependent_count(&self) -> i64 {
        self.dependents.len() as i64
    }

    pub fn qualifying_children(&self) -> i64 {
        self.dependents
            .iter()
            .filter(|d| d.is_qualifying_child(self.tax_year))
            .count() as i64
    }

    /// Personal exemptions: filer, spouse on a joint return, dependents.
    pub fn exemption_count(&self) -> i64 {
        let spouse = i64::from(self.filing_status.is_joint() && self.spouse.is_some());
        1 + spouse + self.dependent_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(born: &str) -> Dependent {
        Dependent {
            person: Person {
                date_of_birth: Some(born.parse().unwrap()),
                ..Person::new("Kid", "Doe")
            },
            relationship: "son".to_string(),
            months_in_home: 12,
        }
    }

    #[test]
    fn qualifying_child_age_cutoff() {
        assert!(child("2010-06-01").is_qualifying_child(2025));
        assert!(!child("2008-01-01").is_qualifying_child(2025));
    }

    #[test]
    fn qualifying_child_requires_residence() {
        let mut c = child("2015-01-01");
        c.months_in_home = 6;
        assert!(!c.is_qualifying_child(2025));
    }

    #[test]
    fn state_withholding_sums_matching_lines_case_insensitively() {
        let model: TaxpayerModel = serde_json::from_value(serde_json::json!({
            "tax_year": 2025,
            "filing_status": "single",
            "taxpayer": { "first_name": "A", "last_name": "B" },
            "income": {
                "w2s": [
                    { "employer": "X", "wages": 100, "state_lines": [
                        { "state_code": "GA", "state_withholding": 7 },
                        { "state_code": "la", "state_withholding": 3 }
                    ] }
                ],
                "government": [
                    { "payer": "DOL", "unemployment_compensation": 50,
                      "state_lines": [ { "state_code": "ga", "state_withholding": 2 } ] }
                ]
            },
            "state_returns": [
                { "state_code": "GA", "residency_type": "part-year", "move_in_date": "2025-07-01" }
            ]
        }))
        .unwrap();

        assert_eq!(model.state_withholding("GA"), Cents::new(9));
        assert_eq!(model.state_withholding("LA"), Cents::new(3));
        assert_eq!(model.state_withholding("UT"), Cents::ZERO);
        assert_eq!(model.deduction, DeductionElection::Standard);
        assert_eq!(
            model.state_returns[0].residency.move_in_date.as_deref(),
            Some("2025-07-01")
        );
    }

    #[test]
    fn exemption_count_counts_spouse_only_on_joint_return() {
        let mut model = TaxpayerModel {
            tax_year: 2025,
            filing_status: FilingStatus::MarriedFilingJointly,
            taxpayer: Person::new("A", "B"),
            spouse: Some(Person::new("C", "B")),
            dependents: vec![child("2015-01-01")],
            income: IncomeDocuments::default(),
            deduction: DeductionElection::Standard,
            prior_year_state: None,
            state_returns: Vec::new(),
        };
        assert_eq!(model.exemption_count(), 3);
        model.filing_status = FilingStatus::MarriedFilingSeparately;
        assert_eq!(model.exemption_count(), 2);
    }

    #[test]
    fn itemized_election_deserializes_tagged() {
        let d: DeductionElection =
            serde_json::from_str(r#"{"kind":"itemized","amount":2500000}"#).unwrap();
        assert_eq!(
            d,
            DeductionElection::Itemized {
                amount: Cents::new(2_500_000)
            }
        );
    }

    #[test]
    fn net_negative_withholding_is_floored_at_zero() {
        let model: TaxpayerModel = serde_json::from_value(serde_json::json!({
            "tax_year": 2025,
            "filing_status": "single",
            "taxpayer": { "first_name": "A", "last_name": "B" },
            "income": {
                "w2s": [
                    { "employer": "X", "wages": 100, "federal_withholding": -40,
                      "state_lines": [
                        { "state_code": "GA", "state_withholding": -12345 },
                        { "state_code": "SC", "state_withholding": -10 }
                    ] },
                    { "employer": "Y", "wages": 100, "federal_withholding": 25,
                      "state_lines": [ { "state_code": "SC", "state_withholding": 30 } ] }
                ]
            }
        }))
        .unwrap();

        assert_eq!(model.state_withholding("GA"), Cents::ZERO);
        assert_eq!(model.state_withholding("SC"), Cents::new(20));
        assert_eq!(model.total_federal_withholding(), Cents::ZERO);
    }
}
