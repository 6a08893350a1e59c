use chrono::NaiveDate;
use ttx_money::{Cents, ResidencyWindow};
use ttx_schemas::{
    DeductionElection, Dependent, FilingStatus, Form1099Int, Form1099Nec, IncomeDocuments, Person,
    StateAmount, StateReturnConfig, TaxpayerModel, W2,
};

/// Fluent `TaxpayerModel` construction for tests.  Defaults: tax year 2025,
/// no income, standard deduction, no state returns.
#[derive(Debug, Clone)]
pub struct TaxpayerBuilder {
    model: TaxpayerModel,
}

impl TaxpayerBuilder {
    pub fn new(filing_status: FilingStatus) -> Self {
        Self {
            model: TaxpayerModel {
                tax_year: 2025,
                filing_status,
                taxpayer: Person::new("Test", "Filer"),
                spouse: None,
                dependents: Vec::new(),
                income: IncomeDocuments::default(),
                deduction: DeductionElection::Standard,
                prior_year_state: None,
                state_returns: Vec::new(),
            },
        }
    }

    pub fn single() -> Self {
        Self::new(FilingStatus::Single)
    }

    pub fn married_joint() -> Self {
        Self::new(FilingStatus::MarriedFilingJointly).spouse("Test", "Spouse")
    }

    pub fn tax_year(mut self, tax_year: i32) -> Self {
        self.model.tax_year = tax_year;
        self
    }

    pub fn spouse(mut self, first: &str, last: &str) -> Self {
        self.model.spouse = Some(Person::new(first, last));
        self
    }

    /// A child living in the home all year.  `born` is `YYYY-MM-DD`.
    pub fn child(mut self, first: &str, born: &str) -> Self {
        let person = Person {
            date_of_birth: NaiveDate::parse_from_str(born, "%Y-%m-%d").ok(),
            ..Person::new(first, "Filer")
        };
        self.model.dependents.push(Dependent {
            person,
            relationship: "child".to_string(),
            months_in_home: 12,
        });
        self
    }

    pub fn w2(mut self, w2: W2) -> Self {
        self.model.income.w2s.push(w2);
        self
    }

    pub fn interest(mut self, payer: &str, cents: i64) -> Self {
        self.model.income.interest.push(Form1099Int {
            payer: payer.to_string(),
            interest: Cents::new(cents),
            us_treasury_interest: Cents::ZERO,
            federal_withholding: Cents::ZERO,
            state_lines: Vec::new(),
        });
        self
    }

    pub fn self_employment(mut self, payer: &str, cents: i64) -> Self {
        self.model.income.nonemployee.push(Form1099Nec {
            payer: payer.to_string(),
            nonemployee_compensation: Cents::new(cents),
            federal_withholding: Cents::ZERO,
            state_lines: Vec::new(),
        });
        self
    }

    pub fn itemized(mut self, cents: i64) -> Self {
        self.model.deduction = DeductionElection::Itemized {
            amount: Cents::new(cents),
        };
        self
    }

    pub fn state(mut self, code: &str, residency: ResidencyWindow) -> Self {
        self.model
            .state_returns
            .push(StateReturnConfig::new(code, residency));
        self
    }

    pub fn full_year(self, code: &str) -> Self {
        self.state(code, ResidencyWindow::full_year())
    }

    pub fn build(self) -> TaxpayerModel {
        self.model
    }
}

#[derive(Debug, Clone)]
pub struct W2Builder {
    w2: W2,
}

impl W2Builder {
    pub fn new(employer: &str, wages_cents: i64) -> Self {
        Self {
            w2: W2 {
                employer: employer.to_string(),
                wages: Cents::new(wages_cents),
                federal_withholding: Cents::ZERO,
                state_lines: Vec::new(),
            },
        }
    }

    pub fn federal_withholding(mut self, cents: i64) -> Self {
        self.w2.federal_withholding = Cents::new(cents);
        self
    }

    /// Boxes 15-17 for one state.
    pub fn state(mut self, code: &str, income_cents: i64, withholding_cents: i64) -> Self {
        self.w2.state_lines.push(StateAmount {
            state_code: code.to_string(),
            state_income: Cents::new(income_cents),
            state_withholding: Cents::new(withholding_cents),
        });
        self
    }

    pub fn build(self) -> W2 {
        self.w2
    }
}
