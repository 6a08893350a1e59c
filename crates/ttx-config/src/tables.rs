//! Typed view over the merged tax-table document.
//!
//! Amounts are integer cents; rates are decimal strings parsed exactly.
//! Every state block is optional at this layer.  Whether a missing block is
//! an error is decided where modules are registered.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ttx_money::{Cents, Rate};
use ttx_schemas::FilingStatus;

use crate::{load_layered_yaml_from_strings, LoadedConfig, BUILTIN_TABLES_YAML};

// ---------------------------------------------------------------------------
// Shared shapes
// ---------------------------------------------------------------------------

/// One value per filing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByFilingStatus<T> {
    pub single: T,
    pub married_filing_jointly: T,
    pub married_filing_separately: T,
    pub head_of_household: T,
    pub qualifying_surviving_spouse: T,
}

impl<T> ByFilingStatus<T> {
    pub fn get(&self, status: FilingStatus) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedFilingJointly => &self.married_filing_jointly,
            FilingStatus::MarriedFilingSeparately => &self.married_filing_separately,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
            FilingStatus::QualifyingSurvivingSpouse => &self.qualifying_surviving_spouse,
        }
    }
}

impl<T: Clone> ByFilingStatus<T> {
    pub fn uniform(value: T) -> Self {
        Self {
            single: value.clone(),
            married_filing_jointly: value.clone(),
            married_filing_separately: value.clone(),
            head_of_household: value.clone(),
            qualifying_surviving_spouse: value,
        }
    }
}

/// Marginal rate applied from `floor` up to the next bracket's floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub floor: Cents,
    pub rate: Rate,
}

/// Progressive schedule, floors ascending, first floor zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BracketSchedule(pub Vec<Bracket>);

impl BracketSchedule {
    pub fn flat(rate: Rate) -> Self {
        BracketSchedule(vec![Bracket {
            floor: Cents::ZERO,
            rate,
        }])
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.0
    }

    /// Tax on `income`.  Each slice is rounded to the cent as it is taxed.
    pub fn tax_on(&self, income: Cents) -> Cents {
        let income = income.floor_zero();
        let mut tax = Cents::ZERO;
        for (i, b) in self.0.iter().enumerate() {
            if income <= b.floor {
                break;
            }
            let ceiling = self.0.get(i + 1).map(|n| n.floor).unwrap_or(Cents::MAX);
            let slice = income.min(ceiling) - b.floor;
            tax += slice.apply_rate(b.rate);
        }
        tax
    }

    /// Marginal rate at `income`.
    pub fn marginal_rate(&self, income: Cents) -> Rate {
        self.0
            .iter()
            .rev()
            .find(|b| income > b.floor || b.floor.is_zero())
            .map(|b| b.rate)
            .unwrap_or(Rate::ZERO)
    }

    fn is_well_formed(&self) -> bool {
        let starts_at_zero = self.0.first().map(|b| b.floor.is_zero()).unwrap_or(false);
        let ascending = self.0.windows(2).all(|w| w[0].floor < w[1].floor);
        starts_at_zero && ascending
    }
}

// ---------------------------------------------------------------------------
// Federal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildTaxCreditTables {
    pub per_child: Cents,
    pub phaseout_threshold: ByFilingStatus<Cents>,
    /// Reduction applies per started step of AGI above the threshold.
    pub phaseout_step: Cents,
    pub phaseout_per_step: Cents,
}

/// One EITC column (by qualifying-children count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EitcSchedule {
    pub phase_in_rate: Rate,
    pub earned_income_amount: Cents,
    pub max_credit: Cents,
    pub phaseout_start: Cents,
    pub phaseout_start_joint: Cents,
    pub phaseout_rate: Rate,
}

impl EitcSchedule {
    /// Phase-in, plateau, phase-out.  The phase-out runs on the larger of
    /// earned income and AGI.
    pub fn credit(&self, earned_income: Cents, agi: Cents, joint: bool) -> Cents {
        let earned_income = earned_income.floor_zero();
        let phased_in = earned_income
            .min(self.earned_income_amount)
            .apply_rate(self.phase_in_rate)
            .min(self.max_credit);
        let start = if joint {
            self.phaseout_start_joint
        } else {
            self.phaseout_start
        };
        let measure = earned_income.max(agi);
        let reduction = (measure - start).floor_zero().apply_rate(self.phaseout_rate);
        (phased_in - reduction).floor_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EitcTables {
    pub no_children: EitcSchedule,
    pub one_child: EitcSchedule,
    pub two_children: EitcSchedule,
    pub three_or_more: EitcSchedule,
    /// Disqualifying investment income.
    pub investment_income_limit: Cents,
}

impl EitcTables {
    pub fn schedule_for(&self, qualifying_children: i64) -> &EitcSchedule {
        match qualifying_children {
            i64::MIN..=0 => &self.no_children,
            1 => &self.one_child,
            2 => &self.two_children,
            _ => &self.three_or_more,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEmploymentTables {
    /// Share of net earnings subject to SE tax (92.35%).
    pub earnings_factor: Rate,
    pub social_security_rate: Rate,
    pub social_security_wage_base: Cents,
    pub medicare_rate: Rate,
    /// Below this, no SE tax is due.
    pub minimum_earnings: Cents,
    /// Share of SE tax deductible above the line.
    pub deductible_share: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalTables {
    pub standard_deduction: ByFilingStatus<Cents>,
    pub brackets: ByFilingStatus<BracketSchedule>,
    pub child_tax_credit: ChildTaxCreditTables,
    pub earned_income_credit: EitcTables,
    pub self_employment: SelfEmploymentTables,
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeorgiaTables {
    pub rate: Rate,
    pub standard_deduction: ByFilingStatus<Cents>,
    pub dependent_exemption: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LouisianaTables {
    pub rate: Rate,
    pub standard_deduction: ByFilingStatus<Cents>,
    /// Louisiana EITC as a share of the federal credit.  Refundable.
    pub eitc_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SouthCarolinaTables {
    pub brackets: BracketSchedule,
    pub dependent_deduction: Cents,
    /// South Carolina EITC as a share of the federal credit.  Nonrefundable.
    pub eitc_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtahTables {
    pub rate: Rate,
    pub credit_rate: Rate,
    pub personal_exemption: Cents,
    pub phaseout_base: ByFilingStatus<Cents>,
    pub phaseout_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissouriTables {
    pub brackets: BracketSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OklahomaTables {
    pub brackets: ByFilingStatus<BracketSchedule>,
    pub standard_deduction: ByFilingStatus<Cents>,
    pub exemption: Cents,
    /// Share of the federal child tax credit.  Nonrefundable.
    pub child_credit_rate: Rate,
    /// No child credit above this federal AGI.
    pub child_credit_agi_limit: Cents,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTables {
    #[serde(rename = "GA", default)]
    pub ga: Option<GeorgiaTables>,
    #[serde(rename = "LA", default)]
    pub la: Option<LouisianaTables>,
    #[serde(rename = "SC", default)]
    pub sc: Option<SouthCarolinaTables>,
    #[serde(rename = "UT", default)]
    pub ut: Option<UtahTables>,
    #[serde(rename = "MO", default)]
    pub mo: Option<MissouriTables>,
    #[serde(rename = "OK", default)]
    pub ok: Option<OklahomaTables>,
}

// ---------------------------------------------------------------------------
// TaxTables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxTables {
    pub tax_year: i32,
    pub federal: FederalTables,
    #[serde(default)]
    pub states: StateTables,
}

impl TaxTables {
    /// Typed view of a merged document.  Bracket schedules must start at
    /// zero and ascend.
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let tables: TaxTables = serde_json::from_value(loaded.config_json.clone())
            .context("tax tables do not match the expected shape")?;
        tables.check_schedules()?;
        Ok(tables)
    }

    /// The embedded base layer with no overlays.
    pub fn builtin() -> Result<Self> {
        let loaded = load_layered_yaml_from_strings(&[BUILTIN_TABLES_YAML])?;
        Self::from_loaded(&loaded)
    }

    fn check_schedules(&self) -> Result<()> {
        let mut schedules: Vec<(&str, &BracketSchedule)> = vec![
            ("federal.brackets.single", &self.federal.brackets.single),
            (
                "federal.brackets.married_filing_jointly",
                &self.federal.brackets.married_filing_jointly,
            ),
            (
                "federal.brackets.married_filing_separately",
                &self.federal.brackets.married_filing_separately,
            ),
            (
                "federal.brackets.head_of_household",
                &self.federal.brackets.head_of_household,
            ),
            (
                "federal.brackets.qualifying_surviving_spouse",
                &self.federal.brackets.qualifying_surviving_spouse,
            ),
        ];
        if let Some(sc) = &self.states.sc {
            schedules.push(("states.SC.brackets", &sc.brackets));
        }
        if let Some(mo) = &self.states.mo {
            schedules.push(("states.MO.brackets", &mo.brackets));
        }
        if let Some(ok) = &self.states.ok {
            schedules.push(("states.OK.brackets.single", &ok.brackets.single));
            schedules.push((
                "states.OK.brackets.married_filing_jointly",
                &ok.brackets.married_filing_jointly,
            ));
        }
        for (name, schedule) in schedules {
            if !schedule.is_well_formed() {
                anyhow::bail!("bracket schedule {name} must start at 0 and ascend");
            }
        }
        Ok(())
    }
}
