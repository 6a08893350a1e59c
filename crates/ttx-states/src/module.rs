use serde::Serialize;
use ttx_config::StateTables;
use ttx_provenance::ProvenanceGraph;
use ttx_schemas::{FederalResult, StateReturnConfig, TaxpayerModel};

use crate::ga::{GeorgiaDetail, GeorgiaModule};
use crate::la::{LouisianaDetail, LouisianaModule};
use crate::mo::{MissouriDetail, MissouriModule};
use crate::ok::{OklahomaDetail, OklahomaModule};
use crate::sc::{SouthCarolinaDetail, SouthCarolinaModule};
use crate::ut::{UtahDetail, UtahModule};
use crate::{ModuleMeta, RulesError, StateCode, StateComputeResult, StateRulesModule};

/// Module-specific intermediate lines, one variant per jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "lines")]
pub enum StateDetail {
    #[serde(rename = "GA")]
    Georgia(GeorgiaDetail),
    #[serde(rename = "LA")]
    Louisiana(LouisianaDetail),
    #[serde(rename = "SC")]
    SouthCarolina(SouthCarolinaDetail),
    #[serde(rename = "UT")]
    Utah(UtahDetail),
    #[serde(rename = "MO")]
    Missouri(MissouriDetail),
    #[serde(rename = "OK")]
    Oklahoma(OklahomaDetail),
}

impl StateDetail {
    pub fn code(&self) -> StateCode {
        match self {
            StateDetail::Georgia(_) => StateCode::Ga,
            StateDetail::Louisiana(_) => StateCode::La,
            StateDetail::SouthCarolina(_) => StateCode::Sc,
            StateDetail::Utah(_) => StateCode::Ut,
            StateDetail::Missouri(_) => StateCode::Mo,
            StateDetail::Oklahoma(_) => StateCode::Ok,
        }
    }
}

/// The closed set of jurisdiction modules.
#[derive(Debug, Clone)]
pub enum StateModule {
    Georgia(GeorgiaModule),
    Louisiana(LouisianaModule),
    SouthCarolina(SouthCarolinaModule),
    Utah(UtahModule),
    Missouri(MissouriModule),
    Oklahoma(OklahomaModule),
}

impl StateModule {
    /// Build the module for `code` from its tables.  A missing table block
    /// is a configuration error.
    pub fn build(code: StateCode, tables: &StateTables) -> Result<StateModule, RulesError> {
        let missing = || RulesError::MissingTables { code };
        Ok(match code {
            StateCode::Ga => {
                StateModule::Georgia(GeorgiaModule::new(tables.ga.clone().ok_or_else(missing)?))
            }
            StateCode::La => StateModule::Louisiana(LouisianaModule::new(
                tables.la.clone().ok_or_else(missing)?,
            )),
            StateCode::Sc => StateModule::SouthCarolina(SouthCarolinaModule::new(
                tables.sc.clone().ok_or_else(missing)?,
            )),
            StateCode::Ut => {
                StateModule::Utah(UtahModule::new(tables.ut.clone().ok_or_else(missing)?))
            }
            StateCode::Mo => {
                StateModule::Missouri(MissouriModule::new(tables.mo.clone().ok_or_else(missing)?))
            }
            StateCode::Ok => {
                StateModule::Oklahoma(OklahomaModule::new(tables.ok.clone().ok_or_else(missing)?))
            }
        })
    }

    pub fn code(&self) -> StateCode {
        self.meta().code
    }

    fn inner(&self) -> &dyn StateRulesModule {
        match self {
            StateModule::Georgia(m) => m,
            StateModule::Louisiana(m) => m,
            StateModule::SouthCarolina(m) => m,
            StateModule::Utah(m) => m,
            StateModule::Missouri(m) => m,
            StateModule::Oklahoma(m) => m,
        }
    }
}

impl StateRulesModule for StateModule {
    fn meta(&self) -> &'static ModuleMeta {
        self.inner().meta()
    }

    fn compute(
        &self,
        taxpayer: &TaxpayerModel,
        federal: &FederalResult,
        config: &StateReturnConfig,
    ) -> StateComputeResult {
        self.inner().compute(taxpayer, federal, config)
    }

    fn collect_traced_values(
        &self,
        result: &StateComputeResult,
    ) -> Result<ProvenanceGraph, RulesError> {
        self.inner().collect_traced_values(result)
    }
}
