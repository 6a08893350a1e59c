use ttx_money::ApportionmentError;
use ttx_provenance::ProvenanceError;
use ttx_states::{RulesError, StateCode};

/// Every failure the engine can report.  State-scoped variants carry the
/// state code so the caller can name the failing module.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // --- configuration ---
    #[error("unsupported jurisdiction '{code}': no state module is registered for it")]
    UnsupportedJurisdiction { code: String },

    #[error("a module for {code} is already registered")]
    DuplicateModule { code: StateCode },

    #[error("{state} module could not be built: {source}")]
    ModuleBuild {
        state: StateCode,
        #[source]
        source: RulesError,
    },

    #[error("{code} is requested more than once")]
    DuplicateStateReturn { code: StateCode },

    #[error("{state} residency: {source}")]
    InvalidResidency {
        state: StateCode,
        #[source]
        source: ApportionmentError,
    },

    #[error("return is for tax year {requested} but the registered tables are for {tables}")]
    TaxYearMismatch { requested: i32, tables: i32 },

    // --- invariant violations ---
    #[error("{state} traced values: {source}")]
    Collect {
        state: StateCode,
        #[source]
        source: RulesError,
    },

    #[error("federal traced values: {source}")]
    FederalProvenance {
        #[source]
        source: ProvenanceError,
    },

    #[error("merging {state} provenance: {source}")]
    Provenance {
        state: StateCode,
        #[source]
        source: ProvenanceError,
    },
}

impl EngineError {
    /// True for errors caused by caller input or tables, false for
    /// implementation defects.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::UnsupportedJurisdiction { .. }
                | EngineError::DuplicateModule { .. }
                | EngineError::DuplicateStateReturn { .. }
                | EngineError::ModuleBuild { .. }
                | EngineError::InvalidResidency { .. }
                | EngineError::TaxYearMismatch { .. }
        )
    }

    /// State code the error is scoped to, when there is one.
    pub fn state(&self) -> Option<StateCode> {
        match self {
            EngineError::DuplicateModule { code }
            | EngineError::DuplicateStateReturn { code } => Some(*code),
            EngineError::ModuleBuild { state, .. }
            | EngineError::InvalidResidency { state, .. }
            | EngineError::Collect { state, .. }
            | EngineError::Provenance { state, .. } => Some(*state),
            EngineError::UnsupportedJurisdiction { .. }
            | EngineError::TaxYearMismatch { .. }
            | EngineError::FederalProvenance { .. } => None,
        }
    }
}
