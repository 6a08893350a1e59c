//! Module registry: the single table mapping state postal code to module.
//!
//! Built once at process start (usually through [`ModuleRegistry::builtin`])
//! and read-only afterwards.  Insertion order is preserved in `list()`.
//! Lookup is by postal code, case-insensitive; a code with no registered
//! module is a configuration error, never a zero-tax default.

use ttx_config::TaxTables;
use ttx_states::{ModuleMeta, StateCode, StateModule, StateRulesModule};

use crate::EngineError;

/// Catalogue of state modules for one tax year.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    tax_year: i32,
    /// Entries in insertion order.
    modules: Vec<StateModule>,
}

impl ModuleRegistry {
    /// Empty registry for `tax_year`.
    pub fn new(tax_year: i32) -> Self {
        Self {
            tax_year,
            modules: Vec::new(),
        }
    }

    /// Every implemented jurisdiction, built from `tables`.
    ///
    /// # Errors
    /// [`EngineError::ModuleBuild`] if a state's table block is missing.
    pub fn builtin(tables: &TaxTables) -> Result<Self, EngineError> {
        Self::with_states(tables, &StateCode::ALL)
    }

    /// Only the listed jurisdictions, in the order given.
    pub fn with_states(tables: &TaxTables, codes: &[StateCode]) -> Result<Self, EngineError> {
        let mut reg = Self::new(tables.tax_year);
        for &code in codes {
            let module = StateModule::build(code, &tables.states)
                .map_err(|source| EngineError::ModuleBuild { state: code, source })?;
            reg.register(module)?;
        }
        Ok(reg)
    }

    /// Tax year the registered tables describe.
    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    /// Add a module.  There is exactly one module per state code.
    ///
    /// # Errors
    /// [`EngineError::DuplicateModule`] if the code is already registered.
    pub fn register(&mut self, module: StateModule) -> Result<(), EngineError> {
        let code = module.code();
        if self.modules.iter().any(|m| m.code() == code) {
            return Err(EngineError::DuplicateModule { code });
        }
        self.modules.push(module);
        Ok(())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.lookup(code).is_ok()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Metadata for every registered module in insertion order.
    pub fn list(&self) -> Vec<&'static ModuleMeta> {
        self.modules.iter().map(|m| m.meta()).collect()
    }

    /// Postal codes of the registered modules, for the unused-table-key
    /// report.
    pub fn codes(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.code().as_str()).collect()
    }

    /// Module registered for `code`.
    ///
    /// # Errors
    /// [`EngineError::UnsupportedJurisdiction`] if the code is not a known
    /// jurisdiction or has no module in this registry.
    pub fn lookup(&self, code: &str) -> Result<&StateModule, EngineError> {
        let unsupported = || EngineError::UnsupportedJurisdiction {
            code: code.trim().to_string(),
        };
        let wanted = StateCode::parse(code).ok_or_else(unsupported)?;
        self.get(wanted).ok_or_else(unsupported)
    }

    pub fn get(&self, code: StateCode) -> Option<&StateModule> {
        self.modules.iter().find(|m| m.code() == code)
    }
}
