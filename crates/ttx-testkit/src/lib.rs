//! ttx-testkit
//!
//! Fixture builders, JSON fixture loading and shared assertions for the
//! cross-crate scenario tests under `tests/`.

use anyhow::{Context, Result};
use std::fs;
use ttx_config::TaxTables;
use ttx_engine::{compute_return, ModuleRegistry, ReturnComputation};
use ttx_schemas::TaxpayerModel;

mod assertions;
mod builders;

pub use assertions::{assert_state_invariants, assert_topological};
pub use builders::{TaxpayerBuilder, W2Builder};

pub fn load_taxpayer_json(path: &str) -> Result<TaxpayerModel> {
    let s = fs::read_to_string(path).with_context(|| format!("read taxpayer fixture: {path}"))?;
    let model: TaxpayerModel =
        serde_json::from_str(&s).with_context(|| format!("parse taxpayer fixture: {path}"))?;
    Ok(model)
}

/// Built-in tables and a registry holding every module.
pub fn builtin_engine() -> Result<(TaxTables, ModuleRegistry)> {
    let tables = TaxTables::builtin()?;
    let registry = ModuleRegistry::builtin(&tables)?;
    Ok((tables, registry))
}

/// Built-in tables re-stamped for another tax year.  The amounts stay the
/// 2025 amounts; only calendar handling changes.
pub fn engine_for_year(tax_year: i32) -> Result<(TaxTables, ModuleRegistry)> {
    let overlay = format!("tax_year: {tax_year}\n");
    let loaded =
        ttx_config::load_layered_yaml_from_strings(&[ttx_config::BUILTIN_TABLES_YAML, &overlay])?;
    let tables = TaxTables::from_loaded(&loaded)?;
    let registry = ModuleRegistry::builtin(&tables)?;
    Ok((tables, registry))
}

/// Compute `taxpayer` against the built-in tables.
pub fn run_builtin(taxpayer: &TaxpayerModel) -> Result<ReturnComputation> {
    let (tables, registry) = builtin_engine()?;
    Ok(compute_return(&registry, &tables.federal, taxpayer)?)
}

/// Path of a fixture under this crate's `tests/fixtures/`.
pub fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}
