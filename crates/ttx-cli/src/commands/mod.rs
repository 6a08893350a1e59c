//! Command handlers for ttx.
//!
//! Shared loading lives here: the taxpayer model, the layered tax tables and
//! the module registry built from them.

pub mod compute;
pub mod tables;
pub mod trail;

use anyhow::{Context, Result};
use std::fs;
use ttx_config::{LoadedConfig, TaxTables, UnusedKeyPolicy, UnusedKeyReport};
use ttx_engine::ModuleRegistry;
use ttx_provenance::TraceId;
use ttx_schemas::TaxpayerModel;

/// Tables and registry for one invocation.
pub struct Session {
    pub loaded: LoadedConfig,
    pub tables: TaxTables,
    pub registry: ModuleRegistry,
    pub unused: UnusedKeyReport,
}

/// Built-in tables plus `overlays`, every module registered.
pub fn load_session(overlays: &[String], policy: UnusedKeyPolicy) -> Result<Session> {
    let refs: Vec<&str> = overlays.iter().map(|s| s.as_str()).collect();
    let loaded = ttx_config::load_with_builtin(&refs)?;
    let tables = TaxTables::from_loaded(&loaded)?;
    let registry = ModuleRegistry::builtin(&tables).context("state module registration failed")?;
    let unused = ttx_config::report_unused_keys(&loaded.config_json, &registry.codes(), policy)?;
    Ok(Session {
        loaded,
        tables,
        registry,
        unused,
    })
}

/// Read a taxpayer model from JSON.
pub fn load_return(path: &str) -> Result<TaxpayerModel> {
    let bytes = fs::read(path).with_context(|| format!("read return failed: {}", path))?;
    // Editors on Windows like to prepend a UTF-8 BOM.
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let raw = std::str::from_utf8(bytes).context("return file must be UTF-8 text")?;
    serde_json::from_str(raw)
        .with_context(|| format!("return file is not a valid taxpayer model: {}", path))
}

/// Display label of a traced value, from the owning module's dictionary.
pub fn node_label(registry: &ModuleRegistry, id: &TraceId) -> Option<&'static str> {
    let ns = id.namespace();
    if ns == ttx_federal::NAMESPACE {
        return ttx_federal::node_label(id.key());
    }
    registry
        .list()
        .into_iter()
        .find(|m| m.namespace == ns)
        .and_then(|m| m.node_label(id.key()))
}
