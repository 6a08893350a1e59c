//! `ttx tables-hash` and `ttx states`.

use anyhow::Result;
use ttx_config::{TaxTables, UnusedKeyPolicy};
use ttx_engine::ModuleRegistry;

use super::load_session;

pub fn tables_hash(paths: &[String], strict: bool) -> Result<()> {
    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let session = load_session(paths, policy)?;

    println!("tables_hash={}", session.loaded.config_hash);
    println!("tax_year={}", session.tables.tax_year);
    println!("unused_keys={}", session.unused.unused_leaf_pointers.len());
    println!("{}", session.loaded.canonical_json);
    Ok(())
}

pub fn states() -> Result<()> {
    let tables = TaxTables::builtin()?;
    let registry = ModuleRegistry::builtin(&tables)?;
    for meta in registry.list() {
        println!(
            "code={} name=\"{}\" form=\"{}\" namespace={}",
            meta.code, meta.state_name, meta.form_label, meta.namespace
        );
    }
    Ok(())
}
