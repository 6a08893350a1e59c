//! ttx-config
//!
//! Tax tables are configuration data, not engine logic.  They load as layered
//! YAML: a built-in base for the supported tax year, then any overlays in
//! order.  The merged document is canonicalized and hashed so a computation
//! can cite the exact tables it ran against.

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

mod consumption;
mod tables;

pub use consumption::{consumed_pointers, report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};
pub use tables::{
    Bracket, BracketSchedule, ByFilingStatus, ChildTaxCreditTables, EitcSchedule, EitcTables,
    FederalTables, GeorgiaTables, LouisianaTables, MissouriTables, OklahomaTables,
    SelfEmploymentTables, SouthCarolinaTables, StateTables, TaxTables, UtahTables,
};

/// Built-in base layer (tax year 2025).  Amounts are integer cents.
pub const BUILTIN_TABLES_YAML: &str = include_str!("../tables/ty2025.yaml");

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

/// The built-in base followed by overlay files in merge order.
pub fn load_with_builtin(overlay_paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = vec![BUILTIN_TABLES_YAML.to_string()];
    for p in overlay_paths {
        let raw = fs::read_to_string(p)
            .with_context(|| format!("failed to read tables overlay: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default Map is key-ordered, so compact serialization is
    // already canonical for a given merged document.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
