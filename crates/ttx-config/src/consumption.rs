//! Unused-key guard for tax tables.
//!
//! Consumed JSON-pointer prefixes are `/tax_year`, `/federal` and
//! `/states/<CODE>` for every registered state module.  A leaf outside all of
//! them is a table nobody reads, usually a typo in an overlay or a state that
//! is not registered.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Consumed JSON-pointer prefixes used for this analysis (sorted, unique)
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Consumed prefixes for the given set of registered state codes.
pub fn consumed_pointers<S: AsRef<str>>(registered_codes: &[S]) -> Vec<String> {
    let mut out: BTreeSet<String> = BTreeSet::new();
    out.insert("/tax_year".to_string());
    out.insert("/federal".to_string());
    for code in registered_codes {
        let code = code.as_ref().trim().to_ascii_uppercase();
        out.insert(normalize_pointer(&format!(
            "/states/{}",
            escape_pointer_token(&code)
        )));
    }
    out.into_iter().collect()
}

/// Produce an unused-key report.
///
/// `Warn` logs each unused leaf and returns the report; `Fail` errors when
/// any leaf is unused.
pub fn report_unused_keys<S: AsRef<str>>(
    config_json: &Value,
    registered_codes: &[S],
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed_prefixes = consumed_pointers(registered_codes);

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if report.is_clean() {
        return Ok(report);
    }

    match policy {
        UnusedKeyPolicy::Fail => bail!(
            "TABLES_UNUSED_KEYS: {} unused table leaf key(s). \
            Remove them or register the owning state module. First few: {}",
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        ),
        UnusedKeyPolicy::Warn => {
            for pointer in &report.unused_leaf_pointers {
                tracing::warn!(pointer = %pointer, "unused tax table key");
            }
        }
    }

    Ok(report)
}

fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" consumes "/a/b" and "/a/b/c" but not "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefix_respects_token_boundary() {
        assert!(is_prefix_pointer("/states/GA", "/states/GA/rate"));
        assert!(is_prefix_pointer("/states/GA", "/states/GA"));
        assert!(!is_prefix_pointer("/states/GA", "/states/GAX/rate"));
    }

    #[test]
    fn unregistered_state_is_reported() {
        let cfg = json!({
            "tax_year": 2025,
            "federal": { "standard_deduction": { "single": 1 } },
            "states": { "GA": { "rate": "0.05" }, "ZZ": { "rate": "0.01" } },
            "notes": "hello"
        });
        let report = report_unused_keys(&cfg, &["GA"], UnusedKeyPolicy::Warn).unwrap();
        assert_eq!(
            report.unused_leaf_pointers,
            vec!["/notes".to_string(), "/states/ZZ/rate".to_string()]
        );
    }

    #[test]
    fn fail_policy_errors_on_unused() {
        let cfg = json!({ "tax_year": 2025, "extra": true });
        let err = report_unused_keys(&cfg, &["GA"], UnusedKeyPolicy::Fail).unwrap_err();
        assert!(err.to_string().contains("TABLES_UNUSED_KEYS"));
    }

    #[test]
    fn codes_are_case_normalized() {
        let prefixes = consumed_pointers(&["ga", " ok "]);
        assert!(prefixes.contains(&"/states/GA".to_string()));
        assert!(prefixes.contains(&"/states/OK".to_string()));
    }
}
