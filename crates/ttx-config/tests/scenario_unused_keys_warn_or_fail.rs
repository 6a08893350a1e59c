//! Scenario: unused tax-table keys
//!
//! GREEN when:
//! - The built-in tables are clean against all six registered state codes.
//! - Dropping a code from the registered set surfaces its table as unused.
//! - `Warn` returns the report; `Fail` errors with the TABLES_UNUSED_KEYS tag.

use ttx_config::{
    load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy, BUILTIN_TABLES_YAML,
};

const ALL_CODES: [&str; 6] = ["GA", "LA", "SC", "UT", "MO", "OK"];

#[test]
fn builtin_tables_are_clean_for_all_modules() {
    let loaded = load_layered_yaml_from_strings(&[BUILTIN_TABLES_YAML]).unwrap();
    let report =
        report_unused_keys(&loaded.config_json, &ALL_CODES, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean(), "unused: {:?}", report.unused_leaf_pointers);
}

#[test]
fn unregistered_state_table_is_warned() {
    let loaded = load_layered_yaml_from_strings(&[BUILTIN_TABLES_YAML]).unwrap();
    let report =
        report_unused_keys(&loaded.config_json, &["GA", "LA"], UnusedKeyPolicy::Warn).unwrap();
    assert!(!report.is_clean());
    assert!(report
        .unused_leaf_pointers
        .iter()
        .all(|p| p.starts_with("/states/")));
    assert!(report
        .unused_leaf_pointers
        .iter()
        .any(|p| p.starts_with("/states/UT/")));
}

#[test]
fn typo_in_overlay_fails_under_fail_policy() {
    let overlay = "federl:\n  standard_deduction:\n    single: 1\n";
    let loaded = load_layered_yaml_from_strings(&[BUILTIN_TABLES_YAML, overlay]).unwrap();
    let err =
        report_unused_keys(&loaded.config_json, &ALL_CODES, UnusedKeyPolicy::Fail).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("TABLES_UNUSED_KEYS"), "got: {msg}");
    assert!(msg.contains("/federl/standard_deduction/single"), "got: {msg}");
}
