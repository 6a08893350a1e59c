//! Namespaced trace identifiers.
//!
//! A [`TraceId`] can only be built through [`Namespace::id`], so every node a
//! module emits carries that module's prefix.  Two modules collide only if
//! they share a namespace; each module declares its own as a constant and
//! the set of modules is closed.

use serde::{Serialize, Serializer};

/// A module-owned id prefix such as `f1040` or `it540`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(&'static str);

impl Namespace {
    /// Declare a namespace.  Prefixes are lowercase ASCII alphanumerics.
    pub const fn new(prefix: &'static str) -> Self {
        Namespace(prefix)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Mint an id inside this namespace.
    pub fn id(&self, key: impl Into<String>) -> TraceId {
        let key = key.into();
        debug_assert!(!key.trim().is_empty(), "trace key must not be empty");
        TraceId {
            namespace: *self,
            key,
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Globally unique (per run) identifier of one traced value: `<ns>.<key>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId {
    namespace: Namespace,
    key: String,
}

impl TraceId {
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Compare against the rendered `<ns>.<key>` form without allocating.
    pub fn matches(&self, rendered: &str) -> bool {
        rendered
            .split_once('.')
            .map(|(ns, key)| ns == self.namespace.as_str() && key == self.key)
            .unwrap_or(false)
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.key)
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GA: Namespace = Namespace::new("ga500");

    #[test]
    fn renders_with_prefix() {
        assert_eq!(GA.id("taxable_income").to_string(), "ga500.taxable_income");
    }

    #[test]
    fn matches_rendered_form() {
        let id = GA.id("tax");
        assert!(id.matches("ga500.tax"));
        assert!(!id.matches("it540.tax"));
        assert!(!id.matches("ga500tax"));
    }

    #[test]
    fn same_key_in_different_namespaces_differs() {
        let la = Namespace::new("it540");
        assert_ne!(GA.id("tax"), la.id("tax"));
    }

    #[test]
    fn serializes_as_string() {
        let v = serde_json::to_value(GA.id("agi")).unwrap();
        assert_eq!(v, serde_json::json!("ga500.agi"));
    }
}
