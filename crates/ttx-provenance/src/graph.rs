//! Provenance graph builder.
//!
//! # Contract
//!
//! - [`record_computation`] is a pure constructor; it touches nothing.
//! - [`ProvenanceGraph::insert`] is the single gate into a run's graph:
//!   duplicate ids, references to nodes not yet inserted, and ids outside the
//!   graph's namespace are rejected as programming errors.  Because a node can
//!   only point at nodes that already exist, insertion order is a topological
//!   order and cycles cannot be expressed.
//! - Scoped graphs may reference ids in declared upstream namespaces without
//!   holding them (a state graph pointing at `f1040.agi`).  Those references
//!   are resolved strictly when the graph is absorbed into a combined graph.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use ttx_money::Cents;

use crate::{Namespace, TraceId};

// ---------------------------------------------------------------------------
// TracedValue
// ---------------------------------------------------------------------------

/// One node of the provenance graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TracedValue {
    pub id: TraceId,
    pub amount: Cents,
    pub derived_from: Vec<TraceId>,
    pub description: String,
}

impl TracedValue {
    /// A node with no inputs: a raw value echoed for traceability.
    pub fn is_root(&self) -> bool {
        self.derived_from.is_empty()
    }
}

/// Build a traced value.  Pure: the caller inserts it into a run's graph.
pub fn record_computation(
    amount: Cents,
    id: TraceId,
    derived_from: &[&TraceId],
    description: impl Into<String>,
) -> TracedValue {
    TracedValue {
        id,
        amount,
        derived_from: derived_from.iter().map(|d| (*d).clone()).collect(),
        description: description.into(),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Invariant violations.  All of these are implementation defects, never
/// user-input problems, and fail the request that produced them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvenanceError {
    #[error("duplicate traced value id '{id}'")]
    DuplicateId { id: String },

    #[error("'{id}' derives from '{dependency}' which has not been recorded yet")]
    UnknownDependency { id: String, dependency: String },

    #[error("'{id}' is outside namespace '{expected}'")]
    NamespaceViolation { id: String, expected: String },

    #[error("'{id}' derives from '{dependency}' in undeclared namespace")]
    ForeignDependency { id: String, dependency: String },

    #[error("no traced value with id '{id}'")]
    NotFound { id: String },

    #[error("provenance graph has a cycle through {remaining} node(s)")]
    Cycle { remaining: usize },
}

// ---------------------------------------------------------------------------
// Elision
// ---------------------------------------------------------------------------

/// Presentation policy applied on top of the complete graph.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ElisionPolicy {
    /// Drop zero-amount nodes unless a retained node depends on them.
    #[default]
    ElideZero,
    /// Every recorded node.
    ShowAll,
}

// ---------------------------------------------------------------------------
// ProvenanceGraph
// ---------------------------------------------------------------------------

/// Run-scoped, insertion-ordered map of traced values.
#[derive(Clone, Debug, Default)]
pub struct ProvenanceGraph {
    /// `None` for a combined graph that accepts every namespace.
    owner: Option<Namespace>,
    upstream: Vec<Namespace>,
    nodes: Vec<TracedValue>,
    index: HashMap<TraceId, usize>,
}

impl ProvenanceGraph {
    /// A graph that only accepts ids in `owner`.
    pub fn scoped(owner: Namespace) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    /// A graph for a whole return: any namespace, every dependency strict.
    pub fn combined() -> Self {
        Self::default()
    }

    /// Allow references into `ns` that are resolved later, on absorb.
    pub fn with_upstream(mut self, ns: Namespace) -> Self {
        if !self.upstream.contains(&ns) {
            self.upstream.push(ns);
        }
        self
    }

    pub fn owner(&self) -> Option<Namespace> {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion (= topological) order.
    pub fn iter(&self) -> impl Iterator<Item = &TracedValue> {
        self.nodes.iter()
    }

    pub fn contains(&self, id: &TraceId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &TraceId) -> Option<&TracedValue> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Look up by rendered id (`"ga500.tax"`).
    pub fn find(&self, rendered: &str) -> Option<&TracedValue> {
        self.nodes.iter().find(|n| n.id.matches(rendered))
    }

    /// Insert a node, enforcing every graph invariant.
    pub fn insert(&mut self, node: TracedValue) -> Result<(), ProvenanceError> {
        if let Some(owner) = self.owner {
            if node.id.namespace() != owner {
                return Err(ProvenanceError::NamespaceViolation {
                    id: node.id.to_string(),
                    expected: owner.to_string(),
                });
            }
        }
        if self.index.contains_key(&node.id) {
            return Err(ProvenanceError::DuplicateId {
                id: node.id.to_string(),
            });
        }
        for dep in &node.derived_from {
            if self.index.contains_key(dep) {
                continue;
            }
            match self.owner {
                Some(owner) if dep.namespace() != owner => {
                    if !self.upstream.contains(&dep.namespace()) {
                        return Err(ProvenanceError::ForeignDependency {
                            id: node.id.to_string(),
                            dependency: dep.to_string(),
                        });
                    }
                }
                _ => {
                    return Err(ProvenanceError::UnknownDependency {
                        id: node.id.to_string(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }
        self.push_unchecked(node);
        Ok(())
    }

    /// Construct and insert in one step; returns the id for chaining.
    pub fn record(
        &mut self,
        amount: Cents,
        id: TraceId,
        derived_from: &[&TraceId],
        description: impl Into<String>,
    ) -> Result<TraceId, ProvenanceError> {
        let node = record_computation(amount, id.clone(), derived_from, description);
        self.insert(node)?;
        Ok(id)
    }

    /// Merge `other` in its insertion order, re-validating every node
    /// against this graph's rules.
    pub fn absorb(&mut self, other: &ProvenanceGraph) -> Result<(), ProvenanceError> {
        for node in &other.nodes {
            self.insert(node.clone())?;
        }
        Ok(())
    }

    /// Dependencies that point outside this graph (upstream references).
    pub fn external_references(&self) -> Vec<&TraceId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for node in &self.nodes {
            for dep in &node.derived_from {
                if !self.index.contains_key(dep) && seen.insert(dep) {
                    out.push(dep);
                }
            }
        }
        out
    }

    /// Kahn's algorithm over internal edges.  External references are
    /// treated as already-satisfied inputs.
    pub fn topological_order(&self) -> Result<Vec<&TracedValue>, ProvenanceError> {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, node) in self.nodes.iter().enumerate() {
            for dep in &node.derived_from {
                if let Some(&j) = self.index.get(dep) {
                    indegree[i] += 1;
                    dependents[j].push(i);
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = queue.pop_front() {
            order.push(&self.nodes[i]);
            for &d in &dependents[i] {
                indegree[d] -= 1;
                if indegree[d] == 0 {
                    queue.push_back(d);
                }
            }
        }

        if order.len() != n {
            return Err(ProvenanceError::Cycle {
                remaining: n - order.len(),
            });
        }
        Ok(order)
    }

    /// Presentation view.  The receiver is left untouched.
    pub fn elided(&self, policy: ElisionPolicy) -> ProvenanceGraph {
        if policy == ElisionPolicy::ShowAll {
            return self.clone();
        }

        let mut needed: HashSet<&TraceId> = HashSet::new();
        let mut keep = vec![false; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate().rev() {
            if !node.amount.is_zero() || needed.contains(&node.id) {
                keep[i] = true;
                needed.extend(node.derived_from.iter());
            }
        }

        let mut out = ProvenanceGraph {
            owner: self.owner,
            upstream: self.upstream.clone(),
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        for (node, kept) in self.nodes.iter().zip(keep) {
            if kept {
                out.push_unchecked(node.clone());
            }
        }
        out
    }

    /// The node and all of its ancestors, in topological order.
    pub fn lineage(&self, id: &TraceId) -> Result<Vec<&TracedValue>, ProvenanceError> {
        let start = self
            .index
            .get(id)
            .copied()
            .ok_or_else(|| ProvenanceError::NotFound { id: id.to_string() })?;

        let mut marked = vec![false; self.nodes.len()];
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            if marked[i] {
                continue;
            }
            marked[i] = true;
            for dep in &self.nodes[i].derived_from {
                if let Some(&j) = self.index.get(dep) {
                    stack.push(j);
                }
            }
        }

        Ok(self
            .nodes
            .iter()
            .zip(marked)
            .filter_map(|(n, m)| m.then_some(n))
            .collect())
    }

    /// Lineage by rendered id.
    pub fn lineage_of(&self, rendered: &str) -> Result<Vec<&TracedValue>, ProvenanceError> {
        let node = self.find(rendered).ok_or_else(|| ProvenanceError::NotFound {
            id: rendered.to_string(),
        })?;
        self.lineage(&node.id)
    }

    /// Node list as JSON, in insertion order.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.nodes).unwrap_or(Value::Null)
    }

    /// SHA-256 (hex) over the canonical JSON of the node list.
    pub fn digest(&self) -> String {
        let canonical = canonical_json(&self.to_json());
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn push_unchecked(&mut self, node: TracedValue) {
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }
}

/// Compact JSON with object keys sorted recursively.
pub(crate) fn canonical_json(v: &Value) -> String {
    sort_keys(v).to_string()
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FED: Namespace = Namespace::new("f1040");
    const GA: Namespace = Namespace::new("ga500");

    fn c(v: i64) -> Cents {
        Cents::new(v)
    }

    #[test]
    fn record_computation_is_pure() {
        let a = FED.id("wages");
        let node = record_computation(c(100), FED.id("agi"), &[&a], "AGI");
        assert_eq!(node.derived_from, vec![a]);
        assert!(!node.is_root());
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut g = ProvenanceGraph::scoped(GA);
        g.record(c(1), GA.id("agi"), &[], "a").unwrap();
        let err = g.record(c(2), GA.id("agi"), &[], "b").unwrap_err();
        assert_eq!(
            err,
            ProvenanceError::DuplicateId {
                id: "ga500.agi".to_string()
            }
        );
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn insert_rejects_forward_reference() {
        let mut g = ProvenanceGraph::scoped(GA);
        let later = GA.id("later");
        let err = g.record(c(1), GA.id("tax"), &[&later], "t").unwrap_err();
        assert!(matches!(err, ProvenanceError::UnknownDependency { .. }));
    }

    #[test]
    fn insert_rejects_id_outside_namespace() {
        let mut g = ProvenanceGraph::scoped(GA);
        let err = g.record(c(1), FED.id("agi"), &[], "x").unwrap_err();
        assert!(matches!(err, ProvenanceError::NamespaceViolation { .. }));
    }

    #[test]
    fn upstream_reference_allowed_only_when_declared() {
        let fed_agi = FED.id("agi");

        let mut strict = ProvenanceGraph::scoped(GA);
        let err = strict.record(c(1), GA.id("agi"), &[&fed_agi], "x").unwrap_err();
        assert!(matches!(err, ProvenanceError::ForeignDependency { .. }));

        let mut open = ProvenanceGraph::scoped(GA).with_upstream(FED);
        open.record(c(1), GA.id("agi"), &[&fed_agi], "x").unwrap();
        assert_eq!(open.external_references(), vec![&fed_agi]);
    }

    #[test]
    fn absorb_resolves_upstream_strictly() {
        let fed_agi = FED.id("agi");
        let mut state = ProvenanceGraph::scoped(GA).with_upstream(FED);
        state.record(c(5), GA.id("agi"), &[&fed_agi], "x").unwrap();

        // Without the federal node, the combined graph refuses the state node.
        let mut bare = ProvenanceGraph::combined();
        assert!(matches!(
            bare.absorb(&state),
            Err(ProvenanceError::UnknownDependency { .. })
        ));

        let mut fed = ProvenanceGraph::scoped(FED);
        fed.record(c(5), fed_agi.clone(), &[], "AGI").unwrap();
        let mut all = ProvenanceGraph::combined();
        all.absorb(&fed).unwrap();
        all.absorb(&state).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.external_references().is_empty());
    }

    #[test]
    fn topological_order_follows_dependencies() {
        let mut g = ProvenanceGraph::scoped(GA);
        let a = g.record(c(1), GA.id("a"), &[], "a").unwrap();
        let b = g.record(c(2), GA.id("b"), &[&a], "b").unwrap();
        g.record(c(3), GA.id("c"), &[&a, &b], "c").unwrap();

        let order: Vec<String> = g
            .topological_order()
            .unwrap()
            .iter()
            .map(|n| n.id.to_string())
            .collect();
        assert_eq!(order, ["ga500.a", "ga500.b", "ga500.c"]);
    }

    #[test]
    fn elision_keeps_zero_nodes_that_are_depended_upon() {
        let mut g = ProvenanceGraph::scoped(GA);
        let zero_dep = g.record(c(0), GA.id("zero_input"), &[], "z").unwrap();
        g.record(c(0), GA.id("zero_leaf"), &[], "unused zero").unwrap();
        g.record(c(10), GA.id("total"), &[&zero_dep], "t").unwrap();

        let view = g.elided(ElisionPolicy::ElideZero);
        let ids: Vec<String> = view.iter().map(|n| n.id.to_string()).collect();
        assert_eq!(ids, ["ga500.zero_input", "ga500.total"]);
        // The complete graph is untouched.
        assert_eq!(g.len(), 3);
        assert_eq!(g.elided(ElisionPolicy::ShowAll).len(), 3);
    }

    #[test]
    fn lineage_returns_ancestors_in_order() {
        let mut g = ProvenanceGraph::scoped(GA);
        let a = g.record(c(1), GA.id("a"), &[], "a").unwrap();
        let b = g.record(c(2), GA.id("b"), &[], "b").unwrap();
        let s = g.record(c(3), GA.id("sum"), &[&a, &b], "a+b").unwrap();
        g.record(c(9), GA.id("unrelated"), &[], "u").unwrap();

        let ids: Vec<String> = g
            .lineage(&s)
            .unwrap()
            .iter()
            .map(|n| n.id.to_string())
            .collect();
        assert_eq!(ids, ["ga500.a", "ga500.b", "ga500.sum"]);
        assert!(g.lineage_of("ga500.missing").is_err());
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let build = |amount: i64| {
            let mut g = ProvenanceGraph::scoped(GA);
            g.record(c(amount), GA.id("tax"), &[], "tax").unwrap();
            g
        };
        assert_eq!(build(1).digest(), build(1).digest());
        assert_ne!(build(1).digest(), build(2).digest());
        assert_eq!(build(1).digest().len(), 64);
    }
}
