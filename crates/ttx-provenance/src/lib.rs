//! ttx-provenance
//!
//! Provenance graph for derived monetary values ("show your work").
//! - Every derived amount is a `TracedValue` naming the values it came from
//! - Ids are minted through a module-owned `Namespace`, never from bare strings
//! - Insertion rejects duplicates and forward references, so the graph is a DAG
//!   in computation order by construction
//! - Zero elision is a view over the complete graph, never a recomputation
//! - A hash-chained JSONL trail exports one run for offline audit
//!
//! No global state: every computation run owns its own graph.

mod graph;
mod id;
pub mod trail;

pub use graph::{record_computation, ElisionPolicy, ProvenanceError, ProvenanceGraph, TracedValue};
pub use id::{Namespace, TraceId};
pub use trail::{verify_trail, verify_trail_str, write_trail, TrailRecord, TrailVerdict};
