//! Hash-chained provenance trail.
//!
//! One run's graph is exported as JSON Lines, one traced value per line, in
//! topological order.  Each record carries `hash_prev` (the previous record's
//! `hash_self`) and `hash_self` (SHA-256 of its own canonical JSON with
//! `hash_self` cleared), so any edit, deletion or reordering is detectable
//! without the engine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

use crate::graph::canonical_json;
use crate::ProvenanceGraph;

/// One exported traced value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailRecord {
    pub seq: u64,
    pub run_id: Uuid,
    pub id: String,
    pub amount_cents: i64,
    pub derived_from: Vec<String>,
    pub description: String,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Result of trail verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailVerdict {
    /// The entire trail is valid.
    Valid { lines: usize },
    /// The trail is broken at the given (1-based) line.
    Broken { line: usize, reason: String },
}

/// Write `graph` to `path` (truncating), returning the records written.
pub fn write_trail(
    path: impl AsRef<Path>,
    run_id: Uuid,
    graph: &ProvenanceGraph,
) -> Result<Vec<TrailRecord>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {parent:?}"))?;
        }
    }

    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("open provenance trail {path:?}"))?;

    let mut last_hash: Option<String> = None;
    let mut out = Vec::with_capacity(graph.len());
    for (seq, node) in graph.iter().enumerate() {
        let mut rec = TrailRecord {
            seq: seq as u64,
            run_id,
            id: node.id.to_string(),
            amount_cents: node.amount.raw(),
            derived_from: node.derived_from.iter().map(|d| d.to_string()).collect(),
            description: node.description.clone(),
            hash_prev: last_hash.clone(),
            hash_self: None,
        };
        let self_hash = compute_record_hash(&rec)?;
        rec.hash_self = Some(self_hash.clone());
        last_hash = Some(self_hash);

        let line = canonical_line(&rec)?;
        f.write_all(line.as_bytes())
            .context("write trail line failed")?;
        f.write_all(b"\n").context("write newline failed")?;
        out.push(rec);
    }
    Ok(out)
}

/// Hash over the canonical JSON of a record WITHOUT `hash_self`.
pub fn compute_record_hash(rec: &TrailRecord) -> Result<String> {
    let mut clone = rec.clone();
    clone.hash_self = None;
    let canonical = canonical_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn canonical_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize trail record failed")?;
    Ok(canonical_json(&raw))
}

/// Verify a trail file.
pub fn verify_trail(path: impl AsRef<Path>) -> Result<TrailVerdict> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read provenance trail {:?}", path.as_ref()))?;
    verify_trail_str(&content)
}

/// Verify trail content: the hash chain, and that every dependency appears
/// on an earlier line.  A trail is expected to be complete, so references
/// to ids never exported count as breaks.
pub fn verify_trail_str(content: &str) -> Result<TrailVerdict> {
    let mut prev_hash: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let rec: TrailRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("parse trail record at line {}", i + 1))?;
        count += 1;

        if rec.hash_prev != prev_hash {
            return Ok(TrailVerdict::Broken {
                line: i + 1,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, rec.hash_prev
                ),
            });
        }

        if let Some(ref claimed) = rec.hash_self {
            let recomputed = compute_record_hash(&rec)?;
            if *claimed != recomputed {
                return Ok(TrailVerdict::Broken {
                    line: i + 1,
                    reason: format!("hash_self mismatch: claimed {claimed}, recomputed {recomputed}"),
                });
            }
        }

        if let Some(dep) = rec.derived_from.iter().find(|d| !seen.contains(*d)) {
            return Ok(TrailVerdict::Broken {
                line: i + 1,
                reason: format!("forward reference: '{}' derives from unseen '{dep}'", rec.id),
            });
        }

        seen.insert(rec.id.clone());
        prev_hash = rec.hash_self.clone();
    }

    Ok(TrailVerdict::Valid { lines: count })
}
