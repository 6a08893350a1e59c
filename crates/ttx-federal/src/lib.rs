//! ttx-federal
//!
//! Federal Form 1040 computation.  Every state module reads this result and
//! none may write it.
//! - Income aggregation from W-2 and 1099 documents
//! - Schedule SE and its above-the-line deduction
//! - Standard vs. elected itemized deduction (larger wins)
//! - Progressive brackets, child tax credit (nonrefundable), EITC (refundable)
//! - `f1040.*` traced values for the return's provenance graph
//!
//! Pure deterministic logic. No IO.

mod compute;
mod trace;

pub use compute::compute_federal;
pub use trace::{collect_traced_values, node_label, NODE_LABELS};

use ttx_provenance::Namespace;

/// Namespace for every federal traced value.
pub const NAMESPACE: Namespace = Namespace::new("f1040");
