//! ttx-engine
//!
//! Composes the federal module and the registered state modules into one
//! return computation.
//! - `ModuleRegistry`: one module per state code, insertion ordered, built
//!   once at startup and read-only afterwards
//! - `compute_state_returns`: one result per requested state, request order
//! - `compute_return`: federal + states + one combined provenance graph
//!
//! Unsupported jurisdictions and malformed residency dates are configuration
//! errors, reported before any state is computed.  Provenance failures are
//! invariant violations and fail the whole request.

mod dispatch;
mod error;
mod registry;

pub use dispatch::{
    collect_state_provenance, compute_return, compute_state_returns, ReturnComputation,
};
pub use error::EngineError;
pub use registry::ModuleRegistry;
