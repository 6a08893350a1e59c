//! ttx-states
//!
//! State rules modules behind one contract.
//! - `StateRulesModule`: compute, collect traced values, static metadata
//! - `StateModule`: the closed set of jurisdictions, built from their tables
//! - Every module apportions through `ttx_money::compute_apportionment_ratio`
//! - Every module owns one namespace (`ga500`, `it540`, `sc1040`, `tc40`,
//!   `mo1040`, `ok511`) and may reference `f1040.*` as upstream
//!
//! Pure deterministic logic. No IO.

mod code;
mod contract;
mod module;
mod review;

pub mod ga;
pub mod la;
pub mod mo;
pub mod ok;
pub mod sc;
pub mod ut;

pub use code::StateCode;
pub use contract::{ModuleMeta, RulesError, StateComputeResult, StateRulesModule};
pub use module::{StateDetail, StateModule};
pub use review::{
    ResultKind, ResultLine, ReviewLayout, ReviewLine, ReviewRow, ReviewSection, Visibility,
};
