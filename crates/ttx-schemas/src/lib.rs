//! ttx-schemas
//!
//! Wire shapes shared across the engine boundary:
//! - `TaxpayerModel`: the caller-owned, already-validated intake record
//! - `FederalResult`: the federal module's output, read-only to every state
//!
//! The engine never mutates either.  All amounts are integer cents.

mod federal;
mod taxpayer;

pub use federal::{DeductionKind, FederalResult};
pub use taxpayer::{
    DeductionElection, Dependent, FilingStatus, Form1099Div, Form1099G, Form1099Int, Form1099Nec,
    Form1099R, IncomeDocument, IncomeDocuments, Person, StateAmount, StateReturnConfig,
    TaxpayerModel, W2,
};

pub use ttx_money::{ResidencyType, ResidencyWindow};
