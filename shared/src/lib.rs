//! Shared types and rules for the Barstock stock ledger
//!
//! This crate holds the domain model and every pure rule of the ledger so the
//! backend service and the browser (via WASM) compute lengths, values and
//! reports the same way.

pub mod error;
pub mod ledger;
pub mod models;
pub mod reporting;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
