//! Domain models for the stock ledger

mod lot;
mod purchase;
mod report;
mod withdrawal;

pub use lot::*;
pub use purchase::*;
pub use report::*;
pub use withdrawal::*;
