//! Business logic services for the bar stock ledger

pub mod ledger;
pub mod purchase;
pub mod reporting;

pub use ledger::StockLedger;
pub use purchase::PurchaseService;
pub use reporting::ReportingService;
