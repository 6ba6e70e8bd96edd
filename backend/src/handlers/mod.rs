//! HTTP handlers for the bar stock ledger API

pub mod health;
pub mod lots;
pub mod purchases;
pub mod reporting;
pub mod withdrawals;

pub use health::health_check;
pub use lots::{archive_lot, create_lot, get_lot, list_lots, withdraw};
pub use purchases::{add_purchase, delete_purchase, list_purchases, transfer_purchase};
pub use reporting::{get_archive_history, get_low_stock, get_material_references, get_price_quote};
pub use withdrawals::list_withdrawals;
