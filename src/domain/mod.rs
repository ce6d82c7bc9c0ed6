/// Domain Layer - Core Business Logic
///
/// Pure state and arithmetic with no collaborator calls. Everything here can be
/// tested in isolation and cloned cheaply for transaction snapshots.
///
/// ## Modules
/// - `tick_math`: boundary arithmetic and full-precision mul-div
/// - `orderbook`: pending volume per (pool, boundary, direction)
/// - `receipts`: receipt class totals and redemption math
/// - `validation`: placement rules

pub mod tick_math;
pub mod orderbook;
pub mod receipts;
pub mod validation;

// Re-export key types
pub use orderbook::{PendingOrderBook, TickBucketBook};
pub use receipts::{ReceiptBook, ReceiptClass};
pub use validation::{OrderValidator, ValidationConfig};
