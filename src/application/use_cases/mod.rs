/// Use Cases - Holder-facing operations
///
/// Each use case is an inherent method on `LimitOrderHook` running inside a
/// single rollback-on-failure transaction.
///
/// ## Available Use Cases
/// - `place_order`: rest volume at a boundary, mint receipts
/// - `cancel_order`: withdraw fully pending volume, burn receipts
/// - `redeem`: burn filled receipts for proceeds

pub mod cancel_order;
pub mod place_order;
pub mod redeem_order;

// Re-export key types
pub use cancel_order::CancelOrderResult;
pub use place_order::PlaceOrderResult;
pub use redeem_order::RedeemResult;
