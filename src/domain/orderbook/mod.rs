/// Domain Layer - OrderBook Module
///
/// Resting limit-order volume bucketed by (pool, boundary, direction).
///
/// ## Production Implementation
/// - `TickBucketBook`: ordered buckets per pool side; the crossing scan is a
///   `BTreeMap` range query instead of a walk over every boundary
///
/// ## Trait Abstraction
/// The `PendingOrderBook` trait is the seam the crossing engine is written
/// against, with a default boundary-by-boundary walk for simple implementations.

pub mod tick_based;
pub mod traits;

pub use tick_based::TickBucketBook;
pub use traits::PendingOrderBook;
