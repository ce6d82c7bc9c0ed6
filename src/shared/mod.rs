/// Shared utilities and types used across all layers
///
/// This module contains:
/// - Protocol definitions (identities, swap shapes, published events)
/// - Currency symbol interning
/// - Prometheus metrics

pub mod protocol;
pub mod symbol_pool;
pub mod metrics;

// Re-export commonly used types
pub use protocol::{
    AccountId, BalanceDelta, ClassId, Currency, Direction, HookEvent, PoolId, PoolKey, SwapParams,
};

pub use symbol_pool::SymbolPool;
