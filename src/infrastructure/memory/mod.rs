//! In-memory collaborators
//!
//! Reference implementations of the pool manager, asset custody and receipt
//! ledger ports. Used by the simulation CLI, the integration tests and the
//! benchmarks.

pub mod bank;
pub mod ledger;
pub mod pool_manager;

pub use bank::{Bank, BankState, BankTransfer};
pub use ledger::InMemoryReceiptLedger;
pub use pool_manager::{tick_at, InMemoryPoolManager, NoHooks, PoolState};
