/// Application Layer - Hook, Use Cases and Services
///
/// Orchestrates the domain state against the collaborators declared in
/// `ports`. Independent of any concrete pool manager, ledger or custody.
///
/// ## Modules
/// - `ports`: collaborator traits and their error types
/// - `config`: hook configuration
/// - `hook`: `LimitOrderHook`, its phases and transactions
/// - `journal`: engine state checkpointed with pool manager sessions
/// - `services`: crossing and execution
/// - `use_cases`: place, cancel, redeem

pub mod config;
pub mod hook;
pub mod journal;
pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export key types
pub use config::HookConfig;
pub use hook::{LimitOrderHook, PoolCursor};
pub use journal::HookJournal;
pub use ports::{
    AssetTransfer, PoolManager, ReceiptLedger, SessionJournal, SwapHooks, UnlockCallback,
};
pub use services::{ExecutionRecord, TriggerReport};
pub use use_cases::{CancelOrderResult, PlaceOrderResult, RedeemResult};
