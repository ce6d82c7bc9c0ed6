/// Infrastructure Layer - Technical Implementations
///
/// Concrete collaborators behind the application ports. The application layer
/// never depends on this module.
///
/// ## Modules
/// - `memory`: in-memory pool manager, bank custody and receipt ledger

pub mod memory;

// Re-export key types
pub use memory::{Bank, BankTransfer, InMemoryPoolManager, InMemoryReceiptLedger, NoHooks};
