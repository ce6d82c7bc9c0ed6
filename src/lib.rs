//! Limit orders for AMM pools, executed by a post-swap hook.
//!
//! Holders rest single-sided orders at tick boundaries of a pool and receive
//! fungible receipts. Whenever an external swap moves the pool price across a
//! boundary holding resting volume, the hook swaps that volume against the
//! pool and credits the output to the boundary's receipt class, which holders
//! redeem pro rata.
//!
//! ## Layers
//! - `shared`: identities, protocol types, events, metrics
//! - `domain`: tick math, pending book, receipt accounting, validation
//! - `application`: the hook, crossing and execution services, use cases
//! - `infrastructure`: in-memory pool manager, custody and receipt ledger
//! - `interfaces`: CLI and simulation

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use application::{HookConfig, LimitOrderHook};
pub use error::{HookError, HookResult};
