//! Error taxonomy
//!
//! - [`PreconditionError`]: rejected before any state change
//! - [`ExternalCallFailure`]: a collaborator failed, the whole operation rolled back
//! - [`InvariantViolation`]: arithmetic or bookkeeping defect, never clamped
//! - [`AccessError`]: a callback arrived from an unexpected caller or phase

use crate::application::ports::{LedgerError, PoolError, TransferError};
use crate::shared::protocol::{AccountId, ClassId, PoolId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("order size {amount} is below the minimum {minimum}")]
    BelowMinimumSize { amount: u128, minimum: u128 },

    #[error("order size {amount} exceeds the maximum {maximum}")]
    AboveMaximumSize { amount: u128, maximum: u128 },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("receipt balance {held} is below the requested {requested}")]
    InsufficientReceiptBalance { held: u128, requested: u128 },

    #[error("class {0} has nothing claimable")]
    NothingClaimable(ClassId),

    #[error("class {0} has filled receipts outstanding and cannot be cancelled")]
    ClassPartiallyFilled(ClassId),

    #[error("unknown receipt class {0}")]
    UnknownClass(ClassId),

    #[error("pool {0} has not been initialized")]
    PoolNotInitialized(PoolId),

    #[error("pool {0} is already initialized")]
    PoolAlreadyInitialized(PoolId),

    #[error("interval width must be positive, got {0}")]
    InvalidWidth(i32),

    #[error("tick {0} is outside the valid tick range")]
    TickOutOfRange(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExternalCallFailure {
    #[error("swap failed: {0}")]
    SwapFailed(PoolError),

    #[error("settle failed: {0}")]
    SettleFailed(PoolError),

    #[error("take failed: {0}")]
    TakeFailed(PoolError),

    #[error("price read failed: {0}")]
    PriceReadFailed(PoolError),

    #[error("unlock failed: {0}")]
    UnlockFailed(PoolError),

    #[error("swap consumed {consumed} of the {requested} resting volume")]
    IncompleteFill { requested: u128, consumed: u128 },

    #[error("transfer failed: {0}")]
    TransferFailed(TransferError),

    #[error("receipt ledger failed: {0}")]
    LedgerFailed(LedgerError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("pending volume at boundary {boundary} would go negative ({available} < {requested})")]
    PendingUnderflow {
        boundary: i32,
        available: u128,
        requested: u128,
    },

    #[error("pending volume at boundary {boundary} overflowed")]
    PendingOverflow { boundary: i32 },

    #[error("total supply of class {class_id} would go negative ({supply} < {requested})")]
    SupplyUnderflow {
        class_id: ClassId,
        supply: u128,
        requested: u128,
    },

    #[error("claimable {claimable} of class {class_id} exceeds unpaid proceeds {unpaid}")]
    ClaimableExceedsProceeds {
        class_id: ClassId,
        claimable: u128,
        unpaid: u128,
    },

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("execution finished without a recorded swap outcome")]
    MissingExecutionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("caller {caller} is not the configured pool manager")]
    UnauthorizedCaller { caller: AccountId },

    #[error("unlock callback received outside of an in-flight execution")]
    UnexpectedCallback,

    #[error("reentrant call rejected while {phase}")]
    Reentrant { phase: &'static str },

    #[error("holder operation rejected inside {depth} open pool manager session(s)")]
    InsideSession { depth: usize },
}

/// Top-level error returned by every hook operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    External(#[from] ExternalCallFailure),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Access(#[from] AccessError),
}

impl HookError {
    /// Label used for the `errors_total` metric
    pub fn family(&self) -> &'static str {
        match self {
            HookError::Precondition(_) => "precondition",
            HookError::External(_) => "external_call",
            HookError::Invariant(_) => "invariant",
            HookError::Access(_) => "access",
        }
    }
}

pub type HookResult<T> = Result<T, HookError>;
