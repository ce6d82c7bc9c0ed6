/// Limit Order Hook - Pool Hook State and Entry Points
///
/// Drives the engine state (pending buckets, receipt classes and the per-pool
/// crossing cursor, kept in the `HookJournal`) and the two collaborators it
/// owns: the receipt ledger and asset custody. The pool manager is never
/// stored; it is handed in by each call as `&mut dyn PoolManager`.
///
/// ## Atomicity
/// Each public operation runs inside `transact`: engine state is saved first,
/// ledger side effects register a compensation, and events are held back
/// until commit. A failure restores the saved state, replays compensations in
/// reverse and drops the buffered events. Pool-side effects are reverted by
/// the pool manager itself when the enclosing unlock or swap fails, and the
/// journal reverts the engine state with them.
///
/// Holder operations (`place_order`, `cancel_order`, `redeem`) are rejected
/// while a pool manager session is open, since their ledger effects cannot
/// follow a session revert.
///
/// ## Phases
/// ```text
/// Idle --after_swap--> Crossing --execute--> Executing --callback done--> Crossing --> Idle
/// ```
/// `unlock_callback` is only honored while `Executing` or while a resume
/// session is being opened. The nested `after_swap` caused by the engine's
/// own execution swap is a no-op.
///
/// ## Operations
/// - `place_order`, `cancel_order`, `redeem`: see `use_cases`
/// - `after_initialize`, `after_swap`, `resume_crossings`: see `services::crossing`
/// - `unlock_callback`: see `services::execution`

use crate::application::config::HookConfig;
use crate::application::journal::HookJournal;
use crate::application::ports::{
    AssetTransfer, PoolManager, ReceiptLedger, SessionJournal, SwapHooks, UnlockCallback,
};
use crate::application::services::crossing::TriggerReport;
use crate::domain::orderbook::{PendingOrderBook, TickBucketBook};
use crate::domain::receipts::{ReceiptBook, ReceiptClass};
use crate::domain::tick_math::{boundary_of, check_width};
use crate::domain::validation::OrderValidator;
use crate::error::{AccessError, HookError, HookResult, PreconditionError};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{
    AccountId, BalanceDelta, ClassId, Direction, HookEvent, PoolId, PoolKey, SwapParams,
};
use parking_lot::MappedMutexGuard;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

/// Crossing cursor of one initialized pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolCursor {
    pub key: PoolKey,
    /// Boundary the engine last observed the pool price at
    pub last_seen: i32,
    /// Fill directions still owed a scan from `last_seen` because a trigger
    /// hit the crossing cap. Drained first by the next trigger.
    pub deferred: SmallVec<[Direction; 2]>,
}

/// Everything a failed operation must roll back
#[derive(Debug, Clone, Default)]
pub(crate) struct HookState {
    pub(crate) book: TickBucketBook,
    pub(crate) receipts: ReceiptBook,
    pub(crate) pools: HashMap<PoolId, PoolCursor>,
}

/// Request handed from the crossing loop to the unlock callback
#[derive(Debug, Clone)]
pub(crate) struct InFlight {
    pub(crate) key: PoolKey,
    pub(crate) boundary: i32,
    pub(crate) direction: Direction,
    pub(crate) amount: u128,
    pub(crate) outcome: Option<BalanceDelta>,
}

#[derive(Debug, Clone)]
pub(crate) enum Phase {
    Idle,
    Crossing { pool: PoolId },
    Executing(InFlight),
    /// Waiting for the unlock session opened by `resume_crossings`
    Resuming {
        pool: PoolId,
        report: Option<TriggerReport>,
    },
}

impl Phase {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Crossing { .. } => "crossing",
            Phase::Executing(_) => "executing",
            Phase::Resuming { .. } => "resuming",
        }
    }
}

/// Ledger effects to undo when a later step fails
#[derive(Debug, Clone, Copy)]
pub(crate) enum Compensation {
    Burn {
        holder: AccountId,
        class_id: ClassId,
        amount: u128,
    },
    Mint {
        holder: AccountId,
        class_id: ClassId,
        amount: u128,
    },
}

pub(crate) type Compensations = SmallVec<[Compensation; 2]>;

pub struct LimitOrderHook<L: ReceiptLedger, T: AssetTransfer> {
    /// Account the engine acts as towards the pool manager
    pub(crate) account: AccountId,
    /// The only account allowed to deliver hook callbacks
    pub(crate) pool_manager: AccountId,
    pub(crate) config: HookConfig,
    pub(crate) validator: OrderValidator,
    pub(crate) phase: Phase,
    pub(crate) ledger: L,
    pub(crate) transfer: T,
    journal: Arc<HookJournal>,
}

impl<L: ReceiptLedger, T: AssetTransfer> LimitOrderHook<L, T> {
    /// Creates a hook acting as `account` that accepts callbacks from
    /// `pool_manager` only
    pub fn new(
        account: AccountId,
        pool_manager: AccountId,
        config: HookConfig,
        ledger: L,
        transfer: T,
    ) -> Self {
        Self {
            account,
            pool_manager,
            validator: OrderValidator::with_config(config.validation()),
            config,
            phase: Phase::Idle,
            ledger,
            transfer,
            journal: Arc::new(HookJournal::new()),
        }
    }

    /// Committed events are also forwarded to `sink`
    pub fn with_event_sink(self, sink: UnboundedSender<HookEvent>) -> Self {
        self.journal.set_sink(sink);
        self
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Unfilled volume resting at (pool, boundary, direction)
    pub fn pending_volume(&self, pool: &PoolId, boundary: i32, direction: Direction) -> u128 {
        self.state().book.peek_pending(pool, boundary, direction)
    }

    /// Resting buckets of one pool side, ascending by boundary
    pub fn depth(&self, pool: &PoolId, direction: Direction) -> Vec<(i32, u128)> {
        self.state().book.depth(pool, direction)
    }

    pub fn class(&self, class_id: &ClassId) -> Option<ReceiptClass> {
        self.state().receipts.class(class_id).cloned()
    }

    /// Class id a placement at raw `tick` would land in
    pub fn class_id_for(&self, key: &PoolKey, tick: i32, direction: Direction) -> HookResult<ClassId> {
        check_width(key.tick_spacing)?;
        Ok(ClassId::derive(
            &key.id(),
            boundary_of(tick, key.tick_spacing),
            direction,
        ))
    }

    pub fn last_seen_boundary(&self, pool: &PoolId) -> Option<i32> {
        self.state().pools.get(pool).map(|cursor| cursor.last_seen)
    }

    pub fn cursor(&self, pool: &PoolId) -> Option<PoolCursor> {
        self.state().pools.get(pool).cloned()
    }

    /// Payout a redemption of `amount` would produce right now
    pub fn preview_redeem(&self, class_id: &ClassId, amount: u128) -> HookResult<u128> {
        self.state().receipts.quote_redemption(class_id, amount)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    pub(crate) fn ensure_idle(&self) -> Result<(), AccessError> {
        match self.phase {
            Phase::Idle => Ok(()),
            ref phase => Err(AccessError::Reentrant { phase: phase.name() }),
        }
    }

    /// Holder operations run outside of pool manager sessions only
    pub(crate) fn ensure_no_session(&self) -> Result<(), AccessError> {
        match self.journal.open_sessions() {
            0 => Ok(()),
            depth => Err(AccessError::InsideSession { depth }),
        }
    }

    pub(crate) fn ensure_pool_manager(&self, manager: &dyn PoolManager) -> Result<(), AccessError> {
        let caller = manager.account();
        if caller != self.pool_manager {
            return Err(AccessError::UnauthorizedCaller { caller });
        }
        Ok(())
    }

    /// Engine state. The guard must not be held across a pool manager call.
    pub(crate) fn state(&self) -> MappedMutexGuard<'_, HookState> {
        self.journal.state()
    }

    pub(crate) fn pool_key(&self, pool: &PoolId) -> Result<PoolKey, PreconditionError> {
        self.state()
            .pools
            .get(pool)
            .map(|cursor| cursor.key.clone())
            .ok_or(PreconditionError::PoolNotInitialized(*pool))
    }

    pub(crate) fn emit(&self, event: HookEvent) {
        self.journal.emit(event);
    }

    /// Runs `op` atomically with respect to engine state, ledger effects and
    /// published events.
    pub(crate) fn transact<R>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut Self, &mut Compensations) -> HookResult<R>,
    ) -> HookResult<R> {
        let savepoint = self.journal.begin();
        let mut undo = Compensations::new();

        match op(self, &mut undo) {
            Ok(result) => {
                self.journal.commit();
                Ok(result)
            }
            Err(err) => {
                self.journal.rollback(savepoint);
                self.compensate(undo);
                METRICS.errors_total.with_label_values(&[err.family()]).inc();
                if let HookError::Invariant(_) = err {
                    error!(operation = name, error = %err, "invariant violated, operation rolled back");
                } else {
                    warn!(operation = name, error = %err, "operation rolled back");
                }
                Err(err)
            }
        }
    }

    fn compensate(&mut self, undo: Compensations) {
        for step in undo.into_iter().rev() {
            let result = match step {
                Compensation::Burn {
                    holder,
                    class_id,
                    amount,
                } => self.ledger.burn(holder, &class_id, amount),
                Compensation::Mint {
                    holder,
                    class_id,
                    amount,
                } => self.ledger.mint(holder, &class_id, amount),
            };
            if let Err(e) = result {
                error!(?step, error = %e, "receipt ledger compensation failed");
            }
        }
    }

    pub(crate) fn record_pending_gauge(&self, pool: &PoolId, direction: Direction) {
        let total = self.state().book.total_pending(pool, direction);
        METRICS
            .pending_volume
            .with_label_values(&[&pool.to_string()[..16], direction.as_str()])
            .set(total as f64);
    }

    // ========================================================================
    // Pool initialization
    // ========================================================================

    fn register_pool(&mut self, key: &PoolKey, tick: i32) -> HookResult<()> {
        check_width(key.tick_spacing)?;
        let pool = key.id();
        let mut state = self.state();
        if state.pools.contains_key(&pool) {
            return Err(PreconditionError::PoolAlreadyInitialized(pool).into());
        }

        let last_seen = boundary_of(tick, key.tick_spacing);
        state.pools.insert(
            pool,
            PoolCursor {
                key: key.clone(),
                last_seen,
                deferred: SmallVec::new(),
            },
        );
        info!(pool = %pool, tick, last_seen, "pool registered");
        Ok(())
    }
}

impl<L: ReceiptLedger, T: AssetTransfer> SwapHooks for LimitOrderHook<L, T> {
    fn after_initialize(
        &mut self,
        manager: &mut dyn PoolManager,
        key: &PoolKey,
        tick: i32,
    ) -> Result<(), HookError> {
        self.ensure_pool_manager(manager)?;
        self.ensure_idle()?;
        self.transact("after_initialize", |hook, _| hook.register_pool(key, tick))
    }

    fn after_swap(
        &mut self,
        manager: &mut dyn PoolManager,
        sender: AccountId,
        key: &PoolKey,
        params: &SwapParams,
        _delta: BalanceDelta,
    ) -> Result<(), HookError> {
        self.ensure_pool_manager(manager)?;

        if sender == self.account {
            // the engine's own execution swap
            return match self.phase {
                Phase::Executing(_) => Ok(()),
                ref phase => Err(AccessError::Reentrant { phase: phase.name() }.into()),
            };
        }
        self.ensure_idle()?;

        let pool = key.id();
        if !self.state().pools.contains_key(&pool) {
            return Err(PreconditionError::PoolNotInitialized(pool).into());
        }

        self.phase = Phase::Crossing { pool };
        let fill = params.direction.opposite();
        let result = self.transact("after_swap", |hook, _| {
            hook.run_trigger(manager, &pool, Some(fill)).map(|_| ())
        });
        self.phase = Phase::Idle;
        result
    }

    fn session_journal(&self) -> Option<Arc<dyn SessionJournal>> {
        let journal: Arc<dyn SessionJournal> = self.journal.clone();
        Some(journal)
    }
}

impl<L: ReceiptLedger, T: AssetTransfer> UnlockCallback for LimitOrderHook<L, T> {
    fn unlock_callback(&mut self, manager: &mut dyn PoolManager) -> Result<(), HookError> {
        self.ensure_pool_manager(manager)?;
        match self.phase {
            Phase::Resuming { pool, report: None } => self.resume_in_session(manager, pool),
            _ => self.execute_in_flight(manager),
        }
    }
}
