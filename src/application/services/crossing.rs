/// Crossing Service - Post-Swap Boundary Scan
///
/// After every external swap the engine compares the boundary the pool price
/// now sits in with the boundary it last observed, and executes every resting
/// bucket of the fill direction that the move crossed.
///
/// ## Algorithm (one direction)
/// 1. `current = boundary_of(current_tick, width)`
/// 2. first active bucket on the walk from `last_seen` toward `current`
///    (ascending when the price rose, descending when it fell; `current`
///    itself excluded)
/// 3. found: execute it, go back to 1 (the execution moved the price)
/// 4. none: the pool is stable, commit `last_seen = current`
///
/// The fill direction is the opposite of the external swap's direction: a
/// swap that pushes the price up crosses resting sells of currency0.
///
/// ## Crossing cap
/// At most `max_crossings_per_trigger` executions run per trigger. When the
/// cap is hit while fillable volume remains, `last_seen` is left untouched and
/// the direction is recorded as deferred. The next trigger for the pool (or an
/// explicit `resume_crossings`) scans the deferred directions first.

use crate::application::hook::{LimitOrderHook, Phase, PoolCursor};
use crate::application::ports::{AssetTransfer, PoolManager, ReceiptLedger};
use crate::application::services::execution::{unlock_failure, ExecutionRecord};
use crate::domain::orderbook::PendingOrderBook;
use crate::domain::tick_math::boundary_of;
use crate::error::{ExternalCallFailure, HookResult, InvariantViolation, PreconditionError};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{Direction, HookEvent, PoolId, PoolKey};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

/// Outcome of one post-swap trigger or resume
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerReport {
    /// Executions in the order they ran
    pub executions: SmallVec<[ExecutionRecord; 4]>,
    /// Set when the crossing cap stopped the run
    pub deferred: Option<Direction>,
    /// Cursor after the trigger
    pub last_seen: i32,
}

enum Crossing {
    Stable { boundary: i32 },
    CapReached,
}

impl<L: ReceiptLedger, T: AssetTransfer> LimitOrderHook<L, T> {
    /// Drains crossings a previous trigger deferred because of the cap.
    ///
    /// The run is wrapped in its own unlock session so the pool manager
    /// reverts every execution if any of them fails.
    pub fn resume_crossings(
        &mut self,
        manager: &mut dyn PoolManager,
        key: &PoolKey,
    ) -> HookResult<TriggerReport> {
        self.ensure_pool_manager(manager)?;
        self.ensure_idle()?;
        let pool = key.id();

        let result = self.transact("resume_crossings", |hook, _| {
            hook.pool_key(&pool)?;
            hook.phase = Phase::Resuming { pool, report: None };
            let unlocked = manager.unlock(hook.account, &mut *hook);
            let finished = std::mem::replace(&mut hook.phase, Phase::Idle);
            unlocked.map_err(unlock_failure)?;

            match finished {
                Phase::Resuming {
                    report: Some(report),
                    ..
                } => Ok(report),
                _ => Err(InvariantViolation::MissingExecutionOutcome.into()),
            }
        });
        self.phase = Phase::Idle;
        result
    }

    /// Body of a resume session, called back from inside `unlock`
    pub(crate) fn resume_in_session(
        &mut self,
        manager: &mut dyn PoolManager,
        pool: PoolId,
    ) -> HookResult<()> {
        self.phase = Phase::Crossing { pool };
        let report = self.run_trigger(manager, &pool, None)?;
        self.phase = Phase::Resuming {
            pool,
            report: Some(report),
        };
        Ok(())
    }

    /// Scans the deferred directions of `pool`, then `own` if given, and
    /// commits the cursor once every one of them is stable.
    pub(crate) fn run_trigger(
        &mut self,
        manager: &mut dyn PoolManager,
        pool: &PoolId,
        own: Option<Direction>,
    ) -> HookResult<TriggerReport> {
        let key = self.pool_key(pool)?;
        let mut owed = self.with_cursor(pool, |cursor| cursor.deferred.clone())?;
        if let Some(direction) = own {
            if !owed.contains(&direction) {
                owed.push(direction);
            }
        }

        let mut budget = self.config.max_crossings_per_trigger.max(1);
        let mut executions = SmallVec::new();
        let mut settled_at = None;

        for (position, direction) in owed.iter().copied().enumerate() {
            match self.cross(manager, &key, pool, direction, &mut budget, &mut executions)? {
                Crossing::Stable { boundary } => settled_at = Some(boundary),
                Crossing::CapReached => {
                    let last_seen = self.with_cursor(pool, |cursor| {
                        cursor.deferred = owed[position..].iter().copied().collect();
                        cursor.last_seen
                    })?;

                    warn!(
                        pool = %pool,
                        direction = %direction,
                        last_seen,
                        executed = executions.len(),
                        "crossing cap reached, deferring remaining crossings"
                    );
                    METRICS
                        .crossings_deferred_total
                        .with_label_values(&[direction.as_str()])
                        .inc();
                    self.observe_trigger(direction, executions.len());
                    self.emit(HookEvent::CrossingDeferred {
                        pool: *pool,
                        direction,
                        last_seen_boundary: last_seen,
                        executed: executions.len(),
                    });

                    return Ok(TriggerReport {
                        executions,
                        deferred: Some(direction),
                        last_seen,
                    });
                }
            }
        }

        let last_seen = self.with_cursor(pool, |cursor| {
            if let Some(boundary) = settled_at {
                cursor.last_seen = boundary;
            }
            cursor.deferred.clear();
            cursor.last_seen
        })?;

        if let Some(direction) = own {
            self.observe_trigger(direction, executions.len());
        }
        if !executions.is_empty() {
            info!(pool = %pool, executed = executions.len(), last_seen, "crossings settled");
        }

        Ok(TriggerReport {
            executions,
            deferred: None,
            last_seen,
        })
    }

    fn cross(
        &mut self,
        manager: &mut dyn PoolManager,
        key: &PoolKey,
        pool: &PoolId,
        direction: Direction,
        budget: &mut usize,
        executions: &mut SmallVec<[ExecutionRecord; 4]>,
    ) -> HookResult<Crossing> {
        let last_seen = self.with_cursor(pool, |cursor| cursor.last_seen)?;

        loop {
            let tick = manager
                .current_tick(pool)
                .map_err(ExternalCallFailure::PriceReadFailed)?;
            let current = boundary_of(tick, key.tick_spacing);

            let next = self
                .state()
                .book
                .next_active(pool, direction, last_seen, current, key.tick_spacing);
            let Some(boundary) = next else {
                debug!(pool = %pool, direction = %direction, last_seen, current, "stable");
                return Ok(Crossing::Stable { boundary: current });
            };

            if *budget == 0 {
                return Ok(Crossing::CapReached);
            }
            *budget -= 1;

            if let Some(record) = self.execute(manager, key, boundary, direction)? {
                executions.push(record);
            }
        }
    }

    fn with_cursor<R>(
        &self,
        pool: &PoolId,
        f: impl FnOnce(&mut PoolCursor) -> R,
    ) -> Result<R, PreconditionError> {
        let mut state = self.state();
        let cursor = state
            .pools
            .get_mut(pool)
            .ok_or(PreconditionError::PoolNotInitialized(*pool))?;
        Ok(f(cursor))
    }

    fn observe_trigger(&self, direction: Direction, executed: usize) {
        METRICS
            .executions_per_trigger
            .with_label_values(&[direction.as_str()])
            .observe(executed as f64);
    }
}
