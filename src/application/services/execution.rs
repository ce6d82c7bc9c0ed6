/// Execution Coordinator - Swapping a Resting Bucket Against the Pool
///
/// Executing a bucket is a two-step round trip with the pool manager:
///
/// 1. `execute` drains the bucket, parks the request in `Phase::Executing`
///    and calls `unlock` with the hook itself as the callback.
/// 2. The pool manager calls back `unlock_callback`, which swaps the whole
///    amount at the extreme price limit, settles the input owed from custody
///    and takes the output into custody. The swap delta is written back into
///    the parked request.
///
/// Back in `execute` the output is credited to the bucket's receipt class.
/// Any failure in the round trip fails the whole enclosing operation; the
/// pool manager reverts its side of the session.

use crate::application::hook::{InFlight, LimitOrderHook, Phase};
use crate::application::ports::{AssetTransfer, PoolError, PoolManager, ReceiptLedger};
use crate::domain::orderbook::PendingOrderBook;
use crate::domain::tick_math::extreme_tick;
use crate::error::{AccessError, ExternalCallFailure, HookError, HookResult, InvariantViolation};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{ClassId, Direction, HookEvent, PoolId, PoolKey, SwapParams};
use serde::Serialize;
use tracing::info;

/// One executed bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRecord {
    pub pool: PoolId,
    pub class_id: ClassId,
    pub boundary: i32,
    pub direction: Direction,
    pub amount_filled: u128,
    pub proceeds: u128,
}

/// Unwraps an error raised by one of our own callbacks, otherwise classifies
/// the pool failure with `wrap`.
pub(crate) fn external(err: PoolError, wrap: fn(PoolError) -> ExternalCallFailure) -> HookError {
    match err {
        PoolError::Callback(inner) => *inner,
        other => wrap(other).into(),
    }
}

pub(crate) fn unlock_failure(err: PoolError) -> HookError {
    external(err, ExternalCallFailure::UnlockFailed)
}

impl<L: ReceiptLedger, T: AssetTransfer> LimitOrderHook<L, T> {
    /// Executes the whole bucket at `boundary`. Returns `None` if the bucket
    /// was already empty.
    pub(crate) fn execute(
        &mut self,
        manager: &mut dyn PoolManager,
        key: &PoolKey,
        boundary: i32,
        direction: Direction,
    ) -> HookResult<Option<ExecutionRecord>> {
        let pool = key.id();
        let amount = self.state().book.take_pending(&pool, boundary, direction);
        if amount == 0 {
            return Ok(None);
        }

        let request = InFlight {
            key: key.clone(),
            boundary,
            direction,
            amount,
            outcome: None,
        };
        let crossing = std::mem::replace(&mut self.phase, Phase::Executing(request));
        let unlocked = manager.unlock(self.account, &mut *self);
        let finished = std::mem::replace(&mut self.phase, crossing);
        unlocked.map_err(unlock_failure)?;

        let delta = match finished {
            Phase::Executing(InFlight {
                outcome: Some(delta),
                ..
            }) => delta,
            _ => return Err(InvariantViolation::MissingExecutionOutcome.into()),
        };

        let proceeds = delta.output_received(direction);
        let class_id = ClassId::derive(&pool, boundary, direction);
        {
            let mut state = self.state();
            state.receipts.credit_proceeds(&class_id, proceeds)?;
            state.receipts.check_invariants(&class_id)?;
        }

        METRICS
            .orders_executed_total
            .with_label_values(&[direction.as_str()])
            .inc();
        self.record_pending_gauge(&pool, direction);
        info!(
            pool = %pool,
            boundary,
            direction = %direction,
            amount_filled = amount,
            proceeds,
            "bucket executed"
        );
        self.emit(HookEvent::OrderExecuted {
            pool,
            class_id,
            amount_filled: amount,
            proceeds,
        });

        Ok(Some(ExecutionRecord {
            pool,
            class_id,
            boundary,
            direction,
            amount_filled: amount,
            proceeds,
        }))
    }

    /// Callback half of `execute`: swap, settle the input, take the output.
    pub(crate) fn execute_in_flight(&mut self, manager: &mut dyn PoolManager) -> HookResult<()> {
        let (key, direction, amount) = match &self.phase {
            Phase::Executing(request) if request.outcome.is_none() => {
                (request.key.clone(), request.direction, request.amount)
            }
            _ => return Err(AccessError::UnexpectedCallback.into()),
        };

        let params = SwapParams {
            direction,
            amount_in: amount,
            tick_limit: extreme_tick(direction),
        };
        let delta = manager
            .swap(self.account, &key, params, &mut *self)
            .map_err(|e| external(e, ExternalCallFailure::SwapFailed))?;

        let consumed = delta.input_owed(direction);
        if consumed != amount {
            return Err(ExternalCallFailure::IncompleteFill {
                requested: amount,
                consumed,
            }
            .into());
        }

        let custodian = self.transfer.custodian();
        manager
            .settle(custodian, key.input_currency(direction), consumed)
            .map_err(|e| external(e, ExternalCallFailure::SettleFailed))?;

        let proceeds = delta.output_received(direction);
        if proceeds > 0 {
            manager
                .take(key.output_currency(direction), custodian, proceeds)
                .map_err(|e| external(e, ExternalCallFailure::TakeFailed))?;
        }

        if let Phase::Executing(request) = &mut self.phase {
            request.outcome = Some(delta);
        }
        Ok(())
    }
}
