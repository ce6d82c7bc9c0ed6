/// Place Order Use Case
///
/// Rests `amount` of the input currency at the boundary containing `tick` and
/// mints the same amount of receipts of the bucket's class to the holder.
///
/// ## Workflow
/// 1. Validate size, width and tick
/// 2. Check the pool was initialized with this hook
/// 3. Add to the pending bucket, open the class and issue supply
/// 4. Mint receipts, then debit the holder's input currency
///
/// A failure at step 4 burns the receipts already minted and restores the
/// book and the class totals.
///
/// ## Example
/// ```rust,ignore
/// let placed = hook.place_order(maker, &key, 125, Direction::ZeroForOne, 5000)?;
/// assert_eq!(placed.boundary, 120);
/// ```

use crate::application::hook::{Compensation, LimitOrderHook};
use crate::application::ports::{AssetTransfer, ReceiptLedger};
use crate::domain::orderbook::PendingOrderBook;
use crate::domain::tick_math::boundary_of;
use crate::error::{ExternalCallFailure, HookResult, PreconditionError};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{AccountId, ClassId, Direction, HookEvent, PoolKey};
use tracing::info;

/// Result of a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceOrderResult {
    pub class_id: ClassId,
    /// Boundary the order rests at
    pub boundary: i32,
}

impl<L: ReceiptLedger, T: AssetTransfer> LimitOrderHook<L, T> {
    pub fn place_order(
        &mut self,
        holder: AccountId,
        key: &PoolKey,
        tick: i32,
        direction: Direction,
        amount: u128,
    ) -> HookResult<PlaceOrderResult> {
        self.ensure_idle()?;
        self.ensure_no_session()?;

        self.transact("place_order", |hook, undo| {
            hook.validator.validate_placement(key, tick, amount)?;

            let pool = key.id();
            if !hook.state().pools.contains_key(&pool) {
                return Err(PreconditionError::PoolNotInitialized(pool).into());
            }

            let boundary = boundary_of(tick, key.tick_spacing);
            let class_id = {
                let mut state = hook.state();
                state.book.add_pending(&pool, boundary, direction, amount)?;
                let class_id = state.receipts.open_class(&pool, boundary, direction);
                state.receipts.issue(&class_id, amount)?;
                class_id
            };

            hook.ledger
                .mint(holder, &class_id, amount)
                .map_err(ExternalCallFailure::LedgerFailed)?;
            undo.push(Compensation::Burn {
                holder,
                class_id,
                amount,
            });

            hook.transfer
                .debit(holder, key.input_currency(direction), amount)
                .map_err(ExternalCallFailure::TransferFailed)?;

            METRICS
                .orders_placed_total
                .with_label_values(&[direction.as_str()])
                .inc();
            METRICS
                .order_size
                .with_label_values(&[direction.as_str()])
                .observe(amount as f64);
            hook.record_pending_gauge(&pool, direction);
            info!(
                holder = %holder,
                pool = %pool,
                tick,
                boundary,
                direction = %direction,
                amount,
                "order placed"
            );
            hook.emit(HookEvent::OrderPlaced {
                class_id,
                holder,
                amount,
                boundary,
                direction,
            });

            Ok(PlaceOrderResult { class_id, boundary })
        })
    }
}
