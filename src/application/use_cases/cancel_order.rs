/// Cancel Order Use Case
///
/// Withdraws unfilled volume: burns receipts and refunds the same amount of
/// the input currency.
///
/// ## Rules
/// - A class can be cancelled only while its bucket's pending volume equals
///   the class's total supply, i.e. every outstanding receipt is backed by
///   unfilled input. Once any part of a class has executed its receipts are
///   claims on proceeds and can only be redeemed; this also covers a reused
///   class whose earlier receipts were redeemed down below the new pending
///   volume.
/// - The holder must hold at least `amount` receipts.
///
/// A failed refund re-mints the burned receipts and restores the bucket.

use crate::application::hook::{Compensation, LimitOrderHook};
use crate::application::ports::{AssetTransfer, ReceiptLedger};
use crate::domain::orderbook::PendingOrderBook;
use crate::error::{ExternalCallFailure, HookResult, PreconditionError};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{AccountId, ClassId, HookEvent};
use tracing::info;

/// Result of a cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelOrderResult {
    pub class_id: ClassId,
    /// Input currency returned to the recipient
    pub refunded: u128,
}

impl<L: ReceiptLedger, T: AssetTransfer> LimitOrderHook<L, T> {
    pub fn cancel_order(
        &mut self,
        holder: AccountId,
        class_id: &ClassId,
        amount: u128,
        recipient: AccountId,
    ) -> HookResult<CancelOrderResult> {
        self.ensure_idle()?;
        self.ensure_no_session()?;
        let class_id = *class_id;

        self.transact("cancel_order", |hook, undo| {
            let class = hook
                .state()
                .receipts
                .class(&class_id)
                .cloned()
                .ok_or(PreconditionError::UnknownClass(class_id))?;
            let (pool, boundary, direction, supply) =
                (class.pool, class.boundary, class.direction, class.total_supply);

            if amount == 0 {
                return Err(PreconditionError::ZeroAmount.into());
            }
            let held = hook.ledger.balance_of(holder, &class_id);
            if held < amount {
                return Err(PreconditionError::InsufficientReceiptBalance {
                    held,
                    requested: amount,
                }
                .into());
            }
            let pending = hook.state().book.peek_pending(&pool, boundary, direction);
            if pending != supply {
                return Err(PreconditionError::ClassPartiallyFilled(class_id).into());
            }

            let input_currency = hook.pool_key(&pool)?.input_currency(direction).clone();
            {
                let mut state = hook.state();
                state.book.reduce_pending(&pool, boundary, direction, amount)?;
                state.receipts.retire(&class_id, amount)?;
            }

            hook.ledger
                .burn(holder, &class_id, amount)
                .map_err(ExternalCallFailure::LedgerFailed)?;
            undo.push(Compensation::Mint {
                holder,
                class_id,
                amount,
            });

            hook.transfer
                .credit(recipient, &input_currency, amount)
                .map_err(ExternalCallFailure::TransferFailed)?;

            METRICS
                .orders_cancelled_total
                .with_label_values(&[direction.as_str()])
                .inc();
            hook.record_pending_gauge(&pool, direction);
            info!(
                holder = %holder,
                recipient = %recipient,
                class_id = %class_id,
                amount,
                "order cancelled"
            );
            hook.emit(HookEvent::OrderCancelled {
                class_id,
                holder,
                recipient,
                amount,
            });

            Ok(CancelOrderResult {
                class_id,
                refunded: amount,
            })
        })
    }
}
