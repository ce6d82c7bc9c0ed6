/// Redeem Use Case
///
/// Burns filled receipts for a proportional share of the class's claimable
/// proceeds: `floor(amount * claimable / total_supply)`, paid in the output
/// currency.
///
/// Redeeming is rejected while the class has nothing claimable, so receipts
/// of a class that never executed cannot be burned for nothing. Partial
/// redemptions are allowed.
///
/// ## Workflow
/// 1. Check the class, the amount, claimable proceeds and the holder's balance
/// 2. Quote the payout and apply it to the class totals
/// 3. Burn receipts, then pay the recipient
///
/// A failed payout re-mints the burned receipts and restores the class.

use crate::application::hook::{Compensation, LimitOrderHook};
use crate::application::ports::{AssetTransfer, ReceiptLedger};
use crate::error::{ExternalCallFailure, HookResult, PreconditionError};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{AccountId, ClassId, HookEvent};
use tracing::info;

/// Result of a redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemResult {
    pub class_id: ClassId,
    pub burned: u128,
    /// Output currency paid to the recipient
    pub paid: u128,
}

impl<L: ReceiptLedger, T: AssetTransfer> LimitOrderHook<L, T> {
    pub fn redeem(
        &mut self,
        holder: AccountId,
        class_id: &ClassId,
        amount: u128,
        recipient: AccountId,
    ) -> HookResult<RedeemResult> {
        self.ensure_idle()?;
        self.ensure_no_session()?;
        let class_id = *class_id;

        self.transact("redeem", |hook, undo| {
            let class = hook
                .state()
                .receipts
                .class(&class_id)
                .cloned()
                .ok_or(PreconditionError::UnknownClass(class_id))?;
            let (pool, direction, claimable) = (class.pool, class.direction, class.claimable);

            if amount == 0 {
                return Err(PreconditionError::ZeroAmount.into());
            }
            if claimable == 0 {
                return Err(PreconditionError::NothingClaimable(class_id).into());
            }
            let held = hook.ledger.balance_of(holder, &class_id);
            if held < amount {
                return Err(PreconditionError::InsufficientReceiptBalance {
                    held,
                    requested: amount,
                }
                .into());
            }

            let payout = hook.state().receipts.quote_redemption(&class_id, amount)?;
            let output_currency = hook.pool_key(&pool)?.output_currency(direction).clone();
            hook.state().receipts.settle_redemption(&class_id, amount, payout)?;

            hook.ledger
                .burn(holder, &class_id, amount)
                .map_err(ExternalCallFailure::LedgerFailed)?;
            undo.push(Compensation::Mint {
                holder,
                class_id,
                amount,
            });

            if payout > 0 {
                hook.transfer
                    .credit(recipient, &output_currency, payout)
                    .map_err(ExternalCallFailure::TransferFailed)?;
            }

            let status = if payout > 0 { "paid" } else { "zero_payout" };
            METRICS.redemptions_total.with_label_values(&[status]).inc();
            info!(
                holder = %holder,
                recipient = %recipient,
                class_id = %class_id,
                burned = amount,
                paid = payout,
                "receipts redeemed"
            );
            hook.emit(HookEvent::Redeemed {
                class_id,
                holder,
                recipient,
                burned: amount,
                paid: payout,
            });

            Ok(RedeemResult {
                class_id,
                burned: amount,
                paid: payout,
            })
        })
    }
}
