//! Receipt accounting
//!
//! One `ReceiptClass` per (pool, boundary, direction). A class tracks how many
//! receipts are outstanding and how much output-currency proceeds they can
//! claim. Receipt balances themselves live in the external ledger; this book
//! only owns the class-level totals and the redemption math.
//!
//! Redemption pays `floor(amount * claimable / total_supply)`. Rounding always
//! favors the class, so dust stays claimable by later redeemers.

use crate::domain::tick_math::mul_div_floor;
use crate::error::{HookError, InvariantViolation, PreconditionError};
use crate::shared::protocol::{ClassId, Direction, PoolId};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReceiptClass {
    pub pool: PoolId,
    pub boundary: i32,
    pub direction: Direction,
    /// Receipts minted minus receipts burned
    pub total_supply: u128,
    /// Proceeds available for redemption
    pub claimable: u128,
    /// Every proceeds credit ever applied
    pub proceeds_credited: u128,
    /// Every payout ever made
    pub proceeds_paid: u128,
}

impl ReceiptClass {
    fn new(pool: PoolId, boundary: i32, direction: Direction) -> Self {
        Self {
            pool,
            boundary,
            direction,
            total_supply: 0,
            claimable: 0,
            proceeds_credited: 0,
            proceeds_paid: 0,
        }
    }
}

/// Class registry. Classes are created lazily and never removed.
#[derive(Clone, Debug, Default)]
pub struct ReceiptBook {
    classes: HashMap<ClassId, ReceiptClass>,
}

impl ReceiptBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(&self, class_id: &ClassId) -> Option<&ReceiptClass> {
        self.classes.get(class_id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Looks up the class for the triple, creating it on first use.
    pub fn open_class(&mut self, pool: &PoolId, boundary: i32, direction: Direction) -> ClassId {
        let class_id = ClassId::derive(pool, boundary, direction);
        self.classes
            .entry(class_id)
            .or_insert_with(|| ReceiptClass::new(*pool, boundary, direction));
        class_id
    }

    fn class_mut(&mut self, class_id: &ClassId) -> Result<&mut ReceiptClass, PreconditionError> {
        self.classes
            .get_mut(class_id)
            .ok_or(PreconditionError::UnknownClass(*class_id))
    }

    /// Records `amount` newly minted receipts
    pub fn issue(&mut self, class_id: &ClassId, amount: u128) -> Result<(), HookError> {
        let class = self.class_mut(class_id)?;
        class.total_supply = class
            .total_supply
            .checked_add(amount)
            .ok_or(InvariantViolation::Overflow("total_supply"))?;
        Ok(())
    }

    /// Records `amount` receipts burned without a payout (cancellation)
    pub fn retire(&mut self, class_id: &ClassId, amount: u128) -> Result<(), HookError> {
        let class = self.class_mut(class_id)?;
        class.total_supply =
            class
                .total_supply
                .checked_sub(amount)
                .ok_or(InvariantViolation::SupplyUnderflow {
                    class_id: *class_id,
                    supply: class.total_supply,
                    requested: amount,
                })?;
        Ok(())
    }

    /// Credits execution proceeds to the class
    pub fn credit_proceeds(&mut self, class_id: &ClassId, proceeds: u128) -> Result<(), HookError> {
        let class = self.class_mut(class_id)?;
        class.claimable = class
            .claimable
            .checked_add(proceeds)
            .ok_or(InvariantViolation::Overflow("claimable"))?;
        class.proceeds_credited = class
            .proceeds_credited
            .checked_add(proceeds)
            .ok_or(InvariantViolation::Overflow("proceeds_credited"))?;
        Ok(())
    }

    /// Payout for burning `amount` receipts, without mutating anything.
    ///
    /// Fails for unknown classes, zero amounts and classes with nothing
    /// claimable. The holder's receipt balance is the caller's concern.
    pub fn quote_redemption(&self, class_id: &ClassId, amount: u128) -> Result<u128, HookError> {
        let class = self
            .classes
            .get(class_id)
            .ok_or(PreconditionError::UnknownClass(*class_id))?;

        if amount == 0 {
            return Err(PreconditionError::ZeroAmount.into());
        }
        if class.claimable == 0 {
            return Err(PreconditionError::NothingClaimable(*class_id).into());
        }
        check_class(class_id, class)?;
        if amount > class.total_supply {
            return Err(InvariantViolation::SupplyUnderflow {
                class_id: *class_id,
                supply: class.total_supply,
                requested: amount,
            }
            .into());
        }

        let payout = mul_div_floor(amount, class.claimable, class.total_supply)
            .ok_or(InvariantViolation::Overflow("redemption payout"))?;
        Ok(payout)
    }

    /// Applies a quoted redemption: burns `amount` of supply and pays `payout`
    pub fn settle_redemption(
        &mut self,
        class_id: &ClassId,
        amount: u128,
        payout: u128,
    ) -> Result<(), HookError> {
        let class = self.class_mut(class_id)?;
        if payout > class.claimable {
            return Err(InvariantViolation::ClaimableExceedsProceeds {
                class_id: *class_id,
                claimable: class.claimable,
                unpaid: payout,
            }
            .into());
        }
        let supply = class.total_supply;
        class.total_supply = supply
            .checked_sub(amount)
            .ok_or(InvariantViolation::SupplyUnderflow {
                class_id: *class_id,
                supply,
                requested: amount,
            })?;
        class.claimable -= payout;
        class.proceeds_paid = class
            .proceeds_paid
            .checked_add(payout)
            .ok_or(InvariantViolation::Overflow("proceeds_paid"))?;
        Ok(())
    }

    pub fn check_invariants(&self, class_id: &ClassId) -> Result<(), InvariantViolation> {
        match self.classes.get(class_id) {
            Some(class) => check_class(class_id, class),
            None => Ok(()),
        }
    }
}

/// `claimable` must equal credited minus paid, which bounds it by everything
/// ever credited.
fn check_class(class_id: &ClassId, class: &ReceiptClass) -> Result<(), InvariantViolation> {
    let unpaid = class
        .proceeds_credited
        .checked_sub(class.proceeds_paid)
        .ok_or(InvariantViolation::Overflow("unpaid proceeds"))?;
    if class.claimable != unpaid {
        return Err(InvariantViolation::ClaimableExceedsProceeds {
            class_id: *class_id,
            claimable: class.claimable,
            unpaid,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn opened() -> (ReceiptBook, ClassId) {
        let mut book = ReceiptBook::new();
        let id = book.open_class(&PoolId([3u8; 32]), 120, Direction::ZeroForOne);
        (book, id)
    }

    #[test]
    fn test_open_class_is_idempotent() {
        let (mut book, id) = opened();
        let again = book.open_class(&PoolId([3u8; 32]), 120, Direction::ZeroForOne);
        assert_eq!(id, again);
        assert_eq!(book.len(), 1);

        let class = book.class(&id).unwrap();
        assert_eq!(class.boundary, 120);
        assert_eq!(class.total_supply, 0);
    }

    #[test]
    fn test_redeem_requires_claimable() {
        let (mut book, id) = opened();
        book.issue(&id, 100).unwrap();

        let err = book.quote_redemption(&id, 10).unwrap_err();
        assert_eq!(err, HookError::Precondition(PreconditionError::NothingClaimable(id)));
    }

    #[test]
    fn test_redeem_unknown_class() {
        let book = ReceiptBook::new();
        let missing = ClassId([0u8; 32]);
        assert!(matches!(
            book.quote_redemption(&missing, 1),
            Err(HookError::Precondition(PreconditionError::UnknownClass(_)))
        ));
    }

    #[test]
    fn test_proportional_payout_leaves_dust() {
        let (mut book, id) = opened();
        book.issue(&id, 3).unwrap();
        book.credit_proceeds(&id, 10).unwrap();

        let first = book.quote_redemption(&id, 1).unwrap();
        assert_eq!(first, 3); // floor(1 * 10 / 3)
        book.settle_redemption(&id, 1, first).unwrap();

        let class = book.class(&id).unwrap();
        assert_eq!(class.total_supply, 2);
        assert_eq!(class.claimable, 7);

        let rest = book.quote_redemption(&id, 2).unwrap();
        assert_eq!(rest, 7); // the dust from the first redemption lands here
        book.settle_redemption(&id, 2, rest).unwrap();
        assert_eq!(book.class(&id).unwrap().claimable, 0);
        book.check_invariants(&id).unwrap();
    }

    #[test]
    fn test_settle_rejects_overpay() {
        let (mut book, id) = opened();
        book.issue(&id, 10).unwrap();
        book.credit_proceeds(&id, 5).unwrap();

        let err = book.settle_redemption(&id, 10, 6).unwrap_err();
        assert!(matches!(err, HookError::Invariant(InvariantViolation::ClaimableExceedsProceeds { .. })));
        assert_eq!(book.class(&id).unwrap().claimable, 5);
    }

    #[test]
    fn test_retire_underflow() {
        let (mut book, id) = opened();
        book.issue(&id, 5).unwrap();
        assert!(book.retire(&id, 6).is_err());
        book.retire(&id, 5).unwrap();
        assert_eq!(book.class(&id).unwrap().total_supply, 0);
    }

    proptest! {
        #[test]
        fn prop_two_holders_never_exceed_claimable(x in 1u128..1_000_000_000, y in 1u128..1_000_000_000, c in 1u128..1_000_000_000_000) {
            let (mut book, id) = opened();
            book.issue(&id, x + y).unwrap();
            book.credit_proceeds(&id, c).unwrap();

            let px = book.quote_redemption(&id, x).unwrap();
            prop_assert_eq!(px, x * c / (x + y));
            book.settle_redemption(&id, x, px).unwrap();

            let py = book.quote_redemption(&id, y);
            match py {
                Ok(py) => {
                    prop_assert!(px + py <= c);
                    book.settle_redemption(&id, y, py).unwrap();
                }
                // the first holder took everything
                Err(_) => prop_assert_eq!(px, c),
            }
            book.check_invariants(&id).unwrap();
        }
    }
}
