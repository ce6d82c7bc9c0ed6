//! Tick arithmetic
//!
//! Maps raw tick coordinates onto the boundaries orders rest at, plus the
//! full-precision `mul_div_floor` used by receipt redemption.

use crate::error::PreconditionError;
use crate::shared::protocol::Direction;
use alloy_primitives::U256;

/// Lowest tick a pool price can reach
pub const MIN_TICK: i32 = -887272;
/// Highest tick a pool price can reach
pub const MAX_TICK: i32 = -MIN_TICK;

/// Largest multiple of `width` that is `<= coordinate`.
///
/// Floor semantics, not truncation: `boundary_of(-7, 10) == -10`.
/// `width` must be positive and `coordinate` within the tick range; validate
/// untrusted inputs with [`check_width`] and [`check_tick`] first.
///
/// ```text
/// width = 60
/// 125 → 120, 120 → 120, -1 → -60, -60 → -60
/// ```
#[inline]
pub fn boundary_of(coordinate: i32, width: i32) -> i32 {
    debug_assert!(width > 0, "interval width must be positive");
    // div_euclid rounds toward negative infinity for a positive divisor
    coordinate.div_euclid(width) * width
}

#[inline]
pub fn check_width(width: i32) -> Result<(), PreconditionError> {
    if width <= 0 {
        return Err(PreconditionError::InvalidWidth(width));
    }
    Ok(())
}

#[inline]
pub fn check_tick(tick: i32) -> Result<(), PreconditionError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(PreconditionError::TickOutOfRange(tick));
    }
    Ok(())
}

/// Price limit for an execution in `direction`: the far end of the range, so
/// a resting order always fills completely regardless of slippage.
#[inline]
pub fn extreme_tick(direction: Direction) -> i32 {
    match direction {
        Direction::ZeroForOne => MIN_TICK,
        Direction::OneForZero => MAX_TICK,
    }
}

/// `floor(a * b / denominator)` with a 256-bit intermediate product.
///
/// Returns `None` when `denominator` is zero or the quotient does not fit in
/// a `u128`.
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Option<u128> {
    // a 128x128 bit product always fits in 256 bits
    let product = U256::from(a) * U256::from(b);
    let quotient = product.checked_div(U256::from(denominator))?;
    u128::try_from(quotient).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundary_of_examples() {
        assert_eq!(boundary_of(-7, 10), -10);
        assert_eq!(boundary_of(7, 10), 0);
        assert_eq!(boundary_of(0, 10), 0);
        assert_eq!(boundary_of(-10, 10), -10);
        assert_eq!(boundary_of(125, 60), 120);
        assert_eq!(boundary_of(-1, 60), -60);
        assert_eq!(boundary_of(MIN_TICK, 1), MIN_TICK);
    }

    #[test]
    fn test_check_width() {
        assert!(check_width(1).is_ok());
        assert_eq!(check_width(0), Err(PreconditionError::InvalidWidth(0)));
        assert_eq!(check_width(-60), Err(PreconditionError::InvalidWidth(-60)));
    }

    #[test]
    fn test_check_tick() {
        assert!(check_tick(MIN_TICK).is_ok());
        assert!(check_tick(MAX_TICK).is_ok());
        assert!(check_tick(MAX_TICK + 1).is_err());
    }

    #[test]
    fn test_extreme_tick() {
        assert_eq!(extreme_tick(Direction::ZeroForOne), MIN_TICK);
        assert_eq!(extreme_tick(Direction::OneForZero), MAX_TICK);
    }

    #[test]
    fn test_mul_div_small() {
        assert_eq!(mul_div_floor(10, 7, 3), Some(23));
        assert_eq!(mul_div_floor(0, 7, 3), Some(0));
        assert_eq!(mul_div_floor(7, 7, 0), None);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // (2^100 * 2^100) / 2^90 = 2^110, intermediate needs 200 bits
        let a = 1u128 << 100;
        assert_eq!(mul_div_floor(a, a, 1u128 << 90), Some(1u128 << 110));

        assert_eq!(mul_div_floor(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
        assert_eq!(mul_div_floor(u128::MAX, u128::MAX - 1, u128::MAX), Some(u128::MAX - 1));
        assert_eq!(mul_div_floor(u128::MAX, 3, 2), None);
        assert_eq!(mul_div_floor(u128::MAX, u128::MAX, 0), None);
    }

    proptest! {
        #[test]
        fn prop_boundary_contains_coordinate(c in MIN_TICK..=MAX_TICK, w in 1i32..=16384) {
            let b = boundary_of(c, w);
            prop_assert!(b <= c);
            prop_assert!((c as i64) < b as i64 + w as i64);
            prop_assert_eq!(b.rem_euclid(w), 0);
        }

        #[test]
        fn prop_boundary_idempotent(c in MIN_TICK..=MAX_TICK, w in 1i32..=16384) {
            let b = boundary_of(c, w);
            prop_assert_eq!(boundary_of(b, w), b);
        }

        #[test]
        fn prop_mul_div_matches_narrow(a in 0u128..=u64::MAX as u128, b in 0u128..=u64::MAX as u128, d in 1u128..=u64::MAX as u128) {
            prop_assert_eq!(mul_div_floor(a, b, d), Some(a * b / d));
        }

        #[test]
        fn prop_mul_div_by_own_factor(a in any::<u128>(), b in 1u128..) {
            prop_assert_eq!(mul_div_floor(a, b, b), Some(a));
        }
    }
}
