/// PendingOrderBook Trait - Domain Layer Abstraction
///
/// Storage of resting volume keyed by (pool, boundary, direction). The book owns
/// no execution logic: the crossing engine asks it where volume rests and the
/// execution coordinator drains it.
///
/// ## Implementations
/// - `TickBucketBook`: production implementation, ordered buckets per pool side
///
/// ## Example
/// ```rust,ignore
/// use limit_order_engine::domain::orderbook::{PendingOrderBook, TickBucketBook};
///
/// let mut book = TickBucketBook::new();
/// book.add_pending(&pool, 120, Direction::ZeroForOne, 5000)?;
/// assert_eq!(book.next_active(&pool, Direction::ZeroForOne, 0, 180, 60), Some(120));
/// ```

use crate::error::InvariantViolation;
use crate::shared::protocol::{Direction, PoolId};

pub trait PendingOrderBook {
    /// Adds `amount` to the bucket. Any amount is accepted; size policy belongs
    /// to the caller.
    fn add_pending(
        &mut self,
        pool: &PoolId,
        boundary: i32,
        direction: Direction,
        amount: u128,
    ) -> Result<(), InvariantViolation>;

    /// Drains the whole bucket and returns what it held. Executions never fill
    /// a bucket partially.
    fn take_pending(&mut self, pool: &PoolId, boundary: i32, direction: Direction) -> u128;

    fn peek_pending(&self, pool: &PoolId, boundary: i32, direction: Direction) -> u128;

    /// Removes exactly `amount` from the bucket, rejecting any reduction below zero.
    fn reduce_pending(
        &mut self,
        pool: &PoolId,
        boundary: i32,
        direction: Direction,
        amount: u128,
    ) -> Result<(), InvariantViolation>;

    /// First boundary with volume in `direction`, walking from `from` toward
    /// `to` (exclusive) in steps of `width`.
    ///
    /// - `from < to`: ascending over `from, from + width, ...` while `< to`
    /// - `from >= to`: descending over `from, from - width, ...` while `> to`
    ///
    /// The default walks every boundary and peeks; implementations with an
    /// ordered index should answer with a range query instead.
    fn next_active(
        &self,
        pool: &PoolId,
        direction: Direction,
        from: i32,
        to: i32,
        width: i32,
    ) -> Option<i32> {
        let (from, to, width) = (from as i64, to as i64, width as i64);
        let mut boundary = from;
        if from < to {
            while boundary < to {
                if self.peek_pending(pool, boundary as i32, direction) > 0 {
                    return Some(boundary as i32);
                }
                boundary += width;
            }
        } else {
            while boundary > to {
                if self.peek_pending(pool, boundary as i32, direction) > 0 {
                    return Some(boundary as i32);
                }
                boundary -= width;
            }
        }
        None
    }

    /// Sum of every bucket for one pool side
    fn total_pending(&self, pool: &PoolId, direction: Direction) -> u128;
}
