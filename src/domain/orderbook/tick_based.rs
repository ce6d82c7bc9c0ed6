/// Tick-bucketed pending order storage
///
/// Design:
/// 1. **Discrete boundaries** - orders rest only on multiples of the pool's tick spacing
/// 2. **One bucket per (pool, boundary, direction)** - placements at the same
///    boundary pool together and are always executed together
/// 3. **Ordered index per pool side** - `BTreeMap` keyed by boundary, so the
///    crossing scan is a range query instead of a walk over every boundary
/// 4. **Empty buckets are removed** - an absent key means zero volume

use super::traits::PendingOrderBook;
use crate::error::InvariantViolation;
use crate::shared::protocol::{Direction, PoolId};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Included};

/// Pending volume for every pool side
#[derive(Clone, Debug, Default)]
pub struct TickBucketBook {
    /// (pool, direction) → boundary → volume, never holds a zero entry
    sides: HashMap<(PoolId, Direction), BTreeMap<i32, u128>>,
}

impl TickBucketBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-empty buckets of one pool side, lowest boundary first
    pub fn depth(&self, pool: &PoolId, direction: Direction) -> Vec<(i32, u128)> {
        self.sides
            .get(&(*pool, direction))
            .map(|side| side.iter().map(|(b, v)| (*b, *v)).collect())
            .unwrap_or_default()
    }

    /// Number of non-empty buckets across every pool
    pub fn bucket_count(&self) -> usize {
        self.sides.values().map(BTreeMap::len).sum()
    }

    fn side(&self, pool: &PoolId, direction: Direction) -> Option<&BTreeMap<i32, u128>> {
        self.sides.get(&(*pool, direction))
    }

    fn remove_bucket(&mut self, pool: &PoolId, boundary: i32, direction: Direction) -> u128 {
        let key = (*pool, direction);
        let Some(side) = self.sides.get_mut(&key) else {
            return 0;
        };
        let amount = side.remove(&boundary).unwrap_or(0);
        if side.is_empty() {
            self.sides.remove(&key);
        }
        amount
    }
}

impl PendingOrderBook for TickBucketBook {
    fn add_pending(
        &mut self,
        pool: &PoolId,
        boundary: i32,
        direction: Direction,
        amount: u128,
    ) -> Result<(), InvariantViolation> {
        if amount == 0 {
            return Ok(());
        }
        let bucket = self
            .sides
            .entry((*pool, direction))
            .or_default()
            .entry(boundary)
            .or_insert(0);
        *bucket = bucket
            .checked_add(amount)
            .ok_or(InvariantViolation::PendingOverflow { boundary })?;
        Ok(())
    }

    fn take_pending(&mut self, pool: &PoolId, boundary: i32, direction: Direction) -> u128 {
        self.remove_bucket(pool, boundary, direction)
    }

    fn peek_pending(&self, pool: &PoolId, boundary: i32, direction: Direction) -> u128 {
        self.side(pool, direction)
            .and_then(|side| side.get(&boundary))
            .copied()
            .unwrap_or(0)
    }

    fn reduce_pending(
        &mut self,
        pool: &PoolId,
        boundary: i32,
        direction: Direction,
        amount: u128,
    ) -> Result<(), InvariantViolation> {
        let available = self.peek_pending(pool, boundary, direction);
        let remaining = available
            .checked_sub(amount)
            .ok_or(InvariantViolation::PendingUnderflow {
                boundary,
                available,
                requested: amount,
            })?;

        self.remove_bucket(pool, boundary, direction);
        if remaining > 0 {
            self.sides
                .entry((*pool, direction))
                .or_default()
                .insert(boundary, remaining);
        }
        Ok(())
    }

    fn next_active(
        &self,
        pool: &PoolId,
        direction: Direction,
        from: i32,
        to: i32,
        width: i32,
    ) -> Option<i32> {
        let side = self.side(pool, direction)?;
        // only boundaries on the from + k*width lattice are part of the walk
        let on_lattice = |b: &i32| (*b as i64 - from as i64).rem_euclid(width as i64) == 0;

        if from < to {
            side.range(from..to).map(|(b, _)| *b).find(|b| on_lattice(b))
        } else {
            side.range((Excluded(to), Included(from)))
                .rev()
                .map(|(b, _)| *b)
                .find(|b| on_lattice(b))
        }
    }

    fn total_pending(&self, pool: &PoolId, direction: Direction) -> u128 {
        self.side(pool, direction)
            .map(|side| side.values().fold(0u128, |acc, v| acc.saturating_add(*v)))
            .unwrap_or(0)
    }
}
