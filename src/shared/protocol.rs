//! Shared protocol types
//!
//! Identities (accounts, currencies, pools, receipt classes), swap request and
//! response shapes exchanged with the pool engine, and the structured records
//! the engine publishes for every committed state change.

use crate::shared::symbol_pool::global_symbol_pool;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Party identifier shared by every collaborator (holders, the hook, the pool manager)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account#{}", self.0)
    }
}

/// Asset symbol, interned through the global symbol pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency(Arc<str>);

impl Currency {
    pub fn new(symbol: &str) -> Self {
        Self(global_symbol_pool().intern(symbol))
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Ok(Currency::new(&symbol))
    }
}

/// Swap direction. `ZeroForOne` pays currency0 in and pushes the tick down,
/// `OneForZero` pays currency1 in and pushes the tick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ZeroForOne,
    OneForZero,
}

impl Direction {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::ZeroForOne => Direction::OneForZero,
            Direction::OneForZero => Direction::ZeroForOne,
        }
    }

    #[inline]
    pub fn is_zero_for_one(self) -> bool {
        matches!(self, Direction::ZeroForOne)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::ZeroForOne => "zero_for_one",
            Direction::OneForZero => "one_for_zero",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! digest_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // the first 8 bytes are plenty to tell ids apart in logs
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..8]))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                let bytes = hex::decode(&text).map_err(D::Error::custom)?;
                let raw: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| D::Error::custom("expected 32 bytes"))?;
                Ok($name(raw))
            }
        }
    };
}

digest_id!(
    /// Opaque pool identity, SHA-256 of the canonical [`PoolKey`] encoding
    PoolId
);

digest_id!(
    /// Receipt class identity, SHA-256 of (pool id, boundary, direction)
    ClassId
);

impl ClassId {
    /// Deterministic class id: identical inputs always address the same class.
    pub fn derive(pool: &PoolId, boundary: i32, direction: Direction) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(pool.0);
        hasher.update(boundary.to_be_bytes());
        hasher.update([direction.is_zero_for_one() as u8]);
        ClassId(hasher.finalize().into())
    }
}

/// Pool configuration: the asset pair plus fee and tick spacing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub currency0: Currency,
    pub currency1: Currency,
    /// Fee in hundredths of a basis point (3000 = 0.30%)
    pub fee: u32,
    pub tick_spacing: i32,
}

impl PoolKey {
    pub fn new(currency0: Currency, currency1: Currency, fee: u32, tick_spacing: i32) -> Self {
        Self {
            currency0,
            currency1,
            fee,
            tick_spacing,
        }
    }

    pub fn id(&self) -> PoolId {
        let mut hasher = Sha256::new();
        hasher.update(self.currency0.symbol().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.currency1.symbol().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.fee.to_be_bytes());
        hasher.update(self.tick_spacing.to_be_bytes());
        PoolId(hasher.finalize().into())
    }

    /// Currency paid into the pool by a swap in `direction`
    pub fn input_currency(&self, direction: Direction) -> &Currency {
        match direction {
            Direction::ZeroForOne => &self.currency0,
            Direction::OneForZero => &self.currency1,
        }
    }

    /// Currency paid out of the pool by a swap in `direction`
    pub fn output_currency(&self, direction: Direction) -> &Currency {
        self.input_currency(direction.opposite())
    }
}

/// Exact-input swap request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    pub direction: Direction,
    pub amount_in: u128,
    /// The swap stops once the pool tick would move past this limit
    pub tick_limit: i32,
}

/// Balance change from the swapper's point of view: negative amounts are owed
/// to the pool, positive amounts are owed to the swapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub amount0: i128,
    pub amount1: i128,
}

impl BalanceDelta {
    pub fn new(amount0: i128, amount1: i128) -> Self {
        Self { amount0, amount1 }
    }

    fn leg(&self, zero: bool) -> i128 {
        if zero {
            self.amount0
        } else {
            self.amount1
        }
    }

    /// Amount of the input currency the swapper must settle
    pub fn input_owed(&self, direction: Direction) -> u128 {
        let leg = self.leg(direction.is_zero_for_one());
        if leg < 0 {
            leg.unsigned_abs()
        } else {
            0
        }
    }

    /// Amount of the output currency the swapper may take
    pub fn output_received(&self, direction: Direction) -> u128 {
        let leg = self.leg(!direction.is_zero_for_one());
        if leg > 0 {
            leg.unsigned_abs()
        } else {
            0
        }
    }
}

/// Records published for every committed state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HookEvent {
    OrderPlaced {
        class_id: ClassId,
        holder: AccountId,
        amount: u128,
        boundary: i32,
        direction: Direction,
    },
    OrderExecuted {
        pool: PoolId,
        class_id: ClassId,
        amount_filled: u128,
        proceeds: u128,
    },
    OrderCancelled {
        class_id: ClassId,
        holder: AccountId,
        recipient: AccountId,
        amount: u128,
    },
    Redeemed {
        class_id: ClassId,
        holder: AccountId,
        recipient: AccountId,
        burned: u128,
        paid: u128,
    },
    /// The per-trigger crossing cap was reached before the pool became stable
    CrossingDeferred {
        pool: PoolId,
        direction: Direction,
        last_seen_boundary: i32,
        executed: usize,
    },
}

impl HookEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            HookEvent::OrderPlaced { .. } => "order_placed",
            HookEvent::OrderExecuted { .. } => "order_executed",
            HookEvent::OrderCancelled { .. } => "order_cancelled",
            HookEvent::Redeemed { .. } => "redeemed",
            HookEvent::CrossingDeferred { .. } => "crossing_deferred",
        }
    }
}
