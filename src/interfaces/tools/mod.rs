//! Tools and Utilities Module
//!
//! Deterministic order-flow simulation against the in-memory collaborators.
//!
//! ## Flow
//! 1. Initialize one pool seeded with deep reserves
//! 2. A ladder of makers rests orders around the starting price: sells of
//!    currency0 above it, buys below it
//! 3. Random traders swap through the pool; every swap triggers crossings
//! 4. Every holder of a filled class redeems everything
//!
//! The same seed always produces the same run.

use crate::application::config::HookConfig;
use crate::application::ports::{PoolError, TransferError};
use crate::application::LimitOrderHook;
use crate::domain::tick_math::{extreme_tick, MAX_TICK};
use crate::error::HookError;
use crate::infrastructure::memory::{Bank, BankTransfer, InMemoryPoolManager, InMemoryReceiptLedger};
use crate::shared::protocol::{AccountId, ClassId, Currency, Direction, HookEvent, PoolKey, SwapParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub const POOL_MANAGER: AccountId = AccountId(1);
pub const HOOK: AccountId = AccountId(2);
const FIRST_MAKER: u64 = 100;
const FIRST_TRADER: u64 = 10_000;

const INITIAL_RESERVE: u128 = 1_000_000_000_000;
const MAKER_FUNDING: u128 = 10_000_000_000;
const TRADER_FUNDING: u128 = 100_000_000_000;
/// Maker orders rest up to this many tick spacings from the starting price
const LADDER_SPACINGS: i32 = 20;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub hook: HookConfig,
    pub tick_spacing: i32,
    /// Pool fee in hundredths of a basis point
    pub fee: u32,
    pub seed: u64,
    pub makers: usize,
    pub orders_per_maker: usize,
    pub swaps: usize,
    pub traders: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hook: HookConfig::default(),
            tick_spacing: 60,
            fee: 3000,
            seed: 42,
            makers: 4,
            orders_per_maker: 5,
            swaps: 100,
            traders: 3,
        }
    }
}

impl SimulationConfig {
    /// Widest tick offset of a maker order from the starting price
    pub fn ladder_span(&self) -> Result<i32, SimulationError> {
        self.tick_spacing
            .checked_mul(LADDER_SPACINGS)
            .filter(|span| (1..=MAX_TICK).contains(span))
            .ok_or(SimulationError::InvalidTickSpacing(self.tick_spacing))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub orders_placed: usize,
    pub orders_rejected: usize,
    pub swaps_executed: usize,
    pub swaps_failed: usize,
    pub classes_filled: usize,
    pub redemptions: usize,
    pub proceeds_paid: u128,
    pub final_tick: i32,
    pub last_seen_boundary: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("pool manager: {0}")]
    Pool(#[from] PoolError),

    #[error("hook: {0}")]
    Hook(#[from] HookError),

    #[error("funding: {0}")]
    Funding(#[from] TransferError),

    #[error("tick spacing {0} leaves no room for the maker ladder")]
    InvalidTickSpacing(i32),
}

pub fn maker(index: usize) -> AccountId {
    AccountId(FIRST_MAKER + index as u64)
}

pub fn trader(index: usize) -> AccountId {
    AccountId(FIRST_TRADER + index as u64)
}

/// Runs the whole flow. Committed hook events go to `events` when given.
pub fn run_simulation(
    config: &SimulationConfig,
    events: Option<UnboundedSender<HookEvent>>,
) -> Result<SimulationReport, SimulationError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let key = PoolKey::new(
        Currency::new("WETH"),
        Currency::new("USDC"),
        config.fee,
        config.tick_spacing,
    );
    let pool = key.id();
    let span = config.ladder_span()?;

    let bank = Bank::new();
    let mut manager = InMemoryPoolManager::new(POOL_MANAGER, bank.clone());
    let mut hook: LimitOrderHook<InMemoryReceiptLedger, BankTransfer> = LimitOrderHook::new(
        HOOK,
        POOL_MANAGER,
        config.hook.clone(),
        InMemoryReceiptLedger::new(),
        bank.custody(HOOK),
    );
    if let Some(sink) = events {
        hook = hook.with_event_sink(sink);
    }

    let tick = manager.initialize(&key, INITIAL_RESERVE, INITIAL_RESERVE, &mut hook)?;
    info!(pool = %pool, tick, "simulation pool ready");

    let mut report = SimulationReport::default();
    let mut classes: Vec<ClassId> = Vec::new();

    // maker ladder
    for m in 0..config.makers {
        let account = maker(m);
        bank.mint(account, &key.currency0, MAKER_FUNDING)?;
        bank.mint(account, &key.currency1, MAKER_FUNDING)?;

        for _ in 0..config.orders_per_maker {
            let offset = rng.gen_range(1..=span);
            let (order_tick, direction) = if rng.gen::<bool>() {
                (tick + offset, Direction::ZeroForOne)
            } else {
                (tick - offset, Direction::OneForZero)
            };
            let amount = rng
                .gen_range(1_000_000u128..100_000_000)
                .max(config.hook.min_order_size);

            match hook.place_order(account, &key, order_tick, direction, amount) {
                Ok(placed) => {
                    report.orders_placed += 1;
                    if !classes.contains(&placed.class_id) {
                        classes.push(placed.class_id);
                    }
                }
                Err(e) => {
                    report.orders_rejected += 1;
                    warn!(maker = %account, error = %e, "placement rejected");
                }
            }
        }
    }

    // random order flow
    for t in 0..config.traders.max(1) {
        let account = trader(t);
        bank.mint(account, &key.currency0, TRADER_FUNDING)?;
        bank.mint(account, &key.currency1, TRADER_FUNDING)?;
    }
    for n in 0..config.swaps {
        let account = trader(n % config.traders.max(1));
        let direction = if rng.gen::<bool>() {
            Direction::ZeroForOne
        } else {
            Direction::OneForZero
        };
        let params = SwapParams {
            direction,
            amount_in: rng.gen_range(100_000_000u128..20_000_000_000),
            tick_limit: extreme_tick(direction),
        };

        match manager.swap_exact_input(account, &key, params, &mut hook) {
            Ok(delta) => {
                report.swaps_executed += 1;
                debug!(trader = %account, ?delta, "swap settled");
            }
            Err(e) => {
                report.swaps_failed += 1;
                warn!(trader = %account, error = %e, "swap failed");
            }
        }
    }

    // everyone holding a filled class redeems
    for class_id in &classes {
        let claimable = hook.class(class_id).map(|c| c.claimable).unwrap_or(0);
        if claimable == 0 {
            continue;
        }
        report.classes_filled += 1;

        for (holder, held) in hook.ledger().holders(class_id) {
            let redeemed = hook.redeem(holder, class_id, held, holder)?;
            report.redemptions += 1;
            report.proceeds_paid += redeemed.paid;
        }
    }

    report.final_tick = manager.pool(&pool).map(|state| state.tick).unwrap_or(tick);
    report.last_seen_boundary = hook.last_seen_boundary(&pool);
    info!(?report, "simulation finished");
    Ok(report)
}
