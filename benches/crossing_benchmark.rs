//! Crossing benchmarks: bucket index scans and full trigger cycles

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use limit_order_engine::domain::{PendingOrderBook, TickBucketBook};
use limit_order_engine::domain::tick_math::extreme_tick;
use limit_order_engine::infrastructure::memory::{Bank, BankTransfer, InMemoryPoolManager, InMemoryReceiptLedger};
use limit_order_engine::shared::protocol::{AccountId, Currency, Direction, PoolKey, SwapParams};
use limit_order_engine::{HookConfig, LimitOrderHook};

const SPACING: i32 = 60;
const POOL_MANAGER: AccountId = AccountId(1);
const HOOK: AccountId = AccountId(2);
const MAKER: AccountId = AccountId(10);
const TRADER: AccountId = AccountId(20);

fn key() -> PoolKey {
    PoolKey::new(Currency::new("WETH"), Currency::new("USDC"), 3000, SPACING)
}

fn sparse_book(buckets: usize) -> TickBucketBook {
    let pool = key().id();
    let mut book = TickBucketBook::new();
    for i in 0..buckets as i32 {
        // every tenth boundary holds volume
        book.add_pending(&pool, i * 10 * SPACING, Direction::ZeroForOne, 1_000).unwrap();
    }
    book
}

fn bench_next_active(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_active range scan");
    let pool = key().id();

    for buckets in [10, 100, 1000] {
        let book = sparse_book(buckets);
        let last = (buckets as i32 - 1) * 10 * SPACING;
        group.throughput(Throughput::Elements(buckets as u64));
        group.bench_with_input(BenchmarkId::from_parameter(buckets), &buckets, |b, _| {
            b.iter(|| {
                let mut from = 0;
                let mut found = 0;
                while let Some(boundary) =
                    book.next_active(&pool, Direction::ZeroForOne, from, last + SPACING, SPACING)
                {
                    found += 1;
                    from = boundary + SPACING;
                }
                black_box(found)
            });
        });
    }
    group.finish();
}

struct Fixture {
    manager: InMemoryPoolManager,
    hook: LimitOrderHook<InMemoryReceiptLedger, BankTransfer>,
}

fn fixture(orders: usize) -> Fixture {
    let key = key();
    let bank = Bank::new();
    let mut manager = InMemoryPoolManager::new(POOL_MANAGER, bank.clone());
    let config = HookConfig::default().with_max_crossings(orders.max(1));
    let mut hook = LimitOrderHook::new(
        HOOK,
        POOL_MANAGER,
        config,
        InMemoryReceiptLedger::new(),
        bank.custody(HOOK),
    );
    manager
        .initialize(&key, 1_000_000_000_000, 1_000_000_000_000, &mut hook)
        .unwrap();

    bank.mint(MAKER, &key.currency0, 1_000_000_000).unwrap();
    bank.mint(TRADER, &key.currency1, 100_000_000_000).unwrap();
    for i in 0..orders as i32 {
        hook.place_order(MAKER, &key, (i + 1) * SPACING, Direction::ZeroForOne, 10_000)
            .unwrap();
    }
    Fixture { manager, hook }
}

fn bench_trigger_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("swap triggering executions");
    let key = key();
    let params = SwapParams {
        direction: Direction::OneForZero,
        amount_in: 20_000_000_000,
        tick_limit: extreme_tick(Direction::OneForZero),
    };

    for orders in [1, 3, 5] {
        group.throughput(Throughput::Elements(orders as u64));
        group.bench_with_input(BenchmarkId::from_parameter(orders), &orders, |b, &orders| {
            b.iter_batched(
                || fixture(orders),
                |mut f| {
                    let delta = f
                        .manager
                        .swap_exact_input(TRADER, &key, params, &mut f.hook)
                        .unwrap();
                    black_box(delta)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_next_active, bench_trigger_cycle);
criterion_main!(benches);
