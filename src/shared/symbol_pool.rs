//! Currency symbol pool
//!
//! Pool keys are hashed and cloned on every swap callback, so currency
//! symbols are interned once and shared as `Arc<str>` afterwards.
//!
//! - First lookup: read lock miss, write lock, one heap allocation
//! - Later lookups: read lock and an atomic increment

use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

lazy_static! {
    static ref GLOBAL_SYMBOL_POOL: Arc<SymbolPool> = Arc::new(SymbolPool::new());
}

/// Process-wide pool used by [`Currency::new`](crate::shared::protocol::Currency::new).
pub fn global_symbol_pool() -> &'static Arc<SymbolPool> {
    &GLOBAL_SYMBOL_POOL
}

/// Interning table for currency symbols
pub struct SymbolPool {
    symbols: RwLock<HashMap<String, Arc<str>>>,
}

impl SymbolPool {
    pub fn new() -> Self {
        Self {
            symbols: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the shared `Arc<str>` for `symbol`, inserting it on first use.
    #[inline]
    pub fn intern(&self, symbol: &str) -> Arc<str> {
        {
            let read_guard = self.symbols.read();
            if let Some(arc) = read_guard.get(symbol) {
                return arc.clone();
            }
        }

        // another thread may have inserted between the two locks
        let mut write_guard = self.symbols.write();
        write_guard
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::from(symbol))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.read().is_empty()
    }
}

impl Default for SymbolPool {
    fn default() -> Self {
        Self::new()
    }
}
