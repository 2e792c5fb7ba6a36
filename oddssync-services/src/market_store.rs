//! Market Store
//!
//! In-memory, ordered working set of markets keyed by id. Every change,
//! whether it comes from a query snapshot or a push event, goes through
//! this store; the lock serializes writers and readers always see a whole
//! snapshot.

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use oddssync_core::{merge_odds, Market, MarketUpdateEvent, Odds};

#[derive(Debug, Default)]
struct StoreInner {
    markets: IndexMap<String, Market>,
    /// Bumped on every mutation that changes contents
    version: u64,
}

/// Ordered market working set
#[derive(Debug, Default)]
pub struct MarketStore {
    inner: RwLock<StoreInner>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole working set with a fresh query snapshot.
    ///
    /// Order is kept. A repeated id keeps its first position and the later
    /// record's contents.
    pub fn replace_all(&self, markets: Vec<Market>) {
        let mut next = IndexMap::with_capacity(markets.len());
        for mut market in markets {
            let dropped = market.normalize();
            if dropped > 0 {
                warn!(
                    "[MarketStore] Dropped {} invalid odds entries for market {}",
                    dropped, market.id
                );
            }
            next.insert(market.id.clone(), market);
        }

        let mut inner = self.inner.write();
        inner.markets = next;
        inner.version += 1;
        debug!("[MarketStore] Replaced working set ({} markets)", inner.markets.len());
    }

    /// Apply one push event
    pub fn apply(&self, event: MarketUpdateEvent) {
        let mut inner = self.inner.write();

        match event {
            MarketUpdateEvent::Created(market) | MarketUpdateEvent::Updated(market) => {
                Self::upsert(&mut inner.markets, market);
                inner.version += 1;
            }
            MarketUpdateEvent::Resolved(id) => {
                if inner.markets.shift_remove(&id).is_some() {
                    inner.version += 1;
                    debug!("[MarketStore] Removed resolved market {}", id);
                }
            }
            // Odds for a market outside the working set are dropped
            MarketUpdateEvent::OddsChanged { market_id, odds } => {
                if Self::merge_market_odds(&mut inner.markets, &market_id, &odds) {
                    inner.version += 1;
                }
            }
        }
    }

    /// Merge fresh odds into one market, e.g. the `newOdds` of a placed bet.
    /// Returns `false` if the market is not in the working set.
    pub fn apply_odds(&self, market_id: &str, odds: &[Odds]) -> bool {
        let mut inner = self.inner.write();
        let merged = Self::merge_market_odds(&mut inner.markets, market_id, odds);
        if merged {
            inner.version += 1;
        }
        merged
    }

    fn merge_market_odds(markets: &mut IndexMap<String, Market>, market_id: &str, odds: &[Odds]) -> bool {
        let Some(market) = markets.get_mut(market_id) else {
            return false;
        };
        merge_odds(&mut market.odds, odds);
        market.normalize();
        true
    }

    /// Current markets in display order
    pub fn snapshot(&self) -> Vec<Market> {
        self.inner.read().markets.values().cloned().collect()
    }

    pub fn get(&self, market_id: &str) -> Option<Market> {
        self.inner.read().markets.get(market_id).cloned()
    }

    pub fn contains(&self, market_id: &str) -> bool {
        self.inner.read().markets.contains_key(market_id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().markets.is_empty()
    }

    /// Mutation counter, for cheap change detection
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    fn upsert(markets: &mut IndexMap<String, Market>, mut market: Market) {
        match markets.get_mut(&market.id) {
            Some(existing) => {
                existing.merge_update(market);
                existing.normalize();
            }
            None => {
                market.normalize();
                debug!("[MarketStore] New market {}", market.id);
                markets.shift_insert(0, market.id.clone(), market);
            }
        }
    }
}
