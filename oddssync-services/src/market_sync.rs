//! Market sync session
//!
//! Owns one Market Store and wires the Query Channel and Update Channel
//! into it. Create one per UI session, `start()` it, and `stop()` it on
//! teardown. With an odds feed, every market on the current page also gets
//! its own `liveOdds` subscription.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info};

use oddssync_core::{ConnectionState, FetchError, FilterState, Market, MarketPage};
use oddssync_graphql::{MarketSource, OddsFeed, UpdateConnector};

use crate::backoff::Backoff;
use crate::config::SyncConfig;
use crate::market_store::MarketStore;
use crate::query_channel::{show_spinner, FetchOutcome, LoadState, QueryChannel};
use crate::update_channel::{ConnectionHealth, Subscription, UpdateChannel};

/// Filter and page the list is currently showing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub filter: FilterState,
    pub page: u32,
    pub total_count: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter: FilterState::default(),
            page: 1,
            total_count: 0,
        }
    }
}

/// Summary of the session for status displays
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub connection: ConnectionState,
    pub load_state: LoadState,
    pub show_spinner: bool,
    pub filter: FilterState,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub market_count: usize,
    pub store_version: u64,
    /// Markets with a live odds subscription
    pub live_odds_markets: usize,
}

/// Outcome of a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The store now holds the fetched page
    Applied { market_count: usize, total_count: u64 },
    /// A newer refresh started; nothing was applied
    Superseded,
}

pub struct MarketSync {
    store: Arc<MarketStore>,
    query: QueryChannel,
    updates: UpdateChannel,
    view: RwLock<ViewState>,
    page_size: u32,
    backoff: Backoff,
    subscription: Mutex<Option<Subscription>>,
    odds_feed: Option<Arc<dyn OddsFeed>>,
    odds_watches: Mutex<HashMap<String, Subscription>>,
}

impl MarketSync {
    pub fn new(
        source: Arc<dyn MarketSource>,
        connector: Arc<dyn UpdateConnector>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            store: Arc::new(MarketStore::new()),
            query: QueryChannel::new(source),
            updates: UpdateChannel::new(connector, config.backoff()),
            view: RwLock::new(ViewState::default()),
            page_size: config.page_size.max(1),
            backoff: config.backoff(),
            subscription: Mutex::new(None),
            odds_feed: None,
            odds_watches: Mutex::new(HashMap::new()),
        }
    }

    /// Follow `liveOdds` for each market on the current page while running
    pub fn with_odds_feed(mut self, feed: Arc<dyn OddsFeed>) -> Self {
        self.odds_feed = Some(feed);
        self
    }

    /// Start the update subscription (if not running) and load the first page
    pub async fn start(&self) -> Result<RefreshOutcome, FetchError> {
        {
            let mut subscription = self.subscription.lock();
            if subscription.is_none() {
                let store = Arc::clone(&self.store);
                *subscription = Some(self.updates.subscribe(move |event| store.apply(event)));
                info!("[MarketSync] Update subscription started");
            }
        }
        self.refresh().await
    }

    /// Close the update subscription and every live odds subscription
    pub fn stop(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.close();
            info!("[MarketSync] Update subscription stopped");
        }
        let watches = std::mem::take(&mut *self.odds_watches.lock());
        if !watches.is_empty() {
            debug!("[MarketSync] Closing {} live odds subscriptions", watches.len());
        }
        for (_, watch) in watches {
            watch.close();
        }
    }

    pub fn is_running(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Refetch the current filter and page, replacing the store on success.
    /// The store keeps its previous contents while the fetch is in flight.
    pub async fn refresh(&self) -> Result<RefreshOutcome, FetchError> {
        let (filter, page) = {
            let view = self.view.read();
            (view.filter.clone(), view.page)
        };

        match self.query.fetch_latest(&filter, page, self.page_size).await? {
            FetchOutcome::Latest(MarketPage {
                markets,
                total_count,
            }) => {
                let market_count = markets.len();
                self.store.replace_all(markets);
                self.view.write().total_count = total_count;
                self.sync_odds_watches();
                debug!(
                    "[MarketSync] Page {} applied ({} of {} markets)",
                    page, market_count, total_count
                );
                Ok(RefreshOutcome::Applied {
                    market_count,
                    total_count,
                })
            }
            FetchOutcome::Superseded => Ok(RefreshOutcome::Superseded),
        }
    }

    /// Switch filter, go back to page 1 and refetch. If the fetch fails the
    /// previous filter and page are restored, matching the markets still in
    /// the store.
    pub async fn set_filter(&self, filter: FilterState) -> Result<RefreshOutcome, FetchError> {
        let switch = self.switch_view(|view| {
            view.filter = filter;
            view.page = 1;
        });
        self.refresh_or_restore(switch).await
    }

    /// Switch page and refetch, restoring the previous page on failure
    pub async fn set_page(&self, page: u32) -> Result<RefreshOutcome, FetchError> {
        if page == 0 {
            return Err(FetchError::invalid_request("page must be >= 1"));
        }
        let switch = self.switch_view(|view| view.page = page);
        self.refresh_or_restore(switch).await
    }

    /// Keep one `liveOdds` subscription per market in the store: close the
    /// ones for markets that left, open the ones for markets that arrived
    fn sync_odds_watches(&self) {
        let Some(feed) = &self.odds_feed else {
            return;
        };
        // Checked under the watch lock so a concurrent stop() cannot miss
        // watches opened here
        let mut watches = self.odds_watches.lock();
        if !self.is_running() {
            return;
        }

        let ids: Vec<String> = self.store.snapshot().into_iter().map(|m| m.id).collect();

        let stale: Vec<String> = watches
            .keys()
            .filter(|id| !ids.contains(id))
            .cloned()
            .collect();
        for id in &stale {
            if let Some(watch) = watches.remove(id) {
                watch.close();
            }
        }

        let mut opened = 0;
        for id in ids {
            if watches.contains_key(&id) {
                continue;
            }
            let channel = UpdateChannel::new(feed.odds_connector(&id), self.backoff);
            let store = Arc::clone(&self.store);
            watches.insert(id, channel.subscribe(move |event| store.apply(event)));
            opened += 1;
        }

        if opened > 0 || !stale.is_empty() {
            debug!(
                "[MarketSync] Live odds: {} opened, {} closed, {} active",
                opened,
                stale.len(),
                watches.len()
            );
        }
    }

    /// Ids of markets with a live odds subscription
    pub fn live_odds_markets(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.odds_watches.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Apply `change` to the view; returns the views before and after
    fn switch_view(&self, change: impl FnOnce(&mut ViewState)) -> (ViewState, ViewState) {
        let mut view = self.view.write();
        let previous = view.clone();
        change(&mut *view);
        (previous, view.clone())
    }

    async fn refresh_or_restore(
        &self,
        (previous, requested): (ViewState, ViewState),
    ) -> Result<RefreshOutcome, FetchError> {
        let result = self.refresh().await;
        if result.is_err() {
            let mut view = self.view.write();
            // Leave the view alone if another switch happened meanwhile
            if view.filter == requested.filter && view.page == requested.page {
                view.filter = previous.filter;
                view.page = previous.page;
            }
        }
        result
    }

    pub fn snapshot(&self) -> Vec<Market> {
        self.store.snapshot()
    }

    pub fn market(&self, market_id: &str) -> Option<Market> {
        self.store.get(market_id)
    }

    pub fn store(&self) -> &Arc<MarketStore> {
        &self.store
    }

    pub fn view(&self) -> ViewState {
        self.view.read().clone()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.updates.state()
    }

    pub fn connection_health(&self) -> ConnectionHealth {
        self.updates.health()
    }

    pub fn status(&self) -> SyncStatus {
        let view = self.view();
        let load_state = self.query.load_state();
        let store_empty = self.store.is_empty();

        SyncStatus {
            connection: self.updates.state(),
            show_spinner: show_spinner(&load_state, store_empty),
            load_state,
            page: view.page,
            page_size: self.page_size,
            total_count: view.total_count,
            total_pages: MarketPage::total_pages(view.total_count, self.page_size),
            filter: view.filter,
            market_count: self.store.len(),
            store_version: self.store.version(),
            live_odds_markets: self.odds_watches.lock().len(),
        }
    }
}

impl Drop for MarketSync {
    fn drop(&mut self) {
        self.stop();
    }
}
