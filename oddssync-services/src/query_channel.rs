//! Query Channel
//!
//! Fetches filtered, sorted, paginated market snapshots. Only the most
//! recently started fetch may deliver its result; anything that finishes
//! after a newer fetch began is reported as superseded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use oddssync_core::{FetchError, FilterState, MarketPage};
use oddssync_graphql::MarketSource;

/// Loading state of the market list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Whether to show a loading placeholder. Existing markets stay on screen
/// while a refetch is in flight.
pub fn show_spinner(state: &LoadState, store_is_empty: bool) -> bool {
    state.is_loading() && store_is_empty
}

/// Result of a fetch that raced other fetches
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// This was the newest fetch; its page should be applied
    Latest(MarketPage),
    /// A newer fetch started meanwhile; the result was discarded
    Superseded,
}

pub struct QueryChannel {
    source: Arc<dyn MarketSource>,
    /// Generation of the newest fetch started
    generation: AtomicU64,
    state: RwLock<LoadState>,
}

impl QueryChannel {
    pub fn new(source: Arc<dyn MarketSource>) -> Self {
        Self {
            source,
            generation: AtomicU64::new(0),
            state: RwLock::new(LoadState::Idle),
        }
    }

    /// Fetch one page. No generation tracking and no state change.
    #[instrument(skip(self))]
    pub async fn fetch(
        &self,
        filter: &FilterState,
        page: u32,
        page_size: u32,
    ) -> Result<MarketPage, FetchError> {
        if page == 0 {
            return Err(FetchError::invalid_request("page must be >= 1"));
        }
        if page_size == 0 {
            return Err(FetchError::invalid_request("page size must be > 0"));
        }
        self.source.fetch_markets(filter, page, page_size).await
    }

    /// Fetch one page, discarding the result (or error) if a newer fetch
    /// has started by the time this one completes.
    pub async fn fetch_latest(
        &self,
        filter: &FilterState,
        page: u32,
        page_size: u32,
    ) -> Result<FetchOutcome, FetchError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.write() = LoadState::Loading;

        let result = self.fetch(filter, page, page_size).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!("[QueryChannel] Discarding result of superseded fetch #{}", ticket);
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                *self.state.write() = LoadState::Ready;
                Ok(FetchOutcome::Latest(page))
            }
            Err(e) => {
                warn!("[QueryChannel] Fetch #{} failed: {}", ticket, e);
                *self.state.write() = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.state.read().clone()
    }

    /// Generation of the newest fetch started so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
