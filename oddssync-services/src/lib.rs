//! Sync services for the Oddssync market client
//!
//! This crate holds the client-side state machine: an ordered market store,
//! the query channel that loads snapshots, the update channel that applies
//! pushed events with automatic reconnection, and the session and betting
//! services that tie them together.

pub mod backoff;
pub mod betting;
pub mod config;
pub mod market_store;
pub mod market_sync;
pub mod query_channel;
pub mod update_channel;

pub use backoff::{Backoff, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX};
pub use betting::BettingService;
pub use config::{ConfigError, SyncConfig};
pub use market_store::MarketStore;
pub use market_sync::{MarketSync, RefreshOutcome, SyncStatus, ViewState};
pub use query_channel::{show_spinner, FetchOutcome, LoadState, QueryChannel};
pub use update_channel::{ConnectionHealth, ConnectionMetrics, Subscription, UpdateChannel};
