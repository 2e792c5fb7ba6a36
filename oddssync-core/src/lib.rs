//! Core types for the Oddssync market sync client
//!
//! This crate defines the shared data structures used across the workspace:
//! markets and their per-option odds, the client-side filter state, push
//! events, connection state, and the parameters for contract mutations.

pub mod connection;
pub mod error;
pub mod event;
pub mod filter;
pub mod market;
pub mod mutation;

pub use connection::ConnectionState;
pub use error::{FetchError, FieldError, MalformedEventError, MutationError, SubscriptionError};
pub use event::{MarketUpdateEvent, MarketUpdateKind};
pub use filter::{Category, FilterState, SortKey, StatusFilter};
pub use market::{merge_odds, Market, MarketPage, Odds};
pub use mutation::{
    potential_payout, AddLiquidityParams, BetLimits, CreateMarketParams, PlaceBetParams,
    ResolveMarketParams, TransactionReceipt,
};
