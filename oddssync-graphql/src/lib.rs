//! GraphQL integration for the Oddssync market sync client
//!
//! Talks to the Oddssync GraphQL service over two transports:
//! - HTTP (`reqwest`) for the market list query and contract mutations
//! - WebSocket (`graphql-transport-ws`) for the `marketsUpdate` and
//!   per-market `liveOdds` subscriptions
//!
//! Wire payloads are decoded into the typed records of `oddssync-core` at
//! this boundary; nothing untyped leaves the crate.

pub mod client;
pub mod queries;
pub mod source;
pub mod types;
pub mod websocket;

pub use client::GraphQlClient;
pub use source::{MarketContract, MarketSource};
pub use types::{decode_update_event, MarketFilterInput, MarketsVariables};
pub use websocket::{EventStream, GraphQlWsConnector, OddsFeed, UpdateConnector};
