//! Seams between the sync services and the GraphQL transport

use async_trait::async_trait;

use oddssync_core::{
    AddLiquidityParams, CreateMarketParams, FetchError, FilterState, MarketPage, MutationError,
    PlaceBetParams, ResolveMarketParams, TransactionReceipt,
};

/// Anything that can answer a market list query
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetch one 1-based page of markets matching the filter
    async fn fetch_markets(
        &self,
        filter: &FilterState,
        page: u32,
        page_size: u32,
    ) -> Result<MarketPage, FetchError>;
}

/// Contract mutations. Implementations submit exactly once.
#[async_trait]
pub trait MarketContract: Send + Sync {
    async fn create_market(
        &self,
        params: &CreateMarketParams,
    ) -> Result<TransactionReceipt, MutationError>;

    async fn place_bet(&self, params: &PlaceBetParams) -> Result<TransactionReceipt, MutationError>;

    async fn resolve_market(
        &self,
        params: &ResolveMarketParams,
    ) -> Result<TransactionReceipt, MutationError>;

    async fn add_liquidity(
        &self,
        params: &AddLiquidityParams,
    ) -> Result<TransactionReceipt, MutationError>;
}
