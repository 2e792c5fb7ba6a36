//! Betting service
//!
//! Validates contract mutations against local state, submits each one
//! exactly once, and folds the result back into the sync session.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use oddssync_core::{
    potential_payout, AddLiquidityParams, BetLimits, CreateMarketParams, MarketUpdateEvent,
    MutationError, PlaceBetParams, ResolveMarketParams, TransactionReceipt,
};
use oddssync_graphql::MarketContract;

use crate::market_sync::MarketSync;

pub struct BettingService {
    contract: Arc<dyn MarketContract>,
    sync: Arc<MarketSync>,
    bet_limits: BetLimits,
}

impl BettingService {
    pub fn new(contract: Arc<dyn MarketContract>, sync: Arc<MarketSync>) -> Self {
        Self {
            contract,
            sync,
            bet_limits: BetLimits::default(),
        }
    }

    pub fn with_bet_limits(mut self, limits: BetLimits) -> Self {
        self.bet_limits = limits;
        self
    }

    pub fn bet_limits(&self) -> BetLimits {
        self.bet_limits
    }

    /// Create a market, then refetch the list
    pub async fn create_market(
        &self,
        params: CreateMarketParams,
    ) -> Result<TransactionReceipt, MutationError> {
        let params = params.validated()?;
        let receipt = self
            .contract
            .create_market(&params)
            .await
            .inspect_err(|e| warn!("[Betting] createMarket rejected: {}", e))?;

        info!(
            "[Betting] Market created (tx {}, market {:?})",
            receipt.transaction_id, receipt.market_id
        );
        self.refresh_after("createMarket").await;
        Ok(receipt)
    }

    /// Place a bet, apply the returned odds, then refetch the list
    pub async fn place_bet(&self, params: PlaceBetParams) -> Result<TransactionReceipt, MutationError> {
        let market = self.sync.market(&params.market_id);
        params.validate(market.as_ref(), &self.bet_limits)?;

        let receipt = self
            .contract
            .place_bet(&params)
            .await
            .inspect_err(|e| warn!("[Betting] placeBet rejected: {}", e))?;

        info!(
            "[Betting] Bet placed on market {} option {} (tx {})",
            params.market_id, params.option_index, receipt.transaction_id
        );
        if !receipt.new_odds.is_empty() {
            self.sync
                .store()
                .apply_odds(&params.market_id, &receipt.new_odds);
        }
        self.refresh_after("placeBet").await;
        Ok(receipt)
    }

    /// Resolve a market and drop it from the working set
    pub async fn resolve_market(
        &self,
        params: ResolveMarketParams,
    ) -> Result<TransactionReceipt, MutationError> {
        let market = self.sync.market(&params.market_id);
        params.validate(market.as_ref())?;

        let receipt = self
            .contract
            .resolve_market(&params)
            .await
            .inspect_err(|e| warn!("[Betting] resolveMarket rejected: {}", e))?;

        info!(
            "[Betting] Market {} resolved with option {} (tx {})",
            params.market_id, params.winning_option, receipt.transaction_id
        );
        self.sync
            .store()
            .apply(MarketUpdateEvent::Resolved(params.market_id.clone()));
        Ok(receipt)
    }

    pub async fn add_liquidity(
        &self,
        params: AddLiquidityParams,
    ) -> Result<TransactionReceipt, MutationError> {
        params.validate()?;

        let receipt = self
            .contract
            .add_liquidity(&params)
            .await
            .inspect_err(|e| warn!("[Betting] addLiquidity rejected: {}", e))?;

        info!(
            "[Betting] Added {} liquidity to market {} (tx {})",
            params.amount, params.market_id, receipt.transaction_id
        );
        Ok(receipt)
    }

    /// Payout of a bet at the option's current odds, if known locally
    pub fn quote(&self, market_id: &str, option_index: u32, amount: Decimal) -> Option<Decimal> {
        let market = self.sync.market(market_id)?;
        let odds = market.odds_for(option_index)?;
        Some(potential_payout(amount, odds.odds))
    }

    async fn refresh_after(&self, operation: &str) {
        if let Err(e) = self.sync.refresh().await {
            warn!("[Betting] Refetch after {} failed: {}", operation, e);
        }
    }
}
