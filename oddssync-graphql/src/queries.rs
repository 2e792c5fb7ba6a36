//! GraphQL documents sent to the Oddssync service

/// Paginated, filtered, sorted market list plus the matching total
pub const GET_MARKETS: &str = r#"
query GetMarkets($skip: Int, $first: Int, $sortBy: MarketSort, $filter: MarketFilter) {
    markets(skip: $skip, first: $first, sortBy: $sortBy, filter: $filter) {
        marketId
        chainId
        description
        creator
        options
        liquidity
        totalBets
        totalBetsCount
        createdAt
        resolvedAt
        winningOption
        isActive
        odds {
            optionIndex
            odds
            totalAmount
            lastUpdate
        }
    }
    marketsCount(filter: $filter)
}
"#;

/// Live market changes (created / updated / resolved)
pub const MARKETS_SUBSCRIPTION: &str = r#"
subscription MarketsUpdate {
    marketsUpdate {
        type
        marketId
        market {
            marketId
            chainId
            description
            options
            liquidity
            totalBets
            totalBetsCount
            isActive
            odds {
                optionIndex
                odds
                totalAmount
                lastUpdate
            }
        }
    }
}
"#;

/// Odds pushes for one market
pub const LIVE_ODDS: &str = r#"
subscription LiveOdds($marketId: ID!) {
    liveOdds(marketId: $marketId) {
        marketId
        odds {
            optionIndex
            odds
            totalAmount
        }
        timestamp
    }
}
"#;

pub const CREATE_MARKET: &str = r#"
mutation CreateMarket(
    $description: String!
    $options: [String!]!
    $initialLiquidity: String!
    $category: String
    $resolutionTime: String
    $minBet: String
    $maxBet: String
) {
    createMarket(
        description: $description
        options: $options
        initialLiquidity: $initialLiquidity
        category: $category
        resolutionTime: $resolutionTime
        minBet: $minBet
        maxBet: $maxBet
    ) {
        marketId
        chainId
        transactionHash
        timestamp
    }
}
"#;

pub const PLACE_BET: &str = r#"
mutation PlaceBet($marketId: ID!, $optionIndex: Int!, $amount: String!) {
    placeBet(marketId: $marketId, optionIndex: $optionIndex, amount: $amount) {
        betId
        transactionHash
        timestamp
        newOdds {
            optionIndex
            odds
            totalAmount
        }
    }
}
"#;

pub const RESOLVE_MARKET: &str = r#"
mutation ResolveMarket($marketId: ID!, $winningOption: Int!, $resolutionData: String) {
    resolveMarket(marketId: $marketId, winningOption: $winningOption, resolutionData: $resolutionData) {
        marketId
        transactionHash
        timestamp
        totalPayout
        winningOption
    }
}
"#;

pub const ADD_LIQUIDITY: &str = r#"
mutation AddLiquidity($marketId: ID!, $amount: String!) {
    addLiquidity(marketId: $marketId, amount: $amount) {
        transactionHash
        timestamp
        newLiquidity
        feeCharged
    }
}
"#;

/// Cheapest query that proves the endpoint is up
pub const NETWORK_STATUS: &str = "{ __typename }";
