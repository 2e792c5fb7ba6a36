//! Wire types for the Oddssync GraphQL API
//!
//! The service sends ids as numbers or strings, amounts as decimal strings
//! (Linera `Amount`, sometimes with a trailing `.`) or numbers, and
//! timestamps as epoch micros or RFC 3339 strings. Everything is normalized
//! into the `oddssync-core` records here.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use oddssync_core::{
    FetchError, FilterState, MalformedEventError, Market, MarketPage, MarketUpdateEvent,
    MarketUpdateKind, MutationError, Odds, StatusFilter, TransactionReceipt,
};

// ============================================================================
// GraphQL envelope
// ============================================================================

/// Body of a GraphQL-over-HTTP request
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

/// Body of a GraphQL response
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
}

/// Join error messages into one human-readable line
pub fn join_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Scalar normalization
// ============================================================================

/// Market/bet id from a JSON number or non-empty string
pub fn parse_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decimal from a JSON string or number
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_suffix('.').unwrap_or(s);
            Decimal::from_str(s).ok()
        }
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .ok()
                .or_else(|| Decimal::from_scientific(&text).ok())
        }
        _ => None,
    }
}

/// Timestamp from epoch seconds/millis/micros or an RFC 3339 string
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(timestamp_from_epoch),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| s.parse::<i64>().ok().and_then(timestamp_from_epoch))
        }
        _ => None,
    }
}

fn timestamp_from_epoch(ts: i64) -> Option<DateTime<Utc>> {
    if ts >= 100_000_000_000_000 {
        DateTime::from_timestamp_micros(ts)
    } else if ts >= 100_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_decimal(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal: {}", value)))
}

// ============================================================================
// Market DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsDto {
    pub option_index: u32,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub odds: Decimal,
    #[serde(alias = "totalBet", deserialize_with = "deserialize_decimal")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub last_update: Option<Value>,
}

impl From<OddsDto> for Odds {
    fn from(dto: OddsDto) -> Self {
        Odds {
            option_index: dto.option_index,
            odds: dto.odds,
            total_amount: dto.total_amount,
            last_update: dto.last_update.as_ref().and_then(parse_timestamp),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDto {
    #[serde(default)]
    pub market_id: Value,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    pub description: String,
    pub options: Vec<String>,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub liquidity: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub total_bets: Decimal,
    #[serde(default)]
    pub total_bets_count: Option<u64>,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub resolved_at: Option<Value>,
    #[serde(default)]
    pub winning_option: Option<u32>,
    #[serde(default)]
    pub odds: Option<Vec<OddsDto>>,
}

impl MarketDto {
    /// Convert into a domain market. Fails only when the id is missing.
    pub fn into_market(self) -> Result<Market, MalformedEventError> {
        let id = parse_id(&self.market_id).ok_or(MalformedEventError::MissingId)?;

        Ok(Market {
            id,
            chain_id: self.chain_id,
            creator: self.creator,
            description: self.description,
            options: self.options,
            liquidity: self.liquidity,
            total_bets: self.total_bets,
            total_bets_count: self.total_bets_count,
            is_active: self.is_active,
            created_at: self.created_at.as_ref().and_then(parse_timestamp),
            resolved_at: self.resolved_at.as_ref().and_then(parse_timestamp),
            winning_option: self.winning_option,
            odds: self
                .odds
                .unwrap_or_default()
                .into_iter()
                .map(Odds::from)
                .collect(),
        })
    }
}

/// `data` of the `GetMarkets` query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketsData {
    pub markets: Vec<MarketDto>,
    #[serde(default)]
    pub markets_count: Option<u64>,
}

impl MarketsData {
    /// Convert into a page, skipping markets without an id
    pub fn into_page(self) -> MarketPage {
        let fetched = self.markets.len() as u64;
        let markets: Vec<Market> = self
            .markets
            .into_iter()
            .filter_map(|dto| match dto.into_market() {
                Ok(market) => Some(market),
                Err(e) => {
                    tracing::warn!("[Oddssync GQL] Skipping market in query result: {}", e);
                    None
                }
            })
            .collect();

        MarketPage {
            markets,
            total_count: self.markets_count.unwrap_or(fetched),
        }
    }
}

// ============================================================================
// Query variables
// ============================================================================

/// `MarketFilter` input object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFilterInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl MarketFilterInput {
    /// Translate the UI filter. Values without a server-side counterpart
    /// (category, high liquidity, unknown) are left out. Returns `None`
    /// when nothing is left to send.
    pub fn from_filter(filter: &FilterState) -> Option<Self> {
        let is_active = match filter.status {
            Some(StatusFilter::Active) => Some(true),
            Some(StatusFilter::Resolved) => Some(false),
            Some(StatusFilter::HighLiquidity) | None => None,
        };
        let search = filter.search_text().map(str::to_string);

        let input = Self { is_active, search };
        (input != Self::default()).then_some(input)
    }
}

/// Variables of the `GetMarkets` query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketsVariables {
    pub skip: u32,
    pub first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<MarketFilterInput>,
}

impl MarketsVariables {
    /// Build variables for a 1-based page
    pub fn new(filter: &FilterState, page: u32, page_size: u32) -> Result<Self, FetchError> {
        if page == 0 {
            return Err(FetchError::invalid_request("page must be >= 1"));
        }
        if page_size == 0 {
            return Err(FetchError::invalid_request("page size must be > 0"));
        }
        let skip = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| FetchError::invalid_request("page offset overflows"))?;

        Ok(Self {
            skip,
            first: page_size,
            sort_by: filter.sort.map(|s| s.server_key()),
            filter: MarketFilterInput::from_filter(filter),
        })
    }
}

// ============================================================================
// Subscription payloads
// ============================================================================

/// Decode one `next` payload of the `marketsUpdate` or `liveOdds`
/// subscription.
///
/// Accepts the full `{data: {marketsUpdate}}` payload, the bare
/// `{marketsUpdate}` object, or the update object itself. A `liveOdds`
/// payload becomes `OddsChanged`.
pub fn decode_update_event(payload: &Value) -> Result<MarketUpdateEvent, MalformedEventError> {
    let data = payload
        .get("data")
        .filter(|d| d.is_object())
        .unwrap_or(payload);
    if let Some(live) = data.get("liveOdds") {
        return decode_odds_change(live);
    }
    let update = data.get("marketsUpdate").unwrap_or(data);

    if !update.is_object() {
        return Err(MalformedEventError::InvalidPayload(format!(
            "expected an object, got {}",
            update
        )));
    }

    let tag = update
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| MalformedEventError::UnknownType("<missing>".to_string()))?;
    let kind: MarketUpdateKind = tag
        .parse()
        .map_err(|_| MalformedEventError::UnknownType(tag.to_string()))?;

    let market = update.get("market").filter(|m| !m.is_null());

    match kind {
        MarketUpdateKind::Resolved => {
            let id = market
                .and_then(|m| m.get("marketId"))
                .and_then(parse_id)
                .or_else(|| update.get("marketId").and_then(parse_id))
                .ok_or(MalformedEventError::MissingId)?;
            Ok(MarketUpdateEvent::Resolved(id))
        }
        MarketUpdateKind::OddsChanged => decode_odds_change(update),
        MarketUpdateKind::Created | MarketUpdateKind::Updated => {
            let market = market.ok_or_else(|| MalformedEventError::MissingMarket {
                kind: kind.to_string(),
            })?;
            let dto: MarketDto = serde_json::from_value(market.clone())
                .map_err(|e| MalformedEventError::InvalidPayload(e.to_string()))?;
            let market = dto.into_market()?;

            Ok(match kind {
                MarketUpdateKind::Created => MarketUpdateEvent::Created(market),
                _ => MarketUpdateEvent::Updated(market),
            })
        }
    }
}

/// Body of one `liveOdds` push
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveOddsDto {
    #[serde(default)]
    pub market_id: Value,
    pub odds: Vec<OddsDto>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

fn decode_odds_change(live: &Value) -> Result<MarketUpdateEvent, MalformedEventError> {
    let dto: LiveOddsDto = serde_json::from_value(live.clone())
        .map_err(|e| MalformedEventError::InvalidPayload(e.to_string()))?;
    let market_id = parse_id(&dto.market_id).ok_or(MalformedEventError::MissingId)?;
    let pushed_at = dto.timestamp.as_ref().and_then(parse_timestamp);

    let odds = dto
        .odds
        .into_iter()
        .map(|entry| {
            let mut odds = Odds::from(entry);
            // Entries carry no time of their own; use the push time
            if odds.last_update.is_none() {
                odds.last_update = pushed_at;
            }
            odds
        })
        .collect();

    Ok(MarketUpdateEvent::OddsChanged { market_id, odds })
}

// ============================================================================
// Mutation results
// ============================================================================

fn require_hash(hash: Option<String>) -> Result<String, MutationError> {
    hash.filter(|h| !h.trim().is_empty())
        .ok_or_else(|| MutationError::parse("response carried no transaction hash"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketData {
    pub create_market: CreateMarketResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketResult {
    #[serde(default)]
    pub market_id: Value,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl CreateMarketResult {
    pub fn into_receipt(self) -> Result<TransactionReceipt, MutationError> {
        Ok(TransactionReceipt {
            transaction_id: require_hash(self.transaction_hash)?,
            market_id: parse_id(&self.market_id),
            bet_id: None,
            timestamp: self.timestamp.as_ref().and_then(parse_timestamp),
            new_odds: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetData {
    pub place_bet: PlaceBetResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetResult {
    #[serde(default)]
    pub bet_id: Value,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub new_odds: Option<Vec<OddsDto>>,
}

impl PlaceBetResult {
    pub fn into_receipt(self, market_id: &str) -> Result<TransactionReceipt, MutationError> {
        Ok(TransactionReceipt {
            transaction_id: require_hash(self.transaction_hash)?,
            market_id: Some(market_id.to_string()),
            bet_id: parse_id(&self.bet_id),
            timestamp: self.timestamp.as_ref().and_then(parse_timestamp),
            new_odds: self
                .new_odds
                .unwrap_or_default()
                .into_iter()
                .map(Odds::from)
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveMarketData {
    pub resolve_market: ResolveMarketResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveMarketResult {
    #[serde(default)]
    pub market_id: Value,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub total_payout: Option<Value>,
    #[serde(default)]
    pub winning_option: Option<u32>,
}

impl ResolveMarketResult {
    pub fn into_receipt(self) -> Result<TransactionReceipt, MutationError> {
        Ok(TransactionReceipt {
            transaction_id: require_hash(self.transaction_hash)?,
            market_id: parse_id(&self.market_id),
            bet_id: None,
            timestamp: self.timestamp.as_ref().and_then(parse_timestamp),
            new_odds: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLiquidityData {
    pub add_liquidity: AddLiquidityResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLiquidityResult {
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub new_liquidity: Option<Value>,
    #[serde(default)]
    pub fee_charged: Option<Value>,
}

impl AddLiquidityResult {
    pub fn into_receipt(self, market_id: &str) -> Result<TransactionReceipt, MutationError> {
        Ok(TransactionReceipt {
            transaction_id: require_hash(self.transaction_hash)?,
            market_id: Some(market_id.to_string()),
            bet_id: None,
            timestamp: self.timestamp.as_ref().and_then(parse_timestamp),
            new_odds: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddssync_core::{Category, SortKey};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_resolved_status_maps_to_inactive_only() {
        let filter = FilterState {
            status: Some(StatusFilter::Resolved),
            sort: None,
            ..FilterState::default()
        };
        let vars = MarketsVariables::new(&filter, 1, 6).unwrap();

        assert_eq!(
            serde_json::to_value(&vars).unwrap(),
            json!({ "skip": 0, "first": 6, "filter": { "isActive": false } })
        );
    }

    #[test]
    fn test_unknown_filter_values_are_omitted() {
        let filter = FilterState::from_raw(Some("crypto"), Some("trending"), Some("hot"), None);
        let vars = MarketsVariables::new(&filter, 3, 6).unwrap();

        assert_eq!(
            serde_json::to_value(&vars).unwrap(),
            json!({ "skip": 12, "first": 6 })
        );
    }

    #[test]
    fn test_full_filter_translation() {
        let filter = FilterState {
            category: Some(Category::Sports),
            status: Some(StatusFilter::Active),
            sort: Some(SortKey::OddsVolatility),
            search: " final ".into(),
        };
        let vars = MarketsVariables::new(&filter, 2, 10).unwrap();

        assert_eq!(
            serde_json::to_value(&vars).unwrap(),
            json!({
                "skip": 10,
                "first": 10,
                "sortBy": "ODDS_VOLATILITY",
                "filter": { "isActive": true, "search": "final" }
            })
        );
    }

    #[test]
    fn test_high_liquidity_has_no_server_filter() {
        let filter = FilterState {
            status: Some(StatusFilter::HighLiquidity),
            ..FilterState::default()
        };
        assert_eq!(MarketFilterInput::from_filter(&filter), None);
    }

    #[test]
    fn test_invalid_pagination_rejected() {
        let filter = FilterState::default();
        assert!(matches!(
            MarketsVariables::new(&filter, 0, 6),
            Err(FetchError::InvalidRequest(_))
        ));
        assert!(matches!(
            MarketsVariables::new(&filter, 1, 0),
            Err(FetchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_decimal(&json!("100.")), Some(dec!(100)));
        assert_eq!(parse_decimal(&json!(1.75)), Some(dec!(1.75)));
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_id(&json!(42)), Some("42".to_string()));
        assert_eq!(parse_id(&json!("")), None);

        let micros = parse_timestamp(&json!(1_700_000_000_000_000i64)).unwrap();
        let rfc = parse_timestamp(&json!("2023-11-14T22:13:20Z")).unwrap();
        assert_eq!(micros, rfc);
    }

    #[test]
    fn test_markets_page_conversion() {
        let data: MarketsData = serde_json::from_value(json!({
            "markets": [{
                "marketId": 7,
                "chainId": "e476",
                "description": "Will BTC close above 100k?",
                "creator": "0xabc",
                "options": ["Yes", "No"],
                "liquidity": "1000.",
                "totalBets": "250.5",
                "totalBetsCount": 12,
                "createdAt": 1_700_000_000_000_000i64,
                "resolvedAt": null,
                "winningOption": null,
                "isActive": true,
                "odds": [
                    { "optionIndex": 0, "odds": 1.5, "totalAmount": "100" },
                    { "optionIndex": 1, "odds": 2.0, "totalBet": "50" }
                ]
            }],
            "marketsCount": 31
        }))
        .unwrap();

        let page = data.into_page();
        assert_eq!(page.total_count, 31);
        let market = &page.markets[0];
        assert_eq!(market.id, "7");
        assert_eq!(market.liquidity, dec!(1000));
        assert_eq!(market.total_bets, dec!(250.5));
        assert!(market.created_at.is_some());
        assert_eq!(market.odds[1].total_amount, dec!(50));
    }

    fn market_json(id: Value) -> Value {
        json!({
            "marketId": id,
            "description": "Coin flip",
            "options": ["Heads", "Tails"],
            "liquidity": "10",
            "totalBets": "0",
            "isActive": true,
            "odds": [{ "optionIndex": 0, "odds": "1.9", "totalAmount": "5" }]
        })
    }

    #[test]
    fn test_decode_created_and_updated() {
        let payload = json!({ "data": { "marketsUpdate": { "type": "CREATED", "market": market_json(json!("m1")) } } });
        match decode_update_event(&payload).unwrap() {
            MarketUpdateEvent::Created(market) => assert_eq!(market.id, "m1"),
            other => panic!("unexpected event: {:?}", other),
        }

        let payload = json!({ "marketsUpdate": { "type": "updated", "market": market_json(json!(3)) } });
        assert!(matches!(
            decode_update_event(&payload).unwrap(),
            MarketUpdateEvent::Updated(m) if m.id == "3"
        ));
    }

    #[test]
    fn test_decode_resolved_id_sources() {
        let nested = json!({ "type": "RESOLVED", "market": { "marketId": "m9" } });
        assert_eq!(
            decode_update_event(&nested).unwrap(),
            MarketUpdateEvent::Resolved("m9".into())
        );

        let top_level = json!({ "type": "RESOLVED", "marketId": 9, "market": null });
        assert_eq!(
            decode_update_event(&top_level).unwrap(),
            MarketUpdateEvent::Resolved("9".into())
        );
    }

    #[test]
    fn test_decode_live_odds() {
        let payload = json!({ "data": { "liveOdds": {
            "marketId": 12,
            "odds": [{ "optionIndex": 1, "odds": "2.35", "totalAmount": "80." }],
            "timestamp": "2024-03-01T12:00:00Z"
        } } });
        match decode_update_event(&payload).unwrap() {
            MarketUpdateEvent::OddsChanged { market_id, odds } => {
                assert_eq!(market_id, "12");
                assert_eq!(odds.len(), 1);
                assert_eq!(odds[0].option_index, 1);
                assert_eq!(odds[0].odds, dec!(2.35));
                assert_eq!(odds[0].total_amount, dec!(80));
                assert!(odds[0].last_update.is_some());
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let tagged = json!({ "type": "ODDS_CHANGED", "marketId": "m2", "odds": [] });
        assert_eq!(
            decode_update_event(&tagged).unwrap(),
            MarketUpdateEvent::OddsChanged { market_id: "m2".into(), odds: vec![] }
        );

        let no_id = json!({ "liveOdds": { "odds": [] } });
        assert_eq!(decode_update_event(&no_id), Err(MalformedEventError::MissingId));
        assert!(matches!(
            decode_update_event(&json!({ "data": { "liveOdds": null } })),
            Err(MalformedEventError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_decode_malformed() {
        let unknown = json!({ "type": "DELETED", "market": market_json(json!("m1")) });
        assert_eq!(
            decode_update_event(&unknown),
            Err(MalformedEventError::UnknownType("DELETED".into()))
        );

        let no_id = json!({ "type": "RESOLVED" });
        assert_eq!(decode_update_event(&no_id), Err(MalformedEventError::MissingId));

        let created_without_id = json!({ "type": "CREATED", "market": market_json(Value::Null) });
        assert_eq!(
            decode_update_event(&created_without_id),
            Err(MalformedEventError::MissingId)
        );

        let no_market = json!({ "type": "UPDATED" });
        assert!(matches!(
            decode_update_event(&no_market),
            Err(MalformedEventError::MissingMarket { .. })
        ));

        assert!(decode_update_event(&json!("PONG")).is_err());
    }

    #[test]
    fn test_mutation_receipts() {
        let data: PlaceBetData = serde_json::from_value(json!({
            "placeBet": {
                "betId": 55,
                "transactionHash": "0xdeadbeef",
                "timestamp": "2024-01-01T00:00:00Z",
                "newOdds": [{ "optionIndex": 1, "odds": "2.4", "totalAmount": "80" }]
            }
        }))
        .unwrap();

        let receipt = data.place_bet.into_receipt("m1").unwrap();
        assert_eq!(receipt.transaction_id, "0xdeadbeef");
        assert_eq!(receipt.bet_id.as_deref(), Some("55"));
        assert_eq!(receipt.new_odds[0].odds, dec!(2.4));

        let data: ResolveMarketData = serde_json::from_value(json!({
            "resolveMarket": { "marketId": 1, "winningOption": 0, "totalPayout": "0" }
        }))
        .unwrap();
        assert!(matches!(
            data.resolve_market.into_receipt(),
            Err(MutationError::Parse(_))
        ));
    }
}
