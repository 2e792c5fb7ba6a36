//! GraphQL-over-HTTP client
//!
//! Runs the market list query and the contract mutations against the
//! Oddssync service endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use oddssync_core::{
    AddLiquidityParams, CreateMarketParams, FetchError, FilterState, MarketPage, MutationError,
    PlaceBetParams, ResolveMarketParams, TransactionReceipt,
};

use crate::queries;
use crate::source::{MarketContract, MarketSource};
use crate::types::{
    join_errors, AddLiquidityData, CreateMarketData, GraphQlRequest, GraphQlResponse, MarketsData,
    MarketsVariables, PlaceBetData, ResolveMarketData,
};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Oddssync GraphQL HTTP client
#[derive(Clone)]
pub struct GraphQlClient {
    client: Client,
    http_url: Url,
    auth_token: Option<String>,
}

impl GraphQlClient {
    /// Create a client for the given endpoint
    pub fn new(http_url: &str, auth_token: Option<String>) -> Result<Self, FetchError> {
        Self::with_timeout(http_url, auth_token, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(
        http_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http_url = Url::parse(http_url).map_err(|e| {
            FetchError::invalid_request(format!("Invalid GraphQL URL {}: {}", http_url, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            http_url,
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Endpoint this client talks to
    pub fn http_url(&self) -> &str {
        self.http_url.as_str()
    }

    /// Whether requests carry an authorization header
    pub fn has_auth(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Check the endpoint answers a trivial query
    #[instrument(skip(self))]
    pub async fn check_network_status(&self) -> Result<(), FetchError> {
        self.execute::<Value>("NetworkStatus", queries::NETWORK_STATUS, json!({}))
            .await
            .map(|_| ())
    }

    /// POST one GraphQL operation and decode its `data`
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, FetchError> {
        debug!("[Oddssync GQL] {} -> {}", operation, self.http_url);

        let mut request = self
            .client
            .post(self.http_url.clone())
            .json(&GraphQlRequest { query, variables });
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(format!("{} timed out: {}", operation, e))
            } else {
                FetchError::network(format!("Failed to send {}: {}", operation, e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::server(status.as_u16(), body));
        }

        let body: GraphQlResponse<T> = response.json().await.map_err(|e| {
            FetchError::parse(format!("Failed to parse {} response: {}", operation, e))
        })?;

        if !body.errors.is_empty() {
            return Err(FetchError::graphql(join_errors(&body.errors)));
        }

        body.data
            .ok_or_else(|| FetchError::parse(format!("{} response carried no data", operation)))
    }
}

#[async_trait]
impl MarketSource for GraphQlClient {
    #[instrument(skip(self))]
    async fn fetch_markets(
        &self,
        filter: &FilterState,
        page: u32,
        page_size: u32,
    ) -> Result<MarketPage, FetchError> {
        let variables = MarketsVariables::new(filter, page, page_size)?;
        let variables = serde_json::to_value(&variables)
            .map_err(|e| FetchError::invalid_request(format!("Failed to encode variables: {}", e)))?;

        let data: MarketsData = self
            .execute("GetMarkets", queries::GET_MARKETS, variables)
            .await?;

        let page = data.into_page();
        debug!(
            "[Oddssync GQL] Fetched {} markets ({} total)",
            page.markets.len(),
            page.total_count
        );
        Ok(page)
    }
}

#[async_trait]
impl MarketContract for GraphQlClient {
    #[instrument(skip(self, params), fields(description = %params.description))]
    async fn create_market(
        &self,
        params: &CreateMarketParams,
    ) -> Result<TransactionReceipt, MutationError> {
        let data: CreateMarketData = self
            .execute(
                "CreateMarket",
                queries::CREATE_MARKET,
                create_market_variables(params),
            )
            .await
            .inspect_err(|e| warn!("[Oddssync GQL] createMarket failed: {}", e))?;

        data.create_market.into_receipt()
    }

    #[instrument(skip(self, params), fields(market_id = %params.market_id))]
    async fn place_bet(&self, params: &PlaceBetParams) -> Result<TransactionReceipt, MutationError> {
        let data: PlaceBetData = self
            .execute("PlaceBet", queries::PLACE_BET, place_bet_variables(params))
            .await
            .inspect_err(|e| warn!("[Oddssync GQL] placeBet failed: {}", e))?;

        data.place_bet.into_receipt(&params.market_id)
    }

    #[instrument(skip(self, params), fields(market_id = %params.market_id))]
    async fn resolve_market(
        &self,
        params: &ResolveMarketParams,
    ) -> Result<TransactionReceipt, MutationError> {
        let data: ResolveMarketData = self
            .execute(
                "ResolveMarket",
                queries::RESOLVE_MARKET,
                resolve_market_variables(params),
            )
            .await
            .inspect_err(|e| warn!("[Oddssync GQL] resolveMarket failed: {}", e))?;

        data.resolve_market.into_receipt()
    }

    #[instrument(skip(self, params), fields(market_id = %params.market_id))]
    async fn add_liquidity(
        &self,
        params: &AddLiquidityParams,
    ) -> Result<TransactionReceipt, MutationError> {
        let data: AddLiquidityData = self
            .execute(
                "AddLiquidity",
                queries::ADD_LIQUIDITY,
                add_liquidity_variables(params),
            )
            .await
            .inspect_err(|e| warn!("[Oddssync GQL] addLiquidity failed: {}", e))?;

        data.add_liquidity.into_receipt(&params.market_id)
    }
}

// Amounts travel as decimal strings so no precision is lost in JSON numbers.

fn create_market_variables(params: &CreateMarketParams) -> Value {
    json!({
        "description": params.description,
        "options": params.options,
        "initialLiquidity": params.initial_liquidity.to_string(),
        "category": params.category,
        "resolutionTime": params.resolution_time.map(|t| t.to_rfc3339()),
        "minBet": params.min_bet.map(|v| v.to_string()),
        "maxBet": params.max_bet.map(|v| v.to_string()),
    })
}

fn place_bet_variables(params: &PlaceBetParams) -> Value {
    json!({
        "marketId": params.market_id,
        "optionIndex": params.option_index,
        "amount": params.amount.to_string(),
    })
}

fn resolve_market_variables(params: &ResolveMarketParams) -> Value {
    json!({
        "marketId": params.market_id,
        "winningOption": params.winning_option,
        "resolutionData": params.resolution_data,
    })
}

fn add_liquidity_variables(params: &AddLiquidityParams) -> Value {
    json!({
        "marketId": params.market_id,
        "amount": params.amount.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_client_rejects_invalid_url() {
        assert!(matches!(
            GraphQlClient::new("not a url", None),
            Err(FetchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let client = GraphQlClient::new("http://localhost:8080/graphql", Some("  ".into())).unwrap();
        assert!(!client.has_auth());
        assert_eq!(client.http_url(), "http://localhost:8080/graphql");
    }

    #[test]
    fn test_bet_variables_send_amount_as_string() {
        let vars = place_bet_variables(&PlaceBetParams {
            market_id: "12".into(),
            option_index: 1,
            amount: dec!(25.50),
        });
        assert_eq!(
            vars,
            json!({ "marketId": "12", "optionIndex": 1, "amount": "25.50" })
        );
    }

    #[test]
    fn test_create_variables_keep_optional_nulls() {
        let vars = create_market_variables(&CreateMarketParams {
            description: "Who wins the final?".into(),
            options: vec!["Home".into(), "Away".into()],
            initial_liquidity: dec!(500),
            category: Some("sports".into()),
            resolution_time: None,
            min_bet: Some(dec!(2)),
            max_bet: None,
        });
        assert_eq!(vars["initialLiquidity"], json!("500"));
        assert_eq!(vars["category"], json!("sports"));
        assert_eq!(vars["minBet"], json!("2"));
        assert!(vars["maxBet"].is_null());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = GraphQlClient::with_timeout(
            "http://127.0.0.1:1/graphql",
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client
            .fetch_markets(&FilterState::default(), 1, 6)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_) | FetchError::Timeout(_)));
        assert!(client.check_network_status().await.is_err());

        let err = client
            .place_bet(&PlaceBetParams {
                market_id: "1".into(),
                option_index: 0,
                amount: dec!(5),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Network(_)));
    }

    /// Answers one HTTP request with a canned GraphQL body
    async fn serve_once(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Read the whole request so closing the socket doesn't reset it
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{}/graphql", addr)
    }

    #[tokio::test]
    async fn test_network_status() {
        let url = serve_once(r#"{"data":{"__typename":"Query"}}"#).await;
        let client = GraphQlClient::new(&url, None).unwrap();
        client.check_network_status().await.unwrap();

        let url = serve_once(r#"{"errors":[{"message":"maintenance"}]}"#).await;
        let client = GraphQlClient::new(&url, None).unwrap();
        assert!(matches!(
            client.check_network_status().await,
            Err(FetchError::GraphQl(_))
        ));
    }
}
