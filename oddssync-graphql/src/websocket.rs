//! `graphql-transport-ws` subscription transport
//!
//! Opens one WebSocket per connection attempt, performs the
//! `connection_init` / `connection_ack` handshake, subscribes to
//! `marketsUpdate` (or one market's `liveOdds`), and forwards each `next`
//! payload as a raw JSON value.
//! Reconnection is the caller's job: the stream simply ends (after an
//! error item) when the connection drops.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use oddssync_core::SubscriptionError;

use crate::queries::{LIVE_ODDS, MARKETS_SUBSCRIPTION};

/// WebSocket sub-protocol spoken by the server
pub const GRAPHQL_TRANSPORT_WS: &str = "graphql-transport-ws";

/// Id of the single subscription carried by each connection
const SUBSCRIPTION_ID: &str = "1";

/// Time allowed for the socket upgrade plus `connection_ack`
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffered payloads between the socket reader and the consumer
const EVENT_BUFFER: usize = 256;

// ============================================================================
// Protocol frames
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscribePayload {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    ConnectionInit {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Subscribe {
        id: String,
        payload: SubscribePayload,
    },
    Pong {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Complete {
        id: String,
    },
}

impl ClientFrame {
    fn to_message(&self) -> Result<Message, SubscriptionError> {
        serde_json::to_string(self)
            .map(|json| Message::Text(json.into()))
            .map_err(|e| SubscriptionError::protocol(format!("Failed to encode frame: {}", e)))
    }
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    ConnectionAck {
        #[serde(default)]
        payload: Option<Value>,
    },
    Next {
        id: String,
        payload: Value,
    },
    Error {
        id: String,
        payload: Value,
    },
    Complete {
        id: String,
    },
    Ping {
        #[serde(default)]
        payload: Option<Value>,
    },
    Pong {
        #[serde(default)]
        payload: Option<Value>,
    },
}

// ============================================================================
// Connector
// ============================================================================

/// Raw subscription payloads of one connection. Ends when the connection
/// is lost; the last item is usually the error that ended it.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Value, SubscriptionError>> + Send>>;

/// Opens one subscription connection
#[async_trait]
pub trait UpdateConnector: Send + Sync + 'static {
    async fn connect(&self) -> Result<EventStream, SubscriptionError>;
}

/// Hands out one connector per market for its `liveOdds` stream
pub trait OddsFeed: Send + Sync + 'static {
    fn odds_connector(&self, market_id: &str) -> Arc<dyn UpdateConnector>;
}

/// `graphql-transport-ws` connector for one subscription document,
/// `marketsUpdate` unless built with [`GraphQlWsConnector::for_market_odds`]
#[derive(Debug, Clone)]
pub struct GraphQlWsConnector {
    ws_url: String,
    auth_token: Option<String>,
    handshake_timeout: Duration,
    subscription: SubscribePayload,
    /// Subscription name for logs
    topic: String,
}

impl GraphQlWsConnector {
    pub fn new(ws_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            subscription: SubscribePayload {
                query: MARKETS_SUBSCRIPTION.to_string(),
                variables: None,
            },
            topic: "marketsUpdate".to_string(),
        }
    }

    /// Same endpoint and credentials, subscribed to `liveOdds` of one market
    pub fn for_market_odds(&self, market_id: &str) -> Self {
        Self {
            subscription: SubscribePayload {
                query: LIVE_ODDS.to_string(),
                variables: Some(json!({ "marketId": market_id })),
            },
            topic: format!("liveOdds({})", market_id),
            ..self.clone()
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    fn init_frame(&self) -> ClientFrame {
        ClientFrame::ConnectionInit {
            payload: self
                .auth_token
                .as_ref()
                .map(|token| json!({ "authorization": format!("Bearer {}", token) })),
        }
    }

    fn subscribe_frame(&self) -> ClientFrame {
        ClientFrame::Subscribe {
            id: SUBSCRIPTION_ID.to_string(),
            payload: self.subscription.clone(),
        }
    }
}

impl OddsFeed for GraphQlWsConnector {
    fn odds_connector(&self, market_id: &str) -> Arc<dyn UpdateConnector> {
        Arc::new(self.for_market_odds(market_id))
    }
}

#[async_trait]
impl UpdateConnector for GraphQlWsConnector {
    async fn connect(&self) -> Result<EventStream, SubscriptionError> {
        let mut request = self
            .ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| SubscriptionError::connect(format!("Invalid WebSocket URL: {}", e)))?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(GRAPHQL_TRANSPORT_WS),
        );

        info!("[Oddssync WS] Connecting to {}", self.ws_url);

        let (ws_stream, _) = tokio::time::timeout(self.handshake_timeout, connect_async(request))
            .await
            .map_err(|_| SubscriptionError::connect("WebSocket upgrade timed out"))?
            .map_err(|e| SubscriptionError::connect(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        write
            .send(self.init_frame().to_message()?)
            .await
            .map_err(|e| SubscriptionError::connect(format!("Failed to send init: {}", e)))?;

        tokio::time::timeout(self.handshake_timeout, await_ack(&mut write, &mut read))
            .await
            .map_err(|_| SubscriptionError::connect("Timed out waiting for connection_ack"))??;

        write
            .send(self.subscribe_frame().to_message()?)
            .await
            .map_err(|e| SubscriptionError::connect(format!("Failed to subscribe: {}", e)))?;

        info!("[Oddssync WS] Subscribed to {}", self.topic);

        let (tx, rx) = mpsc::channel::<Result<Value, SubscriptionError>>(EVENT_BUFFER);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Consumer dropped the stream
                    _ = tx.closed() => {
                        debug!("[Oddssync WS] Consumer gone, completing subscription");
                        if let Ok(msg) = (ClientFrame::Complete { id: SUBSCRIPTION_ID.to_string() }).to_message() {
                            let _ = write.send(msg).await;
                        }
                        let _ = write.close().await;
                        break;
                    }

                    msg = read.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<ServerFrame>(&text) {
                                    Ok(ServerFrame::Next { payload, .. }) => {
                                        if tx.send(Ok(payload)).await.is_err() {
                                            break;
                                        }
                                    }
                                    Ok(ServerFrame::Ping { payload }) => {
                                        let pong = match (ClientFrame::Pong { payload }).to_message() {
                                            Ok(pong) => pong,
                                            Err(e) => {
                                                warn!("[Oddssync WS] {}", e);
                                                continue;
                                            }
                                        };
                                        if let Err(e) = write.send(pong).await {
                                            warn!("[Oddssync WS] Failed to send pong: {}", e);
                                            let _ = tx.send(Err(SubscriptionError::closed(e.to_string()))).await;
                                            break;
                                        }
                                    }
                                    Ok(ServerFrame::Error { payload, .. }) => {
                                        let _ = tx.send(Err(SubscriptionError::protocol(payload.to_string()))).await;
                                        break;
                                    }
                                    Ok(ServerFrame::Complete { .. }) => {
                                        let _ = tx.send(Err(SubscriptionError::closed("Server completed the subscription"))).await;
                                        break;
                                    }
                                    Ok(_) => {}
                                    Err(e) => {
                                        warn!("[Oddssync WS] Unrecognized frame ({}): {}", e, text);
                                    }
                                }
                            }
                            Some(Ok(Message::Ping(data))) => {
                                if let Err(e) = write.send(Message::Pong(data)).await {
                                    warn!("[Oddssync WS] Failed to send pong: {}", e);
                                    let _ = tx.send(Err(SubscriptionError::closed(e.to_string()))).await;
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(frame))) => {
                                info!("[Oddssync WS] Connection closed by server");
                                let _ = tx.send(Err(SubscriptionError::closed(format!("{:?}", frame)))).await;
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("[Oddssync WS] Error: {}", e);
                                let _ = tx.send(Err(SubscriptionError::closed(e.to_string()))).await;
                                break;
                            }
                            None => {
                                info!("[Oddssync WS] Stream ended");
                                break;
                            }
                            _ => {}
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Wait for `connection_ack`, answering pings in the meantime
async fn await_ack<W, R>(write: &mut W, read: &mut R) -> Result<(), SubscriptionError>
where
    W: Sink<Message, Error = WsError> + Unpin,
    R: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerFrame>(&text) {
                Ok(ServerFrame::ConnectionAck { .. }) => return Ok(()),
                Ok(ServerFrame::Ping { payload }) => {
                    let pong = ClientFrame::Pong { payload }.to_message()?;
                    write
                        .send(pong)
                        .await
                        .map_err(|e| SubscriptionError::connect(e.to_string()))?;
                }
                Ok(other) => debug!("[Oddssync WS] Ignoring frame before ack: {:?}", other),
                Err(e) => {
                    return Err(SubscriptionError::protocol(format!(
                        "Unexpected frame before ack: {}",
                        e
                    )))
                }
            },
            Some(Ok(Message::Close(frame))) => {
                return Err(SubscriptionError::closed(format!(
                    "Server closed during handshake: {:?}",
                    frame
                )))
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(SubscriptionError::connect(e.to_string())),
            None => return Err(SubscriptionError::closed("Stream ended during handshake")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    #[test]
    fn test_client_frames() {
        let connector = GraphQlWsConnector::new("ws://localhost:8080/graphql", Some("secret".into()));
        assert_eq!(
            serde_json::to_value(connector.init_frame()).unwrap(),
            json!({ "type": "connection_init", "payload": { "authorization": "Bearer secret" } })
        );

        let anonymous = GraphQlWsConnector::new("ws://localhost:8080/graphql", None);
        assert_eq!(
            serde_json::to_value(anonymous.init_frame()).unwrap(),
            json!({ "type": "connection_init" })
        );

        let subscribe = serde_json::to_value(connector.subscribe_frame()).unwrap();
        assert_eq!(subscribe["type"], "subscribe");
        assert_eq!(subscribe["id"], "1");
        assert!(subscribe["payload"]["query"]
            .as_str()
            .unwrap()
            .contains("marketsUpdate"));
        assert!(subscribe["payload"].get("variables").is_none());
    }

    #[test]
    fn test_market_odds_subscription() {
        let connector = GraphQlWsConnector::new("ws://localhost:8080/graphql", Some("secret".into()));
        let odds = connector.for_market_odds("m7");
        assert_eq!(odds.ws_url(), connector.ws_url());
        assert_eq!(odds.init_frame(), connector.init_frame());

        let subscribe = serde_json::to_value(odds.subscribe_frame()).unwrap();
        assert!(subscribe["payload"]["query"]
            .as_str()
            .unwrap()
            .contains("liveOdds(marketId: $marketId)"));
        assert_eq!(subscribe["payload"]["variables"], json!({ "marketId": "m7" }));
    }

    #[test]
    fn test_server_frames() {
        let next: ServerFrame = serde_json::from_str(
            r#"{"id":"1","type":"next","payload":{"data":{"marketsUpdate":null}}}"#,
        )
        .unwrap();
        assert!(matches!(next, ServerFrame::Next { id, .. } if id == "1"));

        let ack: ServerFrame = serde_json::from_str(r#"{"type":"connection_ack"}"#).unwrap();
        assert_eq!(ack, ServerFrame::ConnectionAck { payload: None });

        let ping: ServerFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, ServerFrame::Ping { payload: None });

        assert!(serde_json::from_str::<ServerFrame>(r#"{"type":"ka"}"#).is_err());
    }

    /// Minimal graphql-transport-ws server: ack, expect subscribe, push one
    /// `next`, then close.
    async fn serve_once(listener: TcpListener) {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = |_req: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
            response.headers_mut().insert(
                "Sec-WebSocket-Protocol",
                HeaderValue::from_static(GRAPHQL_TRANSPORT_WS),
            );
            Ok(response)
        };
        let mut ws = accept_hdr_async(stream, callback).await.unwrap();

        let init = ws.next().await.unwrap().unwrap();
        assert!(init.to_text().unwrap().contains("connection_init"));
        ws.send(Message::Text(r#"{"type":"connection_ack"}"#.into()))
            .await
            .unwrap();

        let subscribe = ws.next().await.unwrap().unwrap();
        assert!(subscribe.to_text().unwrap().contains("subscribe"));

        let next = json!({
            "id": "1",
            "type": "next",
            "payload": { "data": { "marketsUpdate": { "type": "RESOLVED", "marketId": "7" } } }
        });
        ws.send(Message::Text(next.to_string().into())).await.unwrap();
        ws.close(None).await.unwrap();
    }

    #[tokio::test]
    async fn test_connector_forwards_next_payloads() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener));

        let connector = GraphQlWsConnector::new(format!("ws://{}/graphql", addr), None);
        let mut stream = connector.connect().await.unwrap();

        let payload = stream.next().await.unwrap().unwrap();
        assert_eq!(payload["data"]["marketsUpdate"]["marketId"], "7");

        // Connection loss ends the stream, possibly after an error item
        while let Some(item) = stream.next().await {
            assert!(item.is_err());
        }

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_failure_is_connect_error() {
        let connector = GraphQlWsConnector::new("ws://127.0.0.1:1/graphql", None)
            .with_handshake_timeout(Duration::from_secs(2));
        assert!(matches!(
            connector.connect().await,
            Err(SubscriptionError::Connect(_))
        ));
    }
}
