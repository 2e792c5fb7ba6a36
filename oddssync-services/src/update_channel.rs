//! Update Channel
//!
//! Keeps the `marketsUpdate` subscription alive and hands every decoded
//! event to the subscriber in receipt order. Connection drops are recovered
//! with capped exponential backoff; events missed while disconnected are not
//! replayed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use oddssync_core::{ConnectionState, MarketUpdateEvent};
use oddssync_graphql::{decode_update_event, UpdateConnector};

use crate::backoff::Backoff;

/// Health snapshot of the subscription
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionHealth {
    pub state: ConnectionState,
    pub connected: bool,
    pub last_message_time: Option<DateTime<Utc>>,
    pub message_count: u64,
    pub malformed_count: u64,
    pub reconnect_count: u64,
}

/// Counters for the subscription (atomic for thread-safe access)
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    connected: AtomicBool,
    last_message_epoch_ms: AtomicU64,
    message_count: AtomicU64,
    malformed_count: AtomicU64,
    reconnect_count: AtomicU64,
}

impl ConnectionMetrics {
    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn record_message(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last_message_epoch_ms.store(now, Ordering::SeqCst);
        self.message_count.fetch_add(1, Ordering::SeqCst);
    }

    fn record_malformed(&self) {
        self.malformed_count.fetch_add(1, Ordering::SeqCst);
    }

    fn record_reconnect(&self) {
        self.reconnect_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    pub fn malformed_count(&self) -> u64 {
        self.malformed_count.load(Ordering::SeqCst)
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count.load(Ordering::SeqCst)
    }

    fn get_health(&self, state: ConnectionState) -> ConnectionHealth {
        let last_ms = self.last_message_epoch_ms.load(Ordering::SeqCst);
        let last_message_time = if last_ms > 0 {
            DateTime::from_timestamp(
                (last_ms / 1000) as i64,
                ((last_ms % 1000) * 1_000_000) as u32,
            )
        } else {
            None
        };

        ConnectionHealth {
            state,
            connected: self.connected.load(Ordering::SeqCst),
            last_message_time,
            message_count: self.message_count(),
            malformed_count: self.malformed_count(),
            reconnect_count: self.reconnect_count(),
        }
    }
}

/// Open while a subscription is live. Event delivery and state writes run
/// under the lock, so once [`DeliveryGate::close`] returns nothing else gets
/// through.
#[derive(Debug)]
struct DeliveryGate {
    open: Mutex<bool>,
}

impl DeliveryGate {
    fn new() -> Self {
        Self {
            open: Mutex::new(true),
        }
    }

    /// Run `f` if the gate is still open
    fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let open = self.open.lock();
        if *open {
            Some(f())
        } else {
            None
        }
    }

    /// Close the gate, waiting for an in-flight delivery to finish.
    /// Returns whether it was open.
    fn close(&self) -> bool {
        std::mem::replace(&mut *self.open.lock(), false)
    }
}

/// Persistent subscription to market update events
pub struct UpdateChannel {
    connector: Arc<dyn UpdateConnector>,
    backoff: Backoff,
    state: Arc<watch::Sender<ConnectionState>>,
    metrics: Arc<ConnectionMetrics>,
}

impl UpdateChannel {
    pub fn new(connector: Arc<dyn UpdateConnector>, backoff: Backoff) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connector,
            backoff,
            state: Arc::new(state),
            metrics: Arc::new(ConnectionMetrics::default()),
        }
    }

    /// Start delivering events to `on_event` until the returned
    /// subscription is closed or dropped.
    pub fn subscribe<F>(&self, on_event: F) -> Subscription
    where
        F: FnMut(MarketUpdateEvent) + Send + 'static,
    {
        let gate = Arc::new(DeliveryGate::new());
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = ConnectionTask {
            connector: Arc::clone(&self.connector),
            backoff: self.backoff,
            state: Arc::clone(&self.state),
            metrics: Arc::clone(&self.metrics),
            gate: Arc::clone(&gate),
            stop: stop_rx,
        };
        let handle = tokio::spawn(task.run(on_event));

        Subscription {
            handle: Some(handle),
            gate,
            stop: stop_tx,
            state: Arc::clone(&self.state),
            metrics: Arc::clone(&self.metrics),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn metrics(&self) -> &ConnectionMetrics {
        &self.metrics
    }

    pub fn health(&self) -> ConnectionHealth {
        self.metrics.get_health(self.state())
    }
}

/// Everything the background connection loop owns
struct ConnectionTask {
    connector: Arc<dyn UpdateConnector>,
    backoff: Backoff,
    state: Arc<watch::Sender<ConnectionState>>,
    metrics: Arc<ConnectionMetrics>,
    gate: Arc<DeliveryGate>,
    stop: watch::Receiver<bool>,
}

impl ConnectionTask {
    /// Publish a state change; false once the subscription is closed
    fn set_state(&self, state: ConnectionState) -> bool {
        self.gate
            .run(|| {
                self.metrics.set_connected(state.is_connected());
                self.state.send_replace(state);
            })
            .is_some()
    }

    /// Connect, drain, reconnect until the subscription is closed
    async fn run<F>(self, mut on_event: F)
    where
        F: FnMut(MarketUpdateEvent) + Send + 'static,
    {
        let mut stop = self.stop.clone();
        let mut attempt = 0u32;

        loop {
            if !self.set_state(ConnectionState::Connecting) {
                return;
            }

            let connected = tokio::select! {
                _ = stop.wait_for(|stopped| *stopped) => return,
                result = self.connector.connect() => result,
            };

            match connected {
                Ok(mut stream) => {
                    info!("[UpdateChannel] Connected");
                    attempt = 0;
                    if !self.set_state(ConnectionState::Connected) {
                        return;
                    }

                    loop {
                        let item = tokio::select! {
                            _ = stop.wait_for(|stopped| *stopped) => return,
                            item = stream.next() => item,
                        };
                        let Some(item) = item else { break };

                        match item {
                            Ok(payload) => {
                                self.metrics.record_message();
                                match decode_update_event(&payload) {
                                    Ok(event) => {
                                        debug!(
                                            "[UpdateChannel] {} {}",
                                            event.kind(),
                                            event.market_id()
                                        );
                                        if self.gate.run(|| on_event(event)).is_none() {
                                            return;
                                        }
                                    }
                                    Err(e) => {
                                        self.metrics.record_malformed();
                                        warn!("[UpdateChannel] Dropping malformed event: {}", e);
                                    }
                                }
                            }
                            Err(e) => {
                                warn!("[UpdateChannel] Subscription error: {}", e);
                                break;
                            }
                        }
                    }

                    info!("[UpdateChannel] Connection lost");
                }
                Err(e) => {
                    error!("[UpdateChannel] Connection failed: {}", e);
                }
            }

            if !self.set_state(ConnectionState::Disconnected) {
                return;
            }

            let delay = self.backoff.delay(attempt);
            attempt = attempt.saturating_add(1);
            self.metrics.record_reconnect();
            info!(
                "[UpdateChannel] Reconnecting in {:?} (attempt {})",
                delay, attempt
            );
            tokio::select! {
                _ = stop.wait_for(|stopped| *stopped) => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Handle to a running subscription. Closing (or dropping) it stops
/// delivery and releases the connection. No event reaches the callback
/// after `close` returns.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
    gate: Arc<DeliveryGate>,
    stop: watch::Sender<bool>,
    state: Arc<watch::Sender<ConnectionState>>,
    metrics: Arc<ConnectionMetrics>,
}

impl Subscription {
    pub fn close(mut self) {
        self.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.gate.close();
            self.stop.send_replace(true);
            handle.abort();
            self.metrics.set_connected(false);
            self.state.send_replace(ConnectionState::Disconnected);
            info!("[UpdateChannel] Subscription closed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}
