//! Connection state for the market update stream

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the update subscription.
///
/// `Disconnected -> Connecting -> Connected -> Disconnected` on drop, then
/// back to `Connecting` once the backoff delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not connected; a reconnect may be pending
    #[default]
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Connected and receiving events
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}
