//! Error types for the sync client

use serde::Serialize;
use thiserror::Error;

/// Failure of a Query Channel fetch. Surfaced to the caller, never retried
/// automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn network(msg: impl Into<String>) -> Self {
        FetchError::Network(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        FetchError::Timeout(msg.into())
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        FetchError::Server {
            status,
            message: message.into(),
        }
    }

    pub fn graphql(msg: impl Into<String>) -> Self {
        FetchError::GraphQl(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        FetchError::Parse(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        FetchError::InvalidRequest(msg.into())
    }

    /// Whether offering the user a retry makes sense
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) | FetchError::GraphQl(_) => true,
            FetchError::Server { status, .. } => *status >= 500 || *status == 429,
            FetchError::Parse(_) | FetchError::InvalidRequest(_) => false,
        }
    }
}

/// Connection-level failure on the Update Channel. Recovered by reconnect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection closed: {0}")]
    Closed(String),
}

impl SubscriptionError {
    pub fn connect(msg: impl Into<String>) -> Self {
        SubscriptionError::Connect(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        SubscriptionError::Protocol(msg.into())
    }

    pub fn closed(msg: impl Into<String>) -> Self {
        SubscriptionError::Closed(msg.into())
    }
}

/// A push payload that could not be decoded into a market event.
/// Dropped with a diagnostic; the stream keeps running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedEventError {
    #[error("Unknown event type: {0}")]
    UnknownType(String),

    #[error("Event is missing a market identifier")]
    MissingId,

    #[error("Event {kind} is missing its market payload")]
    MissingMarket { kind: String },

    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),
}

/// A single rejected form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure of a contract mutation (create, bet, resolve, add liquidity).
/// Financial operations are never resubmitted automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl MutationError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        MutationError::Rejected(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        MutationError::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        MutationError::Parse(msg.into())
    }

    /// Field errors, when this is a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            MutationError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

impl From<FetchError> for MutationError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(msg) | FetchError::Timeout(msg) => MutationError::Network(msg),
            FetchError::Server { status, message } => {
                MutationError::Network(format!("HTTP {}: {}", status, message))
            }
            FetchError::GraphQl(msg) | FetchError::InvalidRequest(msg) => {
                MutationError::Rejected(msg)
            }
            FetchError::Parse(msg) => MutationError::Parse(msg),
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
