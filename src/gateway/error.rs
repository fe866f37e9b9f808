//! Gateway error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gateway error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::RateLimit, message)
    }

    pub fn overloaded(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Overloaded, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidRequest, message)
    }

    pub fn empty_reply(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::EmptyReply, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Unknown, message)
    }
}

/// Error classification.
///
/// The conversation treats every kind the same except `Overloaded`, which
/// gets its own scripted reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    /// Network issues, timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Model temporarily overloaded (503 / UNAVAILABLE)
    Overloaded,
    /// Other server error (5xx)
    ServerError,
    /// Authentication failed or no API key (401, 403)
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// Service answered without any text
    EmptyReply,
    /// Unknown error
    Unknown,
}

impl GatewayErrorKind {
    pub fn is_overloaded(self) -> bool {
        self == Self::Overloaded
    }
}
