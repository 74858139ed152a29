use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code reported for timeouts, DNS failures and dropped connections
pub const TRANSPORT_ERROR_CODE: i32 = -1;
/// Code reported when credentials are missing or unusable
pub const CONFIGURATION_ERROR_CODE: i32 = -2;
/// Code reported for malformed responses that carried no HTTP error status
pub const PROTOCOL_ERROR_CODE: i32 = -3;
/// Code reported when a position close is requested but nothing is open
pub const NO_OPEN_POSITION_CODE: i32 = -4;
/// HTTP status used by every provider to signal throttling
pub const RATE_LIMIT_STATUS: u16 = 429;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Protocol error: {message}")]
    ProtocolError {
        status: Option<u16>,
        message: String,
    },

    #[error("Venue error: {code} - {message}")]
    VenueError { code: i32, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),
}

/// Coarse classification of an `ExchangeError`, exposed to callers through
/// `RequestOutcome::Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    Protocol,
    Venue,
    RateLimited,
}

impl ErrorKind {
    /// Whether repeating the same call later can succeed without changes
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transport | Self::RateLimited)
    }
}

impl ExchangeError {
    pub fn protocol(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ProtocolError {
            status,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationError(_) => ErrorKind::Configuration,
            Self::TransportError(_) => ErrorKind::Transport,
            Self::ProtocolError { .. } => ErrorKind::Protocol,
            Self::VenueError { .. } => ErrorKind::Venue,
            Self::RateLimited(_) => ErrorKind::RateLimited,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::ConfigurationError(_) => CONFIGURATION_ERROR_CODE,
            Self::TransportError(_) => TRANSPORT_ERROR_CODE,
            Self::ProtocolError { status, .. } => {
                status.map_or(PROTOCOL_ERROR_CODE, i32::from)
            }
            Self::VenueError { code, .. } => *code,
            Self::RateLimited(_) => i32::from(RATE_LIMIT_STATUS),
        }
    }

    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Same variant, status and code with a replaced message
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        match self {
            Self::ConfigurationError(_) => Self::ConfigurationError(message),
            Self::TransportError(_) => Self::TransportError(message),
            Self::ProtocolError { status, .. } => Self::ProtocolError { status, message },
            Self::VenueError { code, .. } => Self::VenueError { code, message },
            Self::RateLimited(_) => Self::RateLimited(message),
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TransportError(format!("Request timed out: {}", err))
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Self::TransportError(format!("Request failed: {}", err))
        } else if err.is_builder() {
            Self::ConfigurationError(format!("Invalid request: {}", err))
        } else if let Some(status) = err.status() {
            Self::protocol(Some(status.as_u16()), err.to_string())
        } else {
            Self::protocol(None, err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(None, format!("Failed to parse JSON response: {}", err))
    }
}

impl From<crate::core::config::ConfigError> for ExchangeError {
    fn from(err: crate::core::config::ConfigError) -> Self {
        Self::ConfigurationError(err.to_string())
    }
}
