use crate::core::errors::{ErrorKind, ExchangeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured failure handed to callers; `message` is meant to be shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub code: i32,
    pub message: String,
}

impl Failure {
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<ExchangeError> for Failure {
    fn from(err: ExchangeError) -> Self {
        Self {
            kind: err.kind(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Uniform result of every public operation.
///
/// `Unsupported` is a non-fatal outcome for features the venue or provider
/// does not offer for the given input; it is neither data nor an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum RequestOutcome<T> {
    Success(T),
    Unsupported { message: String },
    Failure(Failure),
}

impl<T> RequestOutcome<T> {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> RequestOutcome<U> {
        match self {
            Self::Success(value) => RequestOutcome::Success(f(value)),
            Self::Unsupported { message } => RequestOutcome::Unsupported { message },
            Self::Failure(failure) => RequestOutcome::Failure(failure),
        }
    }
}

impl<T> From<Result<T, ExchangeError>> for RequestOutcome<T> {
    fn from(result: Result<T, ExchangeError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err.into()),
        }
    }
}

impl<T> From<ExchangeError> for RequestOutcome<T> {
    fn from(err: ExchangeError) -> Self {
        Self::Failure(err.into())
    }
}
