//! Error types for the admin API client and the streaming log console.
//!
//! Two families live here:
//! - [`ConsoleError`]: everything that can end a streamed job session. The
//!   console never lets these escape to the host; it turns them into a
//!   [`JobStatus`](crate::models::JobStatus) transition plus, for transport
//!   failures, one synthetic log line.
//! - [`ApiError`]: failures of the plain request/response helpers (login,
//!   source listing), which the CLI reports directly.

use reqwest::StatusCode;
use thiserror::Error;

/// Ways a streamed job session can stop short of a clean end-of-stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// `open` was called without a job identifier.
    #[error("job id must not be empty")]
    InvalidJobId,

    /// The trigger request could not be sent, or the server answered with a
    /// non-2xx status before any body was read.
    #[error("{0}")]
    Connection(String),

    /// The response body broke off after streaming had begun.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// The session was closed by the host.
    #[error("cancelled")]
    Cancelled,
}

impl ConsoleError {
    pub fn connection(err: impl std::fmt::Display) -> Self {
        ConsoleError::Connection(err.to_string())
    }

    pub fn interrupted(err: impl std::fmt::Display) -> Self {
        ConsoleError::StreamInterrupted(err.to_string())
    }

    pub fn rejected(status: StatusCode) -> Self {
        ConsoleError::Connection(format!("server responded with {status}"))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConsoleError::Cancelled)
    }
}

/// Errors from the request/response endpoints of the admin API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),

    /// Non-2xx without a usable message body.
    #[error("{context} ({status})")]
    Status {
        context: &'static str,
        status: StatusCode,
    },

    /// Non-2xx where the server explained itself.
    #[error("{0}")]
    Rejected(String),
}
