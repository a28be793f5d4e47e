//! Error taxonomy for session operations.
//!
//! # Design
//! - [`BackendError`] describes what went wrong talking to the server.
//! - [`SessionError`] is what callers see; transport and application failures are
//!   surfaced the same way and only differ in logs.
//! - Stale responses are outcomes, not errors (see [`crate::query::QueryOutcome`]).

use thiserror::Error;

/// Failures raised by a [`crate::backend::Backend`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced a response (connect, DNS, TLS, reset).
    #[error("request failed")]
    Transport {
        /// Transport error detail for logs.
        detail: String,
    },
    /// The server answered with a non-success HTTP status.
    #[error("server responded with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body, when present.
        message: Option<String>,
    },
    /// The response body could not be decoded.
    #[error("response could not be decoded")]
    Decode {
        /// Decoder error detail for logs.
        detail: String,
    },
    /// The server processed the request and reported `success: false`.
    #[error("request rejected by server")]
    Rejected {
        /// Server-provided explanation, when present.
        message: Option<String>,
    },
    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout {
        /// Timeout that elapsed, in milliseconds.
        after_ms: u64,
    },
}

impl BackendError {
    /// Human-readable message supplied by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected { message } => message.as_deref(),
            Self::Transport { .. } | Self::Decode { .. } | Self::Timeout { .. } => None,
        }
    }
}

/// Client-side validation failures; no request is sent when one is raised.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Bulk submission without a chosen action.
    #[error("no action selected")]
    MissingAction,
    /// Bulk submission with an empty selection.
    #[error("no items selected")]
    EmptySelection,
}

impl ValidationError {
    /// Warning text shown to the user.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::MissingAction => "Choose an action to run.",
            Self::EmptySelection => "Select at least one item.",
        }
    }
}

/// Caller-facing error for session operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Input was rejected before any request was made.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// The request failed in transit, timed out, or returned an unusable response.
    #[error("network request failed")]
    Network {
        /// Underlying backend failure.
        #[source]
        source: BackendError,
    },
    /// The server reported the operation as unsuccessful.
    #[error("server reported failure")]
    Application {
        /// Server-provided explanation, when present.
        message: Option<String>,
    },
}

impl From<BackendError> for SessionError {
    fn from(source: BackendError) -> Self {
        match source {
            BackendError::Rejected { message } => Self::Application { message },
            other => Self::Network { source: other },
        }
    }
}

impl SessionError {
    /// Message to surface in a notification, falling back when the server sent none.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(err) => err.user_message().to_string(),
            Self::Network { source } => source
                .server_message()
                .map_or_else(|| fallback.to_string(), str::to_string),
            Self::Application { message } => message
                .as_deref()
                .filter(|text| !text.trim().is_empty())
                .map_or_else(|| fallback.to_string(), str::to_string),
        }
    }

    /// Whether the error was raised client-side.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience alias for session results.
pub type SessionResult<T> = Result<T, SessionError>;
