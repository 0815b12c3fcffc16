//! Error types for the Kanthalloor API client.
//!
//! # Design
//! Every failure the client can observe is one `ApiError` value returned to
//! the caller. The three wire-level classes are kept apart so callers can tell
//! "the server never answered" from "the server answered with garbage" from
//! "the server refused": `Transport`, `Parse` and `Application`. The remaining
//! variants cover failures that happen locally before or after the round trip.

use thiserror::Error;

/// Message used when a failed response carries no `detail` field.
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, broken body stream).
    #[error("request failed: {message}")]
    Transport { message: String },

    /// A response arrived but its body is not valid JSON.
    #[error("invalid response body (HTTP {status}): {message}")]
    Parse { status: u16, message: String },

    /// The response parsed but the status is outside 2xx. `message` is the
    /// body's `detail` field or [`FALLBACK_MESSAGE`].
    #[error("{message}")]
    Application { status: u16, message: String },

    /// The request payload could not be encoded; nothing was sent.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The token store could not persist or clear the token.
    #[error("token storage failed: {0}")]
    Storage(String),
}

impl ApiError {
    /// HTTP status of the response that caused the failure, if one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Parse { status, .. } | ApiError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message suitable for showing to a user.
    pub fn message(&self) -> String {
        match self {
            ApiError::Transport { message }
            | ApiError::Parse { message, .. }
            | ApiError::Application { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        ApiError::Transport {
            message: err.to_string(),
        }
    }
}
