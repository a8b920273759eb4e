//! Caller-facing error types.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::fingerprint::Fingerprint;
use crate::http::InvalidMethod;
use crate::transport::TransportError;

/// Message used when a transport error carries no message of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "request failed";

/// The uniform failure shape for a failed round-trip.
///
/// Cheap to clone: every caller sharing a deduplicated request receives a
/// clone pointing at the same underlying [`TransportError`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub status_code: Option<u16>,
    pub status_message: Option<String>,
    pub message: String,
    pub data: Option<Value>,
    /// The transport's original error.
    #[source]
    pub cause: Arc<TransportError>,
}

/// Converts a transport error into a [`NormalizedError`].
///
/// Structured HTTP errors keep their status fields and payload; anything
/// else keeps only its message.
pub fn normalize(error: TransportError) -> NormalizedError {
    let (status_code, status_message, message, data) = match &error {
        TransportError::Http {
            status_code,
            status_message,
            message,
            data,
        } => (*status_code, status_message.clone(), message.clone(), data.clone()),
        other => (None, None, other.to_string(), None),
    };

    NormalizedError {
        status_code,
        status_message,
        message: if message.is_empty() {
            DEFAULT_ERROR_MESSAGE.to_owned()
        } else {
            message
        },
        data,
        cause: Arc::new(error),
    }
}

impl From<TransportError> for NormalizedError {
    fn from(error: TransportError) -> Self {
        normalize(error)
    }
}

/// Errors returned by [`ApiClient`](crate::client::ApiClient).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The method is not one of GET, POST, PUT, PATCH, DELETE. No request was made.
    #[error(transparent)]
    UnsupportedMethod(#[from] InvalidMethod),

    /// The round-trip failed.
    #[error(transparent)]
    Request(#[from] NormalizedError),

    /// An identical locked request is in flight. Only returned under
    /// [`LockContention::Reject`](crate::client::LockContention::Reject).
    #[error("request ignored while an identical locked request is in flight: {key}")]
    Locked { key: Fingerprint },

    /// The payload did not match the requested type.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns the normalized round-trip error, if that is what this is.
    pub fn as_normalized(&self) -> Option<&NormalizedError> {
        match self {
            ApiError::Request(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code of a failed round-trip.
    pub fn status_code(&self) -> Option<u16> {
        self.as_normalized().and_then(|err| err.status_code)
    }
}
