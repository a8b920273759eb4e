//! The transport seam — whatever actually performs network I/O.
//!
//! The client never talks to the network itself. It hands a URL and the
//! merged [`EffectiveOptions`] to a [`Transport`] and awaits the decoded
//! payload. Any `Fn(String, EffectiveOptions) -> impl Future` closure is a
//! transport, which keeps test doubles and adapters over real HTTP clients
//! equally short.
//!
//! ```
//! use fetchward::transport::{Transport, TransportError};
//! use fetchward::options::EffectiveOptions;
//! use serde_json::json;
//!
//! fn echo() -> impl Transport {
//!     |url: String, _options: EffectiveOptions| async move {
//!         Ok::<_, TransportError>(json!({ "url": url }))
//!     }
//! }
//! ```

use std::future::Future;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use thiserror::Error;

use crate::http::StatusCode;
use crate::options::EffectiveOptions;

/// The future a transport returns for one round-trip.
pub type TransportFuture = BoxFuture<'static, Result<Value, TransportError>>;

/// Errors a transport reports.
///
/// [`TransportError::Http`] is the structured, HTTP-aware shape; its fields
/// are lifted into the caller-facing [`NormalizedError`](crate::error::NormalizedError).
/// Every other variant is treated as a plain error and only its message survives.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{message}")]
    Http {
        status_code: Option<u16>,
        status_message: Option<String>,
        message: String,
        data: Option<Value>,
    },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request aborted")]
    Aborted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// A structured error for a non-2xx status, using the canonical reason as
    /// message when the code has one.
    pub fn status(status: StatusCode) -> Self {
        let reason = status.canonical_reason();
        TransportError::Http {
            status_code: Some(status.as_u16()),
            status_message: reason.map(str::to_owned),
            message: reason.unwrap_or_default().to_owned(),
            data: None,
        }
    }

    /// A structured error with an arbitrary status code, message, and payload.
    pub fn http(status_code: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        TransportError::Http {
            status_code: Some(status_code),
            status_message: None,
            message: message.into(),
            data,
        }
    }
}

/// Performs the network round-trip for one request.
///
/// The returned future must own everything it needs: the client drives it on
/// a detached task so that it completes even when every caller stops waiting.
pub trait Transport: Send + Sync + 'static {
    fn fetch(&self, url: &str, options: &EffectiveOptions) -> TransportFuture;
}

impl<T, F> Transport for T
where
    T: Fn(String, EffectiveOptions) -> F + Send + Sync + 'static,
    F: Future<Output = Result<Value, TransportError>> + Send + 'static,
{
    fn fetch(&self, url: &str, options: &EffectiveOptions) -> TransportFuture {
        (self)(url.to_owned(), options.clone()).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkSettings;
    use crate::http::Method;
    use crate::options::{RequestOptions, merge};

    #[test]
    fn status_error_carries_reason() {
        match TransportError::status(StatusCode::NOT_FOUND) {
            TransportError::Http {
                status_code,
                status_message,
                message,
                data,
            } => {
                assert_eq!(status_code, Some(404));
                assert_eq!(status_message.as_deref(), Some("Not Found"));
                assert_eq!(message, "Not Found");
                assert!(data.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn closures_are_transports() {
        let transport = |url: String, options: EffectiveOptions| async move {
            Ok::<_, TransportError>(serde_json::json!({
                "url": url,
                "method": options.method.as_str(),
            }))
        };
        let options = merge(Method::Delete, RequestOptions::new(), &NetworkSettings::default());
        let payload = transport.fetch("/items/7", &options).await.unwrap();
        assert_eq!(payload["url"], "/items/7");
        assert_eq!(payload["method"], "DELETE");
    }
}
