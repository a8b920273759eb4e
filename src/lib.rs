//! # fetchward
//!
//! Request orchestration for async HTTP clients. An [`ApiClient`] wraps any
//! [`Transport`] and adds request fingerprinting, in-flight deduplication,
//! short-lived response caching for GET requests, and a submission lock that
//! ignores duplicate calls while an identical one is in flight.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use fetchward::{ApiClient, NetworkSettings, RequestOptions};
//! use fetchward::options::EffectiveOptions;
//! use fetchward::transport::TransportError;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = NetworkSettings::from_json_str(r#"{ "baseURL": "https://api.example.com" }"#)?;
//!     let client = ApiClient::new(
//!         |url: String, _options: EffectiveOptions| async move {
//!             Ok::<_, TransportError>(json!({ "url": url }))
//!         },
//!         settings,
//!     );
//!
//!     // Concurrent identical GETs share one round-trip; the result is cached for 10s.
//!     let options = || RequestOptions::new().query("id", 1).cache(Duration::from_secs(10));
//!     let (a, b) = tokio::join!(client.get("/users", options()), client.get("/users", options()));
//!     assert_eq!(a?, b?);
//!
//!     // A form submission that ignores double clicks.
//!     client.post("/orders", RequestOptions::new().body(json!({ "sku": 7 })).lock(true)).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod http;
pub mod options;
pub mod registry;
pub mod transport;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use client::{ApiClient, LockContention};
pub use config::NetworkSettings;
pub use error::{ApiError, NormalizedError};
pub use fingerprint::Fingerprint;
pub use http::{Headers, Method};
pub use options::{CachePolicy, RequestOptions};
pub use transport::{Transport, TransportError};
