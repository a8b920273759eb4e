//! The API client — request orchestration on top of a [`Transport`].
//!
//! Every call runs through the same pipeline:
//!
//! 1. validate the method (GET, POST, PUT, PATCH, DELETE);
//! 2. merge the call's options with the [`NetworkSettings`];
//! 3. derive the request [`Fingerprint`];
//! 4. under `lock`, give up if an identical request is in flight;
//! 5. for a cached GET, serve a fresh cached payload;
//! 6. under `dedupe` (the default), join an identical in-flight request;
//! 7. otherwise register a new round-trip, run the transport on a detached
//!    task, write successful cacheable payloads back, unregister, and settle.
//!
//! Transport failures reach callers only as a [`NormalizedError`](crate::error::NormalizedError) inside
//! [`ApiError::Request`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use fetchward::client::ApiClient;
//! use fetchward::config::NetworkSettings;
//! use fetchward::options::{EffectiveOptions, RequestOptions};
//! use fetchward::transport::TransportError;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = |url: String, _options: EffectiveOptions| async move {
//!         Ok::<_, TransportError>(json!({ "url": url }))
//!     };
//!     let client = ApiClient::new(transport, NetworkSettings::default().base_url("https://api.example.com"));
//!
//!     let user = client.get("/users", RequestOptions::new().query("id", 1).cache(true)).await?;
//!     println!("{user}");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::ResponseCache;
use crate::config::NetworkSettings;
use crate::error::{ApiError, normalize};
use crate::fingerprint::Fingerprint;
use crate::http::Method;
use crate::options::{EffectiveOptions, RequestOptions, merge};
use crate::registry::{Admission, Flight, PendingRegistry, SharePolicy};
use crate::transport::Transport;

/// What a locked call does while an identical request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockContention {
    /// The call never settles. The in-flight request is the only source of truth
    /// and the duplicate submission gets no reaction at all.
    #[default]
    Suspend,
    /// The call fails with [`ApiError::Locked`].
    Reject,
}

/// Request orchestrator over a [`Transport`].
///
/// Cloning is cheap and clones share the transport, settings, pending registry
/// and response cache. Independent clients get independent state unless it is
/// injected with [`with_registry`](Self::with_registry) and
/// [`with_cache`](Self::with_cache).
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    settings: Arc<NetworkSettings>,
    pending: Arc<PendingRegistry>,
    cache: Arc<ResponseCache>,
    lock_contention: LockContention,
}

impl ApiClient {
    /// Creates a client with fresh registry and cache state.
    ///
    /// Configuration advisories are logged once here.
    pub fn new(transport: impl Transport, settings: NetworkSettings) -> Self {
        for advisory in settings.advisories() {
            warn!(%advisory, "network settings advisory");
        }
        Self {
            transport: Arc::new(transport),
            settings: Arc::new(settings),
            pending: Arc::new(PendingRegistry::new()),
            cache: Arc::new(ResponseCache::new()),
            lock_contention: LockContention::default(),
        }
    }

    /// Shares an existing pending registry.
    #[must_use]
    pub fn with_registry(mut self, pending: Arc<PendingRegistry>) -> Self {
        self.pending = pending;
        self
    }

    /// Shares an existing response cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_lock_contention(mut self, lock_contention: LockContention) -> Self {
        self.lock_contention = lock_contention;
        self
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    pub fn pending(&self) -> &Arc<PendingRegistry> {
        &self.pending
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Issues a request. The method comes from `options.method` (default GET).
    ///
    /// # Errors
    ///
    /// - [`ApiError::UnsupportedMethod`] before any network activity.
    /// - [`ApiError::Request`] when the round-trip (own or shared) fails.
    /// - [`ApiError::Locked`] under [`LockContention::Reject`].
    pub async fn request(&self, url: &str, options: RequestOptions) -> Result<Value, ApiError> {
        if !self.settings.enabled {
            warn!(url, "network module is disabled; attempting request anyway");
        }

        let method: Method = options.method.as_deref().unwrap_or("GET").parse()?;
        let effective = merge(method, options, &self.settings);
        let fingerprint = Fingerprint::derive(url, &effective);
        let policy = SharePolicy {
            lock: effective.lock,
            dedupe: effective.dedupe,
        };

        if policy.lock && self.pending.contains(&fingerprint) {
            return self.contended(url, fingerprint).await;
        }

        if let Some(ttl) = effective.cache_ttl() {
            if let Some(payload) = self.cache.lookup(&fingerprint, ttl) {
                debug!(url, key = %fingerprint, "served from cache");
                return Ok(payload);
            }
        }

        let response = match self.pending.admit(&fingerprint, policy) {
            Admission::Started(flight, response) => {
                debug!(%method, url, key = %fingerprint, "dispatching request");
                self.launch(url, effective, flight);
                response
            }
            Admission::Shared(response) => {
                debug!(url, key = %fingerprint, "joined in-flight request");
                response
            }
            Admission::Locked => return self.contended(url, fingerprint).await,
        };

        Ok(response.await?)
    }

    /// Issues a request and decodes the payload into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let payload = self.request(url, options).await?;
        Ok(serde_json::from_value(payload)?)
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(url, options.method(Method::Get)).await
    }

    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(url, options.method(Method::Post)).await
    }

    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(url, options.method(Method::Put)).await
    }

    pub async fn patch(&self, url: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(url, options.method(Method::Patch)).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(url, options.method(Method::Delete)).await
    }

    // The round-trip runs on its own task so it settles (and unregisters)
    // even if every caller stops waiting.
    fn launch(&self, url: &str, options: EffectiveOptions, flight: Flight) {
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.cache);
        let url = url.to_owned();

        tokio::spawn(async move {
            let cacheable = options.cache_ttl().is_some();
            let outcome = match transport.fetch(&url, &options).await {
                Ok(payload) => {
                    if cacheable {
                        cache.store(flight.fingerprint().clone(), payload.clone());
                    }
                    Ok(payload)
                }
                Err(err) => {
                    let normalized = normalize(err);
                    error!(
                        url = %url,
                        status = ?normalized.status_code,
                        message = %normalized.message,
                        "request failed"
                    );
                    Err(normalized)
                }
            };
            flight.complete(outcome);
        });
    }

    async fn contended(&self, url: &str, fingerprint: Fingerprint) -> Result<Value, ApiError> {
        warn!(url, key = %fingerprint, "request locked: identical request in flight");
        match self.lock_contention {
            LockContention::Suspend => std::future::pending().await,
            LockContention::Reject => Err(ApiError::Locked { key: fingerprint }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::TransportError;

    fn echo() -> impl Transport {
        |url: String, options: EffectiveOptions| async move {
            Ok::<_, TransportError>(json!({
                "url": url,
                "method": options.method.as_str(),
                "baseURL": options.base_url,
            }))
        }
    }

    #[tokio::test]
    async fn unsupported_method_fails_before_dispatch() {
        let client = ApiClient::new(echo(), NetworkSettings::default());
        let err = client
            .request("/x", RequestOptions::new().method("TRACE"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMethod(_)));
        assert!(client.pending().is_empty());
    }

    #[tokio::test]
    async fn lowercase_method_is_accepted() {
        let client = ApiClient::new(echo(), NetworkSettings::default());
        let payload = client
            .request("/x", RequestOptions::new().method("patch"))
            .await
            .unwrap();
        assert_eq!(payload["method"], "PATCH");
    }

    #[tokio::test]
    async fn convenience_methods_force_the_verb() {
        let client = ApiClient::new(echo(), NetworkSettings::default().base_url("https://api"));
        let opts = || RequestOptions::new().method("GET");
        assert_eq!(client.post("/a", opts()).await.unwrap()["method"], "POST");
        assert_eq!(client.put("/a", opts()).await.unwrap()["method"], "PUT");
        assert_eq!(client.patch("/a", opts()).await.unwrap()["method"], "PATCH");
        assert_eq!(client.delete("/a", opts()).await.unwrap()["method"], "DELETE");
        let got = client.get("/a", RequestOptions::new().method("POST")).await.unwrap();
        assert_eq!(got["method"], "GET");
        assert_eq!(got["baseURL"], "https://api");
    }

    #[tokio::test]
    async fn disabled_module_still_dispatches() {
        let client = ApiClient::new(echo(), NetworkSettings::default().enabled(false));
        assert!(client.get("/ok", RequestOptions::new()).await.is_ok());
    }

    #[tokio::test]
    async fn request_as_decodes_and_reports_mismatch() {
        #[derive(serde::Deserialize)]
        struct Echo {
            url: String,
        }
        let client = ApiClient::new(echo(), NetworkSettings::default());
        let echo: Echo = client.request_as("/typed", RequestOptions::new()).await.unwrap();
        assert_eq!(echo.url, "/typed");

        let err = client
            .request_as::<Vec<u8>>("/typed", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
