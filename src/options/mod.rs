//! Per-call request options and the option merger.
//!
//! A caller describes a request with [`RequestOptions`]; the client merges it
//! with the module-wide [`NetworkSettings`](crate::config::NetworkSettings) into
//! [`EffectiveOptions`], which is what the fingerprint is derived from and what
//! the transport receives.
//!
//! ```
//! use std::time::Duration;
//! use fetchward::options::{CachePolicy, RequestOptions};
//!
//! let options = RequestOptions::new()
//!     .query("id", 1)
//!     .header("Accept", "application/json")
//!     .cache(Duration::from_secs(10))
//!     .lock(true);
//!
//! assert_eq!(options.cache, CachePolicy::Ttl(Duration::from_secs(10)));
//! assert!(options.dedupe);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::Headers;

pub mod merge;
pub mod signal;

pub use merge::{EffectiveOptions, merge};
pub use signal::AbortSignal;

/// Freshness window used by [`CachePolicy::Default`].
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(3000);

/// Whether, and for how long, a GET response may be served from the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Never read from or write to the cache.
    #[default]
    Off,
    /// Cache with [`DEFAULT_CACHE_TTL`].
    Default,
    /// Cache with a caller-chosen time-to-live.
    Ttl(Duration),
}

impl CachePolicy {
    /// Returns the TTL this policy asks for, or `None` when caching is off.
    ///
    /// A zero TTL counts as off: the call neither reads nor writes the cache.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            CachePolicy::Default => Some(DEFAULT_CACHE_TTL),
            CachePolicy::Ttl(ttl) if !ttl.is_zero() => Some(*ttl),
            _ => None,
        }
    }

    /// Builds a policy from a millisecond count.
    pub fn from_millis(ms: u64) -> Self {
        CachePolicy::Ttl(Duration::from_millis(ms))
    }
}

impl From<bool> for CachePolicy {
    fn from(enabled: bool) -> Self {
        if enabled {
            CachePolicy::Default
        } else {
            CachePolicy::Off
        }
    }
}

impl From<Duration> for CachePolicy {
    fn from(ttl: Duration) -> Self {
        CachePolicy::Ttl(ttl)
    }
}

/// Retry behaviour forwarded to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    Disabled,
    Times(u32),
}

/// Credential (cookie) forwarding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Omit,
    SameOrigin,
    Include,
}

impl Credentials {
    pub fn as_str(&self) -> &'static str {
        match self {
            Credentials::Omit => "omit",
            Credentials::SameOrigin => "same-origin",
            Credentials::Include => "include",
        }
    }
}

/// Caller-supplied override for decoding the raw response text.
///
/// The client only carries it; the transport decides when to apply it.
#[derive(Clone)]
pub struct ResponseParser(Arc<dyn Fn(&str) -> Value + Send + Sync>);

impl ResponseParser {
    pub fn new<F>(parse: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(parse))
    }

    pub fn parse(&self, input: &str) -> Value {
        (self.0)(input)
    }
}

impl fmt::Debug for ResponseParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseParser(..)")
    }
}

/// Options for a single call.
///
/// Every field is optional in the sense that its default defers to the
/// module settings (or to the transport). Fields are public; the builder
/// methods are shorthand.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Raw method name. Convenience wrappers overwrite it; `None` means GET.
    /// Kept as a string so an unsupported verb can be rejected at dispatch.
    pub method: Option<String>,
    pub query: Map<String, Value>,
    pub body: Option<Value>,
    pub headers: Headers,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub retry: Option<Retry>,
    pub credentials: Option<Credentials>,
    pub signal: Option<AbortSignal>,
    pub parse_response: Option<ResponseParser>,
    /// Explicit fingerprint. The caller owns its uniqueness.
    pub key: Option<String>,
    pub cache: CachePolicy,
    /// Share an identical in-flight request instead of issuing another one.
    pub dedupe: bool,
    /// Ignore this call entirely while an identical request is in flight.
    pub lock: bool,
    /// Transport-specific fields passed through untouched.
    pub extra: Map<String, Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: None,
            query: Map::new(),
            body: None,
            headers: Headers::new(),
            base_url: None,
            timeout: None,
            retry: None,
            credentials: None,
            signal: None,
            parse_response: None,
            key: None,
            cache: CachePolicy::Off,
            dedupe: true,
            lock: false,
            extra: Map::new(),
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: impl AsRef<str>) -> Self {
        self.method = Some(method.as_ref().to_owned());
        self
    }

    /// Adds one query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets the body from anything serializable.
    ///
    /// # Errors
    ///
    /// Fails when `body` cannot be represented as JSON, e.g. a map with
    /// non-string keys.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: Retry) -> Self {
        self.retry = Some(retry);
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    #[must_use]
    pub fn parse_response(mut self, parser: ResponseParser) -> Self {
        self.parse_response = Some(parser);
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Accepts `true`/`false` or a [`Duration`] TTL.
    #[must_use]
    pub fn cache(mut self, cache: impl Into<CachePolicy>) -> Self {
        self.cache = cache.into();
        self
    }

    #[must_use]
    pub fn dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    #[must_use]
    pub fn lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    #[must_use]
    pub fn extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}
