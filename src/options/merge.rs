//! Option merger: caller options layered over module settings.

use std::time::Duration;

use serde_json::{Map, Value};

use super::{AbortSignal, CachePolicy, Credentials, RequestOptions, ResponseParser, Retry};
use crate::config::NetworkSettings;
use crate::http::{Headers, Method};

/// A fully-resolved request, as handed to the transport.
#[derive(Debug, Clone)]
pub struct EffectiveOptions {
    pub method: Method,
    pub query: Map<String, Value>,
    pub body: Option<Value>,
    pub headers: Headers,
    /// Empty when neither the caller nor the settings provide one.
    pub base_url: String,
    /// `None` leaves the choice to the transport.
    pub timeout: Option<Duration>,
    pub retry: Option<Retry>,
    pub credentials: Option<Credentials>,
    pub signal: Option<AbortSignal>,
    pub parse_response: Option<ResponseParser>,
    pub key: Option<String>,
    pub cache: CachePolicy,
    pub dedupe: bool,
    pub lock: bool,
    pub extra: Map<String, Value>,
}

impl EffectiveOptions {
    /// Returns the cache TTL when this call may use the response cache.
    ///
    /// Only GET requests that asked for caching qualify.
    pub fn cache_ttl(&self) -> Option<Duration> {
        if self.method.is_cacheable() {
            self.cache.ttl()
        } else {
            None
        }
    }
}

/// Merges caller options with module settings.
///
/// Caller values win, except for headers, which are layered: settings headers
/// form the base and caller headers replace them name by name. When the
/// settings ask for credential forwarding and the caller chose no policy,
/// `include` is forced.
pub fn merge(method: Method, options: RequestOptions, settings: &NetworkSettings) -> EffectiveOptions {
    let base_url = options
        .base_url
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| settings.base_url.clone());

    let credentials = match options.credentials {
        None if settings.with_credentials => Some(Credentials::Include),
        other => other,
    };

    EffectiveOptions {
        method,
        query: options.query,
        body: options.body,
        headers: settings.headers.layered(&options.headers),
        base_url,
        timeout: options.timeout.or(settings.timeout),
        retry: options.retry.or(settings.retry.map(Retry::Times)),
        credentials,
        signal: options.signal,
        parse_response: options.parse_response,
        key: options.key,
        cache: options.cache,
        dedupe: options.dedupe,
        lock: options.lock,
        extra: options.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> NetworkSettings {
        NetworkSettings::default()
            .base_url("https://api.example.com")
            .header("X-Client", "web")
            .header("Accept", "*/*")
    }

    #[test]
    fn settings_fill_in_missing_values() {
        let effective = merge(Method::Get, RequestOptions::new(), &settings());
        assert_eq!(effective.base_url, "https://api.example.com");
        assert_eq!(effective.timeout, Some(Duration::from_millis(15_000)));
        assert_eq!(effective.retry, Some(Retry::Times(0)));
        assert_eq!(effective.credentials, None);
        assert_eq!(effective.headers.get("x-client"), Some("web"));
    }

    #[test]
    fn caller_values_take_precedence() {
        let options = RequestOptions::new()
            .base_url("https://other.example.com")
            .timeout(Duration::from_secs(1))
            .retry(Retry::Disabled)
            .header("accept", "application/json");
        let effective = merge(Method::Post, options, &settings());
        assert_eq!(effective.method, Method::Post);
        assert_eq!(effective.base_url, "https://other.example.com");
        assert_eq!(effective.timeout, Some(Duration::from_secs(1)));
        assert_eq!(effective.retry, Some(Retry::Disabled));
        assert_eq!(effective.headers.get("Accept"), Some("application/json"));
        assert_eq!(effective.headers.get("X-Client"), Some("web"));
    }

    #[test]
    fn empty_caller_base_url_falls_back() {
        let effective = merge(Method::Get, RequestOptions::new().base_url(""), &settings());
        assert_eq!(effective.base_url, "https://api.example.com");
    }

    #[test]
    fn unset_transport_defaults_stay_unset() {
        let mut bare = NetworkSettings::default();
        bare.timeout = None;
        bare.retry = None;
        let effective = merge(Method::Get, RequestOptions::new(), &bare);
        assert_eq!(effective.base_url, "");
        assert_eq!(effective.timeout, None);
        assert_eq!(effective.retry, None);
    }

    #[test]
    fn credentials_forced_only_when_caller_is_silent() {
        let forwarding = settings().with_credentials(true);

        let silent = merge(Method::Get, RequestOptions::new(), &forwarding);
        assert_eq!(silent.credentials, Some(Credentials::Include));

        let explicit = merge(
            Method::Get,
            RequestOptions::new().credentials(Credentials::Omit),
            &forwarding,
        );
        assert_eq!(explicit.credentials, Some(Credentials::Omit));

        let not_forwarding = merge(
            Method::Get,
            RequestOptions::new().credentials(Credentials::SameOrigin),
            &settings(),
        );
        assert_eq!(not_forwarding.credentials, Some(Credentials::SameOrigin));
    }

    #[test]
    fn cache_ttl_only_for_get() {
        let get = merge(Method::Get, RequestOptions::new().cache(true), &settings());
        assert_eq!(get.cache_ttl(), Some(Duration::from_millis(3000)));

        let post = merge(Method::Post, RequestOptions::new().cache(true), &settings());
        assert_eq!(post.cache_ttl(), None);

        let uncached = merge(Method::Get, RequestOptions::new(), &settings());
        assert_eq!(uncached.cache_ttl(), None);
    }

    #[test]
    fn extension_fields_pass_through() {
        let options = RequestOptions::new().extra("responseType", "json");
        let effective = merge(Method::Get, options, &settings());
        assert_eq!(effective.extra.get("responseType"), Some(&Value::from("json")));
    }
}
