//! Request fingerprints — the key for deduplication, locking, and caching.
//!
//! A fingerprint is either the caller's explicit non-empty key, used verbatim,
//! or `METHOD:url:query:body` where query and body are rendered as compact
//! JSON. An absent query renders as `{}`, as does an empty body (`null`,
//! `false`, `0`, or `""`).
//!
//! `serde_json` maps keep their keys sorted, so two structurally equal
//! inputs always render identically regardless of insertion order.

use std::borrow::Borrow;
use std::fmt;

use serde_json::{Map, Value};

use crate::http::Method;
use crate::options::EffectiveOptions;

/// An opaque identifier for a logical request.
///
/// # Examples
///
/// ```
/// use fetchward::fingerprint::Fingerprint;
/// use fetchward::http::Method;
/// use fetchward::options::{RequestOptions, merge};
/// use fetchward::config::NetworkSettings;
///
/// let options = merge(Method::Get, RequestOptions::new().query("id", 1), &NetworkSettings::default());
/// let fp = Fingerprint::derive("/users", &options);
/// assert_eq!(fp.as_str(), r#"GET:/users:{"id":1}:{}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derives the fingerprint for `url` under `options`.
    ///
    /// An explicit `options.key` is returned unchanged. An empty key counts as
    /// no key.
    pub fn derive(url: &str, options: &EffectiveOptions) -> Self {
        match &options.key {
            Some(key) if !key.is_empty() => Fingerprint(key.clone()),
            _ => Self::compute(options.method, url, &options.query, options.body.as_ref()),
        }
    }

    /// Computes a derived fingerprint from its parts.
    pub fn compute(method: Method, url: &str, query: &Map<String, Value>, body: Option<&Value>) -> Self {
        let query = Value::Object(query.clone()).to_string();
        let body = match body {
            Some(value) if !is_empty_body(value) => value.to_string(),
            _ => "{}".to_owned(),
        };
        Fingerprint(format!("{method}:{url}:{query}:{body}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(key: &str) -> Self {
        Fingerprint(key.to_owned())
    }
}

impl From<String> for Fingerprint {
    fn from(key: String) -> Self {
        Fingerprint(key)
    }
}

impl Borrow<str> for Fingerprint {
    fn borrow(&self) -> &str {
        &self.0
    }
}
