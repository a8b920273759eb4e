//! Request header map with case-insensitive name lookup.
//!
//! Unlike a wire-level header list, a request's configured headers hold one
//! value per name: setting a name that is already present replaces it. That is
//! the property the option merger relies on when layering caller headers over
//! module defaults.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A case-insensitive, single-value header map that preserves insertion order.
///
/// # Examples
///
/// ```
/// use fetchward::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.set("Accept", "application/json");
/// headers.set("accept", "text/plain");
///
/// assert_eq!(headers.len(), 1);
/// assert_eq!(headers.get("ACCEPT"), Some("text/plain"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with pre-allocated capacity for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Sets a header, replacing any existing value under the same name.
    ///
    /// The replaced entry keeps its position but takes the new name's casing.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .inner
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.inner.push((name, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value for the given header name (case-insensitive), or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes the header with the given name (case-insensitive).
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.inner.len();
        self.inner.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.inner.len() < before
    }

    /// Returns `true` if the map contains an entry with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the number of headers.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a new map with `overrides` layered on top of `self`.
    ///
    /// Every header from `self` is kept unless `overrides` sets the same name,
    /// in which case the override wins.
    ///
    /// ```
    /// use fetchward::http::Headers;
    ///
    /// let defaults = Headers::new().with("X-App", "web").with("Accept", "*/*");
    /// let caller = Headers::new().with("accept", "application/json");
    ///
    /// let merged = defaults.layered(&caller);
    /// assert_eq!(merged.get("x-app"), Some("web"));
    /// assert_eq!(merged.get("accept"), Some("application/json"));
    /// ```
    #[must_use]
    pub fn layered(&self, overrides: &Headers) -> Headers {
        let mut merged = Headers::with_capacity(self.len() + overrides.len());
        for (name, value) in self.iter().chain(overrides.iter()) {
            merged.set(name, value);
        }
        merged
    }
}

impl From<BTreeMap<String, String>> for Headers {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut headers = Headers::with_capacity(map.len());
        for (name, value) in map {
            headers.set(name, value);
        }
        headers
    }
}

impl From<Headers> for BTreeMap<String, String> {
    fn from(headers: Headers) -> Self {
        headers.inner.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.inner {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}
