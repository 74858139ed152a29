use crate::core::clock::Clock;
use crate::core::errors::ExchangeError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

// Header names are case-insensitive on the wire; `HeaderName::from_static`
// requires the lowercase form.
pub const API_KEY_HEADER: &str = "x-bapi-api-key";
pub const TIMESTAMP_HEADER: &str = "x-bapi-timestamp";
pub const SIGNATURE_HEADER: &str = "x-bapi-sign";
pub const RECV_WINDOW_HEADER: &str = "x-bapi-recv-window";

/// Browser user agent; the venue's edge rejects some default client agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Insertion-ordered string parameters.
///
/// The wire form (query string or JSON body) keeps insertion order, while
/// [`RequestParams::canonical_string`] sorts by key for signing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    entries: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter; a replaced key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `k=v&...` in insertion order, as sent on the wire
    pub fn query_string(&self) -> String {
        join_pairs(self.iter())
    }

    /// `k=v&...` sorted byte-wise by key, as covered by the signature
    pub fn canonical_string(&self) -> String {
        let mut sorted: Vec<(&str, &str)> = self.iter().collect();
        sorted.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        join_pairs(sorted.into_iter())
    }
}

fn join_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

// JSON bodies keep insertion order, which serde_json::Map would not.
impl Serialize for RequestParams {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A private request captured at the moment it was stamped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub timestamp: u64,
    pub method: Method,
    pub endpoint: String,
    pub params: RequestParams,
}

impl SignedRequest {
    /// Query string sent for GET requests (insertion order)
    pub fn query_string(&self) -> String {
        self.params.query_string()
    }

    /// Parameter block appended to the signing prefix (sorted order)
    pub fn canonical_params(&self) -> String {
        self.params.canonical_string()
    }

    /// Full request URL; GET parameters ride in the query string
    pub fn url(&self, base_url: &str) -> String {
        let base = format!("{}{}", base_url.trim_end_matches('/'), self.endpoint);
        if self.method == Method::GET && !self.params.is_empty() {
            format!("{}?{}", base, self.query_string())
        } else {
            base
        }
    }

    /// JSON body for non-GET requests
    pub fn body(&self) -> Result<Option<Vec<u8>>, ExchangeError> {
        if self.method == Method::GET {
            return Ok(None);
        }
        serde_json::to_vec(&self.params)
            .map(Some)
            .map_err(|e| ExchangeError::ConfigurationError(format!("Failed to encode body: {}", e)))
    }
}

/// Headers attached to a signed request
pub type HeaderSet = HeaderMap;

/// Stamps requests with the clock and assembles authentication headers
#[derive(Clone)]
pub struct RequestBuilder {
    api_key: String,
    recv_window_ms: u64,
    user_agent: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("recv_window_ms", &self.recv_window_ms)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    pub fn new(api_key: impl Into<String>, recv_window_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            api_key: api_key.into(),
            recv_window_ms,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            clock,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub const fn recv_window_ms(&self) -> u64 {
        self.recv_window_ms
    }

    pub fn build(&self, method: Method, endpoint: &str, params: RequestParams) -> SignedRequest {
        SignedRequest {
            timestamp: self.clock.now_millis(),
            method,
            endpoint: endpoint.to_string(),
            params,
        }
    }

    pub fn headers(&self, timestamp: u64, signature: &str) -> Result<HeaderSet, ExchangeError> {
        let mut headers = HeaderMap::with_capacity(6);
        headers.insert(header_name(API_KEY_HEADER), header_value(&self.api_key)?);
        headers.insert(
            header_name(TIMESTAMP_HEADER),
            header_value(&timestamp.to_string())?,
        );
        headers.insert(header_name(SIGNATURE_HEADER), header_value(signature)?);
        headers.insert(
            header_name(RECV_WINDOW_HEADER),
            header_value(&self.recv_window_ms.to_string())?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        Ok(headers)
    }
}

fn header_name(name: &'static str) -> HeaderName {
    HeaderName::from_static(name)
}

fn header_value(value: &str) -> Result<HeaderValue, ExchangeError> {
    HeaderValue::from_str(value).map_err(|e| {
        ExchangeError::ConfigurationError(format!("Invalid header value: {}", e))
    })
}
