//! Immutable request description.
//!
//! A request is a value: interceptors derive modified copies through the
//! `with_*` transforms instead of sharing a mutable builder, so every retry
//! attempt starts from exactly the same request.

use crate::base::neterror::NetError;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use url::Url;

/// Outbound HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parse `url` and build a request for it.
    pub fn parse(method: Method, url: &str) -> Result<Self, NetError> {
        let url = Url::parse(url)?;
        Ok(Self::new(method, url))
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Replace (or add) a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace (or add) a header from strings.
    pub fn try_with_header(self, name: &str, value: &str) -> Result<Self, NetError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            NetError::InvalidHeaderValue {
                name: name.to_string(),
            }
        })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeaderValue {
                name: name.to_string(),
            })?;
        Ok(self.with_header(header_name, header_value))
    }

    /// Remove a header if present.
    pub fn without_header(mut self, name: &HeaderName) -> Self {
        self.headers.remove(name);
        self
    }

    /// Replace the whole header map.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Stable identity of this request for retry bookkeeping.
    pub fn key(&self) -> RequestKey {
        RequestKey::from_request(self)
    }

    pub(crate) fn into_parts(self) -> (Method, Url, HeaderMap, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Fingerprint of a logical request: method, URL without fragment, and a
/// hash of the body bytes. Headers are deliberately excluded so that cookie
/// or retry headers added per attempt do not change the identity.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct RequestKey {
    method: Method,
    url: String,
    body_hash: u64,
}

impl RequestKey {
    pub fn from_request(request: &HttpRequest) -> Self {
        let mut url = request.url.clone();
        url.set_fragment(None);

        let mut hasher = DefaultHasher::new();
        match &request.body {
            Some(body) => {
                1u8.hash(&mut hasher);
                body.hash(&mut hasher);
            }
            None => 0u8.hash(&mut hasher),
        }

        Self {
            method: request.method.clone(),
            url: url.into(),
            body_hash: hasher.finish(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} #{:016x}", self.method, self.url, self.body_hash)
    }
}
