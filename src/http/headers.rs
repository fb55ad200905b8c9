//! Default request headers.
//!
//! Adds a configured set of browser-like headers to outgoing requests. A
//! header the request already carries is never overwritten, and empty
//! configured values are skipped.

use crate::base::neterror::NetError;
use crate::http::interceptor::{HttpResult, Interceptor, Next};
use crate::http::HttpRequest;
use futures::future::BoxFuture;
use http::header::{self, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_ACCEPT: &str = "*/*";
pub const DEFAULT_ACCEPT_CHARSET: &str = "utf-8, iso-8859-1;q=0.5";
pub const DEFAULT_ACCEPT_ENCODING: &str = "gzip, deflate, br";
pub const DEFAULT_CONNECTION: &str = "keep-alive";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0";

/// Header values applied by [`DefaultHeadersInterceptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub enabled: bool,
    pub accept: Option<String>,
    pub accept_charset: Option<String>,
    pub accept_encoding: Option<String>,
    pub accept_language: Option<String>,
    pub accept_ranges: Option<String>,
    pub authorization: Option<String>,
    pub connection: Option<String>,
    pub host: Option<String>,
    pub origin: Option<String>,
    pub proxy_authenticate: Option<String>,
    pub proxy_authorization: Option<String>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            accept: Some(DEFAULT_ACCEPT.to_string()),
            accept_charset: Some(DEFAULT_ACCEPT_CHARSET.to_string()),
            accept_encoding: Some(DEFAULT_ACCEPT_ENCODING.to_string()),
            accept_language: Some("*".to_string()),
            accept_ranges: None,
            authorization: None,
            connection: Some(DEFAULT_CONNECTION.to_string()),
            host: None,
            origin: None,
            proxy_authenticate: None,
            proxy_authorization: None,
            referer: None,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl HeaderConfig {
    /// Non-empty configured headers, validated.
    pub fn to_headers(&self) -> Result<Vec<(HeaderName, HeaderValue)>, NetError> {
        let entries = [
            (header::ACCEPT, &self.accept),
            (header::ACCEPT_CHARSET, &self.accept_charset),
            (header::ACCEPT_ENCODING, &self.accept_encoding),
            (header::ACCEPT_LANGUAGE, &self.accept_language),
            (header::ACCEPT_RANGES, &self.accept_ranges),
            (header::AUTHORIZATION, &self.authorization),
            (header::CONNECTION, &self.connection),
            (header::HOST, &self.host),
            (header::ORIGIN, &self.origin),
            (header::PROXY_AUTHENTICATE, &self.proxy_authenticate),
            (header::PROXY_AUTHORIZATION, &self.proxy_authorization),
            (header::REFERER, &self.referer),
            (header::USER_AGENT, &self.user_agent),
        ];

        let mut headers = Vec::new();
        for (name, value) in entries {
            let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            let value = HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeaderValue {
                name: name.to_string(),
            })?;
            headers.push((name, value));
        }
        Ok(headers)
    }
}

/// Fills in configured headers the request does not already set.
#[derive(Debug)]
pub struct DefaultHeadersInterceptor {
    enabled: AtomicBool,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl DefaultHeadersInterceptor {
    pub fn new(config: &HeaderConfig) -> Result<Self, NetError> {
        Ok(Self {
            enabled: AtomicBool::new(config.enabled),
            headers: config.to_headers()?,
        })
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Apply the defaults to `request`.
    pub fn apply(&self, request: HttpRequest) -> HttpRequest {
        if !self.is_enabled() {
            return request;
        }
        let mut request = request;
        for (name, value) in &self.headers {
            // HeaderMap lookups are case-insensitive.
            if request.headers().contains_key(name) {
                continue;
            }
            tracing::debug!(header = %name, "setting default header");
            request = request.with_header(name.clone(), value.clone());
        }
        request
    }
}

impl Interceptor for DefaultHeadersInterceptor {
    fn intercept<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, HttpResult> {
        next.run(self.apply(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn request() -> HttpRequest {
        HttpRequest::parse(Method::GET, "http://example.com/").unwrap()
    }

    #[test]
    fn test_disabled_by_default() {
        let interceptor = DefaultHeadersInterceptor::new(&HeaderConfig::default()).unwrap();
        assert!(!interceptor.is_enabled());
        let req = interceptor.apply(request());
        assert!(req.headers().is_empty());
    }

    #[test]
    fn test_defaults_applied_when_enabled() {
        let config = HeaderConfig {
            enabled: true,
            ..Default::default()
        };
        let interceptor = DefaultHeadersInterceptor::new(&config).unwrap();
        let req = interceptor.apply(request());

        assert_eq!(req.headers().get(header::ACCEPT).unwrap(), DEFAULT_ACCEPT);
        assert_eq!(req.headers().get(header::USER_AGENT).unwrap(), DEFAULT_USER_AGENT);
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_existing_header_not_overwritten() {
        let config = HeaderConfig {
            enabled: true,
            ..Default::default()
        };
        let interceptor = DefaultHeadersInterceptor::new(&config).unwrap();
        let req = request().try_with_header("User-Agent", "custom/1.0").unwrap();
        let req = interceptor.apply(req);

        assert_eq!(req.headers().get(header::USER_AGENT).unwrap(), "custom/1.0");
    }

    #[test]
    fn test_blank_values_skipped() {
        let config = HeaderConfig {
            enabled: true,
            origin: Some("   ".to_string()),
            ..Default::default()
        };
        let headers = config.to_headers().unwrap();
        assert!(!headers.iter().any(|(name, _)| *name == header::ORIGIN));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let config = HeaderConfig {
            referer: Some("bad\r\nvalue".to_string()),
            ..Default::default()
        };
        let err = DefaultHeadersInterceptor::new(&config).unwrap_err();
        assert!(matches!(err, NetError::InvalidHeaderValue { .. }));
    }

    #[test]
    fn test_runtime_toggle() {
        let interceptor = DefaultHeadersInterceptor::new(&HeaderConfig::default()).unwrap();
        interceptor.enable();
        assert!(!interceptor.apply(request()).headers().is_empty());
        interceptor.disable();
        assert!(interceptor.apply(request()).headers().is_empty());
    }
}
