//! Gzip request-body compression.

use crate::base::neterror::NetError;
use crate::http::interceptor::{HttpResult, Interceptor, Next};
use crate::http::HttpRequest;
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures::future::BoxFuture;
use http::header::{self, HeaderValue};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GzipConfig {
    pub enabled: bool,
}

/// Compresses request bodies and marks them `Content-Encoding: gzip`.
///
/// Requests without a body, or that already declare a content encoding, are
/// passed through untouched.
#[derive(Debug, Default)]
pub struct GzipRequestInterceptor {
    enabled: AtomicBool,
}

impl GzipRequestInterceptor {
    pub fn new(config: &GzipConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
        }
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

    pub fn apply(&self, request: HttpRequest) -> Result<HttpRequest, NetError> {
        if !self.is_enabled() || request.headers().contains_key(header::CONTENT_ENCODING) {
            return Ok(request);
        }
        let Some(body) = request.body() else {
            return Ok(request);
        };

        let compressed = gzip(body)?;
        tracing::debug!(
            original = body.len(),
            compressed = compressed.len(),
            "gzip request body"
        );

        Ok(request
            .with_body(compressed)
            .without_header(&header::CONTENT_LENGTH)
            .with_header(header::CONTENT_ENCODING, HeaderValue::from_static("gzip")))
    }
}

fn gzip(data: &[u8]) -> Result<Bytes, NetError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|_| NetError::ContentEncodingFailed)?;
    let out = encoder.finish().map_err(|_| NetError::ContentEncodingFailed)?;
    Ok(Bytes::from(out))
}

impl Interceptor for GzipRequestInterceptor {
    fn intercept<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, HttpResult> {
        match self.apply(request) {
            Ok(request) => next.run(request),
            Err(e) => Box::pin(async move { Err(e) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use http::Method;
    use std::io::Read;

    fn post(body: &'static str) -> HttpRequest {
        HttpRequest::parse(Method::POST, "http://example.com/upload")
            .unwrap()
            .with_body(body)
    }

    #[test]
    fn test_body_compressed() {
        let interceptor = GzipRequestInterceptor::new(&GzipConfig { enabled: true });
        let req = interceptor
            .apply(post("hello hello hello hello").try_with_header("content-length", "23").unwrap())
            .unwrap();

        assert_eq!(req.headers().get(header::CONTENT_ENCODING).unwrap(), "gzip");
        assert!(req.headers().get(header::CONTENT_LENGTH).is_none());

        let mut decoded = String::new();
        GzDecoder::new(req.body().unwrap().as_ref())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "hello hello hello hello");
    }

    #[test]
    fn test_disabled_passthrough() {
        let interceptor = GzipRequestInterceptor::default();
        let req = interceptor.apply(post("plain")).unwrap();
        assert_eq!(req.body().unwrap().as_ref(), b"plain");
    }

    #[test]
    fn test_already_encoded_passthrough() {
        let interceptor = GzipRequestInterceptor::new(&GzipConfig { enabled: true });
        let req = post("data").try_with_header("content-encoding", "br").unwrap();
        let req = interceptor.apply(req).unwrap();
        assert_eq!(req.body().unwrap().as_ref(), b"data");
        assert_eq!(req.headers().get(header::CONTENT_ENCODING).unwrap(), "br");
    }

    #[test]
    fn test_no_body_passthrough() {
        let interceptor = GzipRequestInterceptor::new(&GzipConfig { enabled: true });
        let req = HttpRequest::parse(Method::GET, "http://example.com/").unwrap();
        let req = interceptor.apply(req).unwrap();
        assert!(req.body().is_none());
        assert!(req.headers().get(header::CONTENT_ENCODING).is_none());
    }
}
