//! Plain HTTP/1.1 transport on top of hyper.
//!
//! Connection pooling is delegated to `hyper-util`'s legacy client. Only the
//! `http` scheme is supported; TLS is outside this crate.

use crate::base::neterror::NetError;
use crate::http::interceptor::{HttpResult, Transport};
use crate::http::{HttpRequest, HttpResponse};
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Timeout for establishing a TCP connection.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Deadline for a single call (connect, send, read body). `None` disables it.
    #[serde(with = "humantime_serde")]
    pub call_timeout: Option<Duration>,
    /// Idle connections kept per host.
    pub max_idle_per_host: usize,
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            call_timeout: None,
            max_idle_per_host: 200,
            pool_idle_timeout: Duration::from_secs(300),
        }
    }
}

/// [`Transport`] backed by a pooled hyper client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    call_timeout: Option<Duration>,
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl HyperTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build(connector);

        Self {
            client,
            call_timeout: config.call_timeout,
        }
    }

    async fn send_once(&self, request: HttpRequest) -> HttpResult {
        if request.url().scheme() != "http" {
            return Err(NetError::DisallowedUrlScheme);
        }

        let (method, url, headers, body) = request.into_parts();
        let mut builder = http::Request::builder().method(method).uri(url.as_str());
        if let Some(h) = builder.headers_mut() {
            h.extend(headers);
        }
        let req = builder
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|_| NetError::InvalidUrl)?;

        let resp = self.client.request(req).await.map_err(map_client_error)?;
        let (parts, body) = resp.into_parts();
        let body = body
            .collect()
            .await
            .map_err(NetError::connection_failed)?
            .to_bytes();

        tracing::debug!(url = %url, status = parts.status.as_u16(), "response received");
        Ok(HttpResponse::from_parts(parts, body))
    }
}

fn map_client_error(err: hyper_util::client::legacy::Error) -> NetError {
    if err.is_connect() {
        // Surface the io error kind when the connector exposes one.
        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                return NetError::from(std::io::Error::new(io.kind(), io.to_string()));
            }
            source = cause.source();
        }
    }
    NetError::connection_failed(err)
}

impl Transport for HyperTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, HttpResult> {
        Box::pin(async move {
            match self.call_timeout {
                Some(limit) => tokio::time::timeout(limit, self.send_once(request))
                    .await
                    .map_err(|_| NetError::ConnectionTimedOut)?,
                None => self.send_once(request).await,
            }
        })
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
