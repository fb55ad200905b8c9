//! HTTP Client with builder pattern.
//!
//! The client assembles one [`InterceptorChain`] from a [`ClientConfig`]:
//! default headers, gzip, retry and cookies, in that order, in front of a
//! [`Transport`].
//!
//! # Example
//!
//! ```rust,no_run
//! use chainnet::config::ClientConfig;
//! use chainnet::Client;
//!
//! # async fn run() -> Result<(), chainnet::base::neterror::NetError> {
//! let config = ClientConfig::from_json_str(r#"{"retry": {"max_retry": 2}}"#)?;
//! let client = Client::from_config(config)?;
//!
//! let resp = client.get("http://example.com/").send().await?;
//! println!("{}", resp.status());
//! # Ok(())
//! # }
//! ```

use crate::base::neterror::NetError;
use crate::config::ClientConfig;
use crate::cookies::caching::CachingCookieJar;
use crate::cookies::interceptor::CookieInterceptor;
use crate::cookies::jar::CookieJar;
use crate::cookies::layered::LayeredCookieStore;
use crate::http::gzip::GzipRequestInterceptor;
use crate::http::headers::DefaultHeadersInterceptor;
use crate::http::interceptor::{HttpResult, InterceptorChain, Transport};
use crate::http::retry::RetryInterceptor;
use crate::http::retrystate::RetryStateStore;
use crate::http::transport::HyperTransport;
use crate::http::HttpRequest;
use bytes::Bytes;
use http::Method;
use std::sync::Arc;
use url::Url;

/// HTTP Client for making requests.
///
/// Cheap to clone; clones share the chain, the cookie jar and retry state.
#[derive(Clone)]
pub struct Client {
    chain: InterceptorChain,
    headers: Arc<DefaultHeadersInterceptor>,
    gzip: Arc<GzipRequestInterceptor>,
    retry: Arc<RetryInterceptor>,
    cookie_jar: Option<Arc<dyn CookieJar>>,
    base_url: Option<Url>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Build a client from `config` with the default transport.
    pub fn from_config(config: ClientConfig) -> Result<Self, NetError> {
        Self::builder().config(config).build()
    }

    /// Run `request` through the whole chain.
    pub async fn execute(&self, request: HttpRequest) -> HttpResult {
        self.chain.execute(request).await
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start building a PUT request.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start building a DELETE request.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start building a request with custom method.
    ///
    /// A relative `url` is appended to the base URL, if one is configured.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.as_ref().to_string(),
            headers: http::HeaderMap::new(),
            query: Vec::new(),
            body: None,
            error: None,
        }
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Runtime switch for default headers.
    pub fn default_headers(&self) -> &DefaultHeadersInterceptor {
        &self.headers
    }

    /// Runtime switch for request body compression.
    pub fn gzip(&self) -> &GzipRequestInterceptor {
        &self.gzip
    }

    pub fn retry(&self) -> &RetryInterceptor {
        &self.retry
    }

    pub fn cookie_jar(&self) -> Option<&Arc<dyn CookieJar>> {
        self.cookie_jar.as_ref()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("chain", &self.chain)
            .field("retry", self.retry.config())
            .field("cookie_jar", &self.cookie_jar.as_ref().map(|j| j.name()))
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish()
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    cookie_jar: Option<Arc<dyn CookieJar>>,
    transport: Option<Arc<dyn Transport>>,
    retry_state: Option<RetryStateStore>,
    base_url: Option<String>,
}

impl ClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set cookie jar (takes precedence over `cookie.enabled`).
    pub fn cookie_jar(mut self, jar: Arc<dyn CookieJar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Replace the default [`HyperTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share retry state with another client or inspect it.
    pub fn retry_state(mut self, store: RetryStateStore) -> Self {
        self.retry_state = Some(store);
        self
    }

    /// Prefix for relative request URLs.
    pub fn base_url<U: AsRef<str>>(mut self, url: U) -> Self {
        self.base_url = Some(url.as_ref().to_string());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client, NetError> {
        let config = self.config;
        config.validate()?;
        let base_url = self.base_url.as_deref().map(Url::parse).transpose()?;

        let headers = Arc::new(DefaultHeadersInterceptor::new(&config.header)?);
        let gzip = Arc::new(GzipRequestInterceptor::new(&config.gzip));
        let retry = Arc::new(match self.retry_state {
            Some(store) => RetryInterceptor::with_state_store(config.retry.clone(), store),
            None => RetryInterceptor::new(config.retry.clone()),
        });

        let cookie_jar = self.cookie_jar.or_else(|| {
            config.cookie.enabled.then(|| {
                let cache: Arc<dyn CookieJar> = Arc::new(CachingCookieJar::from_config(&config.cookie));
                Arc::new(LayeredCookieStore::new(vec![cache])) as Arc<dyn CookieJar>
            })
        });

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HyperTransport::new(&config.transport)) as Arc<dyn Transport>);

        let mut chain = InterceptorChain::new(transport)
            .with_shared(headers.clone())
            .with_shared(gzip.clone())
            .with_shared(retry.clone());
        if let Some(jar) = &cookie_jar {
            chain = chain.with(CookieInterceptor::new(jar.clone()));
        }

        tracing::debug!(
            max_retry = config.retry.max_retry,
            cookies = cookie_jar.is_some(),
            "client built"
        );

        Ok(Client {
            chain,
            headers,
            gzip,
            retry,
            cookie_jar,
            base_url,
        })
    }
}

/// Resolve `url` against `base`, appending relative paths to the base path.
fn join_url(base: Option<&Url>, url: &str) -> Result<Url, NetError> {
    let base = match (Url::parse(url), base) {
        (Ok(absolute), _) => return Ok(absolute),
        (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base,
        (Err(e), _) => return Err(e.into()),
    };

    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };
    let mut joined = base.clone();
    joined.set_path(&format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    ));
    if query.is_some() {
        joined.set_query(query);
    }
    Ok(joined)
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: String,
    headers: http::HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Bytes>,
    /// First builder error, reported by `send`.
    error: Option<NetError>,
}

impl RequestBuilder {
    /// Add a header. Invalid names or values are ignored.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<http::HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.headers.insert(key, val);
        }
        self
    }

    /// Set request body.
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Append query parameters to the URL.
    pub fn query<K: AsRef<str>, V: AsRef<str>>(mut self, params: &[(K, V)]) -> Self {
        self.query.extend(
            params
                .iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
        );
        self
    }

    /// Set JSON body.
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => {
                self.body = Some(bytes.into());
                self.headers.insert(
                    http::header::CONTENT_TYPE,
                    http::HeaderValue::from_static("application/json"),
                );
            }
            Err(e) => {
                self.error.get_or_insert(NetError::BodyEncodeFailed {
                    message: e.to_string(),
                });
            }
        }
        self
    }

    /// Set an `application/x-www-form-urlencoded` body.
    pub fn form<K: AsRef<str>, V: AsRef<str>>(mut self, params: &[(K, V)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
            .finish();
        self.body = Some(encoded.into());
        self.headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self
    }

    /// Build the request without sending it.
    pub fn build(self) -> Result<HttpRequest, NetError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let mut url = join_url(self.client.base_url.as_ref(), &self.url)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        let mut request = HttpRequest::new(self.method, url).with_headers(self.headers);
        if let Some(body) = self.body {
            request = request.with_body(body);
        }
        Ok(request)
    }

    /// Send the request.
    pub async fn send(self) -> HttpResult {
        let client = self.client.clone();
        let request = self.build()?;
        client.execute(request).await
    }
}
