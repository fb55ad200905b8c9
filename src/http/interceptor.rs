//! Interceptor chain.
//!
//! An [`InterceptorChain`] runs an ordered list of [`Interceptor`]s in front
//! of a [`Transport`]. Each interceptor receives the request plus a [`Next`]
//! handle for the rest of the chain; `Next` is `Copy`, so an interceptor may
//! invoke the downstream stages more than once (this is how retries work).

use crate::base::neterror::NetError;
use crate::http::{HttpRequest, HttpResponse};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Outcome of one pass through (part of) the chain.
pub type HttpResult = Result<HttpResponse, NetError>;

/// Terminal stage that actually puts a request on the wire.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, HttpResult>;
}

/// A request-processing stage.
pub trait Interceptor: Send + Sync {
    fn intercept<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, HttpResult>;
}

/// Continuation for the stages after the current interceptor.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub(crate) fn new(interceptors: &'a [Arc<dyn Interceptor>], transport: &'a dyn Transport) -> Self {
        Self {
            interceptors,
            transport,
        }
    }

    /// Run the remaining stages for `request`.
    pub fn run(self, request: HttpRequest) -> BoxFuture<'a, HttpResult> {
        match self.interceptors.split_first() {
            Some((current, rest)) => current.intercept(
                request,
                Next {
                    interceptors: rest,
                    transport: self.transport,
                },
            ),
            None => self.transport.send(request),
        }
    }
}

/// Ordered interceptors bound to a transport.
#[derive(Clone)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Arc<dyn Transport>,
}

impl InterceptorChain {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            interceptors: Vec::new(),
            transport,
        }
    }

    /// Append an interceptor; it runs after every interceptor added before it.
    pub fn with<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn with_shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub async fn execute(&self, request: HttpRequest) -> HttpResult {
        Next::new(&self.interceptors, self.transport.as_ref())
            .run(request)
            .await
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Method, StatusCode};
    use std::sync::Mutex;

    struct EchoTransport {
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl Transport for EchoTransport {
        fn send(&self, request: HttpRequest) -> BoxFuture<'_, HttpResult> {
            let tags = request
                .headers()
                .get_all("x-tag")
                .iter()
                .filter_map(|v| v.to_str().ok().map(String::from))
                .collect();
            self.seen.lock().unwrap().push(tags);
            Box::pin(async { Ok(HttpResponse::with_status(StatusCode::OK)) })
        }
    }

    struct Tag(&'static str);

    impl Interceptor for Tag {
        fn intercept<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, HttpResult> {
            let mut headers = request.headers().clone();
            headers.append("x-tag", HeaderValue::from_static(self.0));
            next.run(request.with_headers(headers))
        }
    }

    struct Twice;

    impl Interceptor for Twice {
        fn intercept<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, HttpResult> {
            Box::pin(async move {
                next.run(request.clone()).await?;
                next.run(request).await
            })
        }
    }

    #[tokio::test]
    async fn test_interceptors_run_in_order() {
        let transport = Arc::new(EchoTransport {
            seen: Mutex::new(Vec::new()),
        });
        let chain = InterceptorChain::new(transport.clone())
            .with(Tag("first"))
            .with(Tag("second"));

        let req = HttpRequest::parse(Method::GET, "http://example.com/").unwrap();
        let resp = chain.execute(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[vec!["first".to_string(), "second".to_string()]]);
    }

    #[tokio::test]
    async fn test_next_can_be_reused() {
        let transport = Arc::new(EchoTransport {
            seen: Mutex::new(Vec::new()),
        });
        let chain = InterceptorChain::new(transport.clone())
            .with(Twice)
            .with(Tag("inner"));

        let req = HttpRequest::parse(Method::GET, "http://example.com/").unwrap();
        chain.execute(req).await.unwrap();

        assert_eq!(transport.seen.lock().unwrap().len(), 2);
        assert_eq!(chain.len(), 2);
    }
}
