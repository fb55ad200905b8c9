//! Bridges a [`CookieJar`] into the interceptor chain.

use crate::cookies::canonical_cookie::{cookie_header, CanonicalCookie};
use crate::cookies::jar::CookieJar;
use crate::http::interceptor::{HttpResult, Interceptor, Next};
use crate::http::HttpRequest;
use futures::future::BoxFuture;
use http::header::{self, HeaderValue};
use std::sync::Arc;

/// Attaches stored cookies to each request and stores the cookies each
/// response sets.
///
/// Jar failures are logged; they never fail the call.
#[derive(Clone)]
pub struct CookieInterceptor {
    jar: Arc<dyn CookieJar>,
}

impl CookieInterceptor {
    pub fn new(jar: Arc<dyn CookieJar>) -> Self {
        Self { jar }
    }

    pub fn jar(&self) -> &Arc<dyn CookieJar> {
        &self.jar
    }

    fn attach(&self, request: HttpRequest) -> HttpRequest {
        let cookies = match self.jar.load_for_request(request.url()) {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::warn!(jar = self.jar.name(), error = %e, "cookie load failed");
                return request;
            }
        };
        if cookies.is_empty() {
            return request;
        }

        let mut value = cookie_header(&cookies);
        if let Some(existing) = request
            .headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            value = format!("{}; {}", existing, value);
        }

        match HeaderValue::from_str(&value) {
            Ok(value) => request.with_header(header::COOKIE, value),
            Err(_) => {
                tracing::warn!(url = %request.url(), "stored cookies are not a valid header value");
                request
            }
        }
    }

    fn store(&self, url: &url::Url, outcome: &HttpResult) {
        let Ok(response) = outcome else {
            return;
        };

        let cookies: Vec<CanonicalCookie> = response
            .set_cookie_headers()
            .filter_map(|line| match CanonicalCookie::parse(url, line) {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "ignoring Set-Cookie");
                    None
                }
            })
            .collect();
        if cookies.is_empty() {
            return;
        }

        if let Err(e) = self.jar.save_from_response(url, &cookies) {
            tracing::warn!(jar = self.jar.name(), error = %e, "cookie save failed");
        }
    }
}

impl std::fmt::Debug for CookieInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieInterceptor")
            .field("jar", &self.jar.name())
            .finish()
    }
}

impl Interceptor for CookieInterceptor {
    fn intercept<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, HttpResult> {
        Box::pin(async move {
            let url = request.url().clone();
            let outcome = next.run(self.attach(request)).await;
            self.store(&url, &outcome);
            outcome
        })
    }
}
