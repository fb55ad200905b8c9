//! A cookie jar composed of an ordered list of backends.

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::jar::CookieJar;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Fans saves out to every backend and merges their loads.
///
/// A failing backend never fails the composite: its error is logged and the
/// remaining backends still run. When two backends return a cookie with the
/// same name, the later backend wins while the cookie keeps the position it
/// first appeared at.
#[derive(Clone, Default)]
pub struct LayeredCookieStore {
    backends: Vec<Arc<dyn CookieJar>>,
}

impl LayeredCookieStore {
    pub fn new(backends: Vec<Arc<dyn CookieJar>>) -> Self {
        Self { backends }
    }

    /// Append a backend; it takes precedence over every backend before it.
    pub fn push(mut self, backend: Arc<dyn CookieJar>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for LayeredCookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.backends.iter().map(|b| b.name()))
            .finish()
    }
}

impl CookieJar for LayeredCookieStore {
    fn name(&self) -> &str {
        "layered"
    }

    fn save_from_response(&self, url: &Url, cookies: &[CanonicalCookie]) -> Result<(), NetError> {
        for backend in &self.backends {
            if let Err(e) = backend.save_from_response(url, cookies) {
                tracing::error!(
                    backend = backend.name(),
                    url = %url,
                    error = %e,
                    "cookie backend failed to save"
                );
            }
        }
        Ok(())
    }

    fn load_for_request(&self, url: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
        let now = OffsetDateTime::now_utc();
        let mut merged: Vec<CanonicalCookie> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for backend in &self.backends {
            let cookies = match backend.load_for_request(url) {
                Ok(cookies) => cookies,
                Err(e) => {
                    tracing::error!(
                        backend = backend.name(),
                        url = %url,
                        error = %e,
                        "cookie backend failed to load"
                    );
                    continue;
                }
            };

            for cookie in cookies {
                if cookie.is_expired(now) || !cookie.matches(url) {
                    continue;
                }
                match index.get(&cookie.name) {
                    Some(&pos) => merged[pos] = cookie,
                    None => {
                        index.insert(cookie.name.clone(), merged.len());
                        merged.push(cookie);
                    }
                }
            }
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::memory::MemoryCookieJar;

    struct Failing;

    impl CookieJar for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn save_from_response(&self, _: &Url, _: &[CanonicalCookie]) -> Result<(), NetError> {
            Err(NetError::cookie_store("failing", "disk full"))
        }

        fn load_for_request(&self, _: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
            Err(NetError::cookie_store("failing", "unavailable"))
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_empty_store() {
        let store = LayeredCookieStore::default();
        assert!(store.is_empty());
        store
            .save_from_response(&url(), &[CanonicalCookie::new("a", "1", "example.com")])
            .unwrap();
        assert!(store.load_for_request(&url()).unwrap().is_empty());
    }

    #[test]
    fn test_merge_keeps_first_position() {
        let first = Arc::new(MemoryCookieJar::new());
        let second = Arc::new(MemoryCookieJar::new());
        first.set_cookie(CanonicalCookie::new("a", "first", "example.com"));
        first.set_cookie(CanonicalCookie::new("b", "first", "example.com"));
        second.set_cookie(CanonicalCookie::new("a", "second", "example.com"));

        let store = LayeredCookieStore::default().push(first).push(second);
        let loaded = store.load_for_request(&url()).unwrap();

        let pairs: Vec<_> = loaded.iter().map(|c| c.pair()).collect();
        assert_eq!(pairs, vec!["a=second", "b=first"]);
    }

    #[test]
    fn test_failing_backend_is_skipped() {
        let memory = Arc::new(MemoryCookieJar::new());
        let store = LayeredCookieStore::default()
            .push(Arc::new(Failing))
            .push(memory.clone());

        store
            .save_from_response(&url(), &[CanonicalCookie::new("a", "1", "example.com")])
            .unwrap();
        assert_eq!(memory.total_cookie_count(), 1);
        assert_eq!(store.load_for_request(&url()).unwrap().len(), 1);
    }

    #[test]
    fn test_nested_layers() {
        let inner = LayeredCookieStore::default().push(Arc::new(MemoryCookieJar::new()));
        let outer = LayeredCookieStore::default().push(Arc::new(inner));
        outer
            .save_from_response(&url(), &[CanonicalCookie::new("a", "1", "example.com")])
            .unwrap();
        assert_eq!(outer.load_for_request(&url()).unwrap().len(), 1);
    }

    #[test]
    fn test_debug_lists_backend_names() {
        let store = LayeredCookieStore::default()
            .push(Arc::new(Failing))
            .push(Arc::new(MemoryCookieJar::new()));
        assert_eq!(format!("{:?}", store), r#"["failing", "memory"]"#);
    }
}
