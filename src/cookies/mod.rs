//! Cookie storage and the cookie stage of the interceptor chain.
//!
//! Every store implements [`CookieJar`](jar::CookieJar):
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`LayeredCookieStore`](layered::LayeredCookieStore) | Ordered composition of backends, failures isolated |
//! | [`CachingCookieJar`](caching::CachingCookieJar) | Host-keyed cache, LRU size bound, write/access TTL |
//! | [`MemoryCookieJar`](memory::MemoryCookieJar) | RFC 6265 domain-indexed jar, Netscape import/export |
//! | [`NoCookies`](jar::NoCookies) | Stores nothing |
//!
//! [`CookieInterceptor`](interceptor::CookieInterceptor) attaches a jar to
//! an [`InterceptorChain`](crate::http::InterceptorChain).
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use chainnet::cookies::caching::CachingCookieJar;
//! use chainnet::cookies::canonical_cookie::CanonicalCookie;
//! use chainnet::cookies::jar::CookieJar;
//! use chainnet::cookies::layered::LayeredCookieStore;
//! use url::Url;
//!
//! let cache = CachingCookieJar::new(100, Duration::from_secs(60), Duration::from_secs(60));
//! let store = LayeredCookieStore::default().push(Arc::new(cache));
//!
//! let url = Url::parse("https://example.com/").unwrap();
//! store
//!     .save_from_response(&url, &[CanonicalCookie::new("sid", "abc", "example.com")])
//!     .unwrap();
//! assert_eq!(store.load_for_request(&url).unwrap().len(), 1);
//! ```

pub mod caching;
pub mod canonical_cookie;
pub mod interceptor;
pub mod jar;
pub mod layered;
pub mod memory;
pub mod persistence;
pub mod psl;

pub use caching::{CachingCookieJar, CookieConfig};
pub use canonical_cookie::CanonicalCookie;
pub use interceptor::CookieInterceptor;
pub use jar::{CookieJar, NoCookies};
pub use layered::LayeredCookieStore;
pub use memory::MemoryCookieJar;
