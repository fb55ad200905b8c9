use chainnet::base::neterror::NetError;
use chainnet::cookies::caching::CachingCookieJar;
use chainnet::cookies::canonical_cookie::CanonicalCookie;
use chainnet::cookies::jar::CookieJar;
use chainnet::cookies::layered::LayeredCookieStore;
use chainnet::cookies::memory::MemoryCookieJar;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn future() -> OffsetDateTime {
    OffsetDateTime::now_utc() + time::Duration::hours(1)
}

fn past() -> OffsetDateTime {
    OffsetDateTime::now_utc() - time::Duration::hours(1)
}

/// Hands back whatever was put in, without filtering.
#[derive(Default)]
struct RawJar {
    cookies: std::sync::Mutex<Vec<CanonicalCookie>>,
}

impl CookieJar for RawJar {
    fn name(&self) -> &str {
        "raw"
    }

    fn save_from_response(&self, _url: &Url, cookies: &[CanonicalCookie]) -> Result<(), NetError> {
        self.cookies.lock().unwrap().extend_from_slice(cookies);
        Ok(())
    }

    fn load_for_request(&self, _url: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
        Ok(self.cookies.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct FailingJar {
    saves: AtomicUsize,
}

impl CookieJar for FailingJar {
    fn name(&self) -> &str {
        "failing"
    }

    fn save_from_response(&self, _url: &Url, _cookies: &[CanonicalCookie]) -> Result<(), NetError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Err(NetError::cookie_store("failing", "write rejected"))
    }

    fn load_for_request(&self, _url: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
        Err(NetError::cookie_store("failing", "read rejected"))
    }
}

#[test]
fn test_empty_layered_store_loads_nothing() {
    let store = LayeredCookieStore::new(Vec::new());
    assert!(store.load_for_request(&url("https://example.com/")).unwrap().is_empty());
}

#[test]
fn test_later_backend_wins_on_name() {
    let u = url("https://example.com/");
    let a = Arc::new(RawJar::default());
    let b = Arc::new(RawJar::default());
    a.save_from_response(
        &u,
        &[CanonicalCookie::new("a", "v1", "example.com").with_expiration(future())],
    )
    .unwrap();
    b.save_from_response(
        &u,
        &[CanonicalCookie::new("a", "v2", "example.com").with_expiration(future())],
    )
    .unwrap();

    let store = LayeredCookieStore::default().push(a).push(b);
    let loaded = store.load_for_request(&u).unwrap();

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "a");
    assert_eq!(loaded[0].value, "v2");
}

#[test]
fn test_expired_cookie_never_loaded() {
    let u = url("https://example.com/");
    let raw = Arc::new(RawJar::default());
    raw.save_from_response(
        &u,
        &[
            CanonicalCookie::new("stale", "x", "example.com").with_expiration(past()),
            CanonicalCookie::new("fresh", "y", "example.com").with_expiration(future()),
        ],
    )
    .unwrap();

    let store = LayeredCookieStore::default().push(raw.clone());
    let loaded = store.load_for_request(&u).unwrap();

    assert_eq!(raw.cookies.lock().unwrap().len(), 2);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "fresh");
}

#[test]
fn test_non_matching_cookie_filtered() {
    let raw = Arc::new(RawJar::default());
    raw.save_from_response(
        &url("https://other.org/"),
        &[CanonicalCookie::new("elsewhere", "x", "other.org")],
    )
    .unwrap();

    let store = LayeredCookieStore::default().push(raw);
    assert!(store.load_for_request(&url("https://example.com/")).unwrap().is_empty());
}

#[test]
fn test_save_reaches_healthy_backends_despite_failure() {
    let u = url("https://example.com/");
    let failing = Arc::new(FailingJar::default());
    let first = Arc::new(MemoryCookieJar::new());
    let last = Arc::new(MemoryCookieJar::new());
    let store = LayeredCookieStore::default()
        .push(first.clone())
        .push(failing.clone())
        .push(last.clone());

    let result = store.save_from_response(&u, &[CanonicalCookie::new("sid", "1", "example.com")]);

    assert!(result.is_ok());
    assert_eq!(failing.saves.load(Ordering::SeqCst), 1);
    assert_eq!(first.total_cookie_count(), 1);
    assert_eq!(last.total_cookie_count(), 1);
    assert_eq!(store.load_for_request(&u).unwrap().len(), 1);
}

#[test]
fn test_cache_keeps_two_of_three_hosts() {
    let cache = Arc::new(CachingCookieJar::new(2, Duration::from_secs(60), Duration::from_secs(60)));
    let store = LayeredCookieStore::default().push(cache.clone());

    for host in ["h1", "h2", "h3"] {
        let u = url(&format!("http://{}/", host));
        store
            .save_from_response(&u, &[CanonicalCookie::new("id", host, host)])
            .unwrap();
    }

    assert_eq!(cache.len(), 2);
    let queryable = ["h1", "h2", "h3"]
        .iter()
        .filter(|h| {
            !store
                .load_for_request(&url(&format!("http://{}/", h)))
                .unwrap()
                .is_empty()
        })
        .count();
    assert_eq!(queryable, 2);
    assert!(!cache.contains_host("h1"));
}

#[test]
fn test_parse_and_store_set_cookie() {
    let jar = MemoryCookieJar::new();
    let u = url("https://a.example.com/foo/bar");

    for line in ["root=val; Path=/", "foo=val; Path=/foo", "baz=val; Path=/baz"] {
        let cookie = CanonicalCookie::parse(&u, line).unwrap();
        jar.save_from_response(&u, &[cookie]).unwrap();
    }
    let domain = CanonicalCookie::parse(&u, "domain=val; Domain=example.com; Path=/").unwrap();
    jar.save_from_response(&u, &[domain]).unwrap();

    let names: Vec<_> = jar
        .load_for_request(&u)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names.len(), 3);
    assert_eq!(names[0], "foo");
    assert!(names.contains(&"root".to_string()));
    assert!(names.contains(&"domain".to_string()));

    let sibling = jar.load_for_request(&url("https://b.example.com/")).unwrap();
    assert_eq!(sibling.len(), 1);
    assert_eq!(sibling[0].name, "domain");
}

#[test]
fn test_supercookie_rejected() {
    let u = url("https://www.example.co.uk/");
    assert_eq!(
        CanonicalCookie::parse(&u, "track=1; Domain=co.uk").unwrap_err(),
        NetError::CookiePublicSuffix
    );
    assert!(CanonicalCookie::parse(&u, "ok=1; Domain=example.co.uk").is_ok());
}

#[test]
fn test_concurrent_layered_access_keeps_cache_bound() {
    let cache = Arc::new(CachingCookieJar::new(10, Duration::from_secs(60), Duration::from_secs(60)));
    let memory = Arc::new(MemoryCookieJar::new());
    let store = Arc::new(LayeredCookieStore::default().push(cache.clone()).push(memory.clone()));

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..100 {
                    let host = format!("w{}-{}.example", t, i);
                    let u = url(&format!("http://{}/", host));
                    store
                        .save_from_response(&u, &[CanonicalCookie::new("id", "1", &host)])
                        .unwrap();
                    assert_eq!(store.load_for_request(&u).unwrap().len(), 1);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    cache.run_pending_tasks();
    assert!(cache.len() <= 10, "cache holds {} hosts", cache.len());
    assert_eq!(memory.total_cookie_count(), 800);
}
