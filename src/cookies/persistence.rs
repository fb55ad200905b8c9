//! Cookie persistence - save and load cookies to/from disk.
//!
//! Provides JSON-based persistence for [`MemoryCookieJar`].

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::{CanonicalCookie, SameSite};
use crate::cookies::memory::MemoryCookieJar;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use time::OffsetDateTime;

const BACKEND: &str = "json-file";

/// Serializable representation of a cookie for persistence.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct PersistentCookie {
    name: String,
    value: String,
    domain: String,
    path: String,
    secure: bool,
    http_only: bool,
    host_only: bool,
    expires_unix_secs: Option<i64>,
}

impl From<CanonicalCookie> for PersistentCookie {
    fn from(cookie: CanonicalCookie) -> Self {
        Self {
            expires_unix_secs: cookie.expiration_time.map(|t| t.unix_timestamp()),
            name: cookie.name,
            value: cookie.value,
            domain: cookie.domain,
            path: cookie.path,
            secure: cookie.secure,
            http_only: cookie.http_only,
            host_only: cookie.host_only,
        }
    }
}

/// Save every cookie of `jar` to `path` as pretty-printed JSON.
///
/// # Example
/// ```ignore
/// persistence::save_cookies(&jar, Path::new("/path/to/cookies.json"))?;
/// ```
pub fn save_cookies(jar: &MemoryCookieJar, path: &Path) -> Result<(), NetError> {
    let cookies: Vec<PersistentCookie> = jar
        .all_cookies()
        .into_iter()
        .map(PersistentCookie::from)
        .collect();

    let json = serde_json::to_string_pretty(&cookies)
        .map_err(|e| NetError::cookie_store(BACKEND, e.to_string()))?;
    fs::write(path, json).map_err(|e| NetError::cookie_store(BACKEND, e.to_string()))?;

    tracing::debug!(path = %path.display(), count = cookies.len(), "cookies saved");
    Ok(())
}

/// Load cookies from `path` into a new jar. Cookies that already expired are
/// skipped.
pub fn load_cookies(path: &Path) -> Result<MemoryCookieJar, NetError> {
    let json =
        fs::read_to_string(path).map_err(|e| NetError::cookie_store(BACKEND, e.to_string()))?;
    let stored: Vec<PersistentCookie> =
        serde_json::from_str(&json).map_err(|e| NetError::cookie_store(BACKEND, e.to_string()))?;

    let jar = MemoryCookieJar::new();
    let now = OffsetDateTime::now_utc();

    for pc in stored {
        let expiration_time = pc
            .expires_unix_secs
            .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok());

        let cookie = CanonicalCookie {
            name: pc.name,
            value: pc.value,
            domain: pc.domain,
            path: pc.path,
            creation_time: now,
            expiration_time,
            last_access_time: now,
            secure: pc.secure,
            http_only: pc.http_only,
            host_only: pc.host_only,
            same_site: SameSite::Lax,
        };
        if cookie.is_expired(now) {
            continue;
        }

        jar.set_cookie(cookie);
    }

    tracing::debug!(path = %path.display(), count = jar.total_cookie_count(), "cookies loaded");
    Ok(jar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_roundtrip() {
        let jar = MemoryCookieJar::new();
        jar.set_cookie(
            CanonicalCookie::new("session", "abc123", "example.com")
                .with_secure(true)
                .with_domain_scope(),
        );
        jar.set_cookie(
            CanonicalCookie::new("gone", "x", "example.com")
                .with_expiration(OffsetDateTime::now_utc() - time::Duration::hours(1)),
        );

        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        save_cookies(&jar, &path).unwrap();

        let loaded = load_cookies(&path).unwrap();
        assert_eq!(loaded.total_cookie_count(), 1);

        let url = url::Url::parse("https://www.example.com/").unwrap();
        let cookies = loaded.cookies_for_url(&url);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "session");
        assert_eq!(cookies[0].value, "abc123");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_cookies(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, NetError::CookieStore { .. }));
    }
}
