//! In-memory, domain-indexed cookie storage.

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::{CanonicalCookie, SameSite};
use crate::cookies::jar::CookieJar;
use dashmap::DashMap;
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// Maximum total cookies.
const MAX_COOKIES_TOTAL: usize = 3000;

/// RFC 6265 cookie jar keyed by cookie domain.
///
/// A cookie replaces any stored cookie with the same name and path. Expired
/// cookies are dropped when they are next looked up.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    store: DashMap<String, Vec<CanonicalCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cookie(&self, cookie: CanonicalCookie) {
        let mut entry = self.store.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);

        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            let Some(oldest) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.creation_time)
                .map(|(i, _)| i)
            else {
                break;
            };
            entry.remove(oldest);
        }

        entry.push(cookie);
        drop(entry);

        self.enforce_global_limit();
    }

    fn enforce_global_limit(&self) {
        while self.total_cookie_count() > MAX_COOKIES_TOTAL {
            let mut oldest: Option<(String, usize, OffsetDateTime)> = None;
            for entry in self.store.iter() {
                for (idx, cookie) in entry.value().iter().enumerate() {
                    if oldest
                        .as_ref()
                        .map_or(true, |(_, _, t)| cookie.creation_time < *t)
                    {
                        oldest = Some((entry.key().clone(), idx, cookie.creation_time));
                    }
                }
            }

            let Some((domain, idx, _)) = oldest else {
                break;
            };
            if let Some(mut entry) = self.store.get_mut(&domain) {
                if idx < entry.len() {
                    entry.remove(idx);
                }
            }
        }
    }

    /// Cookies applicable to `url`, longest path first.
    pub fn cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        let Some(host) = url.host_str().map(str::to_lowercase) else {
            return Vec::new();
        };
        let now = OffsetDateTime::now_utc();
        let mut result = Vec::new();

        for domain in candidate_domains(&host) {
            let Some(mut entry) = self.store.get_mut(&domain) else {
                continue;
            };
            entry.retain(|c| !c.is_expired(now));
            for cookie in entry.iter_mut().filter(|c| c.matches(url)) {
                cookie.last_access_time = now;
                result.push(cookie.clone());
            }
        }

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });
        result
    }

    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Snapshot of every stored cookie.
    pub fn all_cookies(&self) -> Vec<CanonicalCookie> {
        self.store
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Export cookies in Netscape `cookies.txt` format (curl/wget compatible).
    ///
    /// Each line is
    /// `domain\tinclude_subdomains\tpath\tsecure\texpiry\tname\tvalue`.
    pub fn export_netscape(&self) -> String {
        let mut lines = vec![
            "# Netscape HTTP Cookie File".to_string(),
            "# https://curl.se/docs/http-cookies.html".to_string(),
            String::new(),
        ];

        for cookie in self.all_cookies() {
            let domain = if cookie.host_only {
                cookie.domain.clone()
            } else {
                format!(".{}", cookie.domain)
            };
            lines.push(format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                domain,
                if cookie.host_only { "FALSE" } else { "TRUE" },
                cookie.path,
                if cookie.secure { "TRUE" } else { "FALSE" },
                cookie.expiration_time.map_or(0, |t| t.unix_timestamp()),
                cookie.name,
                cookie.value
            ));
        }

        lines.join("\n")
    }

    /// Import cookies from Netscape format; returns how many were added.
    /// Malformed lines and already-expired cookies are skipped.
    pub fn import_netscape(&self, content: &str) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut count = 0;

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split('\t').collect();
            let [domain, subdomains, path, secure, expiry, name, value] = parts[..] else {
                continue;
            };

            let expiration_time = match expiry.parse::<i64>() {
                Ok(secs) if secs > 0 => OffsetDateTime::from_unix_timestamp(secs).ok(),
                _ => None,
            };

            let cookie = CanonicalCookie {
                name: name.to_string(),
                value: value.to_string(),
                domain: domain.trim_start_matches('.').to_lowercase(),
                path: path.to_string(),
                creation_time: now,
                expiration_time,
                last_access_time: now,
                secure: secure.eq_ignore_ascii_case("TRUE"),
                http_only: false,
                host_only: subdomains.eq_ignore_ascii_case("FALSE"),
                same_site: SameSite::Lax,
            };
            if cookie.is_expired(now) {
                continue;
            }

            self.set_cookie(cookie);
            count += 1;
        }

        count
    }
}

/// The host itself and its parent domains, e.g. `a.b.example.com`,
/// `b.example.com`, `example.com`.
fn candidate_domains(host: &str) -> Vec<String> {
    let mut domains = vec![host.to_string()];
    let parts: Vec<&str> = host.split('.').collect();
    for i in 1..parts.len().saturating_sub(1) {
        domains.push(parts[i..].join("."));
    }
    domains
}

impl CookieJar for MemoryCookieJar {
    fn name(&self) -> &str {
        "memory"
    }

    fn save_from_response(&self, _url: &Url, cookies: &[CanonicalCookie]) -> Result<(), NetError> {
        for cookie in cookies {
            self.set_cookie(cookie.clone());
        }
        Ok(())
    }

    fn load_for_request(&self, url: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
        Ok(self.cookies_for_url(url))
    }
}
