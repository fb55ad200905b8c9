use crate::base::neterror::NetError;
use crate::cookies::psl;
use time::OffsetDateTime;
use url::Url;

/// Longest lifetime a server may give a cookie, as Chromium caps it.
pub const MAX_COOKIE_AGE: time::Duration = time::Duration::days(400);

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    /// `None` for session cookies, which never expire by time.
    pub expiration_time: Option<OffsetDateTime>,
    pub last_access_time: OffsetDateTime,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub same_site: SameSite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

impl CanonicalCookie {
    /// Host-only session cookie with path `/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into().to_lowercase(),
            path: "/".to_string(),
            creation_time: now,
            expiration_time: None,
            last_access_time: now,
            secure: false,
            http_only: false,
            host_only: true,
            same_site: SameSite::Unspecified,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_expiration(mut self, expires: OffsetDateTime) -> Self {
        self.expiration_time = Some(expires);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Make this a domain cookie (also sent to subdomains).
    pub fn with_domain_scope(mut self) -> Self {
        self.host_only = false;
        self
    }

    /// A cookie is expired once its expiry instant is at or before `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiration_time.is_some_and(|expiry| expiry <= now)
    }

    /// Whether this cookie should be sent with a request to `url`
    /// (RFC 6265 domain, path and secure rules; expiry not considered).
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if !domain_matches(&self.domain, host, self.host_only) {
            return false;
        }
        if !path_matches(&self.path, url.path()) {
            return false;
        }
        !self.secure || url.scheme() == "https"
    }

    /// Parse a `Set-Cookie` header value received from `url`.
    ///
    /// `Max-Age` takes precedence over `Expires`. An explicit `Domain` must
    /// domain-match the URL host and must not be a public suffix.
    pub fn parse(url: &Url, line: &str) -> Result<Self, NetError> {
        let parsed = cookie::Cookie::parse(line).map_err(|_| NetError::CookieParseFailed)?;
        let host = url.host_str().ok_or(NetError::InvalidUrl)?.to_lowercase();
        let now = OffsetDateTime::now_utc();

        let (domain, host_only) = match parsed.domain() {
            Some(d) if !d.trim_start_matches('.').is_empty() => {
                let d = d.trim_start_matches('.').to_lowercase();
                if psl::is_public_suffix(&d) && d != host {
                    return Err(NetError::CookiePublicSuffix);
                }
                if !psl::is_valid_cookie_domain(&d, &host) {
                    return Err(NetError::CookieParseFailed);
                }
                (d, false)
            }
            _ => (host, true),
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(url.path()),
        };

        let latest = now + MAX_COOKIE_AGE;
        let expiration_time = match parsed.max_age() {
            Some(max_age) if max_age <= time::Duration::ZERO => Some(OffsetDateTime::UNIX_EPOCH),
            Some(max_age) => Some(now.checked_add(max_age).map_or(latest, |t| t.min(latest))),
            None => parsed.expires().and_then(|e| e.datetime()).map(|t| t.min(latest)),
        };

        let same_site = match parsed.same_site() {
            Some(cookie::SameSite::Lax) => SameSite::Lax,
            Some(cookie::SameSite::Strict) => SameSite::Strict,
            Some(cookie::SameSite::None) => SameSite::NoRestriction,
            None => SameSite::Unspecified,
        };

        let c = CanonicalCookie {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            creation_time: now,
            expiration_time,
            last_access_time: now,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
            same_site,
        };
        c.validate_prefix(url.scheme() == "https")?;
        Ok(c)
    }

    /// Validate __Secure- and __Host- cookie prefixes per RFC 6265bis.
    /// - __Secure- cookies MUST have the Secure attribute
    /// - __Host- cookies MUST have Secure, Path="/", and no Domain attribute
    pub fn validate_prefix(&self, secure_origin: bool) -> Result<(), NetError> {
        if self.name.starts_with("__Secure-") && (!self.secure || !secure_origin) {
            return Err(NetError::CookieInvalidPrefix);
        }

        if self.name.starts_with("__Host-")
            && (!self.secure || self.path != "/" || !self.host_only || !secure_origin)
        {
            return Err(NetError::CookieInvalidPrefix);
        }

        Ok(())
    }

    /// `name=value` pair as sent in a `Cookie` header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Render cookies as a single `Cookie` header value.
pub fn cookie_header(cookies: &[CanonicalCookie]) -> String {
    cookies
        .iter()
        .map(CanonicalCookie::pair)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check if cookie domain matches request host.
/// Implements RFC 6265 domain matching.
pub fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
    if host_only {
        return cookie_domain.eq_ignore_ascii_case(request_host);
    }

    let cookie_domain = cookie_domain.trim_start_matches('.');
    if request_host.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }

    let host = request_host.as_bytes();
    let domain = cookie_domain.as_bytes();
    host.len() > domain.len()
        && host[host.len() - domain.len()..].eq_ignore_ascii_case(domain)
        && host[host.len() - domain.len() - 1] == b'.'
}

/// Check if request path matches cookie path.
/// Implements RFC 6265 path matching.
pub fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }

    match request_path.strip_prefix(cookie_path) {
        Some(rest) => cookie_path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// RFC 6265 default-path: the request path up to (excluding) its last `/`.
fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}
