//! Public Suffix List (PSL) checks for cookie `Domain` attributes.
//!
//! A server may not scope a cookie to a public suffix such as `com` or
//! `co.uk`; such cookies would leak to every site under that suffix.

use psl::{List, Psl};

/// Whether `domain` is itself a public suffix (e.g. "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_lowercase();
    List.suffix(domain.as_bytes())
        .is_some_and(|suffix| suffix.as_bytes() == domain.as_bytes())
}

/// Whether a `Set-Cookie` from `url_host` may use `cookie_domain`: the host
/// must equal or be a subdomain of it, and it must not be a public suffix
/// (unless it is the host itself).
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.').to_lowercase();
    let url_host = url_host.to_lowercase();

    if url_host == cookie_domain {
        return true;
    }
    if is_public_suffix(&cookie_domain) {
        return false;
    }
    url_host.ends_with(&format!(".{}", cookie_domain))
}
