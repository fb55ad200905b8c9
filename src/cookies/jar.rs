//! The cookie jar abstraction.

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use url::Url;

/// Storage consulted before a request and updated after a response.
///
/// Implementations must tolerate concurrent calls from many in-flight
/// requests. Errors are reported per call; composers such as
/// [`LayeredCookieStore`](crate::cookies::layered::LayeredCookieStore)
/// decide whether to recover from them.
pub trait CookieJar: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Store cookies received in a response for `url`.
    fn save_from_response(&self, url: &Url, cookies: &[CanonicalCookie]) -> Result<(), NetError>;

    /// Cookies to attach to a request for `url`.
    fn load_for_request(&self, url: &Url) -> Result<Vec<CanonicalCookie>, NetError>;
}

/// A jar that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCookies;

impl CookieJar for NoCookies {
    fn name(&self) -> &str {
        "no-cookies"
    }

    fn save_from_response(&self, _url: &Url, _cookies: &[CanonicalCookie]) -> Result<(), NetError> {
        Ok(())
    }

    fn load_for_request(&self, _url: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
        Ok(Vec::new())
    }
}

impl<J: CookieJar + ?Sized> CookieJar for std::sync::Arc<J> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn save_from_response(&self, url: &Url, cookies: &[CanonicalCookie]) -> Result<(), NetError> {
        (**self).save_from_response(url, cookies)
    }

    fn load_for_request(&self, url: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
        (**self).load_for_request(url)
    }
}
