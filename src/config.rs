//! Client configuration.
//!
//! Every section has defaults, so a partial document is valid:
//!
//! ```json
//! {
//!   "retry": { "max_retry": 3, "retry_interval_ms": 500 },
//!   "cookie": { "enabled": true, "expire_after_access": "10m" }
//! }
//! ```

use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};

pub use crate::cookies::caching::CookieConfig;
pub use crate::http::gzip::GzipConfig;
pub use crate::http::headers::HeaderConfig;
pub use crate::http::retry::RetryConfig;
pub use crate::http::transport::TransportConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub retry: RetryConfig,
    pub cookie: CookieConfig,
    pub header: HeaderConfig,
    pub gzip: GzipConfig,
    pub transport: TransportConfig,
}

impl ClientConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, NetError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NetError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NetError> {
        if self.cookie.enabled && self.cookie.maximum_size == 0 {
            return Err(NetError::config("cookie.maximum_size must be positive"));
        }
        if self.transport.connect_timeout.is_zero() {
            return Err(NetError::config("transport.connect_timeout must be positive"));
        }
        self.header.to_headers()?;
        Ok(())
    }
}
