use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Transport Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Empty response")]
    EmptyResponse,

    // Request lifecycle
    #[error("Request cancelled")]
    Cancelled,

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Invalid header value for {name}")]
    InvalidHeaderValue { name: String },
    #[error("Content encoding failed")]
    ContentEncodingFailed,
    #[error("JSON parse failed")]
    JsonParseFailed,
    #[error("Request body encoding failed: {message}")]
    BodyEncodeFailed { message: String },

    // Cookie Errors
    #[error("Cookie prefix validation failed")]
    CookieInvalidPrefix,
    #[error("Cookie domain is a public suffix")]
    CookiePublicSuffix,
    #[error("Cookie parse failed")]
    CookieParseFailed,
    #[error("Cookie store '{backend}' failed: {message}")]
    CookieStore { backend: String, message: String },

    // Configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Build a `ConnectionFailed` error from any displayable cause.
    pub fn connection_failed(cause: impl std::fmt::Display) -> Self {
        NetError::ConnectionFailed {
            message: cause.to_string(),
        }
    }

    /// Build a `CookieStore` error naming the failing backend.
    pub fn cookie_store(backend: impl Into<String>, message: impl Into<String>) -> Self {
        NetError::CookieStore {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        NetError::Config {
            message: message.into(),
        }
    }

    /// Whether the error was raised by the transport (and is therefore
    /// eligible for a retry).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NetError::ConnectionClosed
                | NetError::ConnectionReset
                | NetError::ConnectionRefused
                | NetError::ConnectionAborted
                | NetError::ConnectionFailed { .. }
                | NetError::NameNotResolved
                | NetError::ConnectionTimedOut
                | NetError::EmptyResponse
        )
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Cancelled => -3,
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed { .. } => -104,
            NetError::NameNotResolved => -105,
            NetError::ConnectionTimedOut => -118,

            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::InvalidResponse => -320,
            NetError::EmptyResponse => -324,
            NetError::ContentEncodingFailed => -330,
            // Crate-specific errors (custom codes starting at -10000)
            NetError::CookieInvalidPrefix => -10000,
            NetError::CookiePublicSuffix => -10001,
            NetError::CookieParseFailed => -10002,
            NetError::CookieStore { .. } => -10003,
            NetError::InvalidHeaderValue { .. } => -10004,
            NetError::Config { .. } => -10005,
            NetError::JsonParseFailed => -10006,
            NetError::BodyEncodeFailed { .. } => -10007,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -3 => NetError::Cancelled,
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -105 => NetError::NameNotResolved,
            -118 => NetError::ConnectionTimedOut,
            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -320 => NetError::InvalidResponse,
            -324 => NetError::EmptyResponse,
            -330 => NetError::ContentEncodingFailed,
            -10000 => NetError::CookieInvalidPrefix,
            -10001 => NetError::CookiePublicSuffix,
            -10002 => NetError::CookieParseFailed,
            -10006 => NetError::JsonParseFailed,
            _ => NetError::Unknown(code),
        }
    }
}

impl From<std::io::Error> for NetError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
            ErrorKind::ConnectionReset => NetError::ConnectionReset,
            ErrorKind::ConnectionAborted => NetError::ConnectionAborted,
            ErrorKind::TimedOut => NetError::ConnectionTimedOut,
            ErrorKind::UnexpectedEof => NetError::EmptyResponse,
            _ => NetError::connection_failed(err),
        }
    }
}

impl From<url::ParseError> for NetError {
    fn from(_: url::ParseError) -> Self {
        NetError::InvalidUrl
    }
}
