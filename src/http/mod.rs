pub mod gzip;
pub mod headers;
pub mod interceptor;
pub mod request;
pub mod response;
pub mod retry;
pub mod retrystate;
pub mod transport;

// Re-exports for convenience
pub use interceptor::{HttpResult, Interceptor, InterceptorChain, Next, Transport};
pub use request::{HttpRequest, RequestKey};
pub use response::HttpResponse;
pub use retry::{RetryConfig, RetryInterceptor};
