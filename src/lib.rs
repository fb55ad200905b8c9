//! # chainnet
//!
//! An interceptor-based HTTP client core with bounded retry and layered
//! cookie storage.
//!
//! ## Features
//!
//! - **Interceptor chain**: ordered request stages in front of a transport;
//!   a stage may call the rest of the chain several times
//! - **Retry**: fixed-interval retry of failed or non-2xx calls, bounded per
//!   logical request, with cancellable waits
//! - **Cookies**: RFC 6265 parsing with PSL validation, a layered store that
//!   isolates backend failures, and a size- and time-bounded cache
//! - **Request shaping**: default browser headers and gzip request bodies
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chainnet::config::ClientConfig;
//! use chainnet::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut config = ClientConfig::default();
//!     config.retry.max_retry = 3;
//!     config.cookie.enabled = true;
//!
//!     let client = Client::from_config(config).unwrap();
//!     let response = client.get("http://example.com/").send().await.unwrap();
//!     println!("Status: {}", response.status());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`config`] - Serde configuration for the client
//! - [`cookies`] - Cookie parsing, jars and the cookie interceptor
//! - [`http`] - Requests, responses, the interceptor chain, retry and transport

pub mod base;
pub mod client;
pub mod config;
pub mod cookies;
pub mod http;

pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder, RequestBuilder};
