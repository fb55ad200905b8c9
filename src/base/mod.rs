//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): Network error codes modeled on Chromium's `net_error_list.h`

pub mod neterror;

#[cfg(test)]
mod tests;
