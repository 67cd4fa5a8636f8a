//! HTTP client factory with consistent timeout configuration.
//!
//! Outbound clients (Stripe, OpenAI) are built here rather than with
//! `reqwest::Client::new()` so every external call has a bounded duration.

use reqwest::Client;
use std::time::Duration;

/// Default connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout (total request/response time).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Model completions can take longer than a billing API call.
pub const COMPLETION_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub fn try_build_client() -> Result<Client, reqwest::Error> {
    try_build_client_with_timeout(DEFAULT_REQUEST_TIMEOUT)
}

pub fn try_build_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
}
