//! This module provides the HTTP client used for outbound delivery.
//!
//! Delivery is a single bounded attempt by contract, so the client carries a
//! request timeout but no retry middleware.

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

/// Creates the outbound HTTP client with a bounded per-request timeout.
///
/// # Parameters:
/// - `request_timeout`: Upper bound on a single delivery attempt, including
///   connect time.
///
/// # Returns
/// A `ClientWithMiddleware`, or the underlying build error.
pub fn create_http_client(
    request_timeout: Duration,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let base_client = reqwest::Client::builder().timeout(request_timeout).build()?;
    Ok(ClientBuilder::new(base_client).build())
}
