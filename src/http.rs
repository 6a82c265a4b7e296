use crate::config::HttpTimeouts;
use reqwest::Client;

/// Shared client for analysis and catalog calls. The request timeout bounds
/// every outbound call; exceeding it surfaces as a dependency timeout.
pub fn build_client(timeouts: &HttpTimeouts) -> Client {
    Client::builder()
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .build()
        .unwrap_or_else(|_| Client::new())
}
