use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Upper bound on any single provider call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Global shared HTTP client singleton.
///
/// `Client::clone()` is just an `Arc` increment, so provider clients each
/// hold a clone and add their own headers per request.
static SHARED_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            log::error!("Failed to build HTTP client ({}), using defaults", e);
            Client::new()
        })
});

/// Returns a reference to the global shared HTTP client.
pub fn shared_client() -> &'static Client {
    &SHARED_CLIENT
}
