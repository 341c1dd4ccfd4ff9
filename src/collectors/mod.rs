//! Per-site collectors and the sequential collection session.

pub mod autoscout;
pub mod kleinanzeigen;
pub mod links;
pub mod session;
pub mod traits;
pub mod types;

pub use autoscout::{AutoScoutCollector, Market};
pub use kleinanzeigen::KleinanzeigenCollector;
pub use session::CollectionSession;
pub use traits::Collector;
pub use types::SearchQuery;

use crate::config::ScrapingConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// HTTP client shared by all collectors: fixed user agent, per-request
/// timeout after which the request is abandoned.
pub fn http_client(scraping: &ScrapingConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(scraping.request_timeout_secs))
        .user_agent(scraping.user_agent.clone())
        .build()
        .context("Failed to create HTTP client")
}
