//! HTTP client for fetching timetable pages.
//!
//! The page is a plain GET; no session or cookies are involved. Retry policy
//! belongs to the caller, so every failure is returned as-is.

use super::config::FetchConfig;
use super::error::IngestError;
use rand::Rng;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Client for downloading the HTML of a schedule page.
pub struct ScheduleClient {
    client: Client,
    base_url: Option<Url>,
}

impl ScheduleClient {
    /// Creates a new client from the fetch section of the configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, IngestError> {
        let client = Client::builder()
            .redirect(Policy::limited(10))
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IngestError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let base_url = config.base_url.as_deref().map(Url::parse).transpose()?;

        Ok(Self { client, base_url })
    }

    /// Resolves a schedule URL, joining relative ones onto the base URL.
    pub fn resolve_url(&self, url: &str) -> Result<Url, IngestError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => Ok(base.join(url)?),
                None => Err(IngestError::UrlError {
                    message: format!("Relative schedule URL `{}` but no base URL configured", url),
                }),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches the HTML of a schedule page.
    pub async fn fetch_page(&self, url: &str) -> Result<String, IngestError> {
        let correlation_id = generate_correlation_id();
        let url = self.resolve_url(url)?;
        let start = Instant::now();

        info!(
            correlation_id = %correlation_id,
            url = %url,
            "Fetching schedule page"
        );

        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(
                correlation_id = %correlation_id,
                url = %url,
                status = %status,
                "Schedule page request failed"
            );
            return Err(IngestError::UnexpectedResponse {
                message: format!("{} returned status {}", url, status),
            });
        }

        let html = response.text().await?;

        debug!(
            correlation_id = %correlation_id,
            html_len = html.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched schedule page"
        );

        Ok(html)
    }
}

/// Generates a unique correlation ID for request tracing.
pub(crate) fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
