// Source adapters: one per upstream origin of player statistics.
//
// Every adapter returns either a non-empty batch of raw records or a typed
// `SourceError`. Partial results are never returned; the aggregator treats a
// batch as a unit.

pub mod espn;
pub mod nba_stats;
pub mod reference;
pub mod synthetic;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use hoopscope_core::config::SourcesConfig;
use hoopscope_core::{Scope, Season, SourceKind};

pub use espn::EspnAdapter;
pub use nba_stats::NbaStatsAdapter;
pub use reference::ReferenceAdapter;
pub use synthetic::SyntheticAdapter;

/// Source-specific record shape: field name to value, exactly as the
/// upstream reported it. Only the normalizer looks inside.
pub type RawRecord = serde_json::Value;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why an adapter produced no records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("source did not answer within {0:?}")]
    TimedOut(Duration),

    #[error("network error: {0}")]
    Transport(String),

    #[error("source returned status {0}")]
    HttpStatus(u16),

    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),

    #[error("source returned no records")]
    Empty,

    #[error("source is not configured")]
    NotConfigured,
}

impl SourceError {
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            SourceError::TimedOut(timeout)
        } else if let Some(status) = err.status() {
            SourceError::HttpStatus(status.as_u16())
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter capability
// ---------------------------------------------------------------------------

/// Fetch raw player records for a scope and season.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Non-empty batch, or the reason there is none. Adapters that cannot
    /// narrow by scope upstream return the league and let the aggregator
    /// filter.
    async fn fetch(
        &self,
        scope: &Scope,
        season: &Season,
        timeout: Duration,
    ) -> Result<Vec<RawRecord>, SourceError>;
}

/// Build adapters for `config.effective_order()`, highest priority first.
pub fn build_adapters(config: &SourcesConfig) -> Vec<Box<dyn SourceAdapter>> {
    let http = http_client();
    config
        .effective_order()
        .into_iter()
        .map(|kind| -> Box<dyn SourceAdapter> {
            match kind {
                SourceKind::Primary => Box::new(NbaStatsAdapter::new(
                    http.clone(),
                    config
                        .primary_url
                        .clone()
                        .unwrap_or_else(|| nba_stats::DEFAULT_URL.to_string()),
                )),
                SourceKind::Secondary => Box::new(ReferenceAdapter::new(
                    http.clone(),
                    config.secondary_location.clone(),
                )),
                SourceKind::Tertiary => Box::new(EspnAdapter::new(
                    http.clone(),
                    config
                        .tertiary_url
                        .clone()
                        .unwrap_or_else(|| espn::DEFAULT_URL.to_string()),
                )),
                SourceKind::Synthetic => Box::new(SyntheticAdapter::new()),
            }
        })
        .collect()
}

/// Shared HTTP client. The official stats API refuses requests that do not
/// look like they came from a browser.
fn http_client() -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        reqwest::header::REFERER,
        reqwest::header::HeaderValue::from_static("https://www.nba.com/stats/"),
    );
    reqwest::Client::builder()
        .user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )
        .default_headers(headers)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// GET `url` with `query` and return the body text, mapping failures onto
/// `SourceError`.
pub(crate) async fn get_text(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
    timeout: Duration,
) -> Result<String, SourceError> {
    let response = http
        .get(url)
        .query(query)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| SourceError::from_reqwest(&e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus(status.as_u16()));
    }
    response
        .text()
        .await
        .map_err(|e| SourceError::from_reqwest(&e, timeout))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
