use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::model::Benefit;
use crate::parser;

/// Public CSV export of the benefits sheet.
pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1-OhoadrXgz-FJZAgB_43Vdm8TXwgzaEL5pZi40pY0-w/export?format=csv&gid=0";

const USER_AGENT: &str = "AM-Kelavi-Benefits/1.0";
const MAX_ERROR_BODY_BYTES: usize = 2 * 1024;

#[derive(Clone, Debug)]
pub struct SheetClientConfig {
    pub sheet_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_document_bytes: usize,
}

impl Default for SheetClientConfig {
    fn default() -> Self {
        Self {
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            timeout: Duration::from_secs(20),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(2_000),
            max_document_bytes: 16 * 1024 * 1024,
        }
    }
}

impl SheetClientConfig {
    /// Load the fetch configuration from environment variables.
    ///
    /// Optional:
    /// - `BENEFITS_SHEET_URL`: CSV export URL of the sheet
    /// - `BENEFITS_FETCH_TIMEOUT_SECS`: per-attempt timeout
    /// - `BENEFITS_FETCH_MAX_RETRIES`: retries after the first attempt (0 disables)
    /// - `BENEFITS_FETCH_RETRY_INITIAL_MS` / `BENEFITS_FETCH_RETRY_MAX_MS`: backoff bounds
    /// - `BENEFITS_MAX_DOCUMENT_BYTES`: largest accepted document
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let sheet_url = std::env::var("BENEFITS_SHEET_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.sheet_url);

        let timeout = std::env::var("BENEFITS_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let max_retries = std::env::var("BENEFITS_FETCH_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_retries);

        let initial_backoff = std::env::var("BENEFITS_FETCH_RETRY_INITIAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.initial_backoff);

        let max_backoff = std::env::var("BENEFITS_FETCH_RETRY_MAX_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_backoff);

        let max_document_bytes = std::env::var("BENEFITS_MAX_DOCUMENT_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_document_bytes);

        Self {
            sheet_url,
            timeout,
            max_retries,
            initial_backoff,
            max_backoff,
            max_document_bytes,
        }
    }
}

/// HTTP client for the published sheet.
///
/// Holds no data between calls: every `fetch_benefits` downloads and parses the
/// document again. Only the connection pool is shared.
#[derive(Clone)]
pub struct SheetClient {
    config: SheetClientConfig,
    http: reqwest::Client,
}

impl SheetClient {
    pub fn new(config: SheetClientConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SheetClientConfig {
        &self.config
    }

    /// Download the sheet and parse it into benefits.
    pub async fn fetch_benefits(&self) -> Result<Vec<Benefit>, SourceError> {
        let text = self.fetch_document().await?;
        let benefits = parser::parse_benefits(&text)?;
        info!(count = benefits.len(), "loaded benefits from sheet");
        Ok(benefits)
    }

    /// Download the raw CSV text, retrying transient failures.
    pub async fn fetch_document(&self) -> Result<String, SourceError> {
        self.request_with_retry(|| async {
            let resp = self
                .http
                .get(&self.config.sheet_url)
                .timeout(self.config.timeout)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = read_limited_text(resp, MAX_ERROR_BODY_BYTES).await;
                return Err(SourceError::Status { status, body });
            }

            read_document(resp, self.config.max_document_bytes).await
        })
        .await
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, SourceError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = f().await;
            match result {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "sheet fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn should_retry(err: &SourceError) -> bool {
    match err {
        SourceError::Fetch(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
        SourceError::Status { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        SourceError::TooLarge { .. } | SourceError::Parse(_) => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    let jitter_ms = pseudo_jitter_ms(jitter_cap);
    Duration::from_millis(capped_ms.saturating_add(jitter_ms))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0));
    let nanos = now.subsec_nanos() as u64;
    nanos % (max_inclusive + 1)
}

/// Stream the body into memory, refusing documents above `max_bytes`.
async fn read_document(resp: reqwest::Response, max_bytes: usize) -> Result<String, SourceError> {
    if resp.content_length().is_some_and(|len| len > max_bytes as u64) {
        return Err(SourceError::TooLarge { limit: max_bytes });
    }

    let mut body: Vec<u8> = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > max_bytes {
            return Err(SourceError::TooLarge { limit: max_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Read at most `max_bytes` of an error body; the rest of the stream is dropped unread.
async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    let mut body: Vec<u8> = Vec::new();
    let mut stream = resp.bytes_stream();
    while body.len() < max_bytes {
        match stream.next().await {
            Some(Ok(chunk)) => {
                let take = std::cmp::min(chunk.len(), max_bytes - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Some(Err(e)) => {
                warn!(error = %e, "failed to read sheet error body");
                if body.is_empty() {
                    return "<failed to read error body>".to_string();
                }
                break;
            }
            None => break,
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
