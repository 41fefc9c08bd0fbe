//! Network fetch capability.
//!
//! Uses the curl crate (libcurl). Transfers run on the blocking pool so the
//! calling context keeps handling other messages while a fetch is in flight.

use async_trait::async_trait;
use std::time::Duration;

/// Failure to obtain a response body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, bad URL, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The response had a non-2xx status.
    #[error("HTTP {0}")]
    Status(u32),
    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Status and decoded body of a GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedText {
    pub status: u32,
    pub body: String,
}

impl FetchedText {
    /// The body if the status is 2xx, otherwise [`FetchError::Status`].
    pub fn into_success(self) -> Result<String, FetchError> {
        if (200..300).contains(&self.status) {
            Ok(self.body)
        } else {
            Err(FetchError::Status(self.status))
        }
    }
}

/// Host network fetch: returns status plus text body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<FetchedText, FetchError>;
}

/// [`Fetcher`] backed by libcurl.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    timeout: Duration,
}

impl CurlFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    async fn fetch_text(&self, url: &str) -> Result<FetchedText, FetchError> {
        let url = url.to_string();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || get_text(&url, timeout))
            .await
            .map_err(|e| FetchError::Task(e.to_string()))?
    }
}

/// Easy handle with the redirect and timeout policy shared by every transfer.
pub(crate) fn easy_for(url: &str, timeout: Duration) -> Result<curl::easy::Easy, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(concat!("pagegrab/", env!("CARGO_PKG_VERSION")))?;
    easy.accept_encoding("")?;
    easy.connect_timeout(Duration::from_secs(15).min(timeout))?;
    easy.timeout(timeout)?;
    Ok(easy)
}

/// Blocking GET returning status and lossily decoded body.
pub fn get_text(url: &str, timeout: Duration) -> Result<FetchedText, FetchError> {
    let mut easy = easy_for(url, timeout)?;
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    let status = easy.response_code()?;
    tracing::debug!(url, status, bytes = body.len(), "fetched");
    Ok(FetchedText {
        status,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
