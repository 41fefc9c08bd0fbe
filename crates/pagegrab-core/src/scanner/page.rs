//! The page context's loaded document.

use url::Url;

use crate::host::{FetchError, Fetcher};

/// A loaded page: its address and its full serialized markup.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    url: Url,
    markup: String,
}

impl PageSnapshot {
    pub fn new(url: Url, markup: impl Into<String>) -> Self {
        Self {
            url,
            markup: markup.into(),
        }
    }

    /// Loads the page the way a tab would: one GET, markup taken as-is.
    pub async fn load(url: Url, fetcher: &dyn Fetcher) -> Result<Self, FetchError> {
        let markup = fetcher.fetch_text(url.as_str()).await?.into_success()?;
        tracing::info!(page = %url, bytes = markup.len(), "page loaded");
        Ok(Self { url, markup })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}
