//! Execution contexts and the UI-side controller.
//!
//! The page context owns the loaded document and answers `scanAssets`; the
//! background context owns the orchestrator (and with it the formatter) and
//! answers `downloadAssets` and `beautifyJs`. The controller drives one
//! scan-then-download round trip through their router clients.

use async_trait::async_trait;
use std::sync::Arc;

use crate::model::BatchReport;
use crate::orchestrator::Orchestrator;
use crate::preferences::{PreferenceStore, Preferences};
use crate::router::{self, Handler, Payload, Request, RouterClient, RouterError, TransportError};
use crate::scanner::{scan, PageSnapshot};

pub struct PageContext {
    page: PageSnapshot,
}

impl PageContext {
    pub fn new(page: PageSnapshot) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &PageSnapshot {
        &self.page
    }
}

#[async_trait]
impl Handler for PageContext {
    async fn handle(&self, request: Request) -> anyhow::Result<Payload> {
        match request {
            Request::ScanAssets { options } => {
                let assets = scan(&self.page, &options);
                tracing::debug!(url = %self.page.url(), count = assets.len(), "scan complete");
                Ok(Payload::Assets { assets })
            }
            other => Err(router::unsupported(&other)),
        }
    }
}

pub struct BackgroundContext {
    orchestrator: Arc<Orchestrator>,
}

impl BackgroundContext {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl Handler for BackgroundContext {
    async fn handle(&self, request: Request) -> anyhow::Result<Payload> {
        match request {
            Request::DownloadAssets { assets, options } => {
                let report = self.orchestrator.run(&assets, &options).await;
                Ok(Payload::Downloaded {
                    results: report.results,
                    summary: report.summary,
                })
            }
            Request::BeautifyJs { code } => {
                let code = self.orchestrator.formatter().format(&code).await;
                Ok(Payload::Code { code })
            }
            other => Err(router::unsupported(&other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("no assets found on the page")]
    EmptyScan,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected reply to {0}")]
    UnexpectedReply(&'static str),
}

impl From<RouterError> for ControllerError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::Transport(t) => ControllerError::Transport(t),
            RouterError::Rejected(msg) => ControllerError::Rejected(msg),
        }
    }
}

/// UI-side driver: scan the page, then hand the descriptors to the background.
pub struct Controller {
    prefs: Arc<dyn PreferenceStore>,
}

impl Controller {
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs }
    }

    fn preferences(&self) -> Preferences {
        self.prefs.load().unwrap_or_else(|e| {
            tracing::warn!(error = %format!("{:#}", e), "preferences unreadable, using defaults");
            Preferences::default()
        })
    }

    /// One scan-and-download round trip. Per-asset failures only show up in
    /// the returned summary.
    pub async fn collect(
        &self,
        page: &RouterClient,
        background: &RouterClient,
    ) -> Result<BatchReport, ControllerError> {
        let prefs = self.preferences();

        let assets = match page
            .call(Request::ScanAssets {
                options: prefs.scan_options(),
            })
            .await?
        {
            Payload::Assets { assets } => assets,
            _ => return Err(ControllerError::UnexpectedReply("scanAssets")),
        };
        if assets.is_empty() {
            return Err(ControllerError::EmptyScan);
        }
        tracing::info!(count = assets.len(), "scanned assets, starting download");

        match background
            .call(Request::DownloadAssets {
                assets,
                options: prefs.download_options(),
            })
            .await?
        {
            Payload::Downloaded { results, summary } => {
                tracing::info!(
                    total = summary.total,
                    successful = summary.successful,
                    failed = summary.failed,
                    "download finished"
                );
                Ok(BatchReport { results, summary })
            }
            _ => Err(ControllerError::UnexpectedReply("downloadAssets")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::Formatter;
    use crate::host::{FetchError, FetchedText, Fetcher, HandleStore, SaveError, SaveHost, SaveRequest};
    use crate::model::{AssetKind, ScanOptions};
    use crate::orchestrator::OrchestratorSettings;
    use crate::preferences::{MemoryPreferenceStore, PreferenceKey};
    use crate::router::spawn_router;
    use std::path::PathBuf;
    use std::time::Duration;
    use url::Url;

    struct NoNetwork;

    #[async_trait]
    impl Fetcher for NoNetwork {
        async fn fetch_text(&self, _url: &str) -> Result<FetchedText, FetchError> {
            Err(FetchError::Task("offline".into()))
        }
    }

    struct AcceptAll;

    #[async_trait]
    impl SaveHost for AcceptAll {
        async fn save(&self, request: SaveRequest) -> Result<PathBuf, SaveError> {
            Ok(request.destination)
        }
    }

    fn background() -> RouterClient {
        let orch = Orchestrator::new(
            Arc::new(NoNetwork),
            Arc::new(AcceptAll),
            HandleStore::new(),
            Formatter::heuristic_only(),
            OrchestratorSettings {
                pace: Duration::ZERO,
                handle_grace: Duration::ZERO,
                ..Default::default()
            },
        );
        spawn_router(Arc::new(BackgroundContext::new(Arc::new(orch))))
    }

    fn page(markup: &str) -> RouterClient {
        let url = Url::parse("https://example.com/docs/page.html").unwrap();
        spawn_router(Arc::new(PageContext::new(PageSnapshot::new(url, markup))))
    }

    #[tokio::test]
    async fn page_context_serves_scan_only() {
        let client = page("<html><body><script>x()</script></body></html>");
        let payload = client
            .call(Request::ScanAssets {
                options: ScanOptions::default(),
            })
            .await
            .unwrap();
        let Payload::Assets { assets } = payload else {
            panic!("expected assets");
        };
        assert_eq!(assets[0].kind, AssetKind::PageHtml);
        assert_eq!(assets.len(), 2);

        let err = client
            .call(Request::BeautifyJs { code: "a;".into() })
            .await
            .unwrap_err();
        assert_eq!(err, RouterError::Rejected("unsupported action: beautifyJs".into()));
    }

    #[tokio::test]
    async fn background_beautifies() {
        let payload = background()
            .call(Request::BeautifyJs { code: "a();b();".into() })
            .await
            .unwrap();
        assert_eq!(payload, Payload::Code { code: "a();\nb();\n".into() });
    }

    #[tokio::test]
    async fn collect_honours_stored_preferences() {
        let mut prefs = Preferences::default();
        prefs.set(PreferenceKey::IncludeInlineScripts, false);
        let controller = Controller::new(Arc::new(MemoryPreferenceStore::new(prefs)));

        let report = controller
            .collect(
                &page("<html><head><script>one()</script><script>two()</script></head></html>"),
                &background(),
            )
            .await
            .unwrap();

        assert_eq!(report.summary.total, 1);
        assert_eq!(report.results[0].saved_name.as_deref(), Some("page.html"));
    }

    #[tokio::test]
    async fn collect_reports_transport_failure() {
        let controller = Controller::new(Arc::new(MemoryPreferenceStore::default()));
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        drop(rx);
        let dead = RouterClient::from_sender(tx);
        let err = controller.collect(&dead, &background()).await.unwrap_err();
        assert!(matches!(err, ControllerError::Transport(TransportError::Disconnected)));
    }
}
