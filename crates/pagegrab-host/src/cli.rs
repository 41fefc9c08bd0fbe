use anyhow::{Context, Result};
use clap::Parser;
use pagegrab_core::config::{self, PagegrabConfig};
use pagegrab_core::context::{BackgroundContext, PageContext};
use pagegrab_core::formatter::{Formatter, FormatterEngine};
use pagegrab_core::host::{CurlFetcher, FsSaveHost, HandleStore};
use pagegrab_core::orchestrator::{Orchestrator, OrchestratorSettings};
use pagegrab_core::router::{spawn_router, RouterClient};
use pagegrab_core::scanner::PageSnapshot;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use pagegrab_host::socket::{spawn_socket_server, Routes};

/// Background context for pagegrab: serves scan, download and beautify
/// requests on a Unix socket.
#[derive(Debug, Parser)]
#[command(name = "pagegrab-host")]
#[command(about = "pagegrab: capture a web page's HTML, scripts and frames", long_about = None)]
pub struct Cli {
    /// Router socket path (overrides `socket_path` in config.toml).
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Load this page and also serve `scanAssets` for it.
    #[arg(long)]
    pub page: Option<Url>,

    /// Alternate config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        Cli::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let cfg = match &self.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        let socket_path = match self.socket {
            Some(p) => p,
            None => cfg.resolved_socket_path()?,
        };

        let fetcher = Arc::new(CurlFetcher::new(cfg.fetch_timeout()));
        let page = match self.page {
            Some(url) => Some(load_page(url, fetcher.as_ref()).await?),
            None => None,
        };

        let routes = Routes {
            background: background_context(&cfg, fetcher)?,
            page,
        };
        let server = spawn_socket_server(routes, &socket_path)?;

        tokio::select! {
            res = server => res.context("router socket task")?,
            res = tokio::signal::ctrl_c() => {
                res.context("wait for ctrl-c")?;
                tracing::info!("shutting down");
            }
        }
        let _ = std::fs::remove_file(&socket_path);
        Ok(())
    }
}

fn background_context(cfg: &PagegrabConfig, fetcher: Arc<CurlFetcher>) -> Result<RouterClient> {
    let download_dir = cfg.resolved_download_dir()?;
    tracing::info!(dir = %download_dir.display(), subfolder = %cfg.subfolder, "download location");

    let handles = HandleStore::new();
    let saver = FsSaveHost::new(download_dir, handles.clone(), cfg.fetch_timeout());

    let engine = FormatterEngine::unavailable();
    // Requests arriving before discovery finishes use heuristic formatting.
    drop(engine.spawn_discovery(&cfg.beautifier));

    let orchestrator = Orchestrator::new(
        fetcher,
        Arc::new(saver),
        handles,
        Formatter::new(engine),
        OrchestratorSettings::from(cfg),
    );
    Ok(spawn_router(Arc::new(BackgroundContext::new(Arc::new(
        orchestrator,
    )))))
}

async fn load_page(url: Url, fetcher: &CurlFetcher) -> Result<RouterClient> {
    let snapshot = PageSnapshot::load(url.clone(), fetcher)
        .await
        .with_context(|| format!("load page {}", url))?;
    tracing::info!(url = %url, bytes = snapshot.markup().len(), "page context loaded");
    Ok(spawn_router(Arc::new(PageContext::new(snapshot))))
}
