//! Download orchestrator: turns descriptors into saved files.
//!
//! Assets are processed one at a time in input order, with a fixed pause
//! after each so the host's save facility never sees a burst. Batches do not
//! overlap: a second `run` waits until the one in progress has finished. One asset's
//! failure is recorded in its result and the batch moves on; nothing aborts
//! a batch once it has started.

mod resolve;

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PagegrabConfig;
use crate::formatter::Formatter;
use crate::host::{Fetcher, HandleStore, SaveHost, SaveRequest, SaveSource};
use crate::model::{AssetDescriptor, BatchReport, DownloadOptions, DownloadResult};

use resolve::{resolve, Resolved};

/// Fixed parameters of a batch run.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Destination subfolder under the host download location.
    pub subfolder: String,
    /// Pause after each asset.
    pub pace: Duration,
    /// How long a content handle outlives its save call.
    pub handle_grace: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&PagegrabConfig::default())
    }
}

impl From<&PagegrabConfig> for OrchestratorSettings {
    fn from(cfg: &PagegrabConfig) -> Self {
        Self {
            subfolder: cfg.subfolder.clone(),
            pace: cfg.pace(),
            handle_grace: cfg.handle_grace(),
        }
    }
}

pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    saver: Arc<dyn SaveHost>,
    handles: HandleStore,
    formatter: Formatter,
    settings: OrchestratorSettings,
    batch: tokio::sync::Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        saver: Arc<dyn SaveHost>,
        handles: HandleStore,
        formatter: Formatter,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            fetcher,
            saver,
            handles,
            formatter,
            settings,
            batch: tokio::sync::Mutex::new(()),
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Saves every asset and reports per-asset results in input order.
    pub async fn run(&self, assets: &[AssetDescriptor], options: &DownloadOptions) -> BatchReport {
        let _batch = self.batch.lock().await;
        tracing::info!(
            assets = assets.len(),
            beautify = options.beautify_scripts,
            "batch started"
        );
        let mut results = Vec::with_capacity(assets.len());
        for asset in assets {
            let result = match self.save_one(asset, options).await {
                Ok(name) => {
                    tracing::info!(name = %name, kind = ?asset.kind, "asset saved");
                    DownloadResult::saved(name)
                }
                Err(e) => {
                    tracing::warn!(name = %asset.suggested_name, error = %format!("{:#}", e), "asset failed");
                    DownloadResult::failed(format!("{:#}", e))
                }
            };
            results.push(result);
            if !self.settings.pace.is_zero() {
                tokio::time::sleep(self.settings.pace).await;
            }
        }

        let report = BatchReport::from(results);
        tracing::info!(
            total = report.summary.total,
            successful = report.summary.successful,
            failed = report.summary.failed,
            "batch finished"
        );
        report
    }

    /// Resolves, materializes, and saves one asset; returns the saved name.
    async fn save_one(
        &self,
        asset: &AssetDescriptor,
        options: &DownloadOptions,
    ) -> anyhow::Result<String> {
        let name = asset.safe_name();
        let resolved = resolve(
            asset,
            options.beautify_scripts,
            self.fetcher.as_ref(),
            &self.formatter,
        )
        .await;

        // The lease lives until this function returns on any path; its drop
        // schedules the handle's release after the grace period.
        let (source, _lease) = match resolved {
            Resolved::Content(text) => {
                let lease = self.handles.lease(text, self.settings.handle_grace);
                (SaveSource::Handle(lease.handle().clone()), Some(lease))
            }
            Resolved::Reference(url) => (SaveSource::Reference(url), None),
        };

        let destination = PathBuf::from(&self.settings.subfolder).join(&name);
        let path = self
            .saver
            .save(SaveRequest::unattended(source, destination))
            .await
            .with_context(|| format!("save {}", name))?;
        tracing::debug!(name = %name, path = %path.display(), "save complete");
        Ok(name)
    }
}
