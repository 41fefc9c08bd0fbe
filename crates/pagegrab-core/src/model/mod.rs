//! Asset descriptor model shared by every execution context.
//!
//! Descriptors, options, and results are plain values: each message exchange
//! copies them, so no state is shared between the scanner and the orchestrator.

mod descriptor;
mod result;

pub use descriptor::{AssetDescriptor, AssetKind, AssetOrigin};
pub use result::{BatchReport, BatchSummary, DownloadResult};

use serde::{Deserialize, Serialize};

/// Options for a page scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    /// Emit a descriptor for each non-blank inline `<script>`.
    pub include_inline_scripts: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_inline_scripts: true,
        }
    }
}

/// Options for a download batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadOptions {
    /// Pass script content through the formatter before saving.
    pub beautify_scripts: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            beautify_scripts: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_true() {
        assert!(ScanOptions::default().include_inline_scripts);
        assert!(DownloadOptions::default().beautify_scripts);
    }

    #[test]
    fn options_missing_fields_use_defaults() {
        let scan: ScanOptions = serde_json::from_str("{}").unwrap();
        assert!(scan.include_inline_scripts);
        let dl: DownloadOptions = serde_json::from_str(r#"{"beautifyScripts":false}"#).unwrap();
        assert!(!dl.beautify_scripts);
    }
}
