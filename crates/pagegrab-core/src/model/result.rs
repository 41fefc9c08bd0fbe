//! Per-asset outcomes and their batch aggregate.

use serde::{Deserialize, Serialize};

/// Outcome of saving one asset. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DownloadResult {
    pub fn saved(name: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            saved_name: Some(name.into()),
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            saved_name: None,
            error_message: Some(message.into()),
        }
    }
}

/// Counts over one batch. `total == successful + failed` by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[DownloadResult]) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.succeeded).count();
        Self {
            total,
            successful,
            failed: total - successful,
        }
    }
}

/// Ordered results of one orchestrator run plus their summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<DownloadResult>,
    pub summary: BatchSummary,
}

impl From<Vec<DownloadResult>> for BatchReport {
    fn from(results: Vec<DownloadResult>) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self { results, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let results = vec![
            DownloadResult::saved("a.js"),
            DownloadResult::failed("disk full"),
            DownloadResult::saved("b.html"),
        ];
        let s = BatchSummary::from_results(&results);
        assert_eq!(s, BatchSummary { total: 3, successful: 2, failed: 1 });
        assert_eq!(s.total, s.successful + s.failed);
    }

    #[test]
    fn empty_summary_is_zero() {
        let report = BatchReport::from(Vec::new());
        assert!(report.results.is_empty());
        assert_eq!(report.summary, BatchSummary { total: 0, successful: 0, failed: 0 });
    }

    #[test]
    fn failed_result_omits_saved_name_on_wire() {
        let v = serde_json::to_value(DownloadResult::failed("boom")).unwrap();
        assert_eq!(v["succeeded"], false);
        assert_eq!(v["errorMessage"], "boom");
        assert!(v.get("savedName").is_none());
    }
}
