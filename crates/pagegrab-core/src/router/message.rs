//! Wire shapes of router requests and replies.

use serde::{Deserialize, Serialize};

use super::{RouterError, TransportError};
use crate::model::{AssetDescriptor, BatchSummary, DownloadOptions, DownloadResult, ScanOptions};

/// A named action addressed to one execution context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    ScanAssets {
        #[serde(default)]
        options: ScanOptions,
    },
    DownloadAssets {
        assets: Vec<AssetDescriptor>,
        #[serde(default)]
        options: DownloadOptions,
    },
    BeautifyJs {
        code: String,
    },
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::ScanAssets { .. } => "scanAssets",
            Request::DownloadAssets { .. } => "downloadAssets",
            Request::BeautifyJs { .. } => "beautifyJs",
        }
    }
}

/// Success payload, flattened next to `success: true` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Downloaded {
        results: Vec<DownloadResult>,
        summary: BatchSummary,
    },
    Assets {
        assets: Vec<AssetDescriptor>,
    },
    Code {
        code: String,
    },
}

/// `{success: true, ...payload}` or `{success: false, error}`.
///
/// A relay (the socket daemon) that could not get a reply from the context
/// also sets `transport`, so the caller can tell it from an application
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportError>,
}

impl Response {
    pub fn ok(payload: Payload) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
            transport: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
            transport: None,
        }
    }

    /// Failure reply for a request the relay could not deliver or answer.
    pub fn transport_failure(error: TransportError) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.to_string()),
            transport: Some(error),
        }
    }

    /// Application-level view: the payload, [`RouterError::Rejected`], or
    /// [`RouterError::Transport`] for a relayed transport failure.
    pub fn into_payload(self) -> Result<Payload, RouterError> {
        if let Some(transport) = self.transport {
            return Err(RouterError::Transport(transport));
        }
        match (self.success, self.payload) {
            (true, Some(payload)) => Ok(payload),
            (true, None) => Err(RouterError::Rejected("reply carried no payload".into())),
            (false, _) => Err(RouterError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".into()),
            )),
        }
    }
}
