//! The unit of work: one discoverable asset and how to obtain its bytes.

use serde::{Deserialize, Serialize};

use crate::naming;

/// What an asset is. Determines the saved file's extension and whether the
/// formatter applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    PageHtml,
    ExternalScript,
    InlineScript,
    FrameHtml,
}

impl AssetKind {
    pub fn is_script(self) -> bool {
        matches!(self, AssetKind::ExternalScript | AssetKind::InlineScript)
    }

    /// File extension every name of this kind must end with.
    pub fn extension(self) -> &'static str {
        if self.is_script() {
            ".js"
        } else {
            ".html"
        }
    }

    /// Stem used when nothing usable can be derived from the source.
    pub(crate) fn fallback_stem(self) -> &'static str {
        match self {
            AssetKind::PageHtml => "index",
            AssetKind::ExternalScript => "script",
            AssetKind::InlineScript => "inline_script",
            AssetKind::FrameHtml => "frame",
        }
    }
}

/// Where an asset's bytes come from. Exactly one variant is ever present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetOrigin {
    /// Text already in hand (inline script body, serialized page markup).
    Content(String),
    /// Absolute URL; fetched only when the content must be transformed.
    Reference(String),
}

/// Normalized record describing one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub kind: AssetKind,
    pub origin: AssetOrigin,
    pub suggested_name: String,
}

impl AssetDescriptor {
    /// Builds a descriptor, sanitizing `name` and forcing the extension for `kind`.
    pub fn new(kind: AssetKind, origin: AssetOrigin, name: &str) -> Self {
        Self {
            kind,
            origin,
            suggested_name: naming::with_extension(name, kind.extension(), kind.fallback_stem()),
        }
    }

    pub fn content(kind: AssetKind, text: impl Into<String>, name: &str) -> Self {
        Self::new(kind, AssetOrigin::Content(text.into()), name)
    }

    pub fn reference(kind: AssetKind, url: impl Into<String>, name: &str) -> Self {
        Self::new(kind, AssetOrigin::Reference(url.into()), name)
    }

    /// The name to save under. Re-derived so descriptors that crossed a
    /// message boundary cannot smuggle in an unsafe filename.
    pub fn safe_name(&self) -> String {
        naming::with_extension(
            &self.suggested_name,
            self.kind.extension(),
            self.kind.fallback_stem(),
        )
    }
}
