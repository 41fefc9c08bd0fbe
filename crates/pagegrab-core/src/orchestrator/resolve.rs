//! Content resolution: decide what the save host receives for one asset.

use crate::formatter::Formatter;
use crate::host::{FetchedText, Fetcher};
use crate::model::{AssetDescriptor, AssetOrigin};

/// Either text to materialize or a URL to hand to the host untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Resolved {
    Content(String),
    Reference(String),
}

/// Resolves `asset`.
///
/// References are fetched only when the asset is a script that will be
/// reformatted. A failed fetch (transport error or non-2xx) falls back to
/// the original reference; it is never a per-asset failure.
pub(super) async fn resolve(
    asset: &AssetDescriptor,
    beautify: bool,
    fetcher: &dyn Fetcher,
    formatter: &Formatter,
) -> Resolved {
    let beautify = beautify && asset.kind.is_script();
    match &asset.origin {
        AssetOrigin::Content(text) if beautify => Resolved::Content(formatter.format(text).await),
        AssetOrigin::Content(text) => Resolved::Content(text.clone()),
        AssetOrigin::Reference(url) if beautify => {
            match fetcher
                .fetch_text(url)
                .await
                .and_then(FetchedText::into_success)
            {
                Ok(body) => Resolved::Content(formatter.format(&body).await),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "fetch failed; saving original reference");
                    Resolved::Reference(url.clone())
                }
            }
        }
        AssetOrigin::Reference(url) => Resolved::Reference(url.clone()),
    }
}
