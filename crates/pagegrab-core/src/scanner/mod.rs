//! Page scanner: enumerates a document's assets as descriptors.
//!
//! Runs inside the page context against an already-loaded document. Nothing
//! is fetched here; external scripts and frames are emitted as references
//! and resolved later by the orchestrator.

mod page;

pub use page::PageSnapshot;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::model::{AssetDescriptor, AssetKind, ScanOptions};
use crate::naming;

/// Scans `page` and returns its descriptors.
///
/// Order is part of the contract: the page document first, then external
/// scripts, inline scripts (when enabled), and frame documents, each group in
/// document order.
pub fn scan(page: &PageSnapshot, options: &ScanOptions) -> Vec<AssetDescriptor> {
    let doc = Html::parse_document(page.markup());
    let base = base_url(&doc, page.url());

    let mut assets = vec![AssetDescriptor::content(
        AssetKind::PageHtml,
        doc.html(),
        &naming::page_name(page.url()),
    )];

    let mut external = Vec::new();
    let mut inline = Vec::new();
    if let Ok(sel) = Selector::parse("script") {
        for script in doc.select(&sel) {
            match source_attr(&script) {
                Some(src) => {
                    if let Some(url) = resolve_http(&base, src) {
                        let name = naming::script_name(&url);
                        external.push(AssetDescriptor::reference(
                            AssetKind::ExternalScript,
                            url.as_str(),
                            &name,
                        ));
                    }
                }
                None if options.include_inline_scripts => {
                    let body: String = script.text().collect();
                    if !body.trim().is_empty() {
                        let name = naming::inline_script_name(inline.len() + 1);
                        inline.push(AssetDescriptor::content(AssetKind::InlineScript, body, &name));
                    }
                }
                None => {}
            }
        }
    }

    let mut frames = Vec::new();
    if let Ok(sel) = Selector::parse("iframe, frame") {
        for frame in doc.select(&sel) {
            let Some(url) = source_attr(&frame).and_then(|src| resolve_http(&base, src)) else {
                continue;
            };
            let name = naming::frame_name(&url);
            frames.push(AssetDescriptor::reference(AssetKind::FrameHtml, url.as_str(), &name));
        }
    }

    tracing::debug!(
        page = %page.url(),
        external = external.len(),
        inline = inline.len(),
        frames = frames.len(),
        "scan complete"
    );

    assets.extend(external);
    assets.extend(inline);
    assets.extend(frames);
    assets
}

/// Non-blank `src` attribute, if any.
fn source_attr<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    el.value()
        .attr("src")
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Document base: the first `<base href>` resolved against the page URL.
fn base_url(doc: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves `src` and keeps it only if it lands on http(s).
fn resolve_http(base: &Url, src: &str) -> Option<Url> {
    let url = base.join(src).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
