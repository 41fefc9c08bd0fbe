//! Filename derivation for saved assets.
//!
//! Every name handed to the save host matches `^[\w.-]{1,200}$` and ends with
//! the extension of its asset kind.

mod path;
mod sanitize;

pub use path::last_path_segment;
pub use sanitize::{is_safe_filename, sanitize_filename, NAME_MAX};

use url::Url;

/// Sanitizes `name` and forces it to end with `ext` (e.g. `".js"`).
///
/// An existing extension is matched case-insensitively and normalized to `ext`.
/// When nothing usable remains, `fallback_stem` is used. Truncation to
/// [`NAME_MAX`] always keeps the extension.
pub fn with_extension(name: &str, ext: &str, fallback_stem: &str) -> String {
    let sanitized = sanitize_filename(name);
    let has_ext = sanitized.len() >= ext.len()
        && sanitized[sanitized.len() - ext.len()..].eq_ignore_ascii_case(ext);
    let stem = if has_ext {
        &sanitized[..sanitized.len() - ext.len()]
    } else {
        sanitized.as_str()
    };

    let mut stem = stem.trim_end_matches('_').to_string();
    if stem.is_empty() {
        stem = sanitize_filename(fallback_stem);
    }
    stem.truncate(NAME_MAX - ext.len());
    let stem = stem.trim_end_matches('_');
    format!("{}{}", stem, ext)
}

/// Name for a document: last path segment, or `<host>_index` when it is empty.
pub fn page_name(url: &Url) -> String {
    let raw = last_path_segment(url)
        .unwrap_or_else(|| format!("{}_index", url.host_str().unwrap_or("page")));
    with_extension(&raw, ".html", "index")
}

/// Name for an embedded frame document; derived like [`page_name`].
pub fn frame_name(url: &Url) -> String {
    page_name(url)
}

/// Name for an external script: last path segment, forced to `.js`.
pub fn script_name(url: &Url) -> String {
    let raw = last_path_segment(url).unwrap_or_default();
    with_extension(&raw, ".js", "script")
}

/// Positional name for the `n`th (1-based) inline script.
pub fn inline_script_name(n: usize) -> String {
    format!("inline_script_{}.js", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn page_name_from_path() {
        assert_eq!(page_name(&u("https://x.test/docs/guide.html")), "guide.html");
        assert_eq!(page_name(&u("https://x.test/item.php?id=3")), "item.php.html");
    }

    #[test]
    fn page_name_empty_path_uses_host() {
        assert_eq!(page_name(&u("https://www.x.test/")), "www.x.test_index.html");
        assert_eq!(page_name(&u("https://x.test/blog/")), "x.test_index.html");
    }

    #[test]
    fn script_name_forces_js() {
        assert_eq!(script_name(&u("https://x.test/a.js")), "a.js");
        assert_eq!(script_name(&u("https://x.test/loader?v=1")), "loader.js");
        assert_eq!(script_name(&u("https://x.test/APP.JS")), "APP.js");
        assert_eq!(script_name(&u("https://x.test/")), "script.js");
    }

    #[test]
    fn frame_name_forces_html() {
        assert_eq!(frame_name(&u("https://ads.test/embed/widget")), "widget.html");
    }

    #[test]
    fn inline_names_are_positional() {
        assert_eq!(inline_script_name(1), "inline_script_1.js");
        assert_eq!(inline_script_name(12), "inline_script_12.js");
    }

    #[test]
    fn extension_kept_when_truncating() {
        let long = format!("{}.js", "a".repeat(400));
        let name = with_extension(&long, ".js", "script");
        assert_eq!(name.len(), NAME_MAX);
        assert!(name.ends_with(".js"));
        assert!(is_safe_filename(&name));
    }

    #[test]
    fn idempotent_on_safe_names() {
        for name in ["a.js", "inline_script_3.js", "x.test_index.html"] {
            let ext = if name.ends_with(".js") { ".js" } else { ".html" };
            assert_eq!(with_extension(name, ext, "f"), name);
        }
    }

    #[test]
    fn empty_falls_back() {
        assert_eq!(with_extension("", ".html", "frame"), "frame.html");
        assert_eq!(with_extension("???", ".js", "script"), "script.js");
    }
}
