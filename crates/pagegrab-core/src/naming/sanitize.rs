//! Filesystem-safe filename sanitization.

/// Longest name the save host is handed, in characters.
pub const NAME_MAX: usize = 200;

/// Sanitizes a candidate filename down to `[A-Za-z0-9_.-]`.
///
/// - Replaces every other character (whitespace, `/`, `\`, control, non-ASCII) with `_`
/// - Collapses consecutive underscores
/// - Trims leading dots and underscores, and trailing underscores
/// - Limits length to [`NAME_MAX`] characters
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out
        .trim_start_matches(|c| c == '.' || c == '_')
        .trim_end_matches('_');

    // Output is ASCII, so byte and char lengths agree.
    let mut take = trimmed.len().min(NAME_MAX);
    while trimmed[..take].ends_with('_') {
        take -= 1;
    }
    trimmed[..take].to_string()
}

/// True if `name` already satisfies the sanitized form.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= NAME_MAX
        && !name.contains("__")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}
