//! Repository path normalization.
//!
//! Normalized paths are the deduplication identity for the whole crawl: two
//! spellings that normalize to the same string are the same node. The rule:
//! leading slash, duplicate slashes collapsed, trailing slashes stripped, a
//! trailing numeric dump selector (`.1.json`) stripped. Comparisons stay
//! case-sensitive and percent-encoded, matching JCR path semantics. A bare
//! `.json` suffix is a legitimate node name and is left alone.

/// Normalize a repository path to its canonical form.
pub fn normalize(raw: &str) -> String {
    let trimmed = strip_selector(raw);
    let mut path = String::with_capacity(trimmed.len() + 1);
    for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
        path.push('/');
        path.push_str(segment);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}

/// Join a child name onto a parent path, normalizing the result.
pub fn join(parent: &str, name: &str) -> String {
    normalize(&format!("{parent}/{name}"))
}

/// Parent of a normalized path; the root is its own parent.
pub fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

// Strips the `.N.json` dump selector the crawler appends to fetch URLs.
fn strip_selector(raw: &str) -> &str {
    let trimmed = raw.trim_end_matches('/');
    let Some(stem) = trimmed.strip_suffix(".json") else {
        return trimmed;
    };
    let base = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    if base.len() < stem.len()
        && let Some(base) = base.strip_suffix('.')
    {
        return base;
    }
    trimmed
}
