//! Expansion of frame-templated paths.
//!
//! A path may carry `%d` (plain decimal) or `%0Nd` (zero-padded to width `N`)
//! placeholders. Every placeholder in a pattern receives the same frame
//! number, so `dir%02d/frame%03d.png` walks the directory and file indices in
//! lockstep. Existing scene files depend on that naming convention.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"%(?:0(\d*))?d").expect("placeholder pattern is valid"))
}

pub fn has_placeholder(pattern: &str) -> bool {
    placeholder().is_match(pattern)
}

/// Expands `pattern` into one path per frame of the inclusive `frame_range`.
///
/// A pattern without placeholders yields itself once, whatever the range.
/// A templated pattern with no range, or with a reversed one, yields nothing.
pub fn expand(pattern: &str, frame_range: Option<(i64, i64)>) -> Vec<String> {
    if !has_placeholder(pattern) {
        return vec![pattern.to_string()];
    }
    let Some((start, end)) = frame_range.filter(|(s, e)| s <= e) else {
        return Vec::new();
    };
    (start..=end)
        .map(|frame| substitute(pattern, frame))
        .collect()
}

fn substitute(pattern: &str, frame: i64) -> String {
    placeholder()
        .replace_all(pattern, |caps: &Captures| match caps.get(1) {
            Some(width) => {
                let width = width.as_str().parse::<usize>().unwrap_or(0);
                format!("{frame:0width$}")
            }
            None => frame.to_string(),
        })
        .into_owned()
}

/// Prefixes `path` with the directory `base`. Absolute paths and URLs are
/// returned untouched, as is everything when `base` is empty.
pub fn join_base(base: &str, path: &str) -> String {
    if base.is_empty() || path.starts_with('/') || path.contains("://") {
        return path.to_string();
    }
    if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// The directory part of `path`, without a trailing separator.
pub fn base_directory(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}
