//! Small text helpers shared by the extractor, summarizer and renderer.

use regex::Regex;
use std::sync::LazyLock;

static BULLET_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•–]|\d{1,3}[.)])\s+")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

#[must_use]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Trims trailing commas, then trailing periods.
#[must_use]
pub fn trim_trailing_punctuation(text: &str) -> &str {
    text.trim_end()
        .trim_end_matches(',')
        .trim_end_matches('.')
        .trim_end()
}

/// Collapses every run of whitespace into a single space.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits model output into bullet items, with markers removed.
///
/// Accepts `-`, `*`, `•`, `–`, numbered (`1.` / `1)`) and LaTeX `\item`
/// markers. Lines without a marker continue the previous item. Text with no
/// markers at all becomes a single item.
#[must_use]
pub fn bullet_items(text: &str) -> Vec<String> {
    let normalized = text.replace("\\item", "\n- ");
    let mut items: Vec<String> = Vec::new();

    for line in normalized.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match BULLET_MARKER_RE.find(line) {
            Some(m) => {
                let rest = line[m.end()..].trim();
                if !rest.is_empty() {
                    items.push(rest.to_string());
                }
            }
            None => match items.last_mut() {
                Some(last) => {
                    last.push(' ');
                    last.push_str(line);
                }
                None => items.push(line.to_string()),
            },
        }
    }

    items
}
