use regex::Regex;
use url::Url;

/// Parses a user-supplied string as an http(s) URL with a host.
///
/// Surrounding whitespace, angle brackets, quotes and trailing punctuation are
/// tolerated, so links pasted into chat messages parse cleanly.
#[must_use]
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let raw = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '<' | '>' | '"' | '\''));
    let raw = trim_trailing_punctuation(raw);
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return None;
    }

    let url = Url::parse(raw).ok()?;
    url.host_str().filter(|h| !h.is_empty())?;
    Some(url)
}

#[must_use]
pub fn is_url(raw: &str) -> bool {
    parse_http_url(raw).is_some()
}

/// First http(s) link found anywhere in free text.
#[must_use]
pub fn find_url(text: &str) -> Option<Url> {
    static RAW_URL_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
        Regex::new(r#"https?://[^\s<>()\[\]{}"']+"#)
            .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
    });

    RAW_URL_RE
        .find_iter(text)
        .find_map(|m| parse_http_url(m.as_str()))
}

#[must_use]
fn trim_trailing_punctuation(s: &str) -> &str {
    s.trim_end_matches(&['.', ',', ';', ':', '!', '?', ')', ']', '}'][..])
}
