//! Web page fetching and visible-text extraction.

use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use tracing::{info, warn};
use url::Url;

use crate::errors::PipelineError;
use crate::utils::text::collapse_whitespace;

/// Subtrees whose text is never visible.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// HTTP fetcher with a bounded timeout.
#[derive(Debug, Clone)]
pub struct WebFetcher {
    client: Client,
}

impl WebFetcher {
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetches the page body as text.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Network` on connection failure, timeout, or a
    /// non-2xx status.
    pub async fn fetch(&self, url: &Url) -> Result<String, PipelineError> {
        info!(url = %url, "Fetching web page");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PipelineError::Network(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, %status, "Web page fetch returned non-success status");
            return Err(PipelineError::Network(format!(
                "{url} returned status {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| PipelineError::Network(format!("Failed to read body of {url}: {e}")))
    }

    /// Fetches a page and returns its visible text.
    ///
    /// # Errors
    ///
    /// `PipelineError::Network` for fetch failures, `PipelineError::Extraction`
    /// when the body is not HTML with visible text.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, PipelineError> {
        let body = self.fetch(url).await?;
        html_to_text(&body)
    }
}

/// Extracts visible text from an HTML document.
///
/// Hidden subtrees are dropped and block elements start new lines. Within a
/// line whitespace runs collapse to one space; empty lines are removed.
///
/// # Errors
///
/// Returns `PipelineError::Extraction` if the body does not look like HTML.
pub fn html_to_text(html: &str) -> Result<String, PipelineError> {
    if !html.contains('<') {
        return Err(PipelineError::Extraction(
            "Response body is not HTML".to_string(),
        ));
    }

    let document = Html::parse_document(html);
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let hidden = node.ancestors().chain(std::iter::once(node)).any(|n| {
            n.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        if let Some(element) = node.value().as_element() {
            if BLOCK_ELEMENTS.contains(&element.name()) {
                raw.push('\n');
            }
        } else if let Some(text) = node.value().as_text() {
            raw.push_str(text);
        }
    }

    Ok(clean_visible_text(&raw))
}

fn clean_visible_text(raw: &str) -> String {
    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_subtrees() {
        let html = r"<html><head><title>T</title><style>body { color: red; }</style></head>
            <body><script>var secret = 1;</script><p>Visible text</p></body></html>";
        let text = html_to_text(html).unwrap();
        assert_eq!(text, "Visible text");
    }

    #[test]
    fn block_elements_become_lines() {
        let html = "<body><h1>Title</h1><p>First   paragraph\n here</p><div>Second</div></body>";
        let text = html_to_text(html).unwrap();
        assert_eq!(text, "Title\nFirst paragraph\nhere\nSecond");
    }

    #[test]
    fn inline_elements_stay_on_the_same_line() {
        let html = "<p>Some <b>bold</b> and <a href='#'>linked</a> words</p>";
        assert_eq!(html_to_text(html).unwrap(), "Some bold and linked words");
    }

    #[test]
    fn plain_text_body_is_rejected() {
        let err = html_to_text("just text, no markup").unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_a_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = WebFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/missing", server.url())).unwrap();
        let err = fetcher.fetch_text(&url).await.unwrap_err();

        match err {
            PipelineError::Network(msg) => assert!(msg.contains("404")),
            other => panic!("expected Network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_text_returns_visible_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/article")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html><body><p>Hello from the web</p></body></html>")
            .create_async()
            .await;

        let fetcher = WebFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/article", server.url())).unwrap();
        assert_eq!(fetcher.fetch_text(&url).await.unwrap(), "Hello from the web");
    }
}
