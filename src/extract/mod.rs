//! Source -> raw text

pub mod office;
pub mod pdf;
pub mod web;

use std::path::Path;

use tracing::{info, instrument};

use crate::core::config::PipelineSettings;
use crate::core::models::{Document, DocumentKind, DocumentSource};
use crate::errors::PipelineError;
use pdf::LayoutParams;
use web::WebFetcher;

/// Pulls the full text out of a [`Document`].
#[derive(Debug, Clone)]
pub struct Extractor {
    fetcher: WebFetcher,
    layout: LayoutParams,
}

impl Extractor {
    #[must_use]
    pub fn new(fetcher: WebFetcher, layout: LayoutParams) -> Self {
        Self { fetcher, layout }
    }

    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the HTTP client cannot be built.
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self, PipelineError> {
        Ok(Self::new(
            WebFetcher::new(settings.fetch_timeout)?,
            settings.layout,
        ))
    }

    /// # Errors
    ///
    /// `PipelineError::Network` when a URL cannot be fetched,
    /// `PipelineError::Extraction` for every other read or parse failure.
    #[instrument(skip(self, document), fields(source = %document.display_name()))]
    pub async fn extract(&self, document: &Document) -> Result<String, PipelineError> {
        let text = match &document.source {
            DocumentSource::Url(url) => self.fetcher.fetch_text(url).await?,
            DocumentSource::File { path, kind } => self.extract_file(path, *kind).await?,
        };
        info!(
            kind = document.kind().label(),
            chars = text.len(),
            "Extracted document text"
        );
        Ok(text)
    }

    async fn extract_file(&self, path: &Path, kind: DocumentKind) -> Result<String, PipelineError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PipelineError::Extraction(format!("Failed to read {}: {e}", path.display()))
        })?;

        match kind {
            DocumentKind::Pdf => {
                let layout = self.layout;
                tokio::task::spawn_blocking(move || pdf::extract_pdf(&bytes, layout))
                    .await
                    .map_err(|e| {
                        PipelineError::Extraction(format!(
                            "PDF parser failed on {}: {e}",
                            path.display()
                        ))
                    })?
            }
            DocumentKind::Docx => office::extract_docx(&bytes),
            DocumentKind::Pptx => office::extract_pptx(&bytes),
            DocumentKind::Txt => String::from_utf8(bytes).map_err(|e| {
                PipelineError::Extraction(format!("{} is not valid UTF-8: {e}", path.display()))
            }),
            DocumentKind::WebPage => Err(PipelineError::Extraction(format!(
                "{} is a local file, not a web page",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn extractor() -> Extractor {
        Extractor::new(
            WebFetcher::new(Duration::from_secs(5)).unwrap(),
            LayoutParams::default(),
        )
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("docsum-extract-{}-{name}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn reads_text_files_verbatim() {
        let path = temp_path("notes.txt");
        tokio::fs::write(&path, "line one\n  line two\n").await.unwrap();

        let text = extractor()
            .extract(&Document::from_path(&path).unwrap())
            .await
            .unwrap();
        assert_eq!(text, "line one\n  line two\n");
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn invalid_utf8_text_is_an_extraction_error() {
        let path = temp_path("latin1.txt");
        tokio::fs::write(&path, [0x66, 0x6F, 0xFF, 0x6F]).await.unwrap();

        let err = extractor()
            .extract(&Document::from_path(&path).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn reads_pdf_pages_off_the_runtime() {
        let path = temp_path("two-pages.pdf");
        let bytes = pdf::tests::build_pdf(&[
            b"BT /F1 12 Tf 72 700 Td (Alpha page) Tj ET",
            b"BT /F1 12 Tf 72 700 Td (Beta page) Tj ET",
        ]);
        tokio::fs::write(&path, bytes).await.unwrap();

        let text = extractor()
            .extract(&Document::from_path(&path).unwrap())
            .await
            .unwrap();
        assert_eq!(text, "Alpha page\nBeta page");
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn malformed_pdf_font_is_an_extraction_error() {
        let path = temp_path("bad-font.pdf");
        let bytes = pdf::tests::build_pdf(&[b"BT /F9 12 Tf 72 700 Td (\\001\\002\\003) Tj ET"]);
        tokio::fs::write(&path, bytes).await.unwrap();

        let err = extractor()
            .extract(&Document::from_path(&path).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_file_is_an_extraction_error() {
        let err = extractor()
            .extract(&Document::from_path(temp_path("absent.pdf")).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }
}
