//! Extract -> chunk -> summarize -> render.

pub mod chunker;
pub mod render;
pub mod summarize;
pub mod workspace;

use std::path::Path;

use tracing::{error, info, instrument};

use crate::ai::TextGenerator;
use crate::core::config::PipelineSettings;
use crate::core::models::{Document, PipelineOutput};
use crate::errors::PipelineError;
use crate::extract::Extractor;
use chunker::chunk_text;
use render::Renderer;
use summarize::{Summarizer, finalize_summaries};
use workspace::Workspace;

/// File name of the rendered artifact inside a [`Workspace`].
pub const SUMMARY_FILE_NAME: &str = "summary.pdf";

/// One document summarization run. Stages execute strictly in sequence.
pub struct Pipeline<'a> {
    generator: &'a dyn TextGenerator,
    extractor: Extractor,
    renderer: Renderer,
    settings: PipelineSettings,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(
        generator: &'a dyn TextGenerator,
        extractor: Extractor,
        renderer: Renderer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            generator,
            extractor,
            renderer,
            settings,
        }
    }

    /// Summarizes `document` into a PDF at `output_path`.
    ///
    /// # Errors
    ///
    /// - `Extraction` / `Network` when the text cannot be obtained
    /// - `EmptyContent` when the document has no words
    /// - `Summary` when a generation call fails or nothing usable remains
    /// - `Render` when typesetting fails
    #[instrument(skip_all, fields(source = %document.display_name()))]
    pub async fn run(
        &self,
        document: &Document,
        output_path: &Path,
    ) -> Result<PipelineOutput, PipelineError> {
        let text = self.extractor.extract(document).await?;

        let chunks = chunk_text(&text, self.settings.max_words);
        if chunks.is_empty() {
            error!("Document contains no words");
            return Err(PipelineError::EmptyContent(document.display_name()));
        }
        info!(
            chunks = chunks.len(),
            max_words = self.settings.max_words,
            "Split document into chapters"
        );

        let summarizer = Summarizer::new(self.generator, &self.settings);
        let summaries = summarizer.summarize_chunks(&chunks).await.into_result()?;

        let summaries = finalize_summaries(summaries, self.settings.min_summary_words);
        if summaries.is_empty() {
            return Err(PipelineError::Summary(
                "no usable chunk summaries".to_string(),
            ));
        }

        let overall_summary = summarizer.summarize_overall(&summaries).await?;

        let artifact = self
            .renderer
            .render(&summaries, &overall_summary, output_path)
            .await?;
        info!(
            pdf = %artifact.pdf_path.display(),
            chapters = artifact.chapter_count,
            "Summary document ready"
        );

        Ok(PipelineOutput {
            artifact,
            overall_summary,
            chunk_summaries: summaries,
        })
    }

    /// Like [`Pipeline::run`], rendering into the workspace's summary file.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    pub async fn run_in(
        &self,
        document: &Document,
        workspace: &Workspace,
    ) -> Result<PipelineOutput, PipelineError> {
        self.run(document, &workspace.file(SUMMARY_FILE_NAME)).await
    }
}
