//! Per-chunk and overall summarization.

use tracing::{error, info, warn};

use crate::ai::prompt::{
    BRIEF_SYSTEM_PROMPT, CHUNK_INSTRUCTION, OVERALL_INSTRUCTION, SYSTEM_PROMPT, brief_instruction,
    detect_language,
};
use crate::ai::{GenerationRequest, TextGenerator};
use crate::core::config::PipelineSettings;
use crate::core::models::{Chunk, ChunkSummary};
use crate::errors::PipelineError;
use crate::utils::text::trim_trailing_punctuation;

const BRIEF_MAX_TOKENS: u32 = 200;

/// Result of summarizing a run of chunks. Stops at the first failure; the
/// summaries completed before it are kept so callers can decide what to do.
#[derive(Debug)]
pub struct SummaryBatch {
    pub summaries: Vec<ChunkSummary>,
    pub failure: Option<ChunkFailure>,
}

#[derive(Debug)]
pub struct ChunkFailure {
    pub chunk_index: usize,
    pub error: PipelineError,
}

impl SummaryBatch {
    /// # Errors
    ///
    /// Returns the failure as `PipelineError::Summary`, discarding partial work.
    pub fn into_result(self) -> Result<Vec<ChunkSummary>, PipelineError> {
        match self.failure {
            None => Ok(self.summaries),
            Some(ChunkFailure { chunk_index, error }) => Err(PipelineError::Summary(format!(
                "chapter {} of the document: {}",
                chunk_index + 1,
                error
            ))),
        }
    }
}

pub struct Summarizer<'a> {
    generator: &'a dyn TextGenerator,
    chunk_max_tokens: u32,
    overall_max_tokens: u32,
}

impl<'a> Summarizer<'a> {
    #[must_use]
    pub fn new(generator: &'a dyn TextGenerator, settings: &PipelineSettings) -> Self {
        Self {
            generator,
            chunk_max_tokens: settings.chunk_max_tokens,
            overall_max_tokens: settings.overall_max_tokens,
        }
    }

    /// Bulleted summary of one chunk, with trailing `,` and `.` trimmed.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Summary` if generation fails or returns nothing.
    pub async fn summarize_chunk(&self, chunk: &Chunk) -> Result<ChunkSummary, PipelineError> {
        let raw = self
            .generator
            .generate(GenerationRequest {
                system: SYSTEM_PROMPT,
                instruction: CHUNK_INSTRUCTION,
                text: &chunk.text,
                max_tokens: self.chunk_max_tokens,
            })
            .await
            .map_err(as_summary_error)?;

        let text = trim_trailing_punctuation(raw.trim());
        if text.is_empty() {
            return Err(PipelineError::Summary(format!(
                "empty summary for chunk {}",
                chunk.index
            )));
        }
        Ok(ChunkSummary::new(chunk.index, text))
    }

    /// Summarizes chunks one after another, stopping at the first failure.
    pub async fn summarize_chunks(&self, chunks: &[Chunk]) -> SummaryBatch {
        let mut summaries = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            info!(
                chunk = chunk.index,
                of = chunks.len(),
                words = chunk.word_count,
                "Summarizing chunk"
            );
            match self.summarize_chunk(chunk).await {
                Ok(summary) => summaries.push(summary),
                Err(error) => {
                    error!(chunk = chunk.index, "Chunk summary failed: {}", error);
                    return SummaryBatch {
                        summaries,
                        failure: Some(ChunkFailure {
                            chunk_index: chunk.index,
                            error,
                        }),
                    };
                }
            }
        }

        SummaryBatch {
            summaries,
            failure: None,
        }
    }

    /// One overall summary over the marker-stripped chunk summaries.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Summary` if generation fails or returns nothing.
    pub async fn summarize_overall(
        &self,
        summaries: &[ChunkSummary],
    ) -> Result<String, PipelineError> {
        let combined = combine_summaries(summaries);
        info!(
            summaries = summaries.len(),
            chars = combined.len(),
            "Summarizing overall"
        );

        let overall = self
            .generator
            .generate(GenerationRequest {
                system: SYSTEM_PROMPT,
                instruction: OVERALL_INSTRUCTION,
                text: &combined,
                max_tokens: self.overall_max_tokens,
            })
            .await
            .map_err(as_summary_error)?;

        let overall = overall.trim();
        if overall.is_empty() {
            return Err(PipelineError::Summary(
                "empty overall summary".to_string(),
            ));
        }
        Ok(overall.to_string())
    }

    /// Short bulleted summary of a transcript or message, in its language.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Summary` if generation fails.
    pub async fn summarize_brief(&self, text: &str) -> Result<String, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyContent(
                "nothing to summarize".to_string(),
            ));
        }
        let language = detect_language(text);
        info!(?language, chars = text.len(), "Creating brief summary");

        let summary = self
            .generator
            .generate(GenerationRequest {
                system: BRIEF_SYSTEM_PROMPT,
                instruction: brief_instruction(language),
                text,
                max_tokens: BRIEF_MAX_TOKENS,
            })
            .await
            .map_err(as_summary_error)?;
        Ok(summary.trim().to_string())
    }
}

/// Generator failures surface as summary errors; the original message is kept.
fn as_summary_error(error: PipelineError) -> PipelineError {
    match error {
        PipelineError::Summary(_) => error,
        other => PipelineError::Summary(other.to_string()),
    }
}

/// Bullet text of every summary, markers removed, joined by spaces.
#[must_use]
pub fn combine_summaries(summaries: &[ChunkSummary]) -> String {
    summaries
        .iter()
        .flat_map(ChunkSummary::bullets)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drops a sparse trailing summary and closes the list with a period.
///
/// If the last summary has `min_words` words or fewer it is removed. The new
/// last summary then gets a period appended.
#[must_use]
pub fn finalize_summaries(mut summaries: Vec<ChunkSummary>, min_words: usize) -> Vec<ChunkSummary> {
    if let Some(last) = summaries.last() {
        let words = last.word_count();
        if words <= min_words {
            warn!(
                chunk = last.chunk_index,
                words, "Dropping sparse trailing chunk summary"
            );
            summaries.pop();
        }
    }

    if let Some(last) = summaries.last_mut() {
        last.text.push('.');
    }

    summaries
}
