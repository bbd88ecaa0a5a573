//! Text-generation capability used by the summarizer

pub mod client;
pub mod prompt;

use async_trait::async_trait;

use crate::errors::PipelineError;

// Re-export main types for convenience
pub use client::{LlmClient, estimate_tokens};

/// One call to the text generator.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub instruction: &'a str,
    pub text: &'a str,
    pub max_tokens: u32,
}

/// Anything that turns a prompt into generated text.
///
/// The pipeline borrows an implementation from its caller; no client is
/// created or cached inside the pipeline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, PipelineError>;
}
