use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to extract text: {0}")]
    Extraction(String),

    #[error("No extractable text: {0}")]
    EmptyContent(String),

    #[error("Failed to generate summary: {0}")]
    Summary(String),

    #[error("Failed to render summary document: {0}")]
    Render(String),

    #[error("Failed to fetch URL: {0}")]
    Network(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Message safe to show to an end user. The underlying cause stays in the
    /// `Display` output for logs.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Extraction(_) => "Sorry, I couldn't read that document.",
            PipelineError::EmptyContent(_) => "I couldn't find any text to summarize.",
            PipelineError::Summary(_) => {
                "Sorry, I couldn't generate a summary at this time. Please try again later."
            }
            PipelineError::Render(_) => "Sorry, I couldn't build the summary PDF.",
            PipelineError::Network(_) => "Sorry, I couldn't fetch that URL.",
            PipelineError::Config(_) => "The summarizer is not configured correctly.",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(error: reqwest::Error) -> Self {
        PipelineError::Network(error.to_string())
    }
}
