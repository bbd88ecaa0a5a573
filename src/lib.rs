/// docsum - turns long documents and web pages into a typeset chapter summary.
///
/// A document goes through four stages:
/// 1. Extraction of its text (PDF, DOCX, PPTX, TXT or a web page)
/// 2. Chunking into bounded "chapters" of whitespace-separated words
/// 3. Summarization of each chapter plus one overall summary with an LLM
/// 4. Rendering to LaTeX and typesetting into a PDF
///
/// # Architecture
///
/// The system uses:
/// - lopdf / pdf-extract, zip + quick-xml and scraper for extraction
/// - openai-api-rs message types over reqwest for the chat completions API
/// - an external LaTeX engine (`pdflatex` by default) run as a subprocess
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use docsum::ai::LlmClient;
/// use docsum::core::config::AppConfig;
/// use docsum::core::models::Document;
/// use docsum::extract::Extractor;
/// use docsum::pipeline::render::{Renderer, Typesetter};
/// use docsum::pipeline::workspace::Workspace;
/// use docsum::pipeline::Pipeline;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     docsum::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let client = LlmClient::from_config(&config);
///     let pipeline = Pipeline::new(
///         &client,
///         Extractor::from_settings(&config.settings)?,
///         Renderer::new(Typesetter::new(config.typesetter.clone())),
///         config.settings.clone(),
///     );
///
///     let workspace = Workspace::create(&config.work_dir).await?;
///     let output = pipeline
///         .run_in(&Document::from_path("report.pdf")?, &workspace)
///         .await?;
///     println!("{}", output.artifact.pdf_path.display());
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod core;
pub mod errors;
pub mod extract;
pub mod pipeline;
pub mod utils;

/// Configure structured JSON logging.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; only the first subscriber is installed.
///
/// # Example
///
/// ```
/// docsum::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
