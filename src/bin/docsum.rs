use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use docsum::ai::LlmClient;
use docsum::core::config::AppConfig;
use docsum::core::models::Document;
use docsum::errors::PipelineError;
use docsum::extract::Extractor;
use docsum::pipeline::Pipeline;
use docsum::pipeline::render::{Renderer, Typesetter};
use docsum::pipeline::workspace::Workspace;
use docsum::utils::links::{find_url, is_url};
use tracing::error;

/// Summarize a document or web page into a chaptered PDF.
#[derive(Debug, Parser)]
#[command(name = "docsum", version, about)]
struct Cli {
    /// Path to a .pdf/.docx/.pptx/.txt file, or an http(s) URL
    source: String,

    /// Where to write the PDF, ending in .pdf (defaults to a fresh work directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base directory for per-run work directories
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

fn resolve_source(raw: &str) -> Result<Document, PipelineError> {
    let raw = raw.trim();
    if is_url(raw) {
        return Document::from_url(raw);
    }
    if Path::new(raw).exists() {
        return Document::from_path(raw);
    }
    // A message like "please summarize https://..." still works.
    match find_url(raw) {
        Some(url) => Document::from_url(url.as_str()),
        None => Document::from_path(raw),
    }
}

async fn run(cli: Cli) -> anyhow::Result<Result<(), PipelineError>> {
    let mut config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading configuration")?;
    if let Some(work_dir) = cli.work_dir {
        config.work_dir = work_dir;
    }

    let client = LlmClient::from_config(&config);
    let extractor = Extractor::from_settings(&config.settings)?;
    let renderer = Renderer::new(Typesetter::new(config.typesetter.clone()));
    let pipeline = Pipeline::new(&client, extractor, renderer, config.settings.clone());

    let document = match resolve_source(&cli.source) {
        Ok(document) => document,
        Err(e) => return Ok(Err(e)),
    };

    let result = match cli.output {
        Some(path) => pipeline.run(&document, &path).await,
        None => {
            let workspace = Workspace::create(&config.work_dir).await?;
            pipeline.run_in(&document, &workspace).await
        }
    };

    Ok(result.map(|output| {
        println!("{}", output.artifact.pdf_path.display());
        println!();
        println!("{}", output.overall_summary);
    }))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    docsum::setup_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!(error = %e, "Summarization failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Startup failed");
            eprintln!("docsum: {e:#}");
            ExitCode::FAILURE
        }
    }
}
