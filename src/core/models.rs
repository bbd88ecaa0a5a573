use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::PipelineError;
use crate::utils::links::parse_http_url;
use crate::utils::text::{bullet_items, count_words};

/// Kind of source a document is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Pptx,
    Txt,
    WebPage,
}

impl DocumentKind {
    /// Maps a file extension (without the dot, any case) to a file kind.
    /// Legacy binary Office formats are not supported.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word document",
            Self::Pptx => "PowerPoint",
            Self::Txt => "text file",
            Self::WebPage => "web page",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File { path: PathBuf, kind: DocumentKind },
    Url(Url),
}

/// A read-only input to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: DocumentSource,
}

impl Document {
    /// Builds a file document, inferring its kind from the extension.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Extraction` when the extension is missing or
    /// not a supported format.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let kind = DocumentKind::from_extension(ext).ok_or_else(|| {
            PipelineError::Extraction(format!(
                "unsupported document type: {}",
                if ext.is_empty() { "(none)" } else { ext }
            ))
        })?;
        Ok(Self::with_kind(path, kind))
    }

    #[must_use]
    pub fn with_kind(path: impl Into<PathBuf>, kind: DocumentKind) -> Self {
        Self {
            source: DocumentSource::File {
                path: path.into(),
                kind,
            },
        }
    }

    /// # Errors
    ///
    /// Returns `PipelineError::Extraction` if the string is not an http(s) URL.
    pub fn from_url(raw: &str) -> Result<Self, PipelineError> {
        let url = parse_http_url(raw)
            .ok_or_else(|| PipelineError::Extraction(format!("not a valid URL: {raw}")))?;
        Ok(Self {
            source: DocumentSource::Url(url),
        })
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        match &self.source {
            DocumentSource::File { kind, .. } => *kind,
            DocumentSource::Url(_) => DocumentKind::WebPage,
        }
    }

    /// Path or URL, for logging.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.source {
            DocumentSource::File { path, .. } => path.display().to_string(),
            DocumentSource::Url(url) => url.to_string(),
        }
    }
}

/// A contiguous slice of a document's words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub word_count: usize,
}

impl Chunk {
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace()
    }
}

/// Bulleted summary of exactly one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub chunk_index: usize,
    pub text: String,
}

impl ChunkSummary {
    #[must_use]
    pub fn new(chunk_index: usize, text: impl Into<String>) -> Self {
        Self {
            chunk_index,
            text: text.into(),
        }
    }

    /// Bullet items with their markers removed.
    #[must_use]
    pub fn bullets(&self) -> Vec<String> {
        bullet_items(&self.text)
    }

    /// Word count over the bullet text; markers are not words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.bullets().iter().map(|b| count_words(b)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub pdf_path: PathBuf,
    pub tex_path: PathBuf,
    pub chapter_count: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub artifact: RenderedArtifact,
    pub overall_summary: String,
    pub chunk_summaries: Vec<ChunkSummary>,
}
