use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::extract::pdf::LayoutParams;

/// Default chunk size in words.
pub const DEFAULT_MAX_WORDS: usize = 1000;

/// A trailing chunk summary with this many words or fewer is dropped.
pub const DEFAULT_MIN_SUMMARY_WORDS: usize = 10;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_TYPESETTER: &str = "pdflatex";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_org_id: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub work_dir: PathBuf,
    pub typesetter: String,
    pub settings: PipelineSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineSettings::default();
        let settings = PipelineSettings {
            max_words: parse_var(&lookup, "DOCSUM_MAX_WORDS")?.unwrap_or(defaults.max_words),
            min_summary_words: parse_var(&lookup, "DOCSUM_MIN_SUMMARY_WORDS")?
                .unwrap_or(defaults.min_summary_words),
            fetch_timeout: parse_var::<u64, _>(&lookup, "DOCSUM_FETCH_TIMEOUT_SECS")?
                .map_or(defaults.fetch_timeout, Duration::from_secs),
            layout: LayoutParams {
                char_margin: parse_var(&lookup, "DOCSUM_CHAR_MARGIN")?
                    .unwrap_or(defaults.layout.char_margin),
                word_margin: parse_var(&lookup, "DOCSUM_WORD_MARGIN")?
                    .unwrap_or(defaults.layout.word_margin),
            },
            ..defaults
        };

        Ok(Self {
            openai_api_key: lookup("OPENAI_API_KEY")
                .ok_or_else(|| "OPENAI_API_KEY: environment variable not found".to_string())?,
            openai_org_id: lookup("OPENAI_ORG_ID"),
            openai_model: lookup("OPENAI_MODEL"),
            openai_base_url: lookup("OPENAI_BASE_URL"),
            work_dir: lookup("DOCSUM_WORK_DIR")
                .map_or_else(|| env::temp_dir().join("docsum"), PathBuf::from),
            typesetter: lookup("DOCSUM_TYPESETTER")
                .unwrap_or_else(|| DEFAULT_TYPESETTER.to_string()),
            settings,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("{}: {}", name, e)),
        None => Ok(None),
    }
}

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub max_words: usize,
    pub min_summary_words: usize,
    pub chunk_max_tokens: u32,
    pub overall_max_tokens: u32,
    pub fetch_timeout: Duration,
    pub layout: LayoutParams,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            min_summary_words: DEFAULT_MIN_SUMMARY_WORDS,
            chunk_max_tokens: 100,
            overall_max_tokens: 400,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            layout: LayoutParams::default(),
        }
    }
}
