//! LaTeX rendering and the typesetter subprocess.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{error, info};

use crate::core::models::{ChunkSummary, RenderedArtifact};
use crate::errors::PipelineError;

/// Bytes of typesetter output kept in a render error.
const OUTPUT_TAIL_BYTES: usize = 2_000;

const PREAMBLE: &str = r"\documentclass[12pt]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{amsmath}
\usepackage{amsfonts}
\usepackage{amssymb}
\usepackage{graphicx}
\begin{document}
";

/// Escapes LaTeX reserved characters so arbitrary text typesets literally.
///
/// The preamble only loads `utf8` input with `T1` fonts, which stops at
/// Latin script. Other characters get an ASCII stand-in or `?`.
#[must_use]
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '$' => out.push_str(r"\$"),
            '&' => out.push_str(r"\&"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '%' => out.push_str(r"\%"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            c if c.is_control() && c != '\n' => {}
            c if typesets_in_t1(c) => out.push(c),
            c => out.push_str(ascii_stand_in(c)),
        }
    }
    out
}

/// Printable ASCII, Latin-1, Latin Extended-A and common typographic marks.
fn typesets_in_t1(c: char) -> bool {
    matches!(c,
        '\n' | ' '..='~' | '\u{A0}'..='\u{17F}'
        | '–' | '—' | '‘' | '’' | '‚' | '“' | '”' | '„' | '…' | '€')
}

fn ascii_stand_in(c: char) -> &'static str {
    match c {
        '→' | '⟶' => "->",
        '←' | '⟵' => "<-",
        '↔' => "<->",
        '⇒' => "=>",
        '≤' => "<=",
        '≥' => ">=",
        '≠' => "!=",
        '≈' => "~=",
        '•' | '‣' | '▪' => "-",
        '−' | '‐' | '‑' => "-",
        '™' => "(TM)",
        '\u{2009}' | '\u{200A}' | '\u{202F}' | '\u{2002}' | '\u{2003}' => " ",
        '\u{200B}' | '\u{FEFF}' => "",
        _ => "?",
    }
}

/// Serializes the summaries into the LaTeX intermediate form.
#[must_use]
pub fn render_latex(summaries: &[ChunkSummary], overall_summary: &str) -> String {
    let mut tex = String::from(PREAMBLE);

    let _ = writeln!(tex, r"\section*{{Number of Chapters: {}}}", summaries.len());
    tex.push_str("\\subsection*{Overall Summary}\n");
    tex.push_str(&escape_latex(overall_summary));
    tex.push('\n');
    tex.push_str("\\newpage\n");
    tex.push_str("\\section*{Chapter Summaries}\n");

    for (i, summary) in summaries.iter().enumerate() {
        let _ = writeln!(tex, r"\subsection*{{Chapter {} Summary}}", i + 1);
        tex.push_str("\\begin{itemize}\n");
        for bullet in summary.bullets() {
            let _ = writeln!(tex, r"\item {}", escape_latex(&bullet));
        }
        tex.push_str("\\end{itemize}\n");
    }

    tex.push_str("\\end{document}\n");
    tex
}

/// External tool that turns a `.tex` file into a PDF.
///
/// It is invoked as `program <args..> -output-directory=<dir> <tex file>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typesetter {
    pub program: String,
    pub args: Vec<String>,
}

impl Typesetter {
    #[must_use]
    pub fn pdflatex() -> Self {
        Self::new("pdflatex")
    }

    /// A LaTeX engine with the standard non-interactive flags.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![
                "-interaction=nonstopmode".to_string(),
                "-halt-on-error".to_string(),
            ],
        }
    }

    #[must_use]
    pub fn with_args<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for Typesetter {
    fn default() -> Self {
        Self::pdflatex()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    typesetter: Typesetter,
}

impl Renderer {
    #[must_use]
    pub fn new(typesetter: Typesetter) -> Self {
        Self { typesetter }
    }

    /// Writes `<output stem>.tex` beside `output_path` and typesets it.
    ///
    /// Any previous artifact at `output_path` is overwritten. The path must
    /// end in `.pdf` (any case); the engine always writes a lowercase `.pdf`,
    /// which is the path reported in the artifact.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Render` if `output_path` is not a `.pdf` path,
    /// the `.tex` file cannot be written,
    /// the typesetter cannot be started or exits non-zero, or no PDF appears.
    pub async fn render(
        &self,
        summaries: &[ChunkSummary],
        overall_summary: &str,
        output_path: &Path,
    ) -> Result<RenderedArtifact, PipelineError> {
        let is_pdf = output_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(PipelineError::Render(format!(
                "output path {} must end in .pdf",
                output_path.display()
            )));
        }

        let output_dir = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let pdf_path = output_path.with_extension("pdf");
        let tex_path = output_path.with_extension("tex");

        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| {
            PipelineError::Render(format!("Failed to create {}: {e}", output_dir.display()))
        })?;
        // Stale output must not pass for a fresh render.
        if tokio::fs::try_exists(&pdf_path).await.unwrap_or(false) {
            tokio::fs::remove_file(&pdf_path).await.map_err(|e| {
                PipelineError::Render(format!(
                    "Failed to remove previous {}: {e}",
                    pdf_path.display()
                ))
            })?;
        }

        let tex = render_latex(summaries, overall_summary);
        tokio::fs::write(&tex_path, tex).await.map_err(|e| {
            PipelineError::Render(format!("Failed to write {}: {e}", tex_path.display()))
        })?;

        info!(
            program = %self.typesetter.program,
            tex = %tex_path.display(),
            "Typesetting summary"
        );
        let output = Command::new(&self.typesetter.program)
            .args(&self.typesetter.args)
            .arg(format!("-output-directory={}", output_dir.display()))
            .arg(&tex_path)
            .output()
            .await
            .map_err(|e| {
                PipelineError::Render(format!(
                    "Failed to run {}: {e}",
                    self.typesetter.program
                ))
            })?;

        if !output.status.success() {
            let log = output_tail(&output.stdout, &output.stderr);
            error!(status = %output.status, "Typesetter failed");
            return Err(PipelineError::Render(format!(
                "{} exited with {}: {log}",
                self.typesetter.program, output.status
            )));
        }

        if !tokio::fs::try_exists(&pdf_path).await.unwrap_or(false) {
            return Err(PipelineError::Render(format!(
                "{} finished but {} was not produced",
                self.typesetter.program,
                pdf_path.display()
            )));
        }

        Ok(RenderedArtifact {
            pdf_path,
            tex_path,
            chapter_count: summaries.len(),
        })
    }
}

fn output_tail(stdout: &[u8], stderr: &[u8]) -> String {
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(stdout),
        String::from_utf8_lossy(stderr)
    );
    let combined = combined.trim();
    let mut start = combined.len().saturating_sub(OUTPUT_TAIL_BYTES);
    while !combined.is_char_boundary(start) {
        start += 1;
    }
    combined[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(
            escape_latex(r"50% of $x_1 & {y} #2 ~ ^ \end"),
            r"50\% of \$x\_1 \& \{y\} \#2 \textasciitilde{} \textasciicircum{} \textbackslash{}end"
        );
    }

    #[test]
    fn latin_text_is_kept() {
        assert_eq!(escape_latex("Grüße aus Köln – “zitiert” …"), "Grüße aus Köln – “zitiert” …");
    }

    #[test]
    fn characters_outside_t1_are_replaced() {
        assert_eq!(escape_latex("costs → down ≥ 5"), "costs -> down >= 5");
        assert_eq!(escape_latex("Привет 你好 🚀"), "?????? ?? ?");
    }

    #[test]
    fn escaped_text_cannot_close_the_document() {
        let summaries = vec![ChunkSummary::new(0, r"- \end{document} injected")];
        let tex = render_latex(&summaries, "fine");
        assert_eq!(tex.matches(r"\end{document}").count(), 1);
    }

    #[test]
    fn output_tail_keeps_the_end() {
        let long = "x".repeat(OUTPUT_TAIL_BYTES + 50) + "END";
        let tail = output_tail(long.as_bytes(), b"");
        assert!(tail.ends_with("END"));
        assert_eq!(tail.len(), OUTPUT_TAIL_BYTES);
    }
}
