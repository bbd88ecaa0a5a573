//! PDF text extraction.
//!
//! Pages are read from the lopdf page tree in page order and their content
//! streams walked operator by operator. Gaps between glyph runs decide where
//! words and lines break, governed by [`LayoutParams`]. When the walk yields
//! nothing readable the whole file goes through `pdf-extract` instead.

use lopdf::content::Content;
use lopdf::{Document, Object};
use tracing::{debug, warn};

use crate::errors::PipelineError;

/// Approximate advance of one glyph, in text-space ems.
const AVG_GLYPH_WIDTH_EM: f64 = 0.5;

/// Share of non-printable characters above which a page counts as unreadable.
const MAX_GARBAGE_RATIO: f64 = 0.1;

/// Glyph-merging thresholds, both in average glyph widths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Gap beyond which two runs are placed on separate lines.
    pub char_margin: f64,
    /// Gap beyond which a space separates two runs.
    pub word_margin: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            char_margin: 1.0,
            word_margin: 0.2,
        }
    }
}

/// Extracts the text of every page, joined in page order.
///
/// A PDF whose pages hold no text at all yields an empty string.
///
/// # Errors
///
/// Returns `PipelineError::Extraction` if neither lopdf nor pdf-extract can
/// read the file.
pub fn extract_pdf(bytes: &[u8], layout: LayoutParams) -> Result<String, PipelineError> {
    let pages = match extract_pages(bytes, layout) {
        Ok(pages) if pages_are_readable(&pages) => return Ok(pages.join("\n")),
        Ok(pages) => {
            warn!("PDF content streams produced no readable text, falling back to pdf-extract");
            Some(pages)
        }
        Err(e) => {
            warn!("lopdf could not read PDF ({}), falling back to pdf-extract", e);
            None
        }
    };

    match (extract_with_pdf_extract(bytes), pages) {
        (Ok(text), _) => Ok(text),
        // Blank pages stay blank; the caller reports them as empty content.
        (Err(e), Some(pages)) if pages.iter().all(|p| p.trim().is_empty()) => {
            debug!("pdf-extract failed on a blank PDF: {}", e);
            Ok(String::new())
        }
        (Err(e), _) => Err(e),
    }
}

/// Text of each page, in page order.
///
/// # Errors
///
/// Returns `PipelineError::Extraction` if the document cannot be loaded.
pub fn extract_pages(bytes: &[u8], layout: LayoutParams) -> Result<Vec<String>, PipelineError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| PipelineError::Extraction(format!("Failed to load PDF: {e}")))?;

    let mut pages = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        let text = match doc.get_page_content(page_id) {
            Ok(content) => page_text(&content, layout),
            Err(e) => {
                debug!("Could not get content for page {}: {}", page_num, e);
                String::new()
            }
        };
        pages.push(text);
    }
    Ok(pages)
}

fn pages_are_readable(pages: &[String]) -> bool {
    let text: String = pages.concat();
    let total = text.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return false;
    }
    let garbage = text
        .chars()
        .filter(|c| !c.is_whitespace() && (c.is_control() || *c == char::REPLACEMENT_CHARACTER))
        .count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = garbage as f64 / total as f64;
    ratio <= MAX_GARBAGE_RATIO
}

fn extract_with_pdf_extract(bytes: &[u8]) -> Result<String, PipelineError> {
    // pdf-extract panics on some malformed fonts instead of returning an error.
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| PipelineError::Extraction("pdf-extract panicked on this PDF".to_string()))?
        .map_err(|e| PipelineError::Extraction(format!("PDF extraction failed: {e}")))?;

    // pdf-extract separates pages with form feeds.
    Ok(text
        .split('\x0C')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Walks one page content stream and lays its text out.
#[must_use]
pub fn page_text(content: &[u8], layout: LayoutParams) -> String {
    let operations = match Content::decode(content) {
        Ok(content) => content.operations,
        Err(e) => {
            debug!("Failed to decode page content stream: {}", e);
            return String::new();
        }
    };

    let mut writer = LayoutWriter::new(layout);
    for op in &operations {
        match op.operator.as_str() {
            "BT" => writer.begin_text(),
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(number) {
                    writer.font_size = size.abs().max(1.0);
                }
            }
            "Td" | "TD" => {
                let tx = op.operands.first().and_then(number).unwrap_or(0.0);
                let ty = op.operands.get(1).and_then(number).unwrap_or(0.0);
                writer.move_by(tx, ty);
            }
            "Tm" => {
                let e = op.operands.get(4).and_then(number).unwrap_or(0.0);
                let f = op.operands.get(5).and_then(number).unwrap_or(0.0);
                writer.move_to(e, f);
            }
            "T*" => writer.line_break(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    writer.show(&decode_pdf_string(bytes));
                }
            }
            "'" => {
                writer.line_break();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    writer.show(&decode_pdf_string(bytes));
                }
            }
            "\"" => {
                writer.line_break();
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    writer.show(&decode_pdf_string(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => writer.show(&decode_pdf_string(bytes)),
                            other => {
                                if let Some(adjust) = number(other) {
                                    // TJ adjustments are thousandths of an em; negative moves right.
                                    writer.gap(-adjust / 1000.0 / AVG_GLYPH_WIDTH_EM);
                                }
                            }
                        }
                    }
                }
            }
            "ET" => writer.end_text(),
            _ => {}
        }
    }

    writer.finish()
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Decodes a PDF string: UTF-16BE with BOM, UTF-8, or Latin-1 otherwise.
#[must_use]
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Accumulates glyph runs and applies the layout margins.
struct LayoutWriter {
    layout: LayoutParams,
    out: String,
    font_size: f64,
    /// Current line origin in text space.
    line_x: f64,
    line_y: f64,
    /// Estimated end of the last run shown on this line.
    cursor_x: f64,
    pending_gap: f64,
}

impl LayoutWriter {
    fn new(layout: LayoutParams) -> Self {
        Self {
            layout,
            out: String::new(),
            font_size: 12.0,
            line_x: 0.0,
            line_y: 0.0,
            cursor_x: 0.0,
            pending_gap: 0.0,
        }
    }

    fn begin_text(&mut self) {
        self.line_x = 0.0;
        self.line_y = 0.0;
        self.cursor_x = 0.0;
        self.pending_gap = 0.0;
    }

    fn end_text(&mut self) {
        self.line_break();
    }

    fn glyph_width(&self) -> f64 {
        self.font_size * AVG_GLYPH_WIDTH_EM
    }

    fn move_by(&mut self, tx: f64, ty: f64) {
        self.move_to(self.line_x + tx, self.line_y + ty);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        if (y - self.line_y).abs() > f64::EPSILON {
            self.line_break();
        } else {
            let gap = (x - self.cursor_x) / self.glyph_width();
            self.gap(gap);
        }
        self.line_x = x;
        self.line_y = y;
        self.cursor_x = x;
    }

    /// Records horizontal space, in glyph widths, before the next run.
    fn gap(&mut self, glyphs: f64) {
        self.pending_gap += glyphs;
    }

    fn line_break(&mut self) {
        self.pending_gap = 0.0;
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn show(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let gap = std::mem::take(&mut self.pending_gap);
        if !self.out.is_empty() && !self.out.ends_with(['\n', ' ']) {
            if gap > self.layout.char_margin {
                self.out.push('\n');
            } else if gap > self.layout.word_margin {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
        #[allow(clippy::cast_precision_loss)]
        let advance = text.chars().count() as f64 * self.glyph_width();
        self.cursor_x += advance;
    }

    fn finish(mut self) -> String {
        self.line_break();
        self.out.trim_end().to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn layout() -> LayoutParams {
        LayoutParams::default()
    }

    /// A PDF with one page per content stream. Only font `F1` is defined.
    /// Page objects are created in reverse so page order must come from the
    /// page tree, not object numbering.
    pub(crate) fn build_pdf(page_contents: &[&[u8]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = page_contents
            .iter()
            .rev()
            .map(|content| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                });
                Object::Reference(page_id)
            })
            .collect();
        kids.reverse();

        let count = i64::try_from(kids.len()).unwrap();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pages_are_joined_in_page_tree_order() {
        let bytes = build_pdf(&[
            b"BT /F1 12 Tf 72 700 Td (First page text) Tj ET",
            b"BT /F1 12 Tf 72 700 Td (Second page) Tj 0 -14 Td (has two lines) Tj ET",
        ]);

        let pages = extract_pages(&bytes, layout()).unwrap();
        assert_eq!(pages, vec!["First page text", "Second page\nhas two lines"]);
        assert_eq!(
            extract_pdf(&bytes, layout()).unwrap(),
            "First page text\nSecond page\nhas two lines"
        );
    }

    #[test]
    fn blank_pdf_yields_no_text() {
        let bytes = build_pdf(&[b"", b""]);
        let text = extract_pdf(&bytes, layout()).unwrap();
        assert!(text.trim().is_empty());
    }

    #[test]
    fn undefined_font_with_unreadable_text_is_an_extraction_error() {
        let bytes = build_pdf(&[b"BT /F9 12 Tf 72 700 Td (\\001\\002\\003) Tj ET"]);
        let err = extract_pdf(&bytes, layout()).unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[test]
    fn small_kerning_merges_into_one_word() {
        let content = b"BT /F1 12 Tf 0 0 Td [(Hel) -20 (lo)] TJ ET";
        assert_eq!(page_text(content, layout()), "Hello");
    }

    #[test]
    fn word_sized_gap_inserts_space() {
        let content = b"BT /F1 12 Tf 0 0 Td [(Hello) -250 (world)] TJ ET";
        assert_eq!(page_text(content, layout()), "Hello world");
    }

    #[test]
    fn gap_beyond_char_margin_starts_new_line() {
        let content = b"BT /F1 12 Tf 0 0 Td [(Left) -2000 (Right)] TJ ET";
        assert_eq!(page_text(content, layout()), "Left\nRight");
    }

    #[test]
    fn margins_are_configurable() {
        let content = b"BT /F1 12 Tf 0 0 Td [(Hello) -250 (world)] TJ ET";
        let tight = LayoutParams {
            char_margin: 1.0,
            word_margin: 0.6,
        };
        assert_eq!(page_text(content, tight), "Helloworld");
    }

    #[test]
    fn vertical_moves_break_lines() {
        let content = b"BT /F1 12 Tf 72 700 Td (First line) Tj 0 -14 Td (Second line) Tj ET";
        assert_eq!(page_text(content, layout()), "First line\nSecond line");
    }

    #[test]
    fn separate_text_objects_do_not_run_together() {
        let content = b"BT (One) Tj ET BT (Two) Tj ET";
        assert_eq!(page_text(content, layout()), "One\nTwo");
    }

    #[test]
    fn decodes_utf16_and_latin1_strings() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
        assert_eq!(decode_pdf_string(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }

    #[test]
    fn unreadable_pages_trigger_fallback() {
        assert!(!pages_are_readable(&[String::new(), "  ".to_string()]));
        assert!(!pages_are_readable(&["\u{1}\u{2}\u{3}ab".to_string()]));
        assert!(pages_are_readable(&["plain words".to_string()]));
    }

    #[test]
    fn garbage_input_is_an_extraction_error() {
        let err = extract_pdf(b"definitely not a pdf", layout()).unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }
}
