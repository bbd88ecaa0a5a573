//! DOCX and PPTX text extraction from the Office Open XML zip packages.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::errors::PipelineError;

const DOCX_BODY: &str = "word/document.xml";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Paragraph text in document order, one newline after each paragraph.
///
/// # Errors
///
/// Returns `PipelineError::Extraction` if the package or its XML is unreadable.
pub fn extract_docx(bytes: &[u8]) -> Result<String, PipelineError> {
    let mut archive = open_package(bytes)?;
    let xml = read_entry(&mut archive, DOCX_BODY)?;
    docx_text_from_xml(&xml)
}

/// Text of every shape on every slide, in slide then shape order.
///
/// # Errors
///
/// Returns `PipelineError::Extraction` if the package or a slide is unreadable.
pub fn extract_pptx(bytes: &[u8]) -> Result<String, PipelineError> {
    let mut archive = open_package(bytes)?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix(SLIDE_PREFIX)?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);
    debug!("PPTX package has {} slides", slides.len());

    let mut text = String::new();
    for (_, name) in slides {
        let xml = read_entry(&mut archive, &name)?;
        for shape in slide_shapes_from_xml(&xml)? {
            text.push_str(&shape);
            text.push('\n');
        }
    }
    Ok(text)
}

fn open_package(bytes: &[u8]) -> Result<zip::ZipArchive<Cursor<&[u8]>>, PipelineError> {
    zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::Extraction(format!("Not a valid Office package: {e}")))
}

fn read_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, PipelineError> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| PipelineError::Extraction(format!("Missing {name}: {e}")))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| PipelineError::Extraction(format!("Failed to read {name}: {e}")))?;
    Ok(xml)
}

fn xml_error(e: quick_xml::Error) -> PipelineError {
    PipelineError::Extraction(format!("Malformed document XML: {e}"))
}

/// Walks WordprocessingML: `w:p` paragraphs, `w:t` runs, `w:tab`, `w:br`.
///
/// # Errors
///
/// Returns `PipelineError::Extraction` on malformed XML.
pub fn docx_text_from_xml(xml: &str) -> Result<String, PipelineError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut paragraph = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            // Tab stops in paragraph properties are also `w:tab`; only runs count.
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" if in_run => paragraph.push('\t'),
                b"br" | b"cr" if in_run => paragraph.push('\n'),
                b"p" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) => {
                if in_text {
                    paragraph.push_str(&e.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"r" => in_run = false,
                b"t" => in_text = false,
                b"p" => {
                    text.push_str(&paragraph);
                    text.push('\n');
                    paragraph.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

/// Text of each shape (`p:sp`) with a text body; paragraphs joined by newline.
///
/// # Errors
///
/// Returns `PipelineError::Extraction` on malformed XML.
pub fn slide_shapes_from_xml(xml: &str) -> Result<Vec<String>, PipelineError> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();
    let mut shape_depth = 0usize;
    let mut has_text_body = false;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => {
                    shape_depth += 1;
                    if shape_depth == 1 {
                        has_text_body = false;
                        paragraphs.clear();
                    }
                }
                b"txBody" if shape_depth > 0 => has_text_body = true,
                b"t" if shape_depth > 0 => in_text = true,
                // PowerPoint writes `<a:br><a:rPr/></a:br>`, not an empty element.
                b"br" if shape_depth > 0 => paragraph.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"br" if shape_depth > 0 => paragraph.push('\n'),
                b"p" if has_text_body => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(e) => {
                if in_text {
                    paragraph.push_str(&e.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if has_text_body => {
                    paragraphs.push(std::mem::take(&mut paragraph));
                }
                b"sp" if shape_depth > 0 => {
                    shape_depth -= 1;
                    if shape_depth == 0 && has_text_body {
                        shapes.push(paragraphs.join("\n"));
                        paragraphs.clear();
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}
