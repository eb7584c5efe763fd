//! In-memory PPTX presentation with run-level text replacement.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};
use zip::ZipArchive;

use crate::error::DocumentError;

/// A presentation loaded fully into memory as its raw archive entries.
///
/// Opening reads every entry; `save` re-serializes the whole archive, so the
/// output file is either written completely or not at all. The input file is
/// never mutated.
#[derive(Debug)]
pub struct Presentation {
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Entry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// A slide in document order.
#[derive(Debug, Clone)]
pub struct Slide {
    /// 1-based slide number taken from the entry name (`slideN.xml`).
    pub number: usize,
    pub shapes: Vec<Shape>,
}

/// A text-bearing shape (`<p:sp>` with a `<p:txBody>`).
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

/// Minimal span of text sharing one formatting style (`<a:r>`).
#[derive(Debug, Clone)]
pub struct Run {
    pub text: String,
}

impl Presentation {
    /// Open a `.pptx` file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Open a `.pptx` from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let mut data = Vec::with_capacity(file.size() as usize);
            if !is_dir {
                file.read_to_end(&mut data)?;
            }
            entries.push(Entry { name, data, is_dir });
        }
        Ok(Self { entries })
    }

    /// Parse the slide/shape/paragraph/run tree, ordered by slide number.
    pub fn slides(&self) -> Result<Vec<Slide>, DocumentError> {
        let mut slides = Vec::new();
        for entry in &self.entries {
            if !is_slide_entry(&entry.name) {
                continue;
            }
            let xml = String::from_utf8_lossy(&entry.data);
            let shapes = parse_shapes(&entry.name, &xml)?;
            let number = slide_number(&entry.name).unwrap_or(0);
            slides.push(Slide { number, shapes });
        }
        slides.sort_by_key(|s| s.number);
        Ok(slides)
    }

    /// Replace every non-overlapping occurrence of `placeholder` with
    /// `replacement` inside each run's text, across all slides.
    ///
    /// Matching is literal and case-sensitive, evaluated independently per
    /// run: a placeholder split across two runs by a formatting boundary is
    /// not matched. Returns the number of runs that changed.
    pub fn replace_text(
        &mut self,
        placeholder: &str,
        replacement: &str,
    ) -> Result<usize, DocumentError> {
        let mut replaced = 0;
        for entry in &mut self.entries {
            if !is_slide_entry(&entry.name) {
                continue;
            }
            let xml = String::from_utf8_lossy(&entry.data).into_owned();
            let (rewritten, count) = rewrite_slide_xml(&entry.name, &xml, placeholder, replacement)?;
            if count > 0 {
                entry.data = rewritten;
                replaced += count;
            }
        }
        Ok(replaced)
    }

    /// Serialize the presentation and write it to `path` in one shot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize all archive entries to `.pptx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        for entry in &self.entries {
            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

/// Is this archive entry a slide document (`ppt/slides/slideN.xml`)?
///
/// Excludes relationship parts, slide layouts, and slide masters.
fn is_slide_entry(name: &str) -> bool {
    name.starts_with("ppt/slides/slide") && name.ends_with(".xml") && !name.contains("_rels")
}

/// Extract a slide number from an entry name like `ppt/slides/slide3.xml`.
fn slide_number(name: &str) -> Option<usize> {
    let stem = name.trim_end_matches(".xml");
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

fn xml_error(entry: &str, reason: impl std::fmt::Display) -> DocumentError {
    DocumentError::Xml {
        entry: entry.to_string(),
        reason: reason.to_string(),
    }
}

/// Rewrite one slide's XML, replacing `placeholder` inside each run's text.
///
/// Streams events through unchanged except for the text payload of
/// `<a:t>` elements inside `<a:r>` runs within a shape's text body. The run
/// text is accumulated first (text pieces, character references, CDATA) so
/// that escaped characters participate in matching, then written back as a
/// single text event. Returns the rewritten XML and the changed-run count.
fn rewrite_slide_xml(
    entry: &str,
    xml: &str,
    placeholder: &str,
    replacement: &str,
) -> Result<(Vec<u8>, usize), DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut replaced = 0;

    let mut in_shape = false;
    let mut in_tx_body = false;
    let mut in_run = false;
    // Shapes inside group shapes are not traversed; track nesting depth.
    let mut group_depth = 0usize;
    // Accumulated run text while inside <a:t>; None when outside.
    let mut pending: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(entry, e))?;
        match event {
            Event::Start(e) => {
                match e.local_name().as_ref() {
                    b"grpSp" => group_depth += 1,
                    b"sp" if group_depth == 0 => in_shape = true,
                    b"txBody" if in_shape => in_tx_body = true,
                    b"r" if in_tx_body => in_run = true,
                    b"t" if in_run => pending = Some(String::new()),
                    _ => {}
                }
                writer
                    .write_event(Event::Start(e))
                    .map_err(|e| xml_error(entry, e))?;
            }
            Event::Text(e) => {
                if let Some(buf) = pending.as_mut() {
                    let text = e.xml_content().map_err(|e| xml_error(entry, e))?;
                    buf.push_str(&text);
                } else {
                    writer
                        .write_event(Event::Text(e))
                        .map_err(|e| xml_error(entry, e))?;
                }
            }
            Event::GeneralRef(e) => {
                if let Some(buf) = pending.as_mut() {
                    push_reference(buf, &e);
                } else {
                    writer
                        .write_event(Event::GeneralRef(e))
                        .map_err(|e| xml_error(entry, e))?;
                }
            }
            Event::CData(e) => {
                if let Some(buf) = pending.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e));
                } else {
                    writer
                        .write_event(Event::CData(e))
                        .map_err(|e| xml_error(entry, e))?;
                }
            }
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"grpSp" => group_depth = group_depth.saturating_sub(1),
                    b"sp" => in_shape = false,
                    b"txBody" => in_tx_body = false,
                    b"r" => in_run = false,
                    b"t" => {
                        if let Some(text) = pending.take() {
                            let text = if text.contains(placeholder) {
                                replaced += 1;
                                text.replace(placeholder, replacement)
                            } else {
                                text
                            };
                            writer
                                .write_event(Event::Text(BytesText::new(&text)))
                                .map_err(|e| xml_error(entry, e))?;
                        }
                    }
                    _ => {}
                }
                writer
                    .write_event(Event::End(e))
                    .map_err(|e| xml_error(entry, e))?;
            }
            Event::Eof => break,
            other => {
                writer
                    .write_event(other)
                    .map_err(|e| xml_error(entry, e))?;
            }
        }
    }

    Ok((writer.into_inner(), replaced))
}

/// Parse the text-bearing shapes of one slide's XML into the tree view.
fn parse_shapes(entry: &str, xml: &str) -> Result<Vec<Shape>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();

    let mut current_shape: Option<Shape> = None;
    let mut in_tx_body = false;
    let mut current_para: Option<Paragraph> = None;
    let mut in_run = false;
    let mut group_depth = 0usize;
    let mut run_text: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| xml_error(entry, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"grpSp" => group_depth += 1,
                b"sp" if group_depth == 0 => current_shape = Some(Shape::default()),
                b"txBody" if current_shape.is_some() => in_tx_body = true,
                b"p" if in_tx_body => current_para = Some(Paragraph::default()),
                b"r" if current_para.is_some() => in_run = true,
                b"t" if in_run => run_text = Some(String::new()),
                _ => {}
            },
            Event::Text(e) => {
                if let Some(buf) = run_text.as_mut() {
                    let text = e.xml_content().map_err(|e| xml_error(entry, e))?;
                    buf.push_str(&text);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(buf) = run_text.as_mut() {
                    push_reference(buf, &e);
                }
            }
            Event::CData(e) => {
                if let Some(buf) = run_text.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"grpSp" => group_depth = group_depth.saturating_sub(1),
                b"sp" => {
                    if let Some(shape) = current_shape.take()
                        && !shape.paragraphs.is_empty()
                    {
                        shapes.push(shape);
                    }
                }
                b"txBody" => in_tx_body = false,
                b"p" => {
                    if let Some(para) = current_para.take()
                        && let Some(shape) = current_shape.as_mut()
                    {
                        shape.paragraphs.push(para);
                    }
                }
                b"r" => {
                    in_run = false;
                    // Runs without <a:t> (line breaks etc.) are skipped.
                    if let Some(text) = run_text.take()
                        && let Some(para) = current_para.as_mut()
                    {
                        para.runs.push(Run { text });
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

/// Append the character(s) denoted by a general reference to `buf`.
///
/// Predefined XML entities and numeric character references are resolved;
/// anything else is kept as literal `&name;` text.
fn push_reference(buf: &mut String, name: &[u8]) {
    match name {
        b"amp" => buf.push('&'),
        b"lt" => buf.push('<'),
        b"gt" => buf.push('>'),
        b"quot" => buf.push('"'),
        b"apos" => buf.push('\''),
        _ if name.first() == Some(&b'#') => match parse_char_ref(&name[1..]) {
            Some(c) => buf.push(c),
            None => push_raw_reference(buf, name),
        },
        _ => push_raw_reference(buf, name),
    }
}

/// Keep an unresolvable reference as literal `&name;` text rather than
/// dropping characters from the run.
fn push_raw_reference(buf: &mut String, name: &[u8]) {
    buf.push('&');
    buf.push_str(&String::from_utf8_lossy(name));
    buf.push(';');
}

/// Parse the digits of a numeric character reference (`#65` or `#x41`).
fn parse_char_ref(digits: &[u8]) -> Option<char> {
    let s = std::str::from_utf8(digits).ok()?;
    let code = if let Some(hex) = s.strip_prefix(['x', 'X']) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        s.parse().ok()?
    };
    char::from_u32(code)
}
