//! Shared test utilities: build minimal PPTX fixtures in memory.

use std::io::{Cursor, Write};

use slidefill::Presentation;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#;

const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#;

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// One slide document whose single shape holds one paragraph with the given
/// run texts.
pub fn slide_xml(run_texts: &[&str]) -> String {
    let runs: String = run_texts
        .iter()
        .map(|t| format!("<a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r>", escape_xml(t)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:sp><p:txBody><a:bodyPr/><a:p>{runs}</a:p></p:txBody></p:sp>
  </p:spTree></p:cSld>
</p:sld>"#
    )
}

/// Build a minimal `.pptx` archive with one slide entry per element of
/// `slides` (each element is a full slide XML document).
pub fn build_pptx(slides: &[String]) -> Vec<u8> {
    let cursor = Cursor::new(Vec::new());
    let mut zip_writer = zip::ZipWriter::new(cursor);
    let options = zip::write::FileOptions::default();

    let mut add = |name: &str, content: &str| {
        zip_writer.start_file(name, options).unwrap();
        zip_writer.write_all(content.as_bytes()).unwrap();
    };

    add("[Content_Types].xml", CONTENT_TYPES);
    add("_rels/.rels", ROOT_RELS);
    add("ppt/presentation.xml", PRESENTATION);
    for (i, slide) in slides.iter().enumerate() {
        add(&format!("ppt/slides/slide{}.xml", i + 1), slide);
    }

    zip_writer.finish().unwrap().into_inner()
}

/// A one-slide presentation whose shape holds the given run texts.
pub fn build_single_slide_pptx(run_texts: &[&str]) -> Vec<u8> {
    build_pptx(&[slide_xml(run_texts)])
}

/// All run texts of the presentation, in slide order.
pub fn all_run_texts(presentation: &Presentation) -> Vec<String> {
    presentation
        .slides()
        .unwrap()
        .iter()
        .flat_map(|s| s.shapes.iter())
        .flat_map(|sh| sh.paragraphs.iter())
        .flat_map(|p| p.runs.iter())
        .map(|r| r.text.clone())
        .collect()
}
