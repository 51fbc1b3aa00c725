/*!
 * Common test utilities for the notevox test suite
 */

use anyhow::Result;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::FileOptions;

// Re-export the mock providers module
pub mod mock_providers;

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Routes library logs to the test harness; `RUST_LOG=debug` shows them
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample markdown talk for testing
pub fn create_test_markdown(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"# Opening

Welcome to the **quarterly** review. Today we look at three topics.

- Revenue grew in every region.
- Costs stayed flat.

See [the dashboard](https://example.com/dash) for details.

```
not spoken
```
"#;
    create_test_file(dir, filename, content)
}

/// One slide of a generated presentation
pub struct TestSlide<'a> {
    pub title: Option<&'a str>,
    pub body: &'a [&'a str],
    pub notes: Option<&'a [&'a str]>,
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn shape(placeholder: Option<&str>, paragraphs: &[&str]) -> String {
    let ph = placeholder
        .map(|kind| format!(r#"<p:nvSpPr><p:cNvPr id="2" name="ph"/><p:cNvSpPr/><p:nvPr><p:ph type="{}"/></p:nvPr></p:nvSpPr>"#, kind))
        .unwrap_or_default();
    let body: String = paragraphs
        .iter()
        .map(|p| format!(r#"<a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p>"#, xml_escape(p)))
        .collect();
    format!("<p:sp>{}<p:txBody><a:bodyPr/>{}</p:txBody></p:sp>", ph, body)
}

fn part(root: &str, shapes: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:{0} xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{1}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>{2}</p:spTree></p:cSld></p:{0}>"#,
        root,
        REL_BASE,
        shapes.concat()
    )
}

/// Builds a minimal .pptx package in memory
pub fn build_pptx(slides: &[TestSlide]) -> Result<Vec<u8>> {
    let mut files: Vec<(String, String)> = Vec::new();

    let mut rels = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    rels.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
        REL_BASE
    ));
    let mut id_list = String::new();
    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
            n + 1,
            REL_BASE,
            n
        ));
        id_list.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 1));

        let mut shapes = Vec::new();
        if let Some(title) = slide.title {
            shapes.push(shape(Some("title"), &[title]));
        }
        if !slide.body.is_empty() {
            shapes.push(shape(None, slide.body));
        }
        files.push((format!("ppt/slides/slide{}.xml", n), part("sld", &shapes)));

        if let Some(notes) = slide.notes {
            files.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", n),
                format!(
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{0}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{0}/notesSlide" Target="../notesSlides/notesSlide{1}.xml"/></Relationships>"#,
                    REL_BASE, n
                ),
            ));
            let notes_shapes = vec![
                shape(Some("sldImg"), &[]),
                shape(Some("body"), notes),
                shape(Some("sldNum"), &[&n.to_string()]),
            ];
            files.push((format!("ppt/notesSlides/notesSlide{}.xml", n), part("notes", &notes_shapes)));
        }
    }
    rels.push_str("</Relationships>");
    files.push(("ppt/_rels/presentation.xml.rels".to_string(), rels));
    files.push((
        "ppt/presentation.xml".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:r="{}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            REL_BASE, id_list
        ),
    ));

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in &files {
        zip.start_file(name.as_str(), FileOptions::default())?;
        zip.write_all(content.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Writes a generated presentation to `dir/filename`
pub fn create_test_pptx(dir: &Path, filename: &str, slides: &[TestSlide]) -> Result<PathBuf> {
    let path = dir.join(filename);
    fs::write(&path, build_pptx(slides)?)?;
    Ok(path)
}
