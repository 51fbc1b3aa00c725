/*!
 * PPTX (Office Open XML) notes reader.
 *
 * Slide order comes from `ppt/presentation.xml` (`sldIdLst`) resolved
 * through `ppt/_rels/presentation.xml.rels`; each slide's notes part is
 * found through the slide's own relationships.
 */

use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;
use zip::result::ZipError;

use super::{NoteRow, normalize_newlines};
use crate::errors::NotesError;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Placeholder types that never carry speaker notes
const NON_NOTE_PLACEHOLDERS: [&str; 2] = ["sldNum", "sldImg"];

/// Reader for speaker notes in PPTX packages
#[derive(Debug, Default, Clone, Copy)]
pub struct NotesExtractor;

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// Text of one shape with its placeholder type
#[derive(Debug, Default, Clone, PartialEq)]
struct ShapeText {
    placeholder: Option<String>,
    paragraphs: Vec<String>,
}

impl ShapeText {
    fn text(&self) -> String {
        self.paragraphs.join("\n").trim().to_string()
    }
}

impl NotesExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract title and notes of every slide, in slide-show order
    pub fn extract<R: Read + Seek>(&self, reader: R) -> Result<Vec<NoteRow>, NotesError> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| NotesError::Zip(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = self.slide_order(&mut archive)?;
        debug!("Presentation has {} slide(s)", slide_paths.len());

        let mut rows = Vec::with_capacity(slide_paths.len());
        for (idx, slide_path) in slide_paths.iter().enumerate() {
            rows.push(self.read_slide(&mut archive, slide_path, idx + 1)?);
        }
        Ok(rows)
    }

    /// Ordered slide part paths
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>, NotesError> {
        let rels_xml = read_part(archive, PRESENTATION_RELS)?
            .ok_or_else(|| NotesError::MissingPart(PRESENTATION_RELS.to_string()))?;
        let slide_rels: Vec<Relationship> = parse_relationships(&rels_xml)?
            .into_iter()
            .filter(|rel| rel.rel_type.ends_with("/slide"))
            .collect();

        let listed_ids = match read_part(archive, PRESENTATION_PART)? {
            Some(xml) => parse_slide_id_list(&xml)?,
            None => Vec::new(),
        };

        if !listed_ids.is_empty() {
            let targets: HashMap<&str, &str> = slide_rels
                .iter()
                .map(|rel| (rel.id.as_str(), rel.target.as_str()))
                .collect();
            return Ok(listed_ids
                .iter()
                .filter_map(|id| targets.get(id.as_str()))
                .map(|target| resolve_target("ppt", target))
                .collect());
        }

        // No slide list: fall back to the numbering of the parts
        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .iter()
            .map(|rel| {
                let number = extract_slide_number(&rel.target).or_else(|| extract_slide_number(&rel.id));
                (resolve_target("ppt", &rel.target), number)
            })
            .collect();
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });
        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn read_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<NoteRow, NotesError> {
        let slide_xml = read_part(archive, slide_path)?.ok_or_else(|| NotesError::MissingPart(slide_path.to_string()))?;
        let shapes = parse_shapes(&slide_xml)?;
        let title = slide_title(&shapes);

        let notes = match self.notes_part(archive, slide_path)? {
            Some(notes_path) => match read_part(archive, &notes_path)? {
                Some(notes_xml) => collect_notes(&parse_shapes(&notes_xml)?),
                None => String::new(),
            },
            None => String::new(),
        };

        Ok(NoteRow {
            slide_number,
            title: normalize_newlines(&title),
            notes: normalize_newlines(&notes),
        })
    }

    /// Path of the notes part linked from a slide, if any
    fn notes_part<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>, NotesError> {
        let (dir, file) = split_path(slide_path);
        let rels_path = format!("{}/_rels/{}.rels", dir, file);

        let Some(rels_xml) = read_part(archive, &rels_path)? else {
            return Ok(None);
        };
        Ok(parse_relationships(&rels_xml)?
            .into_iter()
            .find(|rel| rel.rel_type.ends_with("/notesSlide"))
            .map(|rel| resolve_target(dir, &rel.target)))
    }
}

/// Read a part as text; `None` when the package does not contain it
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Option<String>, NotesError> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(NotesError::Zip(format!("Failed to open '{}': {}", path, e))),
    };

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| NotesError::Zip(format!("Failed to read '{}': {}", path, e)))?;
    Ok(Some(content))
}

fn xml_error(context: &str, e: impl std::fmt::Display) -> NotesError {
    NotesError::Xml(format!("{}: {}", context, e))
}

fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, NotesError> {
    let mut reader = Reader::from_str(xml);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"Relationship" => {
                relationships.push(Relationship {
                    id: attribute(e, b"Id").unwrap_or_default(),
                    rel_type: attribute(e, b"Type").unwrap_or_default(),
                    target: attribute(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("Error parsing relationships", e)),
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids of `<p:sldId>` entries, in show order
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>, NotesError> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                // the relationship id is the namespaced `r:id`, not the numeric `id`
                let rel_id = e
                    .attributes()
                    .flatten()
                    .find(|attr| {
                        let key = attr.key.as_ref();
                        key.contains(&b':') && local_name(key) == b"id"
                    })
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("Error parsing presentation", e)),
            _ => {}
        }
    }

    Ok(ids)
}

/// Text shapes of a slide or notes page, in document order
fn parse_shapes(xml: &str) -> Result<Vec<ShapeText>, NotesError> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();
    let mut current: Option<ShapeText> = None;
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current = Some(ShapeText::default()),
                b"ph" => set_placeholder(&mut current, e),
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                b"t" => in_text_run = current.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" => set_placeholder(&mut current, e),
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(paragraph) = current.as_mut().and_then(|s| s.paragraphs.last_mut()) {
                        paragraph.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text_run => {
                let text = e.unescape().map_err(|e| xml_error("Invalid text", e))?;
                if let Some(paragraph) = current.as_mut().and_then(|s| s.paragraphs.last_mut()) {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text_run = false,
                b"sp" => {
                    if let Some(shape) = current.take() {
                        if !shape.text().is_empty() {
                            shapes.push(shape);
                        }
                    }
                    in_text_run = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("Error parsing slide", e)),
            _ => {}
        }
    }

    Ok(shapes)
}

fn set_placeholder(current: &mut Option<ShapeText>, e: &BytesStart) {
    if let Some(shape) = current.as_mut() {
        // a placeholder without a type is an object placeholder
        shape.placeholder = Some(attribute(e, b"type").unwrap_or_else(|| "obj".to_string()));
    }
}

/// Title placeholder text, else the first line of the first text shape
fn slide_title(shapes: &[ShapeText]) -> String {
    let from_placeholder = shapes
        .iter()
        .find(|s| matches!(s.placeholder.as_deref(), Some("title") | Some("ctrTitle")))
        .map(ShapeText::text)
        .filter(|text| !text.is_empty());

    from_placeholder
        .or_else(|| {
            shapes
                .iter()
                .map(ShapeText::text)
                .find(|text| !text.is_empty())
                .and_then(|text| text.lines().next().map(|line| line.trim().to_string()))
        })
        .unwrap_or_default()
}

/// Body placeholder first, then the other text shapes, without repeats
fn collect_notes(shapes: &[ShapeText]) -> String {
    let body = shapes.iter().filter(|s| s.placeholder.as_deref() == Some("body"));
    let others = shapes.iter().filter(|s| {
        s.placeholder.as_deref() != Some("body")
            && !s
                .placeholder
                .as_deref()
                .is_some_and(|kind| NON_NOTE_PLACEHOLDERS.contains(&kind))
    });

    let mut blocks: Vec<String> = Vec::new();
    for text in body.chain(others).map(ShapeText::text) {
        if !text.is_empty() && !blocks.contains(&text) {
            blocks.push(text);
        }
    }
    blocks.join("\n\n")
}

/// Split `ppt/slides/slide1.xml` into (`ppt/slides`, `slide1.xml`)
fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", path),
    }
}

/// Resolve a relationship target against the directory of its source part
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.chars().rev().collect::<String>().parse().ok()
}
