/*!
 * Speaker notes extraction from PowerPoint presentations.
 *
 * - `pptx`: reads slide titles and notes out of the OOXML package
 * - `export`: renders the rows as CSV, Markdown or JSON
 */

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::NotesError;

pub mod export;
pub mod pptx;

pub use export::{ExportOptions, NotesFormat, render};
pub use pptx::NotesExtractor;

/// Title and notes of one slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    /// 1-based position in the slide show
    pub slide_number: usize,
    /// Slide title, empty when the slide has none
    pub title: String,
    /// Speaker notes, blocks separated by a blank line
    pub notes: String,
}

/// Extract the notes of every slide in a `.pptx` file
pub fn extract_notes<P: AsRef<Path>>(path: P) -> Result<Vec<NoteRow>, NotesError> {
    let file = File::open(path.as_ref())?;
    NotesExtractor::new().extract(BufReader::new(file))
}

/// Unify `\r\n` and `\r` line endings to `\n`
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Speakable text of all notes, slides separated by blank lines
pub fn notes_as_text(rows: &[NoteRow]) -> String {
    rows.iter()
        .map(|row| row.notes.trim())
        .filter(|notes| !notes.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
