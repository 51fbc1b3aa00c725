/*!
 * Rendering of extracted notes as CSV, Markdown or JSON.
 */

use std::fmt;
use std::str::FromStr;

use super::NoteRow;
use crate::errors::NotesError;

const MD_HEADING: &str = "# Speaker Notes Export";
const MD_NO_NOTES: &str = "_(no notes)_";
const MD_UNTITLED: &str = "(untitled)";
const MD_PAGE_BREAK: &str = r#"<div style="page-break-after: always;"></div>"#;

/// Output format for extracted notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotesFormat {
    #[default]
    Csv,
    Md,
    Json,
}

impl NotesFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Md => "md",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for NotesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for NotesFormat {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "md" | "markdown" => Ok(Self::Md),
            "json" => Ok(Self::Json),
            other => Err(NotesError::Export(format!("Unknown notes format: {}", other))),
        }
    }
}

/// Layout switches for the exporters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOptions {
    /// Empty line between slide rows in CSV
    pub csv_blank_row: bool,
    /// Line inserted between slides in Markdown (e.g. `---`)
    pub md_separator: Option<String>,
    /// Page-break div between slides in Markdown
    pub md_pagebreak: bool,
}

/// Render rows in the requested format
pub fn render(rows: &[NoteRow], format: NotesFormat, options: &ExportOptions) -> Result<String, NotesError> {
    match format {
        NotesFormat::Csv => render_csv(rows, options.csv_blank_row),
        NotesFormat::Md => Ok(render_markdown(rows, options)),
        NotesFormat::Json => render_json(rows),
    }
}

fn render_csv(rows: &[NoteRow], blank_row: bool) -> Result<String, NotesError> {
    let csv_error = |e: csv::Error| NotesError::Export(format!("CSV write failed: {}", e));
    let mut buffer: Vec<u8> = Vec::new();

    // one writer per record so blank lines can go straight into the buffer;
    // an empty csv record would be written as `""`
    write_csv_record(&mut buffer, ["slide_number", "title", "notes"]).map_err(csv_error)?;
    for (i, row) in rows.iter().enumerate() {
        if blank_row && i > 0 {
            buffer.push(b'\n');
        }
        let number = row.slide_number.to_string();
        write_csv_record(&mut buffer, [number.as_str(), row.title.as_str(), row.notes.as_str()]).map_err(csv_error)?;
    }

    String::from_utf8(buffer).map_err(|e| NotesError::Export(format!("CSV is not UTF-8: {}", e)))
}

fn write_csv_record(buffer: &mut Vec<u8>, record: [&str; 3]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buffer);
    writer.write_record(record)?;
    writer.flush()?;
    Ok(())
}

fn render_markdown(rows: &[NoteRow], options: &ExportOptions) -> String {
    let mut lines: Vec<&str> = vec![MD_HEADING, ""];
    let headings: Vec<String> = rows
        .iter()
        .map(|row| {
            let title = row.title.trim();
            let title = if title.is_empty() { MD_UNTITLED } else { title };
            format!("## Slide {}: {}", row.slide_number, title)
        })
        .collect();

    for (i, (row, heading)) in rows.iter().zip(&headings).enumerate() {
        lines.push(heading);
        lines.push("");
        let notes = row.notes.trim();
        lines.push(if notes.is_empty() { MD_NO_NOTES } else { notes });
        lines.push("");

        if i + 1 < rows.len() {
            if let Some(separator) = options.md_separator.as_deref() {
                lines.push(separator);
                lines.push("");
            }
            if options.md_pagebreak {
                lines.push(MD_PAGE_BREAK);
                lines.push("");
            }
        }
    }

    lines.join("\n")
}

fn render_json(rows: &[NoteRow]) -> Result<String, NotesError> {
    let mut json =
        serde_json::to_string_pretty(rows).map_err(|e| NotesError::Export(format!("JSON encode failed: {}", e)))?;
    json.push('\n');
    Ok(json)
}
