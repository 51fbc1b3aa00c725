/*!
 * # notevox - read documents and speaker notes aloud
 *
 * A Rust library that turns long text into one continuous spoken audio file.
 *
 * ## Features
 *
 * - Split text into provider-safe chunks at sentence and clause boundaries
 * - Synthesize chunks through a speech provider with timeouts, retries and
 *   bounded concurrency:
 *   - Google Translate speech endpoint
 *   - Deterministic mock provider for tests and offline runs
 * - Assemble the chunk audio with speed change, gain and silence gaps
 * - Encode the result as MP3 or WAV, written atomically
 * - Strip markdown syntax before reading
 * - Export speaker notes from PowerPoint (.pptx) files as CSV, Markdown or JSON
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `text`: Chunking and markdown cleaning
 * - `providers`: Speech provider trait and implementations
 * - `synthesis`: Ordered, retried synthesis of all chunks
 * - `audio`: Decoding, transforms, assembly and encoding
 * - `notes`: PPTX speaker notes extraction and export
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audio;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod notes;
pub mod providers;
pub mod synthesis;
pub mod text;

// Re-export main types for easier usage
pub use app_config::{Config, SpeechOptions};
pub use audio::{AudioSegment, OutputFormat, assembler::assemble};
pub use errors::{AppError, NotesError, ProviderError, SpeechError};
pub use language_utils::{get_language_name, validate_language_code};
pub use notes::{NoteRow, extract_notes};
pub use synthesis::SynthesisService;
pub use text::{Chunk, chunk_text};
