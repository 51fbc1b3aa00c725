/*!
 * Text preparation for speech synthesis.
 *
 * - `markdown`: strips markdown syntax so only readable prose remains
 * - `chunker`: splits long text into provider-sized chunks at natural breaks
 */

pub mod chunker;
pub mod markdown;

pub use chunker::{Chunk, chunk_text};
pub use markdown::{CleanOptions, MarkdownCleaner};
