/*!
 * Splitting of long documents into bounded chunks.
 *
 * Lengths are counted in `char`s so that Japanese and other multi-byte
 * scripts are measured the way a speech provider counts them.
 */

use crate::errors::SpeechError;

/// Sentence ends and paragraph breaks, checked first
const SENTENCE_BREAKS: [char; 4] = ['。', '！', '？', '\n'];

/// ASCII terminators only count when followed by whitespace
const ASCII_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Clause-level breaks, used when no sentence end is close enough
const CLAUSE_BREAKS: [char; 2] = ['、', '，'];

/// A bounded, trimmed piece of the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of the chunk in the document
    pub index: usize,
    /// Trimmed chunk text
    pub text: String,
}

impl Chunk {
    /// 1-based chunk number, as shown to users
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into chunks of at most `max_len` characters.
///
/// Cuts prefer, in order: a sentence end or paragraph break, a clause break,
/// then any whitespace, as long as the cut keeps at least 80% of the window.
/// Otherwise the window is hard-cut at `max_len`, so an overlong word is split
/// rather than dropped. Chunks are trimmed and empty residue is discarded.
pub fn chunk_text(text: &str, max_len: usize) -> Result<Vec<Chunk>, SpeechError> {
    if max_len == 0 {
        return Err(SpeechError::InvalidOption(
            "chunk size must be at least 1 character".to_string(),
        ));
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let lookback = max_len / 5;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + max_len).min(total);

        if end < total {
            if let Some(cut) = find_break(&chars, start, end, lookback) {
                end = cut;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                text: trimmed.to_string(),
            });
        }

        start = end;
    }

    Ok(chunks)
}

/// Find the best cut position in `chars[start..end]`, returned as an absolute
/// exclusive end index. Only positions in the last `lookback` characters of
/// the window are considered.
fn find_break(chars: &[char], start: usize, end: usize, lookback: usize) -> Option<usize> {
    if lookback == 0 {
        return None;
    }
    let min_cut = (end - lookback).max(start + 1);

    let latest = |accept: &dyn Fn(usize) -> bool| -> Option<usize> {
        (min_cut..=end).rev().find(|&cut| accept(cut - 1))
    };

    let sentence_end = |i: usize| {
        let c = chars[i];
        SENTENCE_BREAKS.contains(&c)
            || (ASCII_TERMINATORS.contains(&c)
                && chars.get(i + 1).is_some_and(|next| next.is_whitespace()))
    };
    let clause_end = |i: usize| {
        let c = chars[i];
        CLAUSE_BREAKS.contains(&c)
            || (c == ',' && chars.get(i + 1).is_some_and(|next| next.is_whitespace()))
    };
    let whitespace = |i: usize| chars[i].is_whitespace();

    latest(&sentence_end)
        .or_else(|| latest(&clause_end))
        .or_else(|| latest(&whitespace))
}
