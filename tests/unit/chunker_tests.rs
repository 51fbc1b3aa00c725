/*!
 * Tests for text chunking
 */

use notevox::errors::SpeechError;
use notevox::text::chunk_text;

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Test the documented 4000 / 1800 split
#[test]
fn test_chunkText_with4000Chars_shouldProduceThreeChunks() {
    let sentence = "This sentence is exactly fifty characters long ok. ";
    assert_eq!(sentence.chars().count(), 51);
    let text: String = sentence.repeat(80).chars().take(4000).collect();

    let chunks = chunk_text(&text, 1800).unwrap();

    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.char_len() <= 1800));
    assert_eq!(squash(&chunks.iter().map(|c| c.text.as_str()).collect::<String>()), squash(&text));
}

/// Test that short documents stay whole
#[test]
fn test_chunkText_withTextUnderLimit_shouldReturnTrimmedText() {
    let chunks = chunk_text("\n  A short note.  \n", 1800).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "A short note.");
}

/// Test that every character survives chunking of mixed scripts
#[test]
fn test_chunkText_withMixedScripts_shouldPreserveContent() {
    let text = "最初の段落です。English follows here, with a clause. 次は、読点で区切られた長い文章が続きます。 Final words!".repeat(7);
    for limit in [15, 40, 97] {
        let chunks = chunk_text(&text, limit).unwrap();
        assert!(chunks.iter().all(|c| c.char_len() <= limit), "limit {}", limit);
        assert!(chunks.iter().all(|c| c.text == c.text.trim() && !c.text.is_empty()));
        assert_eq!(squash(&chunks.iter().map(|c| c.text.as_str()).collect::<String>()), squash(&text));
    }
}

/// Test that Japanese full stops are preferred over the hard limit
#[test]
fn test_chunkText_withJapaneseSentences_shouldCutAtFullStop() {
    let text = "これは一文目です。これは二文目です。";
    let chunks = chunk_text(text, 10).unwrap();
    assert_eq!(chunks[0].text, "これは一文目です。");
    assert_eq!(chunks[1].text, "これは二文目です。");
}

/// Test invalid limits
#[test]
fn test_chunkText_withZeroLimit_shouldFail() {
    assert!(matches!(chunk_text("text", 0), Err(SpeechError::InvalidOption(_))));
}
