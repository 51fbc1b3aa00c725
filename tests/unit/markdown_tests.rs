/*!
 * Tests for markdown cleaning
 */

use notevox::text::{CleanOptions, MarkdownCleaner};

/// Test a realistic document
#[test]
fn test_clean_withTalkDocument_shouldLeaveSpeakableText() {
    let text = "# Plan\n\n1. **Ship** the `beta`\n2. Collect [feedback](https://x.test)\n\n> Quote here\n\n---\n\nDone.";
    let cleaned = MarkdownCleaner::new().clean(text);
    assert_eq!(cleaned, "Plan\n\nShip the beta\nCollect feedback\n\nQuote here\n\nDone.");
}

/// Test that reference links and footnotes go away
#[test]
fn test_clean_withReferenceLinks_shouldKeepLabel() {
    let cleaned = MarkdownCleaner::new().clean("Read [the guide][1] first[^n].\n[^n]: Footnote");
    assert_eq!(cleaned, "Read the guide first.");
}

/// Test that options can be combined
#[test]
fn test_clean_withBothPreserveOptions_shouldOnlyStripStructure() {
    let cleaner = MarkdownCleaner::with_options(CleanOptions {
        preserve_links: true,
        preserve_emphasis: true,
    });
    assert_eq!(cleaner.clean("## *Hi* [a](b)"), "*Hi* [a](b)");
}

/// Test empty and whitespace input
#[test]
fn test_clean_withBlankInput_shouldReturnEmpty() {
    assert_eq!(MarkdownCleaner::new().clean(""), "");
    assert_eq!(MarkdownCleaner::new().clean("  \n\n   "), "");
}

/// Test windows line endings
#[test]
fn test_clean_withCrLf_shouldNormalize() {
    assert_eq!(MarkdownCleaner::new().clean("# A\r\n\r\nB"), "A\n\nB");
}
