/*!
 * Tests for file utilities
 */

use notevox::file_utils::FileManager;
use std::path::{Path, PathBuf};

use crate::common;

/// Test reading an existing file
#[test]
fn test_readInput_withFile_shouldReturnContent() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "in.txt", "hello").unwrap();
    assert_eq!(FileManager::read_input(&path).unwrap(), "hello");
}

/// Test that the stdio marker is recognized
#[test]
fn test_isStdio_shouldOnlyMatchDash() {
    assert!(FileManager::is_stdio("-"));
    assert!(!FileManager::is_stdio("-.txt"));
    assert!(!FileManager::is_stdio("out.mp3"));
}

/// Test that atomic writes leave only the final file behind
#[test]
fn test_writeOutput_toFile_shouldLeaveSingleFile() {
    let temp_dir = common::create_temp_dir().unwrap();
    let target = temp_dir.path().join("notes.md");
    FileManager::write_output(&target, "# Notes\n").unwrap();

    let entries: Vec<PathBuf> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries, vec![target.clone()]);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "# Notes\n");
}

/// Test the default notes path for bare file names
#[test]
fn test_notesOutputPath_withBareName_shouldStayRelative() {
    assert_eq!(FileManager::notes_output_path(Path::new("deck.pptx"), "json"), PathBuf::from("deck_notes.json"));
}
