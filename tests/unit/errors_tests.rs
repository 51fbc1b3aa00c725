/*!
 * Tests for error types
 */

use notevox::errors::{AppError, ProviderError, SpeechError};

/// Test that provider failures name the chunk and keep the source
#[test]
fn test_speechError_provider_shouldExposeStageAndChunk() {
    let error = SpeechError::Provider {
        chunk: 2,
        total: 3,
        source: ProviderError::Timeout(30),
    };
    assert_eq!(error.stage(), "synthesis");
    assert_eq!(error.chunk(), Some(2));
    assert!(error.to_string().contains('2'));

    let source = std::error::Error::source(&error).unwrap();
    assert!(source.to_string().contains("30"));
}

/// Test stage names of the other variants
#[test]
fn test_speechError_stage_shouldMatchVariant() {
    assert_eq!(SpeechError::EmptyInput.stage(), "input");
    assert_eq!(SpeechError::Encoding("x".into()).stage(), "encode");
    assert_eq!(SpeechError::EmptyInput.chunk(), None);
}

/// Test conversion into the application error
#[test]
fn test_appError_fromSpeechError_shouldWrap() {
    let app: AppError = SpeechError::EmptyInput.into();
    assert!(matches!(app, AppError::Speech(SpeechError::EmptyInput)));
    let app: AppError = anyhow::anyhow!("boom").into();
    assert!(app.to_string().contains("boom"));
}

/// Test that speech errors survive an anyhow round trip for the CLI
#[test]
fn test_anyhow_withContext_shouldStillDowncast() {
    let error = anyhow::Error::from(SpeechError::EmptyInput).context("Failed to read talk.md");
    let found = error.chain().find_map(|cause| cause.downcast_ref::<SpeechError>());
    assert!(matches!(found, Some(SpeechError::EmptyInput)));
}
