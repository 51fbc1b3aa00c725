/*!
 * Integration tests for chunk synthesis: ordering, retries and timeouts
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use notevox::errors::{ProviderError, SpeechError};
use notevox::providers::mock::MockSynthesizer;
use notevox::synthesis::{SynthesisOptions, SynthesisService};
use notevox::text::chunk_text;

use crate::common::mock_providers::{MockErrorType, ScriptedSynthesizer};

fn options(retry_count: u32, concurrent_requests: usize) -> SynthesisOptions {
    SynthesisOptions {
        timeout: Duration::from_secs(5),
        retry_count,
        retry_backoff_ms: 1,
        concurrent_requests,
        rate_limit_delay_ms: 0,
    }
}

const THREE_SENTENCES: &str = "Alpha sentence one.\nBravo sentence two.\nCharlie sentence three.";

/// Test that concurrent results come back in document order
#[tokio::test]
async fn test_synthesizeAll_withSlowFirstChunk_shouldKeepDocumentOrder() {
    let synthesizer = ScriptedSynthesizer::new().delay("Alpha", 150).delay("Bravo", 50);
    let chunks = chunk_text(THREE_SENTENCES, 24).unwrap();
    assert_eq!(chunks.len(), 3);

    let service = SynthesisService::new(Arc::new(synthesizer.clone()), options(0, 3));
    let segments = service.synthesize_all(&chunks, "en").await.unwrap();

    // completion order differs from document order
    assert!(synthesizer.calls().len() == 3);
    for (segment, chunk) in segments.iter().zip(&chunks) {
        let expected_ms = synthesizer.duration_ms_for(&chunk.text);
        assert_eq!(segment.frames(), notevox::audio::frames_for_ms(24_000, expected_ms));
    }
}

/// Test that a chunk failing past its retries aborts with its number
#[tokio::test]
async fn test_synthesizeAll_withChunkTwoAlwaysFailing_shouldReportChunkTwo() {
    crate::common::init_test_logging();
    let synthesizer = ScriptedSynthesizer::new().fail_times("Bravo", usize::MAX, MockErrorType::Connection);
    let chunks = chunk_text(THREE_SENTENCES, 24).unwrap();

    let service = SynthesisService::new(Arc::new(synthesizer.clone()), options(2, 1));
    let err = service.synthesize_all(&chunks, "en").await.unwrap_err();

    match err {
        SpeechError::Provider { chunk, total, source } => {
            assert_eq!(chunk, 2);
            assert_eq!(total, 3);
            assert!(matches!(source, ProviderError::ConnectionError(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // first attempt plus two retries, and chunk 3 is never requested
    assert_eq!(synthesizer.calls_containing("Bravo"), 3);
    assert_eq!(synthesizer.calls_containing("Charlie"), 0);
}

/// Test recovery from transient rate limiting
#[tokio::test]
async fn test_synthesizeAll_withTransientRateLimit_shouldRecover() {
    let synthesizer = ScriptedSynthesizer::new().fail_times("Charlie", 2, MockErrorType::RateLimit);
    let chunks = chunk_text(THREE_SENTENCES, 24).unwrap();

    let service = SynthesisService::new(Arc::new(synthesizer.clone()), options(3, 2));
    let segments = service.synthesize_all(&chunks, "en").await.unwrap();

    assert_eq!(segments.len(), 3);
    assert_eq!(synthesizer.calls_containing("Charlie"), 3);
}

/// Test that client errors are not retried
#[tokio::test]
async fn test_synthesizeAll_withBadRequest_shouldNotRetry() {
    let synthesizer = ScriptedSynthesizer::new().fail_times("Alpha", 1, MockErrorType::BadRequest);
    let chunks = chunk_text(THREE_SENTENCES, 24).unwrap();

    let service = SynthesisService::new(Arc::new(synthesizer.clone()), options(5, 1));
    let err = service.synthesize_all(&chunks, "en").await.unwrap_err();

    assert_eq!(err.chunk(), Some(1));
    assert_eq!(synthesizer.calls().len(), 1);
}

/// Test that a hanging provider call times out and is reported
#[tokio::test]
async fn test_synthesizeAll_withSlowProvider_shouldTimeOut() {
    let chunks = chunk_text("Only one chunk here.", 100).unwrap();
    let mut opts = options(1, 1);
    opts.timeout = Duration::from_millis(50);

    let service = SynthesisService::new(Arc::new(MockSynthesizer::slow(1_000)), opts);
    let started = Instant::now();
    let err = service.synthesize_all(&chunks, "ja").await.unwrap_err();

    assert!(matches!(err, SpeechError::Provider { chunk: 1, source: ProviderError::Timeout(_), .. }));
    assert!(started.elapsed() < Duration::from_millis(900));
}

/// Test the pause between sequential requests
#[tokio::test]
async fn test_synthesizeAll_withRateLimitDelay_shouldSpaceRequests() {
    let chunks = chunk_text(THREE_SENTENCES, 24).unwrap();
    let mut opts = options(0, 1);
    opts.rate_limit_delay_ms = 60;

    let service = SynthesisService::new(Arc::new(MockSynthesizer::working()), opts);
    let started = Instant::now();
    service.synthesize_all(&chunks, "en").await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(120));
}
