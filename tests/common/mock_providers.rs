/*!
 * Scripted speech providers for testing
 *
 * These wrap the library's tone generator and add per-text failure scripts,
 * artificial latency and a log of received requests, so tests can check
 * retry and ordering behavior without network access.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notevox::audio::EncodedAudio;
use notevox::errors::ProviderError;
use notevox::providers::Synthesizer;
use notevox::providers::mock::MockSynthesizer;

/// Type of error to simulate
#[derive(Debug, Clone, Copy)]
pub enum MockErrorType {
    /// Connection error (retried)
    Connection,
    /// Rate limit error (retried)
    RateLimit,
    /// Client error (not retried)
    BadRequest,
}

impl MockErrorType {
    fn to_error(self) -> ProviderError {
        match self {
            Self::Connection => ProviderError::ConnectionError("simulated connection reset".to_string()),
            Self::RateLimit => ProviderError::RateLimitExceeded("429 Too Many Requests".to_string()),
            Self::BadRequest => ProviderError::ApiError {
                status_code: 400,
                message: "simulated bad request".to_string(),
            },
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    /// marker -> (remaining failures, error)
    failures: HashMap<String, (usize, MockErrorType)>,
    /// marker -> latency
    delays: HashMap<String, u64>,
    /// Texts in the order requests arrived
    calls: Vec<String>,
}

/// Provider whose failures and latency are scripted per text marker
#[derive(Debug, Clone)]
pub struct ScriptedSynthesizer {
    tone: MockSynthesizer,
    script: Arc<Mutex<Script>>,
}

impl ScriptedSynthesizer {
    pub fn new() -> Self {
        Self {
            tone: MockSynthesizer::working(),
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// Fail the first `times` requests whose text contains `marker`
    pub fn fail_times(self, marker: &str, times: usize, error: MockErrorType) -> Self {
        self.script.lock().unwrap().failures.insert(marker.to_string(), (times, error));
        self
    }

    /// Delay requests whose text contains `marker`
    pub fn delay(self, marker: &str, delay_ms: u64) -> Self {
        self.script.lock().unwrap().delays.insert(marker.to_string(), delay_ms);
        self
    }

    /// Texts received so far, in arrival order
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Number of requests whose text contains `marker`
    pub fn calls_containing(&self, marker: &str) -> usize {
        self.calls().iter().filter(|text| text.contains(marker)).count()
    }

    /// Milliseconds of tone rendered for `text`
    pub fn duration_ms_for(&self, text: &str) -> u32 {
        self.tone.duration_ms_for(text)
    }
}

#[async_trait]
impl Synthesizer for ScriptedSynthesizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn synthesize(&self, text: &str, _lang: &str) -> Result<EncodedAudio, ProviderError> {
        let (delay_ms, failure) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(text.to_string());

            let delay_ms = script
                .delays
                .iter()
                .find(|(marker, _)| text.contains(marker.as_str()))
                .map(|(_, ms)| *ms)
                .unwrap_or(0);

            let failure = script
                .failures
                .iter_mut()
                .find(|(marker, (remaining, _))| *remaining > 0 && text.contains(marker.as_str()))
                .map(|(_, (remaining, error))| {
                    *remaining -= 1;
                    error.to_error()
                });
            (delay_ms, failure)
        };

        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        Ok(EncodedAudio::wav(self.tone.render(text)?))
    }
}
