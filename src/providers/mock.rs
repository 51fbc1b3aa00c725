/*!
 * Mock synthesizer implementations for testing.
 *
 * The mock renders a sine tone whose length follows the text length, so the
 * whole pipeline can run without network access. Behaviors:
 * - `MockSynthesizer::working()` - Always succeeds
 * - `MockSynthesizer::intermittent(n)` - Fails every Nth request
 * - `MockSynthesizer::failing()` - Always fails with an error
 * - `MockSynthesizer::fail_on_text(s)` - Fails whenever the text contains `s`
 */

use async_trait::async_trait;
use std::f32::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Synthesizer;
use crate::audio::{AudioSegment, EncodedAudio, encode};
use crate::errors::ProviderError;

/// Behavior mode for the mock synthesizer
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a tone
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Fails with a server error whenever the text contains the marker
    FailOnText { marker: String },
    /// Returns no audio bytes
    Empty,
    /// Returns bytes that are not audio
    Garbage,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock synthesizer for testing the conversion pipeline
#[derive(Debug)]
pub struct MockSynthesizer {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Output sample rate
    sample_rate: u32,
    /// Output channel count
    channels: u16,
    /// Audio length per character of text
    ms_per_char: u32,
    /// Advertised request limit
    max_request_chars: Option<usize>,
}

impl MockSynthesizer {
    /// Create a new mock synthesizer with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            sample_rate: 24_000,
            channels: 1,
            ms_per_char: 10,
            max_request_chars: None,
        }
    }

    /// Create a working mock that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that fails on texts containing `marker`
    pub fn fail_on_text(marker: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailOnText { marker: marker.into() })
    }

    /// Create a mock that returns empty audio
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that returns undecodable bytes
    pub fn garbage() -> Self {
        Self::new(MockBehavior::Garbage)
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set the output format of the generated audio
    pub fn with_format(mut self, sample_rate: u32, channels: u16) -> Self {
        self.sample_rate = sample_rate;
        self.channels = channels;
        self
    }

    /// Set how many milliseconds of audio each character produces
    pub fn with_ms_per_char(mut self, ms_per_char: u32) -> Self {
        self.ms_per_char = ms_per_char;
        self
    }

    /// Advertise a request size limit
    pub fn with_max_request_chars(mut self, max: usize) -> Self {
        self.max_request_chars = Some(max);
        self
    }

    /// Number of requests received so far (shared between clones)
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Duration the mock renders for `text`
    pub fn duration_ms_for(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.ms_per_char
    }

    /// Render the tone for `text` as WAV bytes
    pub fn render(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let frames = crate::audio::frames_for_ms(self.sample_rate, self.duration_ms_for(text));
        let channels = self.channels as usize;
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            let value = 0.25 * (2.0 * PI * 440.0 * i as f32 / self.sample_rate as f32).sin();
            samples.extend(std::iter::repeat_n(value, channels));
        }

        let segment = AudioSegment::new(self.sample_rate, self.channels, samples);
        encode::encode_wav(&segment).map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

impl Clone for MockSynthesizer {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            request_count: Arc::clone(&self.request_count),
            sample_rate: self.sample_rate,
            channels: self.channels,
            ms_per_char: self.ms_per_char,
            max_request_chars: self.max_request_chars,
        }
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, text: &str, _lang: &str) -> Result<EncodedAudio, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Working => Ok(EncodedAudio::wav(self.render(text)?)),

            MockBehavior::Intermittent { fail_every } => {
                if *fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(EncodedAudio::wav(self.render(text)?))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::FailOnText { marker } => {
                if text.contains(marker.as_str()) {
                    Err(ProviderError::ConnectionError(format!("Simulated failure on '{}'", marker)))
                } else {
                    Ok(EncodedAudio::wav(self.render(text)?))
                }
            }

            MockBehavior::Empty => Ok(EncodedAudio::wav(Vec::new())),

            MockBehavior::Garbage => Ok(EncodedAudio::mp3(b"this is not an mp3 stream".to_vec())),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(EncodedAudio::wav(self.render(text)?))
            }
        }
    }

    fn max_request_chars(&self) -> Option<usize> {
        self.max_request_chars
    }
}
