/*!
 * Chunk synthesis.
 *
 * Drives a `Synthesizer` once per chunk with a per-call timeout, bounded
 * retries with exponential backoff, and optional concurrency. Results land
 * in slots indexed by chunk position, so the returned segments are always
 * in document order regardless of completion order.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::app_config::ProviderConfig;
use crate::audio::{AudioSegment, EncodedAudio, decode_audio};
use crate::errors::{ProviderError, SpeechError};
use crate::providers::Synthesizer;
use crate::text::Chunk;

/// Retry, timeout and concurrency settings of a synthesis run
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOptions {
    /// Limit for one provider call
    pub timeout: Duration,
    /// Extra attempts after the first failure
    pub retry_count: u32,
    /// Base backoff, doubled on each retry
    pub retry_backoff_ms: u64,
    /// Chunks in flight at once; 1 is strictly sequential
    pub concurrent_requests: usize,
    /// Minimum spacing between request starts, shared by all in-flight chunks
    pub rate_limit_delay_ms: u64,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::default())
    }
}

impl SynthesisOptions {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            retry_count: config.retry_count,
            retry_backoff_ms: config.retry_backoff_ms,
            concurrent_requests: config.concurrent_requests.max(1),
            rate_limit_delay_ms: config.rate_limit_delay_ms,
        }
    }
}

/// Delay before retry number `attempt` (1-based), with up to 10% jitter
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let delay_ms = base_ms.saturating_mul(1u64 << exponent);
    let jitter = if delay_ms >= 10 {
        rand::rng().random_range(0..=delay_ms / 10)
    } else {
        0
    };
    Duration::from_millis(delay_ms + jitter)
}

/// Spaces request starts at least `delay` apart across concurrent chunks
#[derive(Debug)]
struct RequestPacer {
    delay: Duration,
    next_slot: tokio::sync::Mutex<Option<tokio::time::Instant>>,
}

impl RequestPacer {
    fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            next_slot: tokio::sync::Mutex::new(None),
        }
    }

    /// Wait for this request's slot; the first request of a run goes at once
    async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        let start = {
            let mut next_slot = self.next_slot.lock().await;
            let now = tokio::time::Instant::now();
            let start = next_slot.map_or(now, |slot| slot.max(now));
            *next_slot = Some(start + self.delay);
            start
        };
        tokio::time::sleep_until(start).await;
    }
}

/// Synthesizes chunks through one provider
#[derive(Debug, Clone)]
pub struct SynthesisService {
    synthesizer: Arc<dyn Synthesizer>,
    options: SynthesisOptions,
}

impl SynthesisService {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, options: SynthesisOptions) -> Self {
        Self { synthesizer, options }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    pub fn provider_name(&self) -> &str {
        self.synthesizer.name()
    }

    /// Synthesize and decode every chunk, in order
    pub async fn synthesize_all(&self, chunks: &[Chunk], lang: &str) -> Result<Vec<AudioSegment>, SpeechError> {
        self.synthesize_all_with_progress(chunks, lang, |_, _| {}).await
    }

    /// Same as [`synthesize_all`](Self::synthesize_all), reporting `(done, total)` as chunks finish
    pub async fn synthesize_all_with_progress<F>(
        &self,
        chunks: &[Chunk],
        lang: &str,
        progress: F,
    ) -> Result<Vec<AudioSegment>, SpeechError>
    where
        F: Fn(usize, usize) + Sync,
    {
        if chunks.is_empty() {
            return Err(SpeechError::EmptyInput);
        }

        let total = chunks.len();
        if let Some(limit) = self.synthesizer.max_request_chars() {
            if let Some((position, chunk)) = chunks.iter().enumerate().find(|(_, c)| c.char_len() > limit) {
                return Err(SpeechError::InvalidOption(format!(
                    "chunk {} has {} characters, {} accepts at most {}",
                    position + 1,
                    chunk.char_len(),
                    self.synthesizer.name(),
                    limit
                )));
            }
        }

        info!(
            "Synthesizing {} chunk(s) with {} ({} concurrent)",
            total,
            self.synthesizer.name(),
            self.options.concurrent_requests
        );

        let started = Instant::now();
        let pacer = RequestPacer::new(self.options.rate_limit_delay_ms);
        let done = AtomicUsize::new(0);
        let mut slots: Vec<Option<AudioSegment>> = vec![None; total];

        let mut results = stream::iter(chunks.iter().enumerate())
            .map(|(position, chunk)| {
                let done = &done;
                let progress = &progress;
                let pacer = &pacer;
                async move {
                    let result = self.synthesize_chunk(position, chunk, total, lang, pacer).await;
                    if result.is_ok() {
                        progress(done.fetch_add(1, Ordering::SeqCst) + 1, total);
                    }
                    (position, result)
                }
            })
            .buffer_unordered(self.options.concurrent_requests.max(1));

        // the first failure aborts the run; in-flight calls are dropped with the stream
        while let Some((position, result)) = results.next().await {
            slots[position] = Some(result?);
        }
        drop(results);

        debug!("Synthesized {} chunk(s) in {:?}", total, started.elapsed());

        slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.ok_or(SpeechError::Provider {
                    chunk: position + 1,
                    total,
                    source: ProviderError::EmptyResponse,
                })
            })
            .collect()
    }

    /// One chunk: call with timeout and retries, then decode
    async fn synthesize_chunk(
        &self,
        position: usize,
        chunk: &Chunk,
        total: usize,
        lang: &str,
        pacer: &RequestPacer,
    ) -> Result<AudioSegment, SpeechError> {
        let number = position + 1;
        let audio = self.call_with_retry(position, chunk, total, lang, pacer).await?;

        let bytes = audio.data.len();
        let segment = tokio::task::spawn_blocking(move || decode_audio(&audio))
            .await
            .map_err(|e| SpeechError::UnsupportedFormat {
                chunk: Some(number),
                reason: format!("decoder task failed: {}", e),
            })?
            .map_err(|reason| SpeechError::UnsupportedFormat {
                chunk: Some(number),
                reason,
            })?;

        debug!(
            "Chunk {}/{}: {} chars -> {} bytes -> {:.2}s",
            number,
            total,
            chunk.char_len(),
            bytes,
            segment.duration_secs()
        );
        Ok(segment)
    }

    async fn call_with_retry(
        &self,
        position: usize,
        chunk: &Chunk,
        total: usize,
        lang: &str,
        pacer: &RequestPacer,
    ) -> Result<EncodedAudio, SpeechError> {
        let number = position + 1;
        let mut attempt = 0u32;

        loop {
            pacer.wait().await;

            let result = match tokio::time::timeout(self.options.timeout, self.synthesizer.synthesize(&chunk.text, lang)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.options.timeout.as_secs())),
            };

            match result {
                Ok(audio) => return Ok(audio),
                Err(e) if e.is_retriable() && attempt < self.options.retry_count => {
                    attempt += 1;
                    let delay = backoff_delay(self.options.retry_backoff_ms, attempt);
                    warn!(
                        "Chunk {}/{} failed ({}), retry {}/{} in {:?}",
                        number, total, e, attempt, self.options.retry_count, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(SpeechError::Provider {
                        chunk: number,
                        total,
                        source: e,
                    });
                }
            }
        }
    }
}
