/*!
 * Assembly of per-chunk audio into a single timeline.
 *
 * Segments are first normalized to a common format (highest sample rate,
 * highest channel count), then each one is time-stretched and amplified,
 * and finally they are joined in order with a fixed silence gap between
 * consecutive segments.
 */

use log::debug;

use super::{AudioSegment, transform};
use crate::errors::SpeechError;

/// Per-run assembly settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyOptions {
    /// Playback speed factor, `> 1` is faster
    pub speed: f32,
    /// Gain applied to every segment, in dB
    pub gain_db: f32,
    /// Silence between consecutive segments
    pub silence_ms: u32,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            speed: 1.2,
            gain_db: 3.0,
            silence_ms: 250,
        }
    }
}

/// Ordered concatenation under construction
struct Timeline {
    sample_rate: u32,
    channels: u16,
    silence_ms: u32,
    samples: Vec<f32>,
    segments: usize,
}

impl Timeline {
    fn new(sample_rate: u32, channels: u16, silence_ms: u32, capacity: usize) -> Self {
        Self {
            sample_rate,
            channels,
            silence_ms,
            samples: Vec::with_capacity(capacity),
            segments: 0,
        }
    }

    /// Append a segment, preceded by the gap unless it is the first one
    fn push(&mut self, segment: &AudioSegment) {
        if self.segments > 0 && self.silence_ms > 0 {
            let gap = AudioSegment::silence(self.sample_rate, self.channels, self.silence_ms);
            self.samples.extend_from_slice(&gap.samples);
        }
        self.samples.extend_from_slice(&segment.samples);
        self.segments += 1;
    }

    fn finish(self) -> AudioSegment {
        AudioSegment::new(self.sample_rate, self.channels, self.samples)
    }
}

/// Joins decoded chunks into one continuous segment
#[derive(Debug, Clone)]
pub struct AudioAssembler {
    options: AssemblyOptions,
}

impl AudioAssembler {
    /// Create an assembler, rejecting a non-positive or non-finite speed
    pub fn new(options: AssemblyOptions) -> Result<Self, SpeechError> {
        if !options.speed.is_finite() || options.speed <= 0.0 {
            return Err(SpeechError::InvalidOption(format!(
                "speed must be a positive number, got {}",
                options.speed
            )));
        }
        if !options.gain_db.is_finite() {
            return Err(SpeechError::InvalidOption(format!(
                "gain must be a finite number, got {}",
                options.gain_db
            )));
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Assemble `segments` in order
    pub fn assemble(&self, segments: Vec<AudioSegment>) -> Result<AudioSegment, SpeechError> {
        self.assemble_with_progress(segments, |_, _| {})
    }

    /// Assemble `segments` in order, reporting `(done, total)` after each one
    pub fn assemble_with_progress<F>(&self, segments: Vec<AudioSegment>, mut progress: F) -> Result<AudioSegment, SpeechError>
    where
        F: FnMut(usize, usize),
    {
        if segments.is_empty() {
            return Err(SpeechError::EmptyInput);
        }

        let (sample_rate, channels) = target_format(&segments)?;
        let total = segments.len();
        debug!(
            "Assembling {} segments at {} Hz, {} channel(s), speed {}, gain {} dB",
            total, sample_rate, channels, self.options.speed, self.options.gain_db
        );

        let estimated: usize = segments
            .iter()
            .map(|s| (s.duration_secs() * sample_rate as f64 / self.options.speed as f64) as usize)
            .sum::<usize>()
            .saturating_add(total * super::frames_for_ms(sample_rate, self.options.silence_ms))
            * channels as usize;
        let mut timeline = Timeline::new(sample_rate, channels, self.options.silence_ms, estimated);

        for (position, segment) in segments.into_iter().enumerate() {
            let number = position + 1;
            let normalized = normalize(segment, sample_rate, channels).map_err(|e| match e {
                SpeechError::UnsupportedFormat { chunk: None, reason } => {
                    SpeechError::UnsupportedFormat { chunk: Some(number), reason }
                }
                other => other,
            })?;

            let mut stretched = transform::change_speed(&normalized, self.options.speed);
            transform::apply_gain(&mut stretched, self.options.gain_db);
            timeline.push(&stretched);

            progress(number, total);
        }

        let output = timeline.finish();
        debug!("Assembled {:.2}s of audio", output.duration_secs());
        Ok(output)
    }
}

/// Highest sample rate and channel count across all segments
fn target_format(segments: &[AudioSegment]) -> Result<(u32, u16), SpeechError> {
    for (position, segment) in segments.iter().enumerate() {
        if segment.sample_rate == 0 || segment.channels == 0 {
            return Err(SpeechError::UnsupportedFormat {
                chunk: Some(position + 1),
                reason: format!("{} Hz with {} channel(s)", segment.sample_rate, segment.channels),
            });
        }
    }

    let sample_rate = segments.iter().map(|s| s.sample_rate).max().unwrap_or(0);
    let channels = segments.iter().map(|s| s.channels).max().unwrap_or(0);
    Ok((sample_rate, channels))
}

fn normalize(segment: AudioSegment, sample_rate: u32, channels: u16) -> Result<AudioSegment, SpeechError> {
    let segment = transform::match_channels(segment, channels)?;
    if segment.sample_rate == sample_rate {
        Ok(segment)
    } else {
        transform::resample(&segment, sample_rate)
    }
}

/// Convenience wrapper around [`AudioAssembler`]
pub fn assemble(segments: Vec<AudioSegment>, speed: f32, gain_db: f32, silence_ms: u32) -> Result<AudioSegment, SpeechError> {
    AudioAssembler::new(AssemblyOptions {
        speed,
        gain_db,
        silence_ms,
    })?
    .assemble(segments)
}
