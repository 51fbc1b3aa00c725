/*!
 * Audio handling for synthesized speech.
 *
 * - `decode`: provider bytes (MP3/WAV) to PCM segments
 * - `transform`: resampling, channel up-mix, time-stretch and gain
 * - `assembler`: joins segments into one timeline with silence gaps
 * - `encode`: PCM to MP3 (LAME) or WAV
 *
 * All PCM is kept as interleaved `f32` in `[-1.0, 1.0]`.
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod assembler;
pub mod decode;
pub mod encode;
pub mod transform;

pub use assembler::{AssemblyOptions, AudioAssembler};
pub use decode::decode_audio;
pub use encode::encode_audio;

/// Container of the bytes a provider hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContainer {
    Mp3,
    Wav,
}

/// Encoded audio for one chunk, straight from a provider
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub data: Vec<u8>,
    pub container: AudioContainer,
}

impl EncodedAudio {
    pub fn mp3(data: Vec<u8>) -> Self {
        Self { data, container: AudioContainer::Mp3 }
    }

    pub fn wav(data: Vec<u8>) -> Self {
        Self { data, container: AudioContainer::Wav }
    }
}

/// Output file format
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// Guess the format from a path's extension, defaulting to MP3
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().map(|e| e.to_string_lossy().to_lowercase()) {
            Some(ext) if ext == "wav" => Self::Wav,
            _ => Self::Mp3,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Decoded PCM audio with its format
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Frames per second
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Interleaved samples, `frames * channels` long
    pub samples: Vec<f32>,
}

impl AudioSegment {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self { sample_rate, channels, samples }
    }

    /// An empty segment of the given format
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(sample_rate, channels, Vec::new())
    }

    /// `ms` milliseconds of digital silence
    pub fn silence(sample_rate: u32, channels: u16, ms: u32) -> Self {
        let frames = frames_for_ms(sample_rate, ms);
        Self::new(sample_rate, channels, vec![0.0; frames * channels as usize])
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs())
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Split into one buffer per channel
    pub fn to_planar(&self) -> Vec<Vec<f32>> {
        let channels = self.channels as usize;
        if channels == 0 {
            return Vec::new();
        }
        let mut planar = vec![Vec::with_capacity(self.frames()); channels];
        for frame in self.samples.chunks_exact(channels) {
            for (buffer, sample) in planar.iter_mut().zip(frame) {
                buffer.push(*sample);
            }
        }
        planar
    }

    /// Build a segment from per-channel buffers of equal length
    pub fn from_planar(sample_rate: u32, planar: &[Vec<f32>]) -> Self {
        let channels = planar.len();
        let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for buffer in planar {
                samples.push(buffer[i]);
            }
        }
        Self::new(sample_rate, channels as u16, samples)
    }
}

/// Frame count for a duration in milliseconds, rounded to the nearest frame
pub fn frames_for_ms(sample_rate: u32, ms: u32) -> usize {
    ((sample_rate as u64 * ms as u64 + 500) / 1000) as usize
}
