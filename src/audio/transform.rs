/*!
 * Per-segment audio transforms: format normalization, speed and gain.
 */

use std::f32::consts::PI;

use rubato::{FftFixedIn, Resampler};

use super::AudioSegment;
use crate::errors::SpeechError;

/// Input block size handed to the FFT resampler
const RESAMPLE_CHUNK: usize = 1024;

/// Overlap-add window length for time-stretching
const STRETCH_WINDOW_MS: f32 = 40.0;

/// Speeds this close to 1.0 are treated as unchanged
const SPEED_EPSILON: f32 = 1e-3;

fn unsupported(reason: String) -> SpeechError {
    SpeechError::UnsupportedFormat { chunk: None, reason }
}

/// Resample to `target_rate`, keeping the duration (frame count scales with the rate).
pub fn resample(segment: &AudioSegment, target_rate: u32) -> Result<AudioSegment, SpeechError> {
    if segment.sample_rate == target_rate {
        return Ok(segment.clone());
    }
    if segment.sample_rate == 0 || target_rate == 0 || segment.channels == 0 {
        return Err(unsupported(format!(
            "cannot resample {} Hz / {} channels to {} Hz",
            segment.sample_rate, segment.channels, target_rate
        )));
    }

    let frames = segment.frames();
    let channels = segment.channels as usize;
    let expected = ((frames as u64 * target_rate as u64 + segment.sample_rate as u64 / 2)
        / segment.sample_rate as u64) as usize;
    if frames == 0 {
        return Ok(AudioSegment::empty(target_rate, segment.channels));
    }

    let mut resampler = FftFixedIn::<f32>::new(
        segment.sample_rate as usize,
        target_rate as usize,
        RESAMPLE_CHUNK,
        2,
        channels,
    )
    .map_err(|e| unsupported(format!("resampler setup failed: {}", e)))?;
    let delay = resampler.output_delay();

    let planar = segment.to_planar();
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay + RESAMPLE_CHUNK); channels];
    let mut position = 0;

    // Zero-padding past the end flushes the resampler's internal delay.
    while output[0].len() < expected + delay {
        let needed = resampler.input_frames_next();
        let block: Vec<Vec<f32>> = planar
            .iter()
            .map(|channel| {
                let mut block = vec![0.0; needed];
                if position < frames {
                    let end = (position + needed).min(frames);
                    block[..end - position].copy_from_slice(&channel[position..end]);
                }
                block
            })
            .collect();
        position += needed;

        let produced = resampler
            .process(&block, None)
            .map_err(|e| unsupported(format!("resampling failed: {}", e)))?;
        for (dst, src) in output.iter_mut().zip(produced) {
            dst.extend_from_slice(&src);
        }
    }

    let trimmed: Vec<Vec<f32>> = output
        .into_iter()
        .map(|channel| channel[delay..delay + expected].to_vec())
        .collect();

    Ok(AudioSegment::from_planar(target_rate, &trimmed))
}

/// Convert to `target_channels`. Only mono up-mixing is supported.
pub fn match_channels(segment: AudioSegment, target_channels: u16) -> Result<AudioSegment, SpeechError> {
    if segment.channels == target_channels {
        return Ok(segment);
    }
    if segment.channels != 1 {
        return Err(unsupported(format!(
            "cannot convert {} channels to {}",
            segment.channels, target_channels
        )));
    }

    let copies = target_channels as usize;
    let samples = segment
        .samples
        .iter()
        .flat_map(|s| std::iter::repeat_n(*s, copies))
        .collect();
    Ok(AudioSegment::new(segment.sample_rate, target_channels, samples))
}

/// Change playback speed without changing pitch.
///
/// `speed > 1` shortens the segment. The result has exactly
/// `round(frames / speed)` frames.
pub fn change_speed(segment: &AudioSegment, speed: f32) -> AudioSegment {
    if (speed - 1.0).abs() <= SPEED_EPSILON || segment.is_empty() {
        return segment.clone();
    }

    let frames = segment.frames();
    let out_frames = (frames as f64 / speed as f64).round() as usize;
    let window = ((segment.sample_rate as f32 * STRETCH_WINDOW_MS / 1000.0) as usize).max(4) & !1;

    let planar = segment.to_planar();
    let stretched: Vec<Vec<f32>> = if frames < window * 2 {
        planar.iter().map(|channel| stretch_linear(channel, out_frames)).collect()
    } else {
        planar.iter().map(|channel| stretch_ola(channel, out_frames, window, speed)).collect()
    };

    AudioSegment::from_planar(segment.sample_rate, &stretched)
}

/// Windowed overlap-add: analysis hop = synthesis hop * speed.
fn stretch_ola(input: &[f32], out_frames: usize, window: usize, speed: f32) -> Vec<f32> {
    // half-sample offset keeps every tap non-zero, so no output frame is left unweighted
    let hann: Vec<f32> = (0..window)
        .map(|k| 0.5 - 0.5 * (2.0 * PI * (k as f32 + 0.5) / window as f32).cos())
        .collect();
    let hop_out = window / 2;
    let hop_in = hop_out as f64 * speed as f64;
    let last_in_pos = input.len().saturating_sub(window);

    let mut output = vec![0.0f32; out_frames];
    let mut weight = vec![0.0f32; out_frames];

    let mut step = 0usize;
    loop {
        let out_pos = step * hop_out;
        if out_pos >= out_frames {
            break;
        }
        // analysis frames never run past the input, or the tail would fade to silence
        let in_pos = ((step as f64 * hop_in).round() as usize).min(last_in_pos);
        for (k, w) in hann.iter().enumerate() {
            let o = out_pos + k;
            if o >= out_frames {
                break;
            }
            let sample = input.get(in_pos + k).copied().unwrap_or(0.0);
            output[o] += w * sample;
            weight[o] += w;
        }
        step += 1;
    }

    for (sample, w) in output.iter_mut().zip(&weight) {
        if *w > 0.0 {
            *sample /= w;
        }
    }
    output
}

/// Linear interpolation onto `out_frames` points, for clips too short to window.
fn stretch_linear(input: &[f32], out_frames: usize) -> Vec<f32> {
    if input.is_empty() || out_frames == 0 {
        return vec![0.0; out_frames];
    }
    let ratio = input.len() as f64 / out_frames as f64;
    (0..out_frames)
        .map(|i| {
            let pos = i as f64 * ratio;
            let base = pos.floor() as usize;
            let frac = (pos - base as f64) as f32;
            let a = input[base.min(input.len() - 1)];
            let b = input[(base + 1).min(input.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Amplify by `gain_db` decibels, clipping at full scale.
pub fn apply_gain(segment: &mut AudioSegment, gain_db: f32) {
    if gain_db == 0.0 {
        return;
    }
    let factor = 10f32.powf(gain_db / 20.0);
    for sample in segment.samples.iter_mut() {
        *sample = (*sample * factor).clamp(-1.0, 1.0);
    }
}
