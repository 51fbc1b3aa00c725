/*!
 * Final encoding of the assembled timeline.
 */

use std::io::Cursor;

use log::debug;
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};

use super::{AudioSegment, OutputFormat, transform};
use crate::errors::SpeechError;

/// Sample rates LAME accepts as input
const MP3_SAMPLE_RATES: [u32; 9] = [8_000, 11_025, 12_000, 16_000, 22_050, 24_000, 32_000, 44_100, 48_000];

/// Bitrates exposed in the configuration, in kbps
pub const SUPPORTED_BITRATES: [u32; 7] = [64, 96, 128, 160, 192, 256, 320];

fn encoding(message: impl Into<String>) -> SpeechError {
    SpeechError::Encoding(message.into())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn lame_bitrate(kbps: u32) -> Option<Bitrate> {
    match kbps {
        64 => Some(Bitrate::Kbps64),
        96 => Some(Bitrate::Kbps96),
        128 => Some(Bitrate::Kbps128),
        160 => Some(Bitrate::Kbps160),
        192 => Some(Bitrate::Kbps192),
        256 => Some(Bitrate::Kbps256),
        320 => Some(Bitrate::Kbps320),
        _ => None,
    }
}

/// Encode `segment` into the requested container
pub fn encode_audio(segment: &AudioSegment, format: OutputFormat, bitrate_kbps: u32) -> Result<Vec<u8>, SpeechError> {
    match format {
        OutputFormat::Mp3 => encode_mp3(segment, bitrate_kbps),
        OutputFormat::Wav => encode_wav(segment),
    }
}

/// 16-bit PCM WAV
pub fn encode_wav(segment: &AudioSegment) -> Result<Vec<u8>, SpeechError> {
    let spec = hound::WavSpec {
        channels: segment.channels,
        sample_rate: segment.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| encoding(format!("WAV writer setup failed: {}", e)))?;
        for sample in &segment.samples {
            writer
                .write_sample(to_i16(*sample))
                .map_err(|e| encoding(format!("WAV write failed: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| encoding(format!("WAV finalize failed: {}", e)))?;
    }

    Ok(cursor.into_inner())
}

/// Reject settings the encoder would refuse, before any audio is produced
pub fn check_output_settings(format: OutputFormat, bitrate_kbps: u32) -> Result<(), SpeechError> {
    if format == OutputFormat::Mp3 && lame_bitrate(bitrate_kbps).is_none() {
        return Err(SpeechError::InvalidOption(format!(
            "unsupported MP3 bitrate {} kbps (supported: {:?})",
            bitrate_kbps, SUPPORTED_BITRATES
        )));
    }
    Ok(())
}

/// MP3 through LAME at a constant bitrate
pub fn encode_mp3(segment: &AudioSegment, bitrate_kbps: u32) -> Result<Vec<u8>, SpeechError> {
    let bitrate = lame_bitrate(bitrate_kbps)
        .ok_or_else(|| encoding(format!("unsupported MP3 bitrate: {} kbps", bitrate_kbps)))?;
    if !(1..=2).contains(&segment.channels) {
        return Err(encoding(format!("MP3 supports 1 or 2 channels, got {}", segment.channels)));
    }

    let resampled;
    let segment = if MP3_SAMPLE_RATES.contains(&segment.sample_rate) {
        segment
    } else {
        let target = MP3_SAMPLE_RATES
            .iter()
            .copied()
            .find(|rate| *rate >= segment.sample_rate)
            .unwrap_or(48_000);
        debug!("Resampling {} Hz to {} Hz for MP3 output", segment.sample_rate, target);
        resampled = transform::resample(segment, target)?;
        &resampled
    };

    let mut builder = Builder::new().ok_or_else(|| encoding("failed to allocate LAME encoder"))?;
    builder
        .set_num_channels(segment.channels as u8)
        .map_err(|e| encoding(format!("LAME channels: {:?}", e)))?;
    builder
        .set_sample_rate(segment.sample_rate)
        .map_err(|e| encoding(format!("LAME sample rate: {:?}", e)))?;
    builder
        .set_brate(bitrate)
        .map_err(|e| encoding(format!("LAME bitrate: {:?}", e)))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| encoding(format!("LAME quality: {:?}", e)))?;
    let mut encoder = builder
        .build()
        .map_err(|e| encoding(format!("LAME init: {:?}", e)))?;

    let pcm: Vec<i16> = segment.samples.iter().map(|s| to_i16(*s)).collect();
    let mut output = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(segment.frames()));

    let written = if segment.channels == 1 {
        encoder.encode_to_vec(MonoPcm(&pcm), &mut output)
    } else {
        encoder.encode_to_vec(InterleavedPcm(&pcm), &mut output)
    }
    .map_err(|e| encoding(format!("LAME encode: {:?}", e)))?;
    let flushed = encoder
        .flush_to_vec::<FlushNoGap>(&mut output)
        .map_err(|e| encoding(format!("LAME flush: {:?}", e)))?;

    debug!("Encoded {} frames into {} MP3 bytes", segment.frames(), written + flushed);
    Ok(output)
}
