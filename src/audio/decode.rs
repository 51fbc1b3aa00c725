/*!
 * Decoding of provider audio into PCM.
 *
 * MP3 goes through symphonia; WAV is read with hound.
 */

use std::io::Cursor;

use log::debug;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{AudioContainer, AudioSegment, EncodedAudio};

/// Decode provider bytes into an interleaved PCM segment.
///
/// Errors are plain strings; the caller attaches the chunk number.
pub fn decode_audio(audio: &EncodedAudio) -> Result<AudioSegment, String> {
    if audio.data.is_empty() {
        return Err("no audio data".to_string());
    }
    match audio.container {
        AudioContainer::Mp3 => decode_with_symphonia(&audio.data, "mp3"),
        AudioContainer::Wav => decode_wav(&audio.data),
    }
}

fn decode_with_symphonia(data: &[u8], extension: &str) -> Result<AudioSegment, String> {
    let source = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| format!("unrecognized {} stream: {}", extension, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "no decodable audio track".to_string())?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| format!("unsupported codec: {}", e))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16).unwrap_or(0);
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(format!("failed to read packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            // a corrupt frame is skipped, the stream continues
            Err(SymphoniaError::DecodeError(e)) => debug!("Skipping undecodable frame: {}", e),
            Err(e) => return Err(format!("decode failed: {}", e)),
        }
    }

    if sample_rate == 0 || channels == 0 {
        return Err("stream carries no format information".to_string());
    }

    Ok(AudioSegment::new(sample_rate, channels, samples))
}

fn decode_wav(data: &[u8]) -> Result<AudioSegment, String> {
    let mut reader = hound::WavReader::new(Cursor::new(data))
        .map_err(|e| format!("invalid WAV data: {}", e))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid WAV samples: {}", e))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| format!("invalid WAV samples: {}", e))?
        }
    };

    Ok(AudioSegment::new(spec.sample_rate, spec.channels, samples))
}
