/*!
 * Tests for audio assembly through the public API
 */

use notevox::audio::{AssemblyOptions, AudioAssembler, AudioSegment, EncodedAudio, OutputFormat, decode_audio, encode_audio};
use notevox::errors::SpeechError;

fn tone(sample_rate: u32, channels: u16, ms: u32, amplitude: f32) -> AudioSegment {
    let frames = notevox::audio::frames_for_ms(sample_rate, ms);
    let samples = (0..frames * channels as usize)
        .map(|i| if (i / channels as usize) % 2 == 0 { amplitude } else { -amplitude })
        .collect();
    AudioSegment::new(sample_rate, channels, samples)
}

/// Test the duration law for uneven segments
#[test]
fn test_assemble_withUnevenSegments_shouldAddGapsBetweenOnly() {
    let segments = vec![
        tone(16_000, 1, 300, 0.1),
        tone(16_000, 1, 1_250, 0.1),
        tone(16_000, 1, 40, 0.1),
        tone(16_000, 1, 800, 0.1),
    ];
    let expected_frames: usize = segments.iter().map(AudioSegment::frames).sum::<usize>() + 3 * 1_920;

    let output = notevox::assemble(segments, 1.0, 0.0, 120).unwrap();

    assert_eq!(output.frames(), expected_frames);
    // the timeline neither starts nor ends with a gap
    assert!(output.samples[0] != 0.0);
    assert!(*output.samples.last().unwrap() != 0.0);
}

/// Test that a faster speed shortens every segment but not the gaps
#[test]
fn test_assemble_withDoubleSpeed_shouldHalveSpeech() {
    let segments = vec![tone(16_000, 1, 1_000, 0.2), tone(16_000, 1, 1_000, 0.2)];
    let output = notevox::assemble(segments, 2.0, 0.0, 500).unwrap();
    assert_eq!(output.frames(), 8_000 + 8_000 + 8_000);
}

/// Test that mixed inputs come out in the richest format
#[test]
fn test_assemble_withMonoAndStereo_shouldUpmix() {
    let segments = vec![tone(22_050, 1, 500, 0.1), tone(22_050, 2, 500, 0.1)];
    let output = notevox::assemble(segments, 1.0, 0.0, 0).unwrap();
    assert_eq!(output.channels, 2);
    assert_eq!(output.sample_rate, 22_050);
    assert!((output.duration_secs() - 1.0).abs() < 0.001);
}

/// Test that the assembled timeline survives WAV encoding
#[test]
fn test_assembleThenEncodeWav_shouldDecodeToSameLength() {
    let assembler = AudioAssembler::new(AssemblyOptions { speed: 1.0, gain_db: 0.0, silence_ms: 250 }).unwrap();
    let output = assembler
        .assemble(vec![tone(24_000, 1, 1_000, 0.3), tone(24_000, 1, 1_000, 0.3)])
        .unwrap();

    let bytes = encode_audio(&output, OutputFormat::Wav, 192).unwrap();
    let decoded = decode_audio(&EncodedAudio::wav(bytes)).unwrap();

    assert_eq!(decoded.frames(), output.frames());
    assert!((decoded.duration_secs() - 2.25).abs() < 0.001);
}

/// Test that a non-finite gain is rejected before any work
#[test]
fn test_new_withNanGain_shouldFail() {
    let result = AudioAssembler::new(AssemblyOptions { speed: 1.0, gain_db: f32::NAN, silence_ms: 0 });
    assert!(matches!(result, Err(SpeechError::InvalidOption(_))));
}

/// Test that a zero-rate segment is reported with its chunk number
#[test]
fn test_assemble_withBrokenSegment_shouldNameChunk() {
    let segments = vec![tone(16_000, 1, 100, 0.1), AudioSegment::new(0, 1, vec![0.0; 10])];
    match notevox::assemble(segments, 1.0, 0.0, 0) {
        Err(SpeechError::UnsupportedFormat { chunk, .. }) => assert_eq!(chunk, Some(2)),
        other => panic!("unexpected result: {:?}", other),
    }
}
