use crate::audio::{AudioChunk, PcmEncoder, WIRE_SAMPLE_RATE, to_pcm16};

/// WHAT: Full-scale samples map to i16 extremes in little-endian order
/// WHY: The backend reads raw PCM16LE; byte order mistakes are pure noise
#[test]
fn given_full_scale_samples_when_converting_then_i16_extremes_little_endian() {
    // Given: Silence, positive full scale, negative full scale
    let samples = [0.0, 1.0, -1.0];

    // When: Converting to PCM16
    let bytes = to_pcm16(&samples);

    // Then: Two bytes per sample with the expected values
    assert_eq!(bytes.len(), 6);
    assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 0);
    assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), i16::MAX);
    assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), -i16::MAX);
}

/// WHAT: Out-of-range samples are clamped
/// WHY: Hot microphones exceed 1.0 and must not wrap around
#[test]
fn given_clipping_samples_when_converting_then_clamped() {
    // Given: Samples beyond full scale
    let samples = [2.5, -3.0];

    // When: Converting to PCM16
    let bytes = to_pcm16(&samples);

    // Then: Values saturate instead of wrapping
    assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), i16::MAX);
    assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), -i16::MAX);
}

/// WHAT: Audio already at the wire rate is not buffered
/// WHY: 16kHz devices should stream with no added latency
#[test]
#[allow(clippy::unwrap_used)]
fn given_wire_rate_chunk_when_encoding_then_bytes_returned_immediately() {
    // Given: An encoder and a small 16kHz chunk
    let mut encoder = PcmEncoder::new();
    let chunk = AudioChunk {
        samples: vec![0.25; 160],
        sample_rate: WIRE_SAMPLE_RATE,
    };

    // When: Encoding
    let bytes = encoder.encode(chunk).unwrap();

    // Then: Every sample is emitted and nothing is left to flush
    assert_eq!(bytes.len(), 320);
    assert!(encoder.flush().unwrap().is_empty());
}

/// WHAT: Sub-block input at 48kHz is held until flush
/// WHY: The resampler needs whole blocks; the tail must still reach the backend
#[test]
#[allow(clippy::unwrap_used)]
fn given_short_48khz_chunk_when_encoding_then_buffered_until_flush() {
    // Given: An encoder and fewer samples than one resampler block
    let mut encoder = PcmEncoder::new();
    let chunk = AudioChunk {
        samples: vec![0.1; 480],
        sample_rate: 48_000,
    };

    // When: Encoding, then flushing
    let encoded = encoder.encode(chunk).unwrap();
    let flushed = encoder.flush().unwrap();

    // Then: Nothing is emitted until flush, which yields ~160 samples
    assert!(encoded.is_empty());
    let samples = flushed.len() / 2;
    assert!(
        (100..=220).contains(&samples),
        "Expected ~160 samples, got {}",
        samples
    );
}

/// WHAT: One second of 48kHz audio yields about one second at 16kHz
/// WHY: Streaming in callback-sized chunks must not drift or drop audio
#[test]
#[allow(clippy::unwrap_used)]
fn given_one_second_in_small_chunks_when_encoding_then_output_length_approximately_correct() {
    // Given: An encoder fed 100 chunks of 10ms at 48kHz
    let mut encoder = PcmEncoder::new();
    let mut total_bytes = 0;

    // When: Encoding every chunk, then flushing
    for _ in 0..100 {
        let chunk = AudioChunk {
            samples: vec![0.2; 480],
            sample_rate: 48_000,
        };
        total_bytes += encoder.encode(chunk).unwrap().len();
    }
    total_bytes += encoder.flush().unwrap().len();

    // Then: Roughly 16000 samples came out
    let samples = total_bytes / 2;
    assert!(
        (samples as i64 - 16_000).unsigned_abs() < 400,
        "Expected ~16000 samples, got {}",
        samples
    );
}
