use crate::audio::Resampler;

const CAPTURE_RATE: u32 = 48_000;
const WIRE_RATE: u32 = 16_000;

/// WHAT: A whole second of 48kHz audio comes out as a second at 16kHz
/// WHY: The backend only accepts 16kHz audio
#[test]
#[allow(clippy::unwrap_used)]
fn given_one_second_at_48khz_when_resampling_then_one_second_at_16khz() {
    // Given: Resampler configured for 48kHz -> 16kHz
    let mut resampler = Resampler::new(CAPTURE_RATE, WIRE_RATE).unwrap();
    let input = vec![0.5; CAPTURE_RATE as usize];

    // When: Resampling
    let output = resampler.resample(&input).unwrap();

    // Then: Output never exceeds the mapped length and stays close to it
    assert!(output.len() <= WIRE_RATE as usize);
    assert!(
        (output.len() as i64 - WIRE_RATE as i64).unsigned_abs() < 100,
        "Expected ~{} samples, got {}",
        WIRE_RATE,
        output.len()
    );
    assert!(output.iter().all(|s| s.is_finite()));
}

/// WHAT: Empty input yields empty output
/// WHY: Flushing an idle encoder must not emit padding
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_input_when_resampling_then_empty_output() {
    // Given: A resampler
    let mut resampler = Resampler::new(CAPTURE_RATE, WIRE_RATE).unwrap();

    // When: Resampling nothing
    let output = resampler.resample(&[]).unwrap();

    // Then: Nothing comes back
    assert!(output.is_empty());
}

/// WHAT: A partial block is padded internally but trimmed on output
/// WHY: The tail of an utterance must not grow trailing silence
#[test]
#[allow(clippy::unwrap_used)]
fn given_partial_block_when_resampling_then_output_trimmed_to_mapped_length() {
    // Given: Fewer samples than one block
    let mut resampler = Resampler::new(CAPTURE_RATE, WIRE_RATE).unwrap();
    let input: Vec<f32> = (0..300).map(|i| (i as f32 * 0.05).sin()).collect();

    // When: Resampling
    let output = resampler.resample(&input).unwrap();

    // Then: At most a third of the input length, all finite
    assert!(output.len() <= 100);
    assert!(output.iter().all(|s| s.is_finite() && s.abs() <= 1.5));
}

/// WHAT: Block size and input rate are reported as configured
/// WHY: The encoder buffers by block size and rebuilds on rate changes
#[test]
#[allow(clippy::unwrap_used)]
fn given_new_resampler_when_inspecting_then_reports_block_size_and_rate() {
    // Given/When: A 44.1kHz resampler
    let resampler = Resampler::new(44_100, WIRE_RATE).unwrap();

    // Then: Configuration is visible to callers
    assert_eq!(resampler.input_rate(), 44_100);
    assert!(resampler.chunk_size() > 0);
}
