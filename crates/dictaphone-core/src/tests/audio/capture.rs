use crate::audio::capture::downmix;

/// WHAT: Mono input passes through unchanged
/// WHY: Single-channel microphones need no mixing
#[test]
fn given_mono_frames_when_downmixing_then_samples_unchanged() {
    // Given: Mono samples
    let data = vec![0.1, -0.2, 0.3];

    // When: Downmixing with one channel
    let mono = downmix(&data, 1);

    // Then: Samples are identical
    assert_eq!(mono, data);
}

/// WHAT: Stereo frames are averaged per frame
/// WHY: The wire format is mono; both channels must contribute
#[test]
fn given_stereo_frames_when_downmixing_then_channels_averaged() {
    // Given: Two interleaved stereo frames
    let data = vec![1.0, 0.0, -0.5, -0.5];

    // When: Downmixing with two channels
    let mono = downmix(&data, 2);

    // Then: One sample per frame, each the channel average
    assert_eq!(mono.len(), 2);
    assert!((mono[0] - 0.5).abs() < f32::EPSILON);
    assert!((mono[1] + 0.5).abs() < f32::EPSILON);
}

/// WHAT: A trailing partial frame is averaged over the channels it has
/// WHY: A short callback buffer must not produce out-of-range samples
#[test]
fn given_partial_trailing_frame_when_downmixing_then_averaged_over_present_samples() {
    // Given: One full 3-channel frame plus a lone trailing sample
    let data = vec![0.3, 0.3, 0.3, 0.9];

    // When: Downmixing with three channels
    let mono = downmix(&data, 3);

    // Then: The trailing sample stands on its own
    assert_eq!(mono.len(), 2);
    assert!((mono[0] - 0.3).abs() < 1e-6);
    assert!((mono[1] - 0.9).abs() < 1e-6);
}

/// WHAT: Capturer starts against real hardware
/// WHY: Validates the dedicated audio thread opens a cpal stream
#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
#[allow(clippy::unwrap_used)]
async fn given_default_device_when_starting_capture_then_chunks_arrive() {
    use crate::audio::{AudioCapturer, AudioSink, AudioSource};

    // Given: A capturer on the default device
    let mut capturer = AudioCapturer::new().unwrap();
    let (sink, mut rx) = AudioSink::channel(64);

    // When: Capturing briefly
    capturer.start(sink).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    capturer.stop();

    // Then: At least one chunk was delivered
    assert!(rx.try_recv().is_ok());
}
