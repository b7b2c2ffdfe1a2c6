pub(crate) mod capture;
mod devices;
mod encoder;
mod resampler;
mod sink;

pub(crate) use resampler::Resampler;

pub use {
    capture::AudioCapturer,
    devices::{AudioDeviceInfo, list_input_devices},
    encoder::{PcmEncoder, WIRE_SAMPLE_RATE, to_pcm16},
    sink::{AudioChunk, AudioSink},
};

use crate::CoreResult;

use async_trait::async_trait;

/// Microphone capture as seen by the session controller.
#[async_trait]
pub trait AudioSource: Send {
    /// Choose the input device for the next `start`. `None` means the system default.
    fn select_device(&mut self, device_id: Option<String>);

    /// Begin streaming captured audio into `sink`.
    ///
    /// Resolves once the device is open. Must not block the calling task.
    async fn start(&mut self, sink: AudioSink) -> CoreResult<()>;

    /// Stop streaming. No-op when not capturing.
    fn stop(&mut self);
}
