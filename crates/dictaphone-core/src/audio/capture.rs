use crate::{
    CoreError, CoreResult,
    audio::{AudioChunk, AudioSink, AudioSource},
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::JoinHandle,
    time::Duration,
};

use async_trait::async_trait;
use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tokio::{sync::oneshot, time::timeout};
use tracing::{debug, error, info, instrument, warn};

/// How long `start` waits for the audio thread to open the stream.
const START_TIMEOUT: Duration = Duration::from_secs(5);

enum CaptureCommand {
    Start {
        device_id: Option<String>,
        sink: AudioSink,
        reply: oneshot::Sender<CoreResult<()>>,
    },
    Stop,
    Shutdown,
}

/// Microphone capture on a dedicated audio thread.
///
/// `cpal::Stream` is not `Send` on every backend, so the stream never leaves
/// the thread that built it. The capturer talks to that thread over a
/// command channel and is itself `Send`. Replies come back on a oneshot so
/// the async caller never parks its worker thread.
pub struct AudioCapturer {
    selected_device: Option<String>,
    command_tx: mpsc::Sender<CaptureCommand>,
    thread: Option<JoinHandle<()>>,
}

impl AudioCapturer {
    /// Spawn the audio thread. No device is opened until `start`.
    #[track_caller]
    #[instrument]
    pub fn new() -> CoreResult<Self> {
        let (command_tx, command_rx) = mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || capture_thread(command_rx))
            .map_err(|e| CoreError::DeviceError {
                reason: format!("Failed to spawn audio thread: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("AudioCapturer initialized");

        Ok(Self {
            selected_device: None,
            command_tx,
            thread: Some(thread),
        })
    }
}

#[async_trait]
impl AudioSource for AudioCapturer {
    fn select_device(&mut self, device_id: Option<String>) {
        debug!(device_id = ?device_id, "Input device selected");
        self.selected_device = device_id;
    }

    async fn start(&mut self, sink: AudioSink) -> CoreResult<()> {
        let (reply, reply_rx) = oneshot::channel();

        self.command_tx
            .send(CaptureCommand::Start {
                device_id: self.selected_device.clone(),
                sink,
                reply,
            })
            .map_err(|_| CoreError::DeviceError {
                reason: "Audio thread is not running".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match timeout(START_TIMEOUT, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CoreError::DeviceError {
                reason: "Audio thread exited before opening the stream".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(_) => Err(CoreError::DeviceError {
                reason: "Timed out waiting for audio thread".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    fn stop(&mut self) {
        if self.command_tx.send(CaptureCommand::Stop).is_err() {
            warn!("Audio thread already gone");
        }
    }
}

impl Drop for AudioCapturer {
    fn drop(&mut self) {
        let _ = self.command_tx.send(CaptureCommand::Shutdown);

        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            error!("Audio capture thread panicked");
        }
    }
}

struct ActiveStream {
    _stream: Stream,
    /// Set before the stream is dropped so a late callback writes nothing.
    shutdown: Arc<AtomicBool>,
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

fn capture_thread(command_rx: mpsc::Receiver<CaptureCommand>) {
    let mut active: Option<ActiveStream> = None;

    while let Ok(command) = command_rx.recv() {
        match command {
            CaptureCommand::Start {
                device_id,
                sink,
                reply,
            } => {
                active = None;
                let result = open_stream(device_id.as_deref(), sink).map(|stream| {
                    active = Some(stream);
                });
                // A caller that gave up waiting must not leave the stream running.
                if reply.send(result).is_err() && active.take().is_some() {
                    warn!("Start abandoned by caller, closing stream");
                }
            }
            CaptureCommand::Stop => {
                if active.take().is_some() {
                    info!("Audio capture stopped");
                }
            }
            CaptureCommand::Shutdown => break,
        }
    }

    debug!("Audio thread exiting");
}

#[track_caller]
fn find_device(device_id: Option<&str>) -> CoreResult<Device> {
    let host = cpal::default_host();

    if let Some(id) = device_id {
        let devices = host.input_devices().map_err(|e| CoreError::DeviceError {
            reason: format!("Failed to enumerate devices: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        for device in devices {
            if device.id().is_ok_and(|dev_id| dev_id.to_string() == id) {
                return Ok(device);
            }
        }

        warn!(device_id = id, "Selected device not found, using default");
    }

    host.default_input_device()
        .ok_or(CoreError::NoMicrophoneFound {
            location: ErrorLocation::from(Location::caller()),
        })
}

#[track_caller]
fn open_stream(device_id: Option<&str>, sink: AudioSink) -> CoreResult<ActiveStream> {
    let device = find_device(device_id)?;

    let supported = device
        .default_input_config()
        .map_err(|e| CoreError::DeviceError {
            reason: format!("Failed to get config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let config: StreamConfig = supported.into();
    let channels = usize::from(config.channels.max(1));
    let sample_rate = config.sample_rate;

    let shutdown = Arc::new(AtomicBool::new(false));
    let callback_shutdown = Arc::clone(&shutdown);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if callback_shutdown.load(Ordering::Acquire) {
                    return;
                }
                let samples = downmix(data, channels);
                sink.push(AudioChunk {
                    samples,
                    sample_rate,
                });
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| CoreError::DeviceError {
            reason: format!("Failed to build stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    stream.play().map_err(|e| CoreError::DeviceError {
        reason: format!("Failed to start stream: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!(
        device_id = ?device.id().ok().map(|id| id.to_string()),
        sample_rate,
        channels,
        "Audio capture started"
    );

    Ok(ActiveStream {
        _stream: stream,
        shutdown,
    })
}

/// Average interleaved frames down to a single channel.
pub(crate) fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }

    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
