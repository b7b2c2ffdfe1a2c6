use crate::{CoreError, CoreResult};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument, trace};

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Mono FFT resampler working on fixed input blocks of [`Resampler::chunk_size`].
pub struct Resampler {
    resampler: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
    output_chunk: Vec<f32>,
}

impl Resampler {
    #[track_caller]
    #[instrument]
    pub fn new(input_rate: u32, output_rate: u32) -> CoreResult<Self> {
        let resampler = Fft::<f32>::new(
            input_rate as usize,
            output_rate as usize,
            CHUNK_SIZE,
            SUB_CHUNKS,
            1,
            FixedSync::Input,
        )
        .map_err(|e| CoreError::ResamplingError {
            reason: format!("Failed to create resampler: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let output_chunk = vec![0.0f32; resampler.output_frames_max()];

        debug!(input_rate, output_rate, chunk_size = CHUNK_SIZE, "Resampler initialized");

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            output_chunk,
        })
    }

    /// Number of input frames consumed per processing step.
    pub fn chunk_size(&self) -> usize {
        CHUNK_SIZE
    }

    /// Rate the resampler expects its input at.
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Resample `samples`, zero-padding the trailing partial block.
    ///
    /// Output is trimmed to the length the input would map to at the output
    /// rate, so padding never shows up as trailing silence. Streaming callers
    /// should hand in whole multiples of [`Resampler::chunk_size`] and only
    /// pass a remainder when flushing.
    #[track_caller]
    #[instrument(skip(self, samples))]
    pub fn resample(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let expected_len =
            (samples.len() as f64 * self.output_rate as f64 / self.input_rate as f64) as usize;
        let mut output = Vec::with_capacity(expected_len);

        for chunk in samples.chunks(CHUNK_SIZE) {
            if chunk.len() < CHUNK_SIZE {
                let mut padded = chunk.to_vec();
                padded.resize(CHUNK_SIZE, 0.0);
                self.process_block(&padded, &mut output)?;
            } else {
                self.process_block(chunk, &mut output)?;
            }
        }

        output.truncate(expected_len);

        trace!(
            input_len = samples.len(),
            output_len = output.len(),
            "Resampled block"
        );

        Ok(output)
    }

    #[track_caller]
    fn process_block(&mut self, block: &[f32], output: &mut Vec<f32>) -> CoreResult<()> {
        let input_adapter = InterleavedSlice::new(block, 1, CHUNK_SIZE).map_err(|e| {
            CoreError::ResamplingError {
                reason: format!("Failed to create input adapter: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let output_frames = self.output_chunk.len();
        let mut output_adapter =
            InterleavedSlice::new_mut(&mut self.output_chunk, 1, output_frames).map_err(|e| {
                CoreError::ResamplingError {
                    reason: format!("Failed to create output adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

        let (_consumed, written) = self
            .resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| CoreError::ResamplingError {
                reason: format!("Resampling failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        output.extend_from_slice(&self.output_chunk[..written]);

        Ok(())
    }
}
