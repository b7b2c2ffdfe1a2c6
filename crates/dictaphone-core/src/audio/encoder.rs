use crate::{
    CoreResult,
    audio::{AudioChunk, Resampler},
};

use tracing::debug;

/// Sample rate the backend expects on the wire.
pub const WIRE_SAMPLE_RATE: u32 = 16_000;

/// Turns captured chunks into PCM16 little-endian mono at [`WIRE_SAMPLE_RATE`].
///
/// Resampling works on whole blocks, so input is buffered until a block is
/// complete. [`PcmEncoder::flush`] drains whatever is left.
pub struct PcmEncoder {
    resampler: Option<Resampler>,
    pending: Vec<f32>,
}

impl Default for PcmEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PcmEncoder {
    /// Create an encoder with no resampler; one is built for the first chunk's rate.
    pub fn new() -> Self {
        Self {
            resampler: None,
            pending: Vec::new(),
        }
    }

    /// Encode a chunk. May return an empty buffer while a block is filling.
    pub fn encode(&mut self, chunk: AudioChunk) -> CoreResult<Vec<u8>> {
        if chunk.sample_rate == WIRE_SAMPLE_RATE {
            return Ok(to_pcm16(&chunk.samples));
        }

        let rate_changed = self
            .resampler
            .as_ref()
            .is_none_or(|r| r.input_rate() != chunk.sample_rate);

        if rate_changed {
            debug!(
                input_rate = chunk.sample_rate,
                output_rate = WIRE_SAMPLE_RATE,
                "Configuring wire resampler"
            );
            self.resampler = Some(Resampler::new(chunk.sample_rate, WIRE_SAMPLE_RATE)?);
            self.pending.clear();
        }

        self.pending.extend_from_slice(&chunk.samples);

        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(Vec::new());
        };

        let whole = self.pending.len() - self.pending.len() % resampler.chunk_size();
        if whole == 0 {
            return Ok(Vec::new());
        }

        let block: Vec<f32> = self.pending.drain(..whole).collect();
        let resampled = resampler.resample(&block)?;

        Ok(to_pcm16(&resampled))
    }

    /// Encode any buffered remainder.
    pub fn flush(&mut self) -> CoreResult<Vec<u8>> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(Vec::new());
        };

        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let remainder = std::mem::take(&mut self.pending);
        let resampled = resampler.resample(&remainder)?;

        Ok(to_pcm16(&resampled))
    }
}

/// Convert float samples to PCM16 little-endian bytes, clamping to full scale.
pub fn to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}
