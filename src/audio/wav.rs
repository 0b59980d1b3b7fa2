//! WAV decoding for the command-line front end.
//!
//! Produces the flat mono f32 buffer the transcriber expects: channels are
//! averaged, integer PCM is normalised to [-1.0, 1.0], and other sample
//! rates are linearly resampled to 16 kHz.

use crate::defaults::SAMPLE_RATE;
use crate::error::AudioError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Decoded audio ready for transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    /// Rate of the source file, before resampling.
    pub source_rate: u32,
    pub source_channels: u16,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / SAMPLE_RATE as f64
    }
}

/// Read and decode a WAV file.
pub fn load_wav(path: &Path) -> Result<DecodedAudio, AudioError> {
    let file = File::open(path)?;
    decode_wav(BufReader::new(file))
}

/// Decode WAV data from any reader.
pub fn decode_wav<R: Read>(reader: R) -> Result<DecodedAudio, AudioError> {
    let wav_reader = hound::WavReader::new(reader)?;
    let spec = wav_reader.spec();

    if spec.channels == 0 {
        return Err(AudioError::FormatMismatch {
            expected: "at least one channel".to_string(),
            actual: "0 channels".to_string(),
        });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => wav_reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            wav_reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let mono = downmix(&interleaved, spec.channels as usize);
    let samples = resample(&mono, spec.sample_rate, SAMPLE_RATE);

    Ok(DecodedAudio {
        samples,
        source_rate: spec.sample_rate,
        source_channels: spec.channels,
    })
}

/// Average interleaved channels into one.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Simple linear interpolation resampling.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as f32
            }
        })
        .collect()
}
