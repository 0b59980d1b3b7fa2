//! Fixed-duration chunking of a sample buffer.
//!
//! Chunks are contiguous, non-overlapping slices of the input; only the
//! final chunk may be shorter than the nominal duration. Each call to
//! [`chunk`] returns a fresh iterator, so a plan can be walked any number of
//! times.

use crate::defaults;

/// One bounded-duration slice of the input buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioChunk<'a> {
    /// Position in the chunk sequence, starting at 0.
    pub index: usize,
    /// Offset of the first sample within the whole buffer.
    pub offset: usize,
    pub samples: &'a [f32],
}

impl AudioChunk<'_> {
    /// Absolute start time of this chunk in seconds.
    pub fn start_secs(&self, sample_rate: u32) -> f64 {
        self.offset as f64 / sample_rate as f64
    }

    /// Absolute end time of this chunk in seconds.
    pub fn end_secs(&self, sample_rate: u32) -> f64 {
        (self.offset + self.samples.len()) as f64 / sample_rate as f64
    }
}

/// Lazy iterator over the chunks of a buffer.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    samples: &'a [f32],
    chunk_len: usize,
    next_offset: usize,
    next_index: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = AudioChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_offset >= self.samples.len() {
            return None;
        }

        let end = (self.next_offset + self.chunk_len).min(self.samples.len());
        let chunk = AudioChunk {
            index: self.next_index,
            offset: self.next_offset,
            samples: &self.samples[self.next_offset..end],
        };
        self.next_offset = end;
        self.next_index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.samples.len() - self.next_offset).div_ceil(self.chunk_len);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Number of samples in a chunk of `chunk_secs` at `sample_rate`.
///
/// Never less than one sample, so degenerate durations still make progress.
pub fn chunk_len(chunk_secs: f64, sample_rate: u32) -> usize {
    let len = (chunk_secs * sample_rate as f64).round();
    if len.is_finite() && len >= 1.0 {
        len as usize
    } else {
        1
    }
}

/// Split `samples` into chunks of `chunk_secs` seconds.
pub fn chunk(samples: &[f32], chunk_secs: f64, sample_rate: u32) -> Chunks<'_> {
    Chunks {
        samples,
        chunk_len: chunk_len(chunk_secs, sample_rate),
        next_offset: 0,
        next_index: 0,
    }
}

/// Split `samples` into chunks of the default duration at the default rate.
pub fn chunk_default(samples: &[f32]) -> Chunks<'_> {
    chunk(samples, defaults::CHUNK_SECS, defaults::SAMPLE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_preserve_every_sample() {
        for len in [0usize, 1, 15_999, 16_000, 16_001, 47_123] {
            let samples: Vec<f32> = (0..len).map(|i| i as f32).collect();
            let chunks: Vec<_> = chunk(&samples, 1.0, 16_000).collect();

            let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
            assert_eq!(total, len, "sample count changed for len {len}");

            let rejoined: Vec<f32> = chunks.iter().flat_map(|c| c.samples.iter().copied()).collect();
            assert_eq!(rejoined, samples);
        }
    }

    #[test]
    fn test_chunks_are_ordered_and_contiguous() {
        let samples = vec![0.0f32; 100_000];
        let chunks: Vec<_> = chunk(&samples, 2.0, 16_000).collect();

        let mut expected_offset = 0;
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.offset, expected_offset);
            expected_offset += c.samples.len();
        }
    }

    #[test]
    fn test_only_last_chunk_is_short() {
        let samples = vec![0.0f32; 16_000 * 45];
        let chunks: Vec<_> = chunk_default(&samples).collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].samples.len(), 16_000 * 30);
        assert_eq!(chunks[1].samples.len(), 16_000 * 15);
        assert_eq!(chunks[1].start_secs(16_000), 30.0);
        assert_eq!(chunks[1].end_secs(16_000), 45.0);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let samples = vec![0.0f32; 16_000 * 60];
        assert_eq!(chunk_default(&samples).count(), 2);
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        assert_eq!(chunk_default(&[]).len(), 0);
    }

    #[test]
    fn test_chunking_is_restartable() {
        let samples = vec![0.5f32; 40_000];
        let first: Vec<_> = chunk(&samples, 1.0, 16_000).collect();
        let second: Vec<_> = chunk(&samples, 1.0, 16_000).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_size_hint_is_exact() {
        let samples = vec![0.0f32; 33_000];
        let mut chunks = chunk(&samples, 1.0, 16_000);
        assert_eq!(chunks.len(), 3);
        chunks.next();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_degenerate_duration_falls_back_to_one_sample() {
        assert_eq!(chunk_len(0.0, 16_000), 1);
        assert_eq!(chunk_len(f64::NAN, 16_000), 1);
        assert_eq!(chunk_len(-3.0, 16_000), 1);
        assert_eq!(chunk_len(0.5, 16_000), 8_000);
    }
}
