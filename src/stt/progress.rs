//! Progress reporting during a transcription.
//!
//! Progress is reported once per completed chunk as the fraction of samples
//! processed. Sinks run on the transcribing thread while the model lock is
//! held: a slow sink stalls the transcription, and a sink that calls back
//! into the same [`Transcriber`](crate::stt::transcriber::Transcriber) gets a
//! reentrancy error rather than a deadlock.

use crossbeam_channel::Sender;

/// Receives progress fractions in [0, 1].
pub trait ProgressSink {
    fn on_progress(&self, fraction: f32);
}

impl<F: Fn(f32)> ProgressSink for F {
    fn on_progress(&self, fraction: f32) {
        self(fraction)
    }
}

/// Sends each fraction down a channel. A disconnected receiver is ignored.
impl ProgressSink for Sender<f32> {
    fn on_progress(&self, fraction: f32) {
        // Receiver gone means nobody is watching
        self.send(fraction).ok();
    }
}

/// Turns sample counts into monotonic progress calls on an optional sink.
pub struct ProgressReporter<'a> {
    sink: Option<&'a dyn ProgressSink>,
    total_samples: usize,
    last: f32,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: Option<&'a dyn ProgressSink>, total_samples: usize) -> Self {
        Self {
            sink,
            total_samples,
            last: 0.0,
        }
    }

    /// Report that `processed_samples` of the total are done.
    ///
    /// Never reports less than the previous value; reports exactly 1.0 once
    /// everything is processed.
    pub fn report(&mut self, processed_samples: usize) {
        let Some(sink) = self.sink else {
            return;
        };

        let fraction = if processed_samples >= self.total_samples {
            1.0
        } else {
            (processed_samples as f64 / self.total_samples as f64) as f32
        };
        let fraction = fraction.max(self.last);
        self.last = fraction;
        sink.on_progress(fraction);
    }

    /// Last reported fraction.
    pub fn last(&self) -> f32 {
        self.last
    }
}
