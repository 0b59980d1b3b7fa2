//! Default configuration constants for transcribo.
//!
//! Shared by the config file, the orchestrator and the engine bindings so
//! that the same numbers are used everywhere.

/// Sample rate the speech engine expects, in Hz (mono f32).
pub const SAMPLE_RATE: u32 = 16000;

/// Nominal chunk duration in seconds.
///
/// Bounds the length of a single engine call; the last chunk may be shorter.
pub const CHUNK_SECS: f64 = 30.0;

/// Seconds per engine timestamp tick (ticks are centiseconds).
pub const SECONDS_PER_TICK: f64 = 0.01;

/// Default language code for transcription.
///
/// "auto" lets the engine detect the spoken language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Reported language when detection was requested but the engine gave none.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Default whisper model name.
pub const DEFAULT_MODEL: &str = "base";

/// Report the GPU backend compiled into this build.
///
/// The engine decides the compute backend; this is informational only.
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_scale_is_centiseconds() {
        assert_eq!(150.0 * SECONDS_PER_TICK, 1.5);
    }

    #[test]
    fn default_chunk_holds_thirty_seconds_of_samples() {
        assert_eq!((CHUNK_SECS * SAMPLE_RATE as f64) as usize, 480_000);
    }

    #[test]
    fn gpu_backend_is_cpu_without_gpu_features() {
        if !cfg!(any(
            feature = "cuda",
            feature = "vulkan",
            feature = "hipblas",
            feature = "openblas"
        )) {
            assert_eq!(gpu_backend(), "CPU");
        }
    }
}
