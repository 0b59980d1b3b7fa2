//! Per-segment confidence scoring.
//!
//! A segment's confidence is the engine's native value when it reports one,
//! otherwise the arithmetic mean of its token probabilities. The two sources
//! are never blended. Segments without tokens score 0.0.

use crate::engine::RawSegment;

/// Confidence for one engine segment, always in [0, 1].
pub fn score(segment: &RawSegment) -> f32 {
    match segment.confidence {
        Some(native) => clamp_unit(native),
        None => mean_token_probability(segment),
    }
}

/// Mean of token probabilities; 0.0 for an empty token list.
pub fn mean_token_probability(segment: &RawSegment) -> f32 {
    if segment.tokens.is_empty() {
        return 0.0;
    }
    let sum: f64 = segment
        .tokens
        .iter()
        .map(|t| clamp_unit(t.probability) as f64)
        .sum();
    clamp_unit((sum / segment.tokens.len() as f64) as f32)
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
