//! Rendering a transcript for the terminal or for subtitle files.

use crate::stt::types::{Segment, TranscriptionResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::str::FromStr;

/// Output format for a finished transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain joined text.
    #[default]
    Text,
    Srt,
    Vtt,
    /// The full result as pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::Vtt),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown output format '{other}' (expected text, srt, vtt or json)"
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

/// Render `result` in the requested format. Always ends with a newline.
pub fn render(result: &TranscriptionResult, format: OutputFormat) -> Result<String, serde_json::Error> {
    let rendered = match format {
        OutputFormat::Text => format!("{}\n", result.text),
        OutputFormat::Srt => render_srt(&result.segments),
        OutputFormat::Vtt => render_vtt(&result.segments),
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(result)?),
    };
    Ok(rendered)
}

fn render_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (n, segment) in cues(segments).enumerate() {
        if n > 0 {
            out.push('\n');
        }
        // Writing to a String cannot fail
        writeln!(
            out,
            "{}\n{} --> {}\n{}",
            n + 1,
            timestamp(segment.start, ','),
            timestamp(segment.end, ','),
            segment.text
        )
        .ok();
    }
    out
}

fn render_vtt(segments: &[Segment]) -> String {
    let mut out = String::from("WEBVTT\n");
    for segment in cues(segments) {
        writeln!(
            out,
            "\n{} --> {}\n{}",
            timestamp(segment.start, '.'),
            timestamp(segment.end, '.'),
            segment.text
        )
        .ok();
    }
    out
}

/// Segments worth a subtitle cue.
fn cues(segments: &[Segment]) -> impl Iterator<Item = &Segment> {
    segments.iter().filter(|s| !s.text.is_empty())
}

/// `HH:MM:SS<sep>mmm`, rounding to the nearest millisecond.
fn timestamp(secs: f64, separator: char) -> String {
    let total_ms = if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        separator,
        ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> TranscriptionResult {
        TranscriptionResult {
            text: "hello there general".into(),
            language: "en".into(),
            duration: 3725.5,
            segments: vec![
                Segment {
                    id: 0,
                    start: 0.0,
                    end: 1.25,
                    text: "hello there".into(),
                    confidence: 0.9,
                },
                Segment {
                    id: 1,
                    start: 1.25,
                    end: 1.5,
                    text: String::new(),
                    confidence: 0.0,
                },
                Segment {
                    id: 2,
                    start: 3723.0,
                    end: 3725.5,
                    text: "general".into(),
                    confidence: 0.8,
                },
            ],
            model_type: "base".into(),
        }
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("SRT".parse::<OutputFormat>(), Ok(OutputFormat::Srt));
        assert_eq!("webvtt".parse::<OutputFormat>(), Ok(OutputFormat::Vtt));
        assert_eq!(" json ".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("docx".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for format in [
            OutputFormat::Text,
            OutputFormat::Srt,
            OutputFormat::Vtt,
            OutputFormat::Json,
        ] {
            assert_eq!(format.to_string().parse::<OutputFormat>(), Ok(format));
        }
    }

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(timestamp(0.0, ','), "00:00:00,000");
        assert_eq!(timestamp(1.2345, '.'), "00:00:01.235");
        assert_eq!(timestamp(3725.5, ','), "01:02:05,500");
        assert_eq!(timestamp(-3.0, ','), "00:00:00,000");
        assert_eq!(timestamp(f64::NAN, ','), "00:00:00,000");
    }

    #[test]
    fn test_render_text() {
        let out = render(&sample_result(), OutputFormat::Text).unwrap();
        assert_eq!(out, "hello there general\n");
    }

    #[test]
    fn test_render_srt_skips_empty_segments() {
        let out = render(&sample_result(), OutputFormat::Srt).unwrap();
        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:01,250\nhello there\n\n\
             2\n01:02:03,000 --> 01:02:05,500\ngeneral\n"
        );
    }

    #[test]
    fn test_render_vtt() {
        let out = render(&sample_result(), OutputFormat::Vtt).unwrap();
        assert_eq!(
            out,
            "WEBVTT\n\n00:00:00.000 --> 00:00:01.250\nhello there\n\n\
             01:02:03.000 --> 01:02:05.500\ngeneral\n"
        );
    }

    #[test]
    fn test_render_json_uses_camel_case() {
        let out = render(&sample_result(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["modelType"], "base");
        assert_eq!(value["segments"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_render_empty_transcript() {
        let result = TranscriptionResult {
            text: String::new(),
            language: "unknown".into(),
            duration: 1.0,
            segments: Vec::new(),
            model_type: "base".into(),
        };
        assert_eq!(render(&result, OutputFormat::Srt).unwrap(), "");
        assert_eq!(render(&result, OutputFormat::Vtt).unwrap(), "WEBVTT\n");
        assert_eq!(render(&result, OutputFormat::Text).unwrap(), "\n");
    }
}
