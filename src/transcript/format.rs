//! Fused transcript output formatting (JSON, JSON lines, text, SRT, VTT).

use super::{FusedSegment, FusedTranscript, SegmentSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Text,
    Srt,
    Vtt,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            "text" | "txt" => Ok(OutputFormat::Text),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!(
                "Unknown format: {}. Use json, jsonl, text, srt, or vtt.",
                s
            )),
        }
    }
}

/// JSON-serializable transcript for export.
#[derive(Debug, Serialize)]
pub struct TranscriptExport<'a> {
    pub media_id: &'a str,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub window_count: usize,
    pub sources: BTreeMap<SegmentSource, usize>,
    pub segments: &'a [FusedSegment],
}

impl<'a> From<&'a FusedTranscript> for TranscriptExport<'a> {
    fn from(transcript: &'a FusedTranscript) -> Self {
        Self {
            media_id: transcript.media_id(),
            generated_at: Utc::now(),
            duration_ms: transcript.duration_ms(),
            window_count: transcript.window_count(),
            sources: transcript.source_counts(),
            segments: transcript.segments(),
        }
    }
}

/// Format a transcript for output.
pub fn format_transcript(transcript: &FusedTranscript, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(transcript),
        OutputFormat::Jsonl => format_jsonl(transcript),
        OutputFormat::Text => format_text(transcript),
        OutputFormat::Srt => format_srt(transcript),
        OutputFormat::Vtt => format_vtt(transcript),
    }
}

fn format_json(transcript: &FusedTranscript) -> String {
    let export = TranscriptExport::from(transcript);
    serde_json::to_string_pretty(&export).unwrap_or_else(|_| "{}".to_string())
}

/// One segment record per line.
fn format_jsonl(transcript: &FusedTranscript) -> String {
    let mut output = String::new();
    for segment in transcript.segments() {
        if let Ok(line) = serde_json::to_string(segment) {
            output.push_str(&line);
            output.push('\n');
        }
    }
    output
}

/// Plain "Speaker N: text" lines; empty segments are skipped.
fn format_text(transcript: &FusedTranscript) -> String {
    let mut output = String::new();

    for segment in transcript.segments() {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }
        output.push_str(&format!("Speaker {}: {}", segment.speaker, text));
        if segment.merged_count > 1 {
            output.push_str(&format!(" [merged {}]", segment.merged_count));
        }
        output.push('\n');
    }

    output
}

fn format_srt(transcript: &FusedTranscript) -> String {
    let mut output = String::new();

    for (i, segment) in transcript.segments().iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(segment.start_ms),
            format_srt_timestamp(segment.end_ms)
        ));
        output.push_str(&format!("[Speaker {}] {}", segment.speaker, segment.text));
        output.push_str("\n\n");
    }

    output
}

fn format_vtt(transcript: &FusedTranscript) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, segment) in transcript.segments().iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_timestamp(segment.start_ms),
            format_vtt_timestamp(segment.end_ms)
        ));
        // Voice span carries the speaker
        output.push_str(&format!("<v Speaker {}>{}", segment.speaker, segment.text));
        output.push_str("\n\n");
    }

    output
}

/// Format timestamp for SRT (00:00:00,000).
fn format_srt_timestamp(ms: u64) -> String {
    let (hours, minutes, secs, millis) = split_ms(ms);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Format timestamp for VTT (00:00:00.000).
fn format_vtt_timestamp(ms: u64) -> String {
    let (hours, minutes, secs, millis) = split_ms(ms);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

fn split_ms(ms: u64) -> (u64, u64, u64, u64) {
    (
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1000,
        ms % 1000,
    )
}
