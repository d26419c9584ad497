//! Chapter marker timing and ffmetadata rendering.
//!
//! Kept free of subprocess I/O so the timing rules are testable on their
//! own.

use crate::defaults::{CHAPTER_LEAD_IN_MS, FFMETADATA_HEADER};
use std::io::{self, Write};

/// A named time range within the final audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMarker {
    pub title: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Derive markers from `(title, duration_ms)` pairs in final order.
///
/// Each marker's displayed start is pulled [`CHAPTER_LEAD_IN_MS`] before its
/// true cumulative boundary (clamped at zero) so players seeking to a
/// chapter do not clip its first word; the end is the unmodified cumulative
/// boundary. Blank titles become `"Chapter {n}"`, numbered by position in
/// this (already filtered) list.
pub fn build_markers(items: &[(String, u64)]) -> Vec<ChapterMarker> {
    let mut markers = Vec::with_capacity(items.len());
    let mut cumulative: u64 = 0;

    for (position, (title, duration_ms)) in items.iter().enumerate() {
        let end_ms = cumulative + duration_ms;
        let title = if title.trim().is_empty() {
            format!("Chapter {}", position + 1)
        } else {
            title.clone()
        };

        markers.push(ChapterMarker {
            title,
            start_ms: cumulative.saturating_sub(CHAPTER_LEAD_IN_MS),
            end_ms,
        });
        cumulative = end_ms;
    }

    markers
}

/// Render markers as an ffmetadata document with a millisecond timebase.
pub fn write_ffmetadata(w: &mut impl Write, markers: &[ChapterMarker]) -> io::Result<()> {
    writeln!(w, "{FFMETADATA_HEADER}")?;
    for marker in markers {
        writeln!(w)?;
        writeln!(w, "[CHAPTER]")?;
        writeln!(w, "TIMEBASE=1/1000")?;
        writeln!(w, "START={}", marker.start_ms)?;
        writeln!(w, "END={}", marker.end_ms)?;
        writeln!(w, "title={}", escape_value(&marker.title))?;
    }
    Ok(())
}

/// Escape the characters the ffmetadata format treats specially.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '=' | ';' | '#' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}
