//! Default configuration constants for bookvox.
//!
//! Shared constants used across the conversion pipeline and configuration
//! types to ensure consistency and eliminate duplication.

/// Sample rate of the raw PCM stream piper emits, in Hz.
pub const SYNTH_SAMPLE_RATE: u32 = 22050;

/// Channel count of the raw PCM stream (piper is mono).
pub const SYNTH_CHANNELS: u32 = 1;

/// Number of bytes peeked from a section's text to derive its chapter title.
///
/// The peek is non-destructive: the bytes are stitched back in front of the
/// stream before synthesis reads it. The preview is truncated down to the
/// last complete UTF-8 character, so multibyte scripts may lose a trailing
/// character from the derived title.
pub const TITLE_PEEK_BYTES: usize = 20;

/// How far a chapter marker's displayed start is pulled before its true
/// boundary, in milliseconds. Players seek slightly early so the first
/// spoken word of a chapter is not clipped. Clamped to zero for the first
/// chapter.
pub const CHAPTER_LEAD_IN_MS: u64 = 500;

/// MP3 bitrate for per-section intermediate files.
pub const SECTION_BITRATE: &str = "128k";

/// MP3 bitrate for the final concatenated audiobook.
pub const FINAL_BITRATE: &str = "192k";

/// Header token opening an ffmetadata chapter block file.
pub const FFMETADATA_HEADER: &str = ";FFMETADATA1";

/// Default piper voice model.
pub const DEFAULT_MODEL: &str = "en_US-hfc_male-medium.onnx";

/// Default output directory for finished audiobooks.
pub const DEFAULT_OUTPUT_DIR: &str = "~/Audiobooks";

/// Default number of concurrent section conversions.
///
/// 0 means unbounded (one worker per section) and is deliberately not the
/// default: parallel piper instances are CPU and memory heavy.
pub const DEFAULT_THREADS: usize = 4;

/// Directory name under the user config dir holding config and voice models.
pub const APP_DIR: &str = "bookvox";

/// Index of available piper voices and their download paths.
pub const VOICES_INDEX_URL: &str =
    "https://huggingface.co/rhasspy/piper-voices/raw/main/voices.json";

/// Base URL the voice index's file paths are resolved against.
pub const VOICES_BASE_URL: &str = "https://huggingface.co/rhasspy/piper-voices/resolve/main";
