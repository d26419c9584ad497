//! Audio encoding: per-section raw-PCM→MP3 and final chapter-tagged concat.

pub mod chapters;
pub mod ffmpeg;

use crate::error::Result;
use std::io::Read;
use std::path::{Path, PathBuf};

pub use chapters::{ChapterMarker, build_markers, write_ffmetadata};
pub use ffmpeg::FfmpegEncoder;

/// One surviving chapter handed to the concat operation, in final order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterInput {
    pub file: PathBuf,
    pub title: String,
}

/// Encodes synthesized audio and assembles the final audiobook file.
pub trait AudioEncoder: Send + Sync {
    /// Wrap a raw PCM stream (22050 Hz, mono, s16le) into a compressed file,
    /// verify the result structurally, and return its duration in ms.
    fn encode_raw(&self, pcm: Box<dyn Read + Send>, out_file: &Path) -> Result<u64>;

    /// Concatenate `items` in list order into `out_file`, embedding one
    /// chapter marker per item.
    fn concat(&self, items: &[ChapterInput], out_file: &Path) -> Result<()>;
}
