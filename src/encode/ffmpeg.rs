//! ffmpeg/ffprobe subprocess encoder.

use crate::defaults::{FINAL_BITRATE, SECTION_BITRATE, SYNTH_CHANNELS, SYNTH_SAMPLE_RATE};
use crate::encode::{AudioEncoder, ChapterInput, build_markers, write_ffmetadata};
use crate::error::{BookvoxError, Result};
use crate::exec::{PipedChild, run_captured};
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::debug;

/// Production encoder backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegEncoder;

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Duration of an audio file in milliseconds, via ffprobe.
    pub fn probe_duration_ms(&self, file: &Path) -> Result<u64> {
        if !file.is_file() {
            return Err(BookvoxError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", file.display()),
            )));
        }

        let file_arg = file.to_string_lossy();
        let output = run_captured(
            "ffprobe",
            &[
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                &file_arg,
            ],
        )?;

        let seconds: f64 = output.trim().parse().map_err(|_| {
            BookvoxError::Subprocess {
                tool: "ffprobe".to_string(),
                status: "exit status: 0".to_string(),
                stderr: format!("unparseable duration output: {output:?}"),
            }
        })?;
        Ok((seconds * 1000.0).round() as u64)
    }

    /// Fail unless `file` exists, is non-empty, and decodes cleanly.
    fn verify(&self, file: &Path) -> Result<()> {
        let metadata = std::fs::metadata(file).map_err(|e| {
            BookvoxError::Io(io::Error::new(
                e.kind(),
                format!("encoder output {} missing: {e}", file.display()),
            ))
        })?;
        if metadata.len() == 0 {
            return Err(BookvoxError::Io(io::Error::other(format!(
                "encoder output {} is empty",
                file.display()
            ))));
        }

        let file_arg = file.to_string_lossy();
        run_captured("ffmpeg", &["-v", "error", "-i", &file_arg, "-f", "null", "-"])?;
        Ok(())
    }
}

impl AudioEncoder for FfmpegEncoder {
    fn encode_raw(&self, pcm: Box<dyn Read + Send>, out_file: &Path) -> Result<u64> {
        let rate = SYNTH_SAMPLE_RATE.to_string();
        let channels = SYNTH_CHANNELS.to_string();
        let out_arg = out_file.to_string_lossy().into_owned();

        let child = PipedChild::spawn(
            "ffmpeg",
            &[
                "-f", "s16le", "-ar", &rate, "-ac", &channels, "-i", "pipe:0", "-acodec",
                "libmp3lame", "-b:a", SECTION_BITRATE, "-y", &out_arg,
            ],
            pcm,
        )?;
        child.wait()?;

        self.verify(out_file)?;
        self.probe_duration_ms(out_file)
    }

    fn concat(&self, items: &[ChapterInput], out_file: &Path) -> Result<()> {
        if items.is_empty() {
            return Err(BookvoxError::Io(io::Error::other(
                "nothing to concatenate",
            )));
        }
        debug!(chapters = items.len(), out = %out_file.display(), "concatenating");

        let mut list_file = tempfile::Builder::new()
            .prefix("bookvox-concat-")
            .suffix(".txt")
            .tempfile()?;
        let mut timed = Vec::with_capacity(items.len());

        for item in items {
            let absolute = std::path::absolute(&item.file)?;
            writeln!(
                list_file,
                "file '{}'",
                absolute.to_string_lossy().replace('\'', r"'\''")
            )?;
            let duration = self.probe_duration_ms(&absolute)?;
            timed.push((item.title.clone(), duration));
        }
        list_file.flush()?;

        let mut metadata_file = tempfile::Builder::new()
            .prefix("bookvox-metadata-")
            .suffix(".txt")
            .tempfile()?;
        write_ffmetadata(&mut metadata_file, &build_markers(&timed))?;
        metadata_file.flush()?;

        let list_arg = list_file.path().to_string_lossy().into_owned();
        let metadata_arg = metadata_file.path().to_string_lossy().into_owned();
        let out_arg = out_file.to_string_lossy().into_owned();
        run_captured(
            "ffmpeg",
            &[
                "-f", "concat", "-safe", "0", "-i", &list_arg, "-i", &metadata_arg,
                "-map_metadata", "1", "-id3v2_version", "3", "-acodec", "libmp3lame", "-b:a",
                FINAL_BITRATE, "-y", &out_arg,
            ],
        )?;

        self.verify(out_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec;
    use std::io::Cursor;

    fn ffmpeg_available() -> bool {
        exec::require("ffmpeg").is_ok() && exec::require("ffprobe").is_ok()
    }

    /// Half a second of mono 22050 Hz silence.
    fn silence_pcm() -> Vec<u8> {
        vec![0u8; (SYNTH_SAMPLE_RATE as usize / 2) * 2]
    }

    #[test]
    fn encode_raw_produces_playable_mp3_with_duration() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg/ffprobe not installed - skipping encode test");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("0000-section-test.mp3");

        let duration = FfmpegEncoder::new()
            .encode_raw(Box::new(Cursor::new(silence_pcm())), &out)
            .unwrap();

        assert!(out.is_file());
        assert!(std::fs::metadata(&out).unwrap().len() > 0);
        // Half a second of input; mp3 framing may pad slightly.
        assert!((300..=800).contains(&duration), "duration was {duration}ms");
    }

    #[test]
    fn encode_raw_rejects_empty_stream() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg/ffprobe not installed - skipping encode test");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.mp3");

        let result =
            FfmpegEncoder::new().encode_raw(Box::new(Cursor::new(Vec::new())), &out);
        assert!(result.is_err(), "zero PCM bytes should not encode cleanly");
    }

    #[test]
    fn concat_embeds_chapter_markers() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg/ffprobe not installed - skipping concat test");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let encoder = FfmpegEncoder::new();

        let first = dir.path().join("0000-section-a.mp3");
        let second = dir.path().join("0001-section-b.mp3");
        encoder
            .encode_raw(Box::new(Cursor::new(silence_pcm())), &first)
            .unwrap();
        encoder
            .encode_raw(Box::new(Cursor::new(silence_pcm())), &second)
            .unwrap();

        let out = dir.path().join("book.mp3");
        encoder
            .concat(
                &[
                    ChapterInput {
                        file: first,
                        title: "Cow".to_string(),
                    },
                    ChapterInput {
                        file: second,
                        title: String::new(),
                    },
                ],
                &out,
            )
            .unwrap();

        let out_arg = out.to_string_lossy().into_owned();
        let chapters = run_captured("ffprobe", &["-i", &out_arg, "-show_chapters"]).unwrap();
        assert!(chapters.contains("Cow"));
        assert!(chapters.contains("Chapter 2"));
    }

    #[test]
    fn concat_rejects_empty_item_list() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("book.mp3");
        assert!(FfmpegEncoder::new().concat(&[], &out).is_err());
    }

    #[test]
    fn probe_missing_file_is_an_io_error() {
        let err = FfmpegEncoder::new()
            .probe_duration_ms(Path::new("/nonexistent/file.mp3"))
            .unwrap_err();
        assert!(matches!(err, BookvoxError::Io(_)));
    }
}
