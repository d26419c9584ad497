//! Plain-text extraction via the `ebook-convert` tool.

use crate::error::{BookvoxError, Result};
use crate::exec;
use std::io::{Cursor, Read, Write};

/// Turns a section's raw bytes into a plain-text stream piper can speak.
///
/// A section whose conversion yields only whitespace (cover pages, image-only
/// sections) fails with `EmptyContent`; the chaptered pipeline absorbs that
/// variant into a skip while every other error aborts the run.
pub trait TextExtractor: Send + Sync {
    fn extract(
        &self,
        input: Box<dyn Read + Send>,
        file_ext: &str,
        name: &str,
    ) -> Result<Box<dyn Read + Send>>;
}

/// `ebook-convert` (Calibre) subprocess extractor.
///
/// ebook-convert does not accept stdin, so the input lands in a scratch file
/// whose suffix tells the tool which parser to use.
#[derive(Debug, Clone, Copy, Default)]
pub struct EbookConvert;

impl EbookConvert {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for EbookConvert {
    fn extract(
        &self,
        mut input: Box<dyn Read + Send>,
        file_ext: &str,
        name: &str,
    ) -> Result<Box<dyn Read + Send>> {
        let ext = file_ext.trim_start_matches('.');
        let ext = if ext.is_empty() { "txt" } else { ext };

        let mut in_file = tempfile::Builder::new()
            .prefix("bookvox-convert-in-")
            .suffix(&format!(".{ext}"))
            .tempfile()?;
        std::io::copy(&mut input, in_file.as_file_mut())?;
        in_file.as_file_mut().flush()?;

        let out_file = tempfile::Builder::new()
            .prefix("bookvox-convert-out-")
            .suffix(".txt")
            .tempfile()?;

        exec::run_captured(
            "ebook-convert",
            &[
                &in_file.path().to_string_lossy(),
                &out_file.path().to_string_lossy(),
            ],
        )?;

        let text = std::fs::read_to_string(out_file.path())?;
        usable_text(text, name)
    }
}

/// Reject whitespace-only conversion results; wrap the rest in a stream.
fn usable_text(text: String, name: &str) -> Result<Box<dyn Read + Send>> {
    if text.trim().is_empty() {
        return Err(BookvoxError::EmptyContent {
            name: name.to_string(),
            reason: "conversion produced no text".to_string(),
        });
    }
    Ok(Box::new(Cursor::new(text.into_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_text_passes_real_content_through() {
        let mut reader = usable_text("Once upon a time".to_string(), "ch1").unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "Once upon a time");
    }

    #[test]
    fn usable_text_rejects_whitespace_only() {
        let err = usable_text(" \n\t \n".to_string(), "cover.xhtml").err().unwrap();
        match err {
            BookvoxError::EmptyContent { name, .. } => assert_eq!(name, "cover.xhtml"),
            other => panic!("expected EmptyContent, got {other:?}"),
        }
    }

    /// End-to-end extraction, skipped when Calibre is not installed.
    #[test]
    fn extract_plain_text_section() {
        if exec::require("ebook-convert").is_err() {
            eprintln!("ebook-convert not installed - skipping extraction test");
            return;
        }

        let input = Box::new(Cursor::new(
            b"<html><body><p>A paragraph of prose.</p></body></html>".to_vec(),
        ));
        let mut reader = EbookConvert::new()
            .extract(input, "html", "section-1")
            .unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert!(out.contains("A paragraph of prose"));
    }
}
