//! Ordered section listing for chaptered conversion.
//!
//! Sections come out in spine order - the book's authoritative reading
//! order. Table-of-contents data is informational only and never consulted
//! for ordering.

use crate::error::{BookvoxError, Result};
use epub::doc::EpubDoc;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// One independently convertible unit of a book.
///
/// Created once by the section source and consumed exactly once by one
/// pipeline worker; the text stream is single-use.
pub struct Section {
    /// Ordinal position in source order; defines final chapter order.
    pub index: usize,
    /// Sanitized identifier, safe for use inside a filename.
    pub name: String,
    /// Extension of the underlying resource, for the text extractor.
    pub file_ext: String,
    /// Raw section bytes.
    pub text: Box<dyn Read + Send>,
}

/// Spine-ordered section source over an EPUB archive.
#[derive(Debug)]
pub struct EpubSections {
    doc: EpubDoc<BufReader<File>>,
}

impl EpubSections {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = EpubDoc::new(path).map_err(|e| BookvoxError::BookOpen {
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Self { doc })
    }

    /// Consume the archive, yielding every spine item as a [`Section`].
    ///
    /// "Pages" walk the spine in reading order, so the section index here is
    /// the authoritative final chapter order.
    pub fn into_sections(mut self) -> Result<Vec<Section>> {
        let page_count = self.doc.get_num_pages();
        let mut sections = Vec::with_capacity(page_count);

        for index in 0..page_count {
            if !self.doc.set_current_page(index) {
                return Err(BookvoxError::BookOpen {
                    message: format!("spine item {index} is out of range"),
                });
            }

            let resource_path =
                self.doc
                    .get_current_path()
                    .ok_or_else(|| BookvoxError::BookOpen {
                        message: format!("spine item {index} has no manifest path"),
                    })?;

            let (bytes, _mime) =
                self.doc
                    .get_current()
                    .ok_or_else(|| BookvoxError::BookOpen {
                        message: format!("spine item {index} missing from archive"),
                    })?;

            let file_ext = resource_path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "xhtml".to_string());

            sections.push(Section {
                index,
                name: sanitize_name(&resource_path.to_string_lossy()),
                file_ext,
                text: Box::new(Cursor::new(bytes)),
            });
        }

        Ok(sections)
    }
}

/// Flatten a resource path into a single filename-safe component.
fn sanitize_name(raw: &str) -> String {
    raw.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_flattens_path_separators() {
        assert_eq!(sanitize_name("OEBPS/text/ch01.xhtml"), "OEBPS_text_ch01.xhtml");
        assert_eq!(sanitize_name("ch01.xhtml"), "ch01.xhtml");
    }

    #[test]
    fn section_streams_are_single_use() {
        let mut section = Section {
            index: 0,
            name: "ch01.xhtml".to_string(),
            file_ext: "xhtml".to_string(),
            text: Box::new(Cursor::new(b"<p>text</p>".to_vec())),
        };

        let mut first = Vec::new();
        section.text.read_to_end(&mut first).unwrap();
        assert_eq!(first, b"<p>text</p>");

        let mut second = Vec::new();
        section.text.read_to_end(&mut second).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn open_rejects_non_epub_file() {
        let file = tempfile::Builder::new().suffix(".epub").tempfile().unwrap();
        std::fs::write(file.path(), b"not a zip archive").unwrap();

        let err = EpubSections::open(file.path()).unwrap_err();
        match err {
            BookvoxError::BookOpen { message } => {
                assert!(message.contains(&file.path().display().to_string()));
            }
            other => panic!("expected BookOpen, got {other:?}"),
        }
    }
}
