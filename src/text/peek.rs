//! Non-destructive stream peek for chapter title derivation.

use std::io::{self, Cursor, Read};

/// Read up to `limit` bytes from `reader`, returning the preview together
/// with a reconstituted stream that yields the peeked bytes again before the
/// remainder. The stream handed back is equivalent to the one passed in.
pub fn peek(
    mut reader: Box<dyn Read + Send>,
    limit: usize,
) -> io::Result<(Vec<u8>, Box<dyn Read + Send>)> {
    let mut preview = vec![0u8; limit];
    let mut filled = 0;

    while filled < limit {
        match reader.read(&mut preview[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    preview.truncate(filled);

    let reconstituted: Box<dyn Read + Send> =
        Box::new(Cursor::new(preview.clone()).chain(reader));
    Ok((preview, reconstituted))
}

/// Derive a short display title from peeked bytes.
///
/// The preview is cut down to its longest valid UTF-8 prefix, so a peek that
/// lands mid-character in a multibyte script drops the partial character
/// rather than producing replacement glyphs. The first line is kept and runs
/// of whitespace are collapsed. Returns an empty string when nothing usable
/// remains; callers substitute a positional default.
pub fn title_from_preview(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            // Safety of the slice is guaranteed by valid_up_to.
            std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default()
        }
    };

    text.lines()
        .next()
        .unwrap_or("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(mut reader: Box<dyn Read + Send>) -> Vec<u8> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn peek_returns_prefix_and_preserves_stream() {
        let source = Box::new(Cursor::new(b"The quick brown fox jumps".to_vec()));
        let (preview, rest) = peek(source, 9).unwrap();

        assert_eq!(preview, b"The quick");
        assert_eq!(read_all(rest), b"The quick brown fox jumps");
    }

    #[test]
    fn peek_short_stream_returns_everything() {
        let source = Box::new(Cursor::new(b"tiny".to_vec()));
        let (preview, rest) = peek(source, 20).unwrap();

        assert_eq!(preview, b"tiny");
        assert_eq!(read_all(rest), b"tiny");
    }

    #[test]
    fn peek_empty_stream() {
        let source = Box::new(Cursor::new(Vec::new()));
        let (preview, rest) = peek(source, 20).unwrap();

        assert!(preview.is_empty());
        assert!(read_all(rest).is_empty());
    }

    #[test]
    fn title_collapses_whitespace_and_stops_at_first_line() {
        assert_eq!(
            title_from_preview(b"  Chapter   One\nSecond line"),
            "Chapter One"
        );
    }

    #[test]
    fn title_from_whitespace_only_is_empty() {
        assert_eq!(title_from_preview(b" \t \n  "), "");
        assert_eq!(title_from_preview(b""), "");
    }

    #[test]
    fn title_drops_partial_trailing_multibyte_character() {
        // A fixed-size peek over multibyte text can land mid-character; the
        // derived title rounds down to the last complete one.
        let text = "日本語の本".as_bytes();
        let cut = &text[..7]; // two complete 3-byte chars + 1 stray byte

        let title = title_from_preview(cut);
        assert_eq!(title, "日本");
    }

    #[test]
    fn title_survives_ascii_cut_anywhere() {
        let (preview, _) = peek(Box::new(Cursor::new(b"Rooster crowing".to_vec())), 7).unwrap();
        assert_eq!(title_from_preview(&preview), "Rooster");
    }
}
