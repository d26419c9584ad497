//! Diacritic stripping so an English voice does not spell out accents.

use crate::error::Result;
use crate::exec::PipedChild;
use std::io::{Cursor, Read};

/// Optionally rewrites a text stream into the character set the synthesis
/// voice can speak.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, input: Box<dyn Read + Send>) -> Result<Box<dyn Read + Send>>;
}

/// `iconv` transliteration to plain ASCII, dropping what cannot be mapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iconv;

impl Iconv {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for Iconv {
    fn normalize(&self, input: Box<dyn Read + Send>) -> Result<Box<dyn Read + Send>> {
        let mut child = PipedChild::spawn(
            "iconv",
            &["-f", "UTF-8", "-t", "ASCII//TRANSLIT//IGNORE"],
            input,
        )?;

        // Section text is small relative to the audio derived from it;
        // buffering it avoids holding a child open across the synthesis call.
        let mut normalized = Vec::new();
        if let Some(mut stdout) = child.take_stdout() {
            stdout.read_to_end(&mut normalized)?;
        }
        child.wait()?;

        Ok(Box::new(Cursor::new(normalized)))
    }
}
