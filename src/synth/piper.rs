//! Piper subprocess client.

use crate::error::{BookvoxError, Result};
use crate::exec::PipedChild;
use crate::synth::{SpeechSynthesizer, SynthCompletion, SynthStream};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wrapper around the `piper` binary and one resolved voice model.
///
/// Construct once per run and share by reference; the client itself holds no
/// mutable state.
pub struct PiperClient {
    binary: String,
    model: PathBuf,
}

impl PiperClient {
    /// A client speaking through the given voice model file.
    pub fn new(model: PathBuf) -> Self {
        Self {
            binary: "piper".to_string(),
            model,
        }
    }

    /// Override the binary name, for tests and non-PATH installs.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn model_arg(&self) -> String {
        self.model.to_string_lossy().into_owned()
    }
}

impl SpeechSynthesizer for PiperClient {
    fn synthesize_stream(&self, name: &str, text: Box<dyn Read + Send>) -> Result<SynthStream> {
        debug!(name, model = %self.model.display(), "streaming synthesis");

        let model = self.model_arg();
        let mut child = PipedChild::spawn(&self.binary, &["-m", &model, "--output_raw"], text)?;

        let pcm = child.take_stdout().ok_or_else(|| {
            BookvoxError::Io(io::Error::other("synthesis stdout already taken"))
        })?;

        Ok(SynthStream::new(
            Box::new(pcm),
            SynthCompletion::new(move || child.wait()),
        ))
    }

    fn synthesize_to_file(
        &self,
        name: &str,
        text: Box<dyn Read + Send>,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        let out_file = out_dir.join(format!("{stem}.wav"));
        debug!(name, out = %out_file.display(), "file synthesis");

        let model = self.model_arg();
        let out_arg = out_file.to_string_lossy().into_owned();
        let child = PipedChild::spawn(
            &self.binary,
            &["-m", &model, "--output_file", &out_arg],
            text,
        )?;
        child.wait()?;

        if !out_file.is_file() {
            return Err(BookvoxError::Io(io::Error::other(format!(
                "synthesis reported success but {} was not written",
                out_file.display()
            ))));
        }
        Ok(out_file)
    }
}
