//! Speech synthesis: the trait seam the pipeline consumes and the piper
//! subprocess client implementing it.

pub mod piper;
pub mod voices;

use crate::error::Result;
use std::io::Read;
use std::path::{Path, PathBuf};

pub use piper::PiperClient;
pub use voices::{VoiceCatalog, find_or_download, installed_models};

/// Live streaming synthesis output.
///
/// `pcm` yields raw samples incrementally while the synthesis process runs.
/// After draining it, callers must invoke [`SynthCompletion::finish`] to
/// observe the process exit status - a stream that read to EOF may still
/// have ended in a failed synthesis.
pub struct SynthStream {
    pcm: Box<dyn Read + Send>,
    completion: SynthCompletion,
}

impl SynthStream {
    pub fn new(pcm: Box<dyn Read + Send>, completion: SynthCompletion) -> Self {
        Self { pcm, completion }
    }

    /// Split into the PCM stream and the completion handle.
    pub fn into_parts(self) -> (Box<dyn Read + Send>, SynthCompletion) {
        (self.pcm, self.completion)
    }
}

/// Deferred check of a synthesis process's exit status.
pub struct SynthCompletion(Box<dyn FnOnce() -> Result<()> + Send>);

impl SynthCompletion {
    pub fn new(f: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    /// A completion that always succeeds, for synthesizers with nothing to
    /// wait on.
    pub fn ready() -> Self {
        Self(Box::new(|| Ok(())))
    }

    pub fn finish(self) -> Result<()> {
        (self.0)()
    }
}

/// Turns a text stream into audio.
pub trait SpeechSynthesizer: Send + Sync {
    /// Streaming mode: raw PCM samples on a live channel.
    fn synthesize_stream(&self, name: &str, text: Box<dyn Read + Send>) -> Result<SynthStream>;

    /// Blocking mode: synthesize the whole text into a container file under
    /// `out_dir` and return its path.
    fn synthesize_to_file(
        &self,
        name: &str,
        text: Box<dyn Read + Send>,
        out_dir: &Path,
    ) -> Result<PathBuf>;
}
