//! Chaptered conversion: bounded-concurrency fan-out over sections, ordered
//! fan-in into one chapter-tagged audiobook.
//!
//! Each section runs through extract → normalize → title peek → streaming
//! synthesis → per-section encode on a worker thread, and writes its outcome
//! into the slot matching its index. Completion order never affects output
//! order. A section with no usable text is skipped; any other failure stops
//! dispatch, lets in-flight work settle, and aborts the run with no final
//! file. All intermediate audio lives in one run-scoped temp directory that
//! is removed before `run` returns, success or not.

use crate::defaults::TITLE_PEEK_BYTES;
use crate::encode::{AudioEncoder, ChapterInput};
use crate::error::{BookvoxError, Result};
use crate::pipeline::outcome::ConversionOutcome;
use crate::source::Section;
use crate::synth::SpeechSynthesizer;
use crate::text::{Normalizer, TextExtractor, peek, title_from_preview};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Settings for one chaptered conversion run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum simultaneous section conversions; 0 means one worker per
    /// section, which can exhaust CPU and memory on constrained hosts.
    pub concurrency_limit: usize,
    /// Where the final audiobook lands. Must already exist.
    pub output_directory: PathBuf,
    /// Skip diacritic normalization and feed text to synthesis untouched.
    pub passthrough_unicode: bool,
    /// Base name of the source being converted; its stem names the output.
    pub source_name: String,
}

/// The fan-out/fan-in coordinator.
pub struct ChapterPipeline {
    extractor: Arc<dyn TextExtractor>,
    normalizer: Arc<dyn Normalizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    encoder: Arc<dyn AudioEncoder>,
}

impl ChapterPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        normalizer: Arc<dyn Normalizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        encoder: Arc<dyn AudioEncoder>,
    ) -> Self {
        Self {
            extractor,
            normalizer,
            synthesizer,
            encoder,
        }
    }

    /// Convert `sections` into `{output_directory}/{source stem}.mp3`.
    pub fn run(&self, sections: Vec<Section>, config: &PipelineConfig) -> Result<PathBuf> {
        validate(config)?;

        if sections.is_empty() {
            return Err(BookvoxError::NoAudio {
                name: config.source_name.clone(),
            });
        }

        let worker_count = if config.concurrency_limit == 0 {
            warn!(
                sections = sections.len(),
                "concurrency limit is 0: running every section at once may overload the CPU"
            );
            sections.len()
        } else {
            config.concurrency_limit.min(sections.len())
        };

        // Run-scoped scratch space; removed on every exit path.
        let temp_dir = tempfile::Builder::new()
            .prefix("bookvox-run-")
            .tempdir_in(&config.output_directory)?;

        let section_count = sections.len();
        let slots: Mutex<Vec<Option<ConversionOutcome>>> =
            Mutex::new((0..section_count).map(|_| None).collect());
        let abort = AtomicBool::new(false);
        let first_error: Mutex<Option<BookvoxError>> = Mutex::new(None);

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Section>();
        for section in sections {
            // Unbounded send only fails when every receiver is gone, and the
            // workers have not spawned yet.
            if job_tx.send(section).is_err() {
                break;
            }
        }
        drop(job_tx);

        std::thread::scope(|scope| {
            for _ in 0..worker_count {
                let job_rx = job_rx.clone();
                let slots = &slots;
                let abort = &abort;
                let first_error = &first_error;
                let temp_path = temp_dir.path();

                scope.spawn(move || {
                    while let Ok(section) = job_rx.recv() {
                        if abort.load(Ordering::SeqCst) {
                            break;
                        }
                        let index = section.index;
                        let name = section.name.clone();

                        match self.convert_section(section, config, temp_path) {
                            Ok(outcome) => {
                                if let ConversionOutcome::Skipped { reason } = &outcome {
                                    warn!(section = %name, reason = %reason, "skipping section");
                                }
                                write_slot(slots, index, outcome);
                            }
                            Err(error) => {
                                abort.store(true, Ordering::SeqCst);
                                let mut guard = first_error
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner);
                                if guard.is_none() {
                                    *guard = Some(error);
                                } else {
                                    debug!(section = %name, %error, "further error after abort");
                                }
                                drop(guard);
                                write_slot(slots, index, ConversionOutcome::Failed);
                                break;
                            }
                        }
                    }
                });
            }
        });

        if let Some(error) = first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            // temp_dir drops here, discarding every per-section artifact.
            return Err(error);
        }

        let outcomes = slots.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut chapters = Vec::new();
        let mut skipped = 0usize;
        for outcome in outcomes {
            match outcome {
                Some(ConversionOutcome::Success {
                    audio_file, title, ..
                }) => chapters.push(ChapterInput {
                    file: audio_file,
                    title,
                }),
                Some(ConversionOutcome::Skipped { .. }) => skipped += 1,
                // Failed slots only exist alongside a recorded error, and
                // None slots only when dispatch stopped early - both handled
                // above.
                _ => {}
            }
        }

        if chapters.is_empty() {
            return Err(BookvoxError::NoAudio {
                name: config.source_name.clone(),
            });
        }
        info!(
            chapters = chapters.len(),
            skipped, "assembling final audiobook"
        );

        let final_path = config
            .output_directory
            .join(format!("{}.mp3", source_stem(&config.source_name)));
        if let Err(error) = self.encoder.concat(&chapters, &final_path) {
            // A failed concat can leave a partial file at the output path.
            std::fs::remove_file(&final_path).ok();
            return Err(error);
        }

        // Surface cleanup failure instead of silently leaking scratch files.
        temp_dir.close()?;
        Ok(final_path)
    }

    /// One section's full task: Pending → Normalizing → Synthesizing →
    /// Encoding → outcome.
    fn convert_section(
        &self,
        section: Section,
        config: &PipelineConfig,
        temp_dir: &Path,
    ) -> Result<ConversionOutcome> {
        let Section {
            index,
            name,
            file_ext,
            text,
        } = section;

        let text = match self.extractor.extract(text, &file_ext, &name) {
            Ok(text) => text,
            Err(BookvoxError::EmptyContent { reason, .. }) => {
                return Ok(ConversionOutcome::Skipped { reason });
            }
            Err(error) => return Err(error),
        };

        let text = if config.passthrough_unicode {
            text
        } else {
            self.normalizer.normalize(text)?
        };

        let (preview, text) = peek(text, TITLE_PEEK_BYTES)?;
        let title = title_from_preview(&preview);

        let stream = self.synthesizer.synthesize_stream(&name, text)?;
        let (pcm, completion) = stream.into_parts();

        // Index in the filename keeps scratch files inspectable mid-run.
        let audio_file = temp_dir.join(format!("{index:04}-section-{name}.mp3"));
        let encode_result = self.encoder.encode_raw(pcm, &audio_file);

        // The synthesis exit status is the root cause when the stream ended
        // early, so check it before trusting the encode result.
        completion.finish()?;
        let duration_ms = encode_result?;

        debug!(section = %name, duration_ms, "section encoded");
        Ok(ConversionOutcome::Success {
            audio_file,
            title,
            duration_ms,
        })
    }
}

fn write_slot(
    slots: &Mutex<Vec<Option<ConversionOutcome>>>,
    index: usize,
    outcome: ConversionOutcome,
) {
    let mut guard = slots.lock().unwrap_or_else(PoisonError::into_inner);
    guard[index] = Some(outcome);
}

fn validate(config: &PipelineConfig) -> Result<()> {
    if config.source_name.trim().is_empty() {
        return Err(BookvoxError::ConfigInvalidValue {
            key: "source_name".to_string(),
            message: "no source name was provided".to_string(),
        });
    }
    if !config.output_directory.is_dir() {
        return Err(BookvoxError::ConfigInvalidValue {
            key: "output_directory".to_string(),
            message: format!(
                "the output directory {} does not exist",
                config.output_directory.display()
            ),
        });
    }
    Ok(())
}

fn source_stem(source_name: &str) -> String {
    Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_name.to_string())
}
