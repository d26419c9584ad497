//! Whole-book conversion without chapter splitting.

use crate::encode::AudioEncoder;
use crate::error::Result;
use crate::pipeline::chapters::PipelineConfig;
use crate::synth::SpeechSynthesizer;
use crate::text::{Normalizer, TextExtractor};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Convert one file in a single pass: extract → normalize → synthesize.
///
/// With `output_mp3`, the synthesis stream is encoded straight into
/// `{output_directory}/{stem}.mp3`; otherwise synthesis writes a WAV into
/// the output directory and that path is returned. Unlike the chaptered
/// pipeline there is nothing to skip to - an empty extraction result is
/// fatal here.
pub fn convert_whole_book(
    extractor: &dyn TextExtractor,
    normalizer: &dyn Normalizer,
    synthesizer: &dyn SpeechSynthesizer,
    encoder: &dyn AudioEncoder,
    input_file: &Path,
    config: &PipelineConfig,
    output_mp3: bool,
) -> Result<PathBuf> {
    let file_ext = input_file
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "txt".to_string());
    let name = input_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.source_name.clone());

    let raw = Box::new(File::open(input_file)?);
    let text = extractor.extract(raw, &file_ext, &name)?;
    let text = if config.passthrough_unicode {
        text
    } else {
        normalizer.normalize(text)?
    };

    if output_mp3 {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        let out_file = config.output_directory.join(format!("{stem}.mp3"));

        let stream = synthesizer.synthesize_stream(&name, text)?;
        let (pcm, completion) = stream.into_parts();
        let encode_result = encoder.encode_raw(pcm, &out_file);
        let finish_result = completion.finish();
        if encode_result.is_err() || finish_result.is_err() {
            // Neither a truncated nor an unverified file may stay behind.
            std::fs::remove_file(&out_file).ok();
        }
        finish_result?;
        let duration_ms = encode_result?;

        debug!(out = %out_file.display(), duration_ms, "book encoded");
        Ok(out_file)
    } else {
        synthesizer.synthesize_to_file(&name, text, &config.output_directory)
    }
}
