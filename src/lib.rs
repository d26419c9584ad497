//! bookvox - Convert ebooks into chaptered audiobooks with a local piper
//! voice.
//!
//! The core is a bounded-concurrency pipeline that extracts spine-ordered
//! sections, streams each through speech synthesis, encodes the results, and
//! reassembles them in source order with embedded chapter markers.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod encode;
pub mod error;
pub mod exec;
pub mod pipeline;
pub mod source;
pub mod synth;
pub mod text;

// Core pipeline
pub use pipeline::{ChapterPipeline, ConversionOutcome, PipelineConfig, convert_whole_book};

// Collaborator seams (source → text → synthesis → encoding)
pub use encode::{AudioEncoder, ChapterInput, ChapterMarker, FfmpegEncoder};
pub use source::{EpubSections, Section};
pub use synth::{PiperClient, SpeechSynthesizer, SynthCompletion, SynthStream};
pub use text::{EbookConvert, Iconv, Normalizer, TextExtractor};

// Error handling
pub use error::{BookvoxError, Result};

// Config
pub use config::Config;
