//! Conversion entry point wiring the real collaborators together.
//!
//! Everything below `run_conversion` works on trait objects; this module is
//! the only place that knows the production implementations are piper,
//! ebook-convert, iconv and ffmpeg.

use crate::config::{self, Config};
use crate::encode::FfmpegEncoder;
use crate::error::{BookvoxError, Result};
use crate::exec;
use crate::pipeline::{ChapterPipeline, PipelineConfig, convert_whole_book};
use crate::source::EpubSections;
use crate::synth::{self, PiperClient};
use crate::text::{EbookConvert, Iconv};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one conversion run needs, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// The file (or URL) to convert.
    pub file: String,
    /// Piper voice model name or path.
    pub model: String,
    /// Directory to save the output file.
    pub output_dir: String,
    /// Speak UTF-8 characters rather than transliterating them.
    pub speak_utf8: bool,
    /// Output MP3 (WAV otherwise). Chaptered output is always MP3.
    pub output_mp3: bool,
    /// Split into chapter-tagged sections.
    pub chapters: bool,
    /// Concurrent section conversions; 0 means unbounded.
    pub threads: usize,
}

impl ConvertOptions {
    /// Merge config-file values with CLI overrides.
    pub fn new(file: String, config: &Config) -> Self {
        Self {
            file,
            model: config.model.clone(),
            output_dir: config.output.clone(),
            speak_utf8: config.speak_utf8,
            output_mp3: config.mp3,
            chapters: config.chapters,
            threads: config.threads,
        }
    }
}

/// Make sure the options are not obviously invalid before any work begins.
fn sanity_check(opts: &mut ConvertOptions) -> Result<()> {
    if opts.file.trim().is_empty() {
        return Err(BookvoxError::ConfigInvalidValue {
            key: "file".to_string(),
            message: "no file was provided".to_string(),
        });
    }
    if opts.model.trim().is_empty() {
        return Err(BookvoxError::ConfigInvalidValue {
            key: "model".to_string(),
            message: "no model was provided".to_string(),
        });
    }
    if opts.output_dir.trim().is_empty() {
        return Err(BookvoxError::ConfigInvalidValue {
            key: "output".to_string(),
            message: "no output directory was provided".to_string(),
        });
    }
    if !Path::new(&opts.output_dir).is_dir() {
        return Err(BookvoxError::ConfigInvalidValue {
            key: "output".to_string(),
            message: format!("the output directory {} does not exist", opts.output_dir),
        });
    }

    let ext = Path::new(&opts.file)
        .extension()
        .and_then(|e| e.to_str());
    if opts.chapters && ext.is_none_or(|e| !e.eq_ignore_ascii_case("epub")) {
        warn!(
            file = %opts.file,
            "only epub files can be split into chapters; converting without them"
        );
        opts.chapters = false;
    }

    Ok(())
}

/// Run the core audiobook creation process. Does not include any CLI
/// parsing. Returns the path of the created audiobook.
pub fn run_conversion(mut opts: ConvertOptions) -> Result<PathBuf> {
    opts.file = config::expand_home(&opts.file).to_string_lossy().into_owned();
    opts.model = config::expand_home(&opts.model).to_string_lossy().into_owned();
    opts.output_dir = config::expand_home(&opts.output_dir)
        .to_string_lossy()
        .into_owned();

    sanity_check(&mut opts)?;

    if is_url(&opts.file) {
        let downloaded = download_source(&opts.file, Path::new(&opts.output_dir))?;
        opts.file = downloaded.to_string_lossy().into_owned();
    }

    let model_path = synth::find_or_download(&opts.model, &config::app_dir())?;
    let synthesizer = PiperClient::new(model_path);

    let input = PathBuf::from(&opts.file);
    let pipeline_config = PipelineConfig {
        concurrency_limit: opts.threads,
        output_directory: PathBuf::from(&opts.output_dir),
        passthrough_unicode: opts.speak_utf8,
        source_name: input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| opts.file.clone()),
    };

    info!("converting and generating the audiobook; this may take a while");

    let output = if opts.chapters {
        let sections = EpubSections::open(&input)?.into_sections()?;
        let pipeline = ChapterPipeline::new(
            Arc::new(EbookConvert::new()),
            Arc::new(Iconv::new()),
            Arc::new(synthesizer),
            Arc::new(FfmpegEncoder::new()),
        );
        pipeline.run(sections, &pipeline_config)?
    } else {
        convert_whole_book(
            &EbookConvert::new(),
            &Iconv::new(),
            &synthesizer,
            &FfmpegEncoder::new(),
            &input,
            &pipeline_config,
            opts.output_mp3,
        )?
    };

    info!(path = %output.display(), "audiobook created");
    Ok(output)
}

/// List installed voice models on stdout.
pub fn run_ls() -> Result<()> {
    let dir = config::app_dir();
    if !dir.is_dir() {
        return Ok(());
    }
    for model in synth::installed_models(&dir)? {
        if let Some(name) = model.file_name() {
            println!("{}", name.to_string_lossy());
        }
    }
    Ok(())
}

/// External tools this program shells out to.
const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("piper", "speech synthesis"),
    ("ffmpeg", "audio encoding and concatenation"),
    ("ffprobe", "audio duration probing"),
    ("ebook-convert", "text extraction (Calibre)"),
    ("iconv", "diacritic transliteration"),
];

/// Report which external tools are installed. Errors when any are missing.
pub fn run_check() -> Result<()> {
    let mut missing = Vec::new();
    for (tool, purpose) in REQUIRED_TOOLS {
        match exec::require(tool) {
            Ok(path) => println!("ok       {tool} ({purpose}) at {}", path.display()),
            Err(_) => {
                println!("MISSING  {tool} ({purpose})");
                missing.push(*tool);
            }
        }
    }
    if !missing.is_empty() {
        return Err(BookvoxError::ToolNotFound {
            tool: missing.join(", "),
        });
    }
    Ok(())
}

/// True for the http(s) inputs we download before converting.
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Fetch a remote source file into the output directory.
fn download_source(url: &str, dest_dir: &Path) -> Result<PathBuf> {
    let name = url
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("download");
    let dest = dest_dir.join(name);
    info!(url, dest = %dest.display(), "downloading source file");

    let response = ureq::get(url).call().map_err(|e| BookvoxError::Download {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let mut reader = response.into_reader();
    let mut out = std::fs::File::create(&dest)?;
    std::io::copy(&mut reader, &mut out)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_in(dir: &Path) -> ConvertOptions {
        ConvertOptions {
            file: "book.epub".to_string(),
            model: "en_US-test-medium.onnx".to_string(),
            output_dir: dir.to_string_lossy().into_owned(),
            speak_utf8: false,
            output_mp3: true,
            chapters: false,
            threads: 2,
        }
    }

    #[test]
    fn options_inherit_config_values() {
        let config = Config {
            model: "a.onnx".to_string(),
            output: "/tmp".to_string(),
            threads: 7,
            speak_utf8: true,
            mp3: false,
            chapters: true,
        };
        let opts = ConvertOptions::new("x.epub".to_string(), &config);

        assert_eq!(opts.file, "x.epub");
        assert_eq!(opts.model, "a.onnx");
        assert_eq!(opts.output_dir, "/tmp");
        assert_eq!(opts.threads, 7);
        assert!(opts.speak_utf8);
        assert!(!opts.output_mp3);
        assert!(opts.chapters);
    }

    #[test]
    fn sanity_check_requires_file_model_and_output() {
        let dir = tempfile::tempdir().unwrap();

        let mut opts = options_in(dir.path());
        opts.file = String::new();
        assert!(matches!(
            sanity_check(&mut opts).unwrap_err(),
            BookvoxError::ConfigInvalidValue { ref key, .. } if key == "file"
        ));

        let mut opts = options_in(dir.path());
        opts.model = "  ".to_string();
        assert!(matches!(
            sanity_check(&mut opts).unwrap_err(),
            BookvoxError::ConfigInvalidValue { ref key, .. } if key == "model"
        ));

        let mut opts = options_in(dir.path());
        opts.output_dir = "/nonexistent/bookvox/out".to_string();
        assert!(matches!(
            sanity_check(&mut opts).unwrap_err(),
            BookvoxError::ConfigInvalidValue { ref key, .. } if key == "output"
        ));
    }

    #[test]
    fn sanity_check_disables_chapters_for_non_epub() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options_in(dir.path());
        opts.file = "notes.txt".to_string();
        opts.chapters = true;

        sanity_check(&mut opts).unwrap();
        assert!(!opts.chapters, "chapter splitting only applies to epub");
    }

    #[test]
    fn sanity_check_keeps_chapters_for_epub() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options_in(dir.path());
        opts.chapters = true;

        sanity_check(&mut opts).unwrap();
        assert!(opts.chapters);
    }

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/book.epub"));
        assert!(is_url("http://example.com/book.epub"));
        assert!(!is_url("book.epub"));
        assert!(!is_url("/home/user/book.epub"));
        assert!(!is_url("ftp://example.com/book.epub"));
    }
}
