//! Command-line interface for bookvox
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Convert ebooks into chaptered audiobooks with a local piper voice
#[derive(Parser, Debug)]
#[command(
    name = "bookvox",
    version,
    about = "Convert ebooks into chaptered audiobooks with a local piper voice"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// File or URL to convert
    pub file: Option<String>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Piper voice model name or path (default from config file)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Directory the finished audiobook is written to (must exist)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<String>,

    /// Speak UTF-8 characters instead of transliterating them to ASCII
    #[arg(long)]
    pub speak_utf8: bool,

    /// Write a plain WAV instead of an MP3
    #[arg(long)]
    pub wav: bool,

    /// Split the book into chapter-tagged sections (epub only)
    #[arg(long)]
    pub chapters: bool,

    /// Concurrent section conversions; 0 runs every section at once
    #[arg(short = 't', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Verbose output (-v: debug, -vv: full trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the voice models that are installed
    #[command(alias = "list-models")]
    Ls,

    /// Check that the external tools bookvox needs are on PATH
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_conversion() {
        let cli = Cli::try_parse_from(["bookvox", "book.epub"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.file.as_deref(), Some("book.epub"));
        assert!(!cli.chapters);
        assert!(cli.threads.is_none());
    }

    #[test]
    fn parses_full_flag_set() {
        let cli = Cli::try_parse_from([
            "bookvox",
            "book.epub",
            "--chapters",
            "--speak-utf8",
            "--model",
            "zh_CN-huayan-medium.onnx",
            "-o",
            "/tmp/books",
            "-t",
            "3",
            "-vv",
        ])
        .unwrap();

        assert!(cli.chapters);
        assert!(cli.speak_utf8);
        assert_eq!(cli.model.as_deref(), Some("zh_CN-huayan-medium.onnx"));
        assert_eq!(cli.output.as_deref(), Some("/tmp/books"));
        assert_eq!(cli.threads, Some(3));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn parses_ls_and_alias() {
        let cli = Cli::try_parse_from(["bookvox", "ls"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Ls)));

        let cli = Cli::try_parse_from(["bookvox", "list-models"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Ls)));
    }

    #[test]
    fn parses_check() {
        let cli = Cli::try_parse_from(["bookvox", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
    }

    #[test]
    fn threads_zero_is_accepted() {
        let cli = Cli::try_parse_from(["bookvox", "book.epub", "--threads", "0"]).unwrap();
        assert_eq!(cli.threads, Some(0));
    }
}
