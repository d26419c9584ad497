use anyhow::{Context, Result, bail};
use bookvox::app::{self, ConvertOptions};
use bookvox::cli::{Cli, Commands};
use bookvox::config::Config;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Ls) => app::run_ls()?,
        Some(Commands::Check) => app::run_check()?,
        None => {
            let Some(file) = cli.file.clone() else {
                bail!("you must specify a file to convert (see bookvox --help)");
            };
            let config = load_config(&cli)?;
            let opts = apply_cli_overrides(ConvertOptions::new(file, &config), &cli);
            let output = app::run_conversion(opts)?;
            println!("{}", output.display());
        }
    }

    Ok(())
}

/// Map `-v` counts to an env-filter, letting `RUST_LOG` win when set.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "bookvox=info",
        1 => "bookvox=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);

    // Seed the default config on first run, but never invent a file at a
    // path the user asked for explicitly.
    if cli.config.is_none() && Config::write_default_if_missing(&path)? {
        eprintln!("New default configuration file created at {}", path.display());
    }

    let config = Config::load_or_default(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    Ok(config.with_env_overrides())
}

fn apply_cli_overrides(mut opts: ConvertOptions, cli: &Cli) -> ConvertOptions {
    if let Some(model) = &cli.model {
        opts.model = model.clone();
    }
    if let Some(output) = &cli.output {
        opts.output_dir = output.clone();
    }
    if let Some(threads) = cli.threads {
        opts.threads = threads;
    }
    if cli.speak_utf8 {
        opts.speak_utf8 = true;
    }
    if cli.wav {
        opts.output_mp3 = false;
    }
    if cli.chapters {
        opts.chapters = true;
    }
    opts
}
