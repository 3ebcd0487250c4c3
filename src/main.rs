// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};

use screentrans::app_config::{Config, LogLevel};
use screentrans::pipeline::TranslationPipeline;
use screentrans::providers::gemini::GeminiBackend;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for screentrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// screentrans - translate text inside images with an AI image-editing endpoint
///
/// Sends a captured screen region (or any image file) to a remote
/// image-editing translation endpoint and writes back the edited image.
#[derive(Parser, Debug)]
#[command(name = "screentrans")]
#[command(version = "1.0.0")]
#[command(about = "AI-powered in-image translation")]
#[command(long_about = "screentrans compresses an image into a transmission budget, sends it to a \
Gemini-style image-editing translation endpoint and saves the returned edited image.

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. The API key can also be supplied via the
    GEMINI_API_KEY environment variable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input image file to translate
    #[arg(value_name = "INPUT_IMAGE")]
    input_path: Option<PathBuf>,

    /// Output path for the edited image (defaults to <input>.translated.png)
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Probe the endpoint connection and exit
    #[arg(long)]
    check: bool,
}

/// Custom logger writing colored, timestamped lines to stderr.
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default.
    // The level is updated after loading the config if needed.
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "screentrans", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::from_file(&cli.config_path)?;
    let level = cli
        .log_level
        .map(LogLevel::from)
        .unwrap_or(config.log_level)
        .to_level_filter();
    log::set_max_level(level);
    config.validate()?;

    if cli.check {
        let backend = GeminiBackend::new(
            config.resolved_api_key(),
            config.endpoint.clone(),
            config.model.clone(),
            config.timeout_secs,
        )
        .map_err(|e| anyhow!("Endpoint check failed: {}", e.user_message()))?;
        backend
            .probe()
            .await
            .map_err(|e| anyhow!("Endpoint check failed: {}", e.user_message()))?;
        info!("Endpoint connection OK");
        return Ok(());
    }

    let input_path = cli
        .input_path
        .ok_or_else(|| anyhow!("No input image given. Run with --help for usage."))?;
    let output_path = cli.output_path.unwrap_or_else(|| {
        let mut path = input_path.clone();
        path.set_extension("translated.png");
        path
    });

    let image = image::open(&input_path)
        .with_context(|| format!("Failed to open input image {}", input_path.display()))?;
    info!("Loaded {} ({}x{})", input_path.display(), image.width(), image.height());

    let gate = TranslationPipeline::gate_from_config(&config);
    let pipeline = TranslationPipeline::new(config, gate).map_err(|e| anyhow!(e.user_message()))?;

    match pipeline.translate(&image).await {
        Ok(outcome) => {
            if let Some(edited) = &outcome.edited_image {
                edited
                    .save(&output_path)
                    .with_context(|| format!("Failed to save edited image to {}", output_path.display()))?;
                info!("Saved edited image to {}", output_path.display());
            }
            if let Some(text) = &outcome.auxiliary_text {
                info!("Endpoint commentary: {}", text);
            }
            if let Some(text) = &outcome.translated_text {
                info!("Translated text: {}", text);
            }
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(anyhow!(e.user_message()))
        }
    }
}
