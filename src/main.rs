// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error};
use std::io::Write;
use std::path::{Path, PathBuf};

use notevox::app_config::{self, Config, SpeechProvider};
use notevox::app_controller::{Controller, SpeakRequest};
use notevox::audio::OutputFormat;
use notevox::errors::SpeechError;
use notevox::language_utils;
use notevox::notes::{ExportOptions, NotesFormat};
use notevox::text::CleanOptions;

/// CLI Wrapper for SpeechProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSpeechProvider {
    Google,
    Mock,
}

impl From<CliSpeechProvider> for SpeechProvider {
    fn from(cli_provider: CliSpeechProvider) -> Self {
        match cli_provider {
            CliSpeechProvider::Google => SpeechProvider::Google,
            CliSpeechProvider::Mock => SpeechProvider::Mock,
        }
    }
}

/// CLI Wrapper for OutputFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOutputFormat {
    Mp3,
    Wav,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Mp3 => OutputFormat::Mp3,
            CliOutputFormat::Wav => OutputFormat::Wav,
        }
    }
}

/// CLI Wrapper for NotesFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliNotesFormat {
    Csv,
    Md,
    Json,
}

impl From<CliNotesFormat> for NotesFormat {
    fn from(cli_format: CliNotesFormat) -> Self {
        match cli_format {
            CliNotesFormat::Csv => NotesFormat::Csv,
            CliNotesFormat::Md => NotesFormat::Md,
            CliNotesFormat::Json => NotesFormat::Json,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a text or markdown file aloud into one audio file (default command)
    Speak(SpeakArgs),

    /// Export the speaker notes of a PowerPoint (.pptx) file
    Notes(NotesArgs),

    /// Strip markdown syntax and write plain text
    Clean(CleanArgs),

    /// List the languages with a known voice
    Languages,

    /// Generate shell completions for notevox
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct SpeakArgs {
    /// Text or markdown file to read, '-' for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: PathBuf,

    #[command(flatten)]
    options: SpeakOptions,
}

#[derive(Args, Debug, Clone)]
struct SpeakOptions {
    /// Output audio file (.mp3 or .wav)
    #[arg(short, long = "out", visible_alias = "output", default_value = "output.mp3")]
    out: PathBuf,

    /// Output format, overrides the file extension
    #[arg(long, value_enum)]
    format: Option<CliOutputFormat>,

    /// Playback speed (1.0 is normal)
    #[arg(long)]
    speed: Option<f32>,

    /// Gain in dB
    #[arg(long, allow_negative_numbers = true)]
    gain: Option<f32>,

    /// Silence between chunks in milliseconds
    #[arg(long)]
    silence_ms: Option<u32>,

    /// Language code (e.g., 'ja', 'en', 'zh-TW')
    #[arg(long)]
    lang: Option<String>,

    /// Maximum characters per chunk
    #[arg(long)]
    chunk: Option<usize>,

    /// Skip markdown cleaning (input is already plain text)
    #[arg(long)]
    no_clean: bool,

    /// MP3 bitrate in kbps
    #[arg(long)]
    bitrate: Option<u32>,

    /// Speech provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSpeechProvider>,
}

#[derive(Args, Debug)]
struct NotesArgs {
    /// Input .pptx file
    #[arg(value_name = "PPTX_PATH")]
    input: PathBuf,

    /// Output file, '-' for stdout (default: <stem>_notes.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: CliNotesFormat,

    /// Insert an empty row between slides (CSV)
    #[arg(long)]
    csv_blank_row: bool,

    /// Separator line between slides (Markdown, e.g. '---')
    #[arg(long, allow_hyphen_values = true)]
    md_separator: Option<String>,

    /// Insert a print page break between slides (Markdown)
    #[arg(long)]
    md_pagebreak: bool,
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Markdown file, '-' for stdin
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file, '-' for stdout
    #[arg(short, long = "out", default_value = "-")]
    out: PathBuf,

    /// Keep link URLs
    #[arg(long)]
    preserve_links: bool,

    /// Keep bold and italic markers
    #[arg(long)]
    preserve_emphasis: bool,
}

/// notevox - read documents and speaker notes aloud
#[derive(Parser, Debug)]
#[command(name = "notevox")]
#[command(version)]
#[command(about = "Text-to-speech for documents and presentation notes")]
#[command(long_about = "notevox turns text and markdown into a single spoken audio file and exports
speaker notes from PowerPoint presentations.

EXAMPLES:
    notevox talk.md                              # Read talk.md into output.mp3
    notevox talk.md -o talk.wav --speed 1.0      # WAV output at normal speed
    cat notes.txt | notevox --lang en --no-clean # Read stdin as plain English text
    notevox notes deck.pptx --format md          # Write deck_notes.md
    notevox notes deck.pptx -o - | notevox -     # Read a deck's notes aloud
    notevox clean README.md                      # Print README.md as plain text
    notevox completions bash > notevox.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in notevox.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. Command line flags override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Text or markdown file to read, '-' for stdin
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    #[command(flatten)]
    speak: SpeakOptions,

    /// Configuration file path
    #[arg(short, long = "config", global = true, default_value = "notevox.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
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
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Installed at the most verbose level; log::set_max_level does the filtering
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    if let Err(err) = run(cli).await {
        error!("{}", failure_message(&err));
        std::process::exit(1);
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "notevox", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Languages) => {
            print_languages();
            Ok(())
        }
        Some(Commands::Notes(args)) => run_notes(args),
        Some(Commands::Clean(args)) => {
            let options = CleanOptions {
                preserve_links: args.preserve_links,
                preserve_emphasis: args.preserve_emphasis,
            };
            Controller::clean_text(&args.input, &args.out, options)
        }
        Some(Commands::Speak(args)) => run_speak(args.input, args.options, &cli.config_path, cli.log_level).await,
        None => {
            // Default behavior - read the top-level input aloud
            let input = cli.input.unwrap_or_else(|| PathBuf::from("-"));
            run_speak(input, cli.speak, &cli.config_path, cli.log_level).await
        }
    }
}

async fn run_speak(
    input: PathBuf,
    options: SpeakOptions,
    config_path: &Path,
    log_level: Option<CliLogLevel>,
) -> Result<()> {
    let mut config = Config::load_or_create(config_path)?;

    // Override config with CLI options if provided
    if let Some(speed) = options.speed {
        config.speech.speed = speed;
    }
    if let Some(gain) = options.gain {
        config.speech.gain_db = gain;
    }
    if let Some(silence_ms) = options.silence_ms {
        config.speech.silence_ms = silence_ms;
    }
    if let Some(lang) = &options.lang {
        config.speech.lang = lang.clone();
    }
    if let Some(chunk) = options.chunk {
        config.speech.chunk_size = chunk;
    }
    if let Some(bitrate) = options.bitrate {
        config.output.bitrate_kbps = bitrate;
    }
    if let Some(provider) = &options.provider {
        config.provider.provider_type = provider.clone().into();
    }
    let explicit_format: Option<OutputFormat> = options.format.clone().map(Into::into);
    if let Some(format) = explicit_format {
        config.output.format = format;
    }

    // If log level was not set via command line, update it from config now
    match log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    if !language_utils::is_listed(&config.speech.lang) {
        log::warn!(
            "Language '{}' is not in the tested list; the provider may reject it",
            config.speech.lang
        );
    }

    let controller = Controller::with_config(config)?;
    let request = SpeakRequest {
        input,
        output: options.out,
        format: explicit_format,
        clean: !options.no_clean,
    };
    controller.speak(&request).await?;
    Ok(())
}

fn run_notes(args: NotesArgs) -> Result<()> {
    let options = ExportOptions {
        csv_blank_row: args.csv_blank_row,
        md_separator: args.md_separator,
        md_pagebreak: args.md_pagebreak,
    };
    Controller::export_notes(&args.input, args.output.as_deref(), args.format.into(), &options)?;
    Ok(())
}

fn print_languages() {
    println!("{:<6} {:<12} NATIVE NAME", "CODE", "NAME");
    for language in language_utils::supported_languages() {
        println!("{:<6} {:<12} {}", language.code, language.name, language.native_name.unwrap_or("-"));
    }
}

/// Single terminal line naming the failing stage and chunk
fn failure_message(err: &anyhow::Error) -> String {
    match err.chain().find_map(|cause| cause.downcast_ref::<SpeechError>()) {
        Some(speech) => match speech.chunk() {
            Some(chunk) => format!("ERROR: {} stage, chunk {}: {:#}", speech.stage(), chunk, err),
            None => format!("ERROR: {} stage: {:#}", speech.stage(), err),
        },
        None => format!("ERROR: {:#}", err),
    }
}
