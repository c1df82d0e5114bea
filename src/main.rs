// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use sonioxsrt::app_config::{self, Config, SubtitleConfig};
use sonioxsrt::app_config::TranslationConfig;
use sonioxsrt::app_controller::Controller;
use sonioxsrt::file_utils::FileManager;
use sonioxsrt::providers::openai::OpenAI;
use sonioxsrt::providers::soniox::SonioxClient;
use sonioxsrt::transcriber::TranscriptionRequest;
use sonioxsrt::translation::{TranslationPasses, Translator};

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

/// Options shared by every subcommand
#[derive(Args, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "sonioxsrt.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Segmentation and layout overrides
#[derive(Args, Debug, Default)]
struct EngineArgs {
    /// Silence in ms that starts a new cue
    #[arg(long)]
    gap_ms: Option<i64>,

    /// Minimum cue duration in ms
    #[arg(long)]
    min_dur_ms: Option<i64>,

    /// Maximum cue duration in ms
    #[arg(long)]
    max_dur_ms: Option<i64>,

    /// Maximum characters per second
    #[arg(long)]
    max_cps: Option<f64>,

    /// Maximum characters per line
    #[arg(long)]
    max_cpl: Option<usize>,

    /// Maximum lines per cue
    #[arg(long)]
    max_lines: Option<usize>,

    /// Characters after which a line break is preferred (e.g. ",;、")
    #[arg(long)]
    line_split_delimiters: Option<String>,

    /// End cues at sentence-ending punctuation
    #[arg(long)]
    segment_on_sentence: bool,

    /// Start a new cue when the speaker changes
    #[arg(long)]
    split_on_speaker: bool,

    /// Mark sentences continued across cues with an ellipsis
    #[arg(long)]
    ellipses: bool,
}

impl EngineArgs {
    fn apply(&self, config: &mut SubtitleConfig) {
        if let Some(gap_ms) = self.gap_ms {
            config.gap_ms = gap_ms;
        }
        if let Some(min_dur_ms) = self.min_dur_ms {
            config.min_dur_ms = min_dur_ms;
        }
        if let Some(max_dur_ms) = self.max_dur_ms {
            config.max_dur_ms = max_dur_ms;
        }
        if let Some(max_cps) = self.max_cps {
            config.max_cps = max_cps;
        }
        if let Some(max_cpl) = self.max_cpl {
            config.max_cpl = max_cpl;
        }
        if let Some(max_lines) = self.max_lines {
            config.max_lines = max_lines;
        }
        if let Some(delimiters) = &self.line_split_delimiters {
            config.set_line_split_delimiters(delimiters);
        }
        config.segment_on_sentence |= self.segment_on_sentence;
        config.split_on_speaker |= self.split_on_speaker;
        config.ellipses |= self.ellipses;
    }
}

/// Optional translation of the finished cues
#[derive(Args, Debug, Default)]
struct TranslateArgs {
    /// Translate the subtitles into this language with an OpenAI-compatible LLM
    #[arg(long)]
    translate_to: Option<String>,

    /// Translation passes: 1 for a draft, 3 for draft, review and refine
    #[arg(long, value_parser = parse_translation_passes)]
    translation_passes: Option<u8>,

    /// Model name for translation (falls back to DEFAULT_MODEL, then the config file)
    #[arg(long, env = "LLM_MODEL")]
    llm_model: Option<String>,

    /// Chat completions base URL
    #[arg(long, env = "LLM_BASE_URL")]
    llm_base_url: Option<String>,

    /// API key for the translation LLM (default: LLM_API_KEY or .env)
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,
}

impl TranslateArgs {
    fn apply(&self, config: &mut TranslationConfig) {
        if let Some(language) = &self.translate_to {
            config.target_language = Some(language.clone());
        }
        if let Some(passes) = self.translation_passes {
            config.passes = passes;
        }
        let model = self
            .llm_model
            .clone()
            .or_else(|| std::env::var("DEFAULT_MODEL").ok())
            .filter(|model| !model.trim().is_empty());
        if let Some(model) = model {
            config.model = model;
        }
        if let Some(base_url) = &self.llm_base_url {
            config.base_url = base_url.clone();
        }
    }
}

fn parse_translation_passes(value: &str) -> Result<u8, String> {
    match value.trim() {
        "1" => Ok(1),
        "3" => Ok(3),
        other => Err(format!("expected 1 or 3, got {:?}", other)),
    }
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Transcript JSON file, or a directory of them
    #[arg(short, long, default_value = "response.json")]
    input: PathBuf,

    /// Output SRT file (single-file mode only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing subtitles in directory mode
    #[arg(short, long)]
    force: bool,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(flatten)]
    translate: TranslateArgs,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct TranscribeArgs {
    /// Local audio file to upload
    #[arg(long, conflicts_with = "audio_url", required_unless_present = "audio_url")]
    audio: Option<PathBuf>,

    /// Public audio URL for the service to fetch
    #[arg(long)]
    audio_url: Option<String>,

    /// Recognition model
    #[arg(short, long)]
    model: Option<String>,

    /// Where to save the transcript JSON
    #[arg(short, long, default_value = "response.json")]
    output: PathBuf,

    /// Also convert the transcript to this SRT file
    #[arg(long)]
    srt: Option<PathBuf>,

    /// Do not delete the uploaded file and transcription afterwards
    #[arg(long)]
    keep_resources: bool,

    /// Status polling interval in ms
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// API base URL
    #[arg(long, env = "SONIOX_BASE_URL")]
    base_url: Option<String>,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert transcript JSON to SRT subtitles
    Convert(ConvertArgs),

    /// Transcribe audio with Soniox and save the transcript
    Transcribe(TranscribeArgs),

    /// Generate shell completions for sonioxsrt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// sonioxsrt - readable SRT subtitles from Soniox transcripts
#[derive(Parser, Debug)]
#[command(name = "sonioxsrt")]
#[command(version)]
#[command(about = "Turn Soniox speech-to-text transcripts into readable SRT subtitles")]
#[command(long_about = "sonioxsrt groups recognised tokens into subtitle cues that respect reading speed,
duration and line length limits, and can fetch transcripts from the Soniox API.

EXAMPLES:
    sonioxsrt convert -i response.json -o subtitles.srt
    sonioxsrt convert -i transcripts/ --force
    sonioxsrt convert -i response.json --max-cpl 16 --segment-on-sentence --ellipses
    sonioxsrt convert -i response.json -o talk.de.srt --translate-to German
    sonioxsrt convert -i response.json --translate-to \"Brazilian Portuguese\" --translation-passes 3
    sonioxsrt transcribe --audio talk.wav --srt talk.srt
    sonioxsrt completions bash > sonioxsrt.bash

CONFIGURATION:
    Settings are read from sonioxsrt.json when present (see --config).
    Command-line flags override individual values. The API key is taken from
    SONIOX_API_KEY or a .env file in the working directory. Translation reads
    LLM_API_KEY, LLM_MODEL and LLM_BASE_URL the same way.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
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
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// Load the config file and apply the log level, command line first
fn load_config(common: &CommonArgs) -> Result<Config> {
    let mut config = Config::load_or_default(&common.config)?;
    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(LevelFilter::from(&config.log_level));
    debug!("Loaded configuration from {:?}", common.config);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // The level is narrowed once the configuration is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sonioxsrt", &mut std::io::stdout());
            Ok(())
        }
        Commands::Convert(args) => run_convert(args).await,
        Commands::Transcribe(args) => run_transcribe(args).await,
    }
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    args.engine.apply(&mut config.subtitles);
    args.translate.apply(&mut config.translation);

    let controller = Controller::with_config(config)?;
    let settings = &controller.config().translation;
    let Some(target_language) = settings.target_language.clone() else {
        return controller.convert(&args.input, args.output.as_deref(), args.force);
    };

    if FileManager::dir_exists(&args.input) {
        return Err(anyhow!("Translation works on a single transcript file, not a directory"));
    }
    let passes = TranslationPasses::from_count(settings.passes)
        .ok_or_else(|| anyhow!("Translation passes must be 1 or 3, got {}", settings.passes))?;
    let model = OpenAI::from_config(settings, args.translate.llm_api_key.clone())?;
    let translator = Translator::new(model, target_language, controller.config().subtitles.clone())
        .with_chunk_size(settings.chunk_size)
        .with_max_retries(settings.max_retries);

    let (output, stats) = controller
        .convert_file_translated(&args.input, args.output.as_deref(), &translator, passes)
        .await
        .with_context(|| format!("Failed to translate {:?}", args.input))?;
    info!("{}", stats.summary());
    info!("Wrote translated subtitles to {:?}", output);
    Ok(())
}

async fn run_transcribe(args: TranscribeArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    args.engine.apply(&mut config.subtitles);
    if let Some(model) = &args.model {
        config.api.model = model.clone();
    }
    if let Some(poll_interval_ms) = args.poll_interval_ms {
        config.api.poll_interval_ms = poll_interval_ms;
    }
    if let Some(base_url) = &args.base_url {
        config.api.base_url = base_url.clone();
    }
    config.api.keep_remote |= args.keep_resources;

    let controller = Controller::with_config(config)?;
    let api = &controller.config().api;
    let client = SonioxClient::from_config(api)?;
    let request = TranscriptionRequest::new(args.audio, args.audio_url, api.model.clone())?;

    controller
        .transcribe(client, &request, &args.output, args.srt.as_deref())
        .await
        .with_context(|| format!("Failed to transcribe into {:?}", args.output))?;
    Ok(())
}
