use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::audio::encode::check_output_settings;
use crate::audio::{AssemblyOptions, AudioAssembler, OutputFormat, encode_audio};
use crate::errors::SpeechError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::notes::{self, ExportOptions, NotesFormat};
use crate::providers::{self, Synthesizer};
use crate::synthesis::{SynthesisOptions, SynthesisService};
use crate::text::{CleanOptions, MarkdownCleaner, chunk_text};

// @module: Application controller for text-to-speech and notes workflows

/// One `speak` invocation
#[derive(Debug, Clone)]
pub struct SpeakRequest {
    /// Text or markdown file, `-` for stdin
    pub input: PathBuf,
    /// Audio file to write
    pub output: PathBuf,
    /// Explicit output format; otherwise guessed from the output extension
    pub format: Option<OutputFormat>,
    /// Strip markdown before chunking
    pub clean: bool,
}

/// What a finished `speak` run produced
#[derive(Debug, Clone)]
pub struct SpeakSummary {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub chunks: usize,
    pub duration: Duration,
    pub bytes: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Speech provider
    synthesizer: Arc<dyn Synthesizer>,
}

impl Controller {
    /// Create a new controller for test purposes with the mock provider
    pub fn new_for_test() -> Result<Self> {
        let synthesizer: Arc<dyn Synthesizer> = Arc::new(providers::mock::MockSynthesizer::working());
        Self::with_synthesizer(Config::default(), synthesizer)
    }

    // @method: Create a new controller with the provider selected in the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let synthesizer = providers::create_synthesizer(&config.provider)
            .context("Failed to create speech provider")?;
        Self::with_synthesizer(config, synthesizer)
    }

    /// Create a controller around an existing provider
    pub fn with_synthesizer(config: Config, synthesizer: Arc<dyn Synthesizer>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config, synthesizer })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Format of the audio file: explicit choice, then extension, then config
    pub fn output_format(&self, output: &Path, explicit: Option<OutputFormat>) -> OutputFormat {
        if let Some(format) = explicit {
            return format;
        }
        match output.extension().map(|e| e.to_string_lossy().to_lowercase()) {
            Some(ext) if ext == "wav" || ext == "mp3" => OutputFormat::from_path(output),
            _ => self.config.output.format,
        }
    }

    /// Convert a text file to a single audio file
    ///
    /// Nothing is written unless every chunk was synthesized and the audio
    /// was encoded.
    pub async fn speak(&self, request: &SpeakRequest) -> Result<SpeakSummary> {
        let started = Instant::now();
        let speech = &self.config.speech;
        let format = self.output_format(&request.output, request.format);
        let lang = language_utils::validate_language_code(&speech.lang)?;

        // Reject bad output, speed or gain settings before any request goes out
        check_output_settings(format, self.config.output.bitrate_kbps)?;
        let assembler = AudioAssembler::new(AssemblyOptions {
            speed: speech.speed,
            gain_db: speech.gain_db,
            silence_ms: speech.silence_ms,
        })?;

        let raw = Self::read_speech_source(&request.input)?;
        let text = if request.clean {
            MarkdownCleaner::new().clean(&raw)
        } else {
            raw
        };

        let chunks = chunk_text(&text, speech.chunk_size)?;
        if chunks.is_empty() {
            return Err(SpeechError::EmptyInput.into());
        }
        info!(
            "Synthesizing {} chunk(s) ({} chars) with {} in '{}'",
            chunks.len(),
            text.chars().count(),
            self.synthesizer.name(),
            lang
        );

        let service = SynthesisService::new(
            Arc::clone(&self.synthesizer),
            SynthesisOptions::from_config(&self.config.provider),
        );
        let synth_bar = Self::progress_bar(chunks.len(), "synthesizing");
        let segments = service
            .synthesize_all_with_progress(&chunks, &lang, |done, _total| synth_bar.set_position(done as u64))
            .await;
        synth_bar.finish_and_clear();
        let segments = segments?;
        debug!("Synthesis finished after {}", Self::format_duration(started.elapsed()));

        let assemble_bar = Self::progress_bar(segments.len(), "assembling");
        let worker_bar = assemble_bar.clone();
        let bitrate = self.config.output.bitrate_kbps;
        let encoded = tokio::task::spawn_blocking(move || -> Result<(Vec<u8>, Duration), SpeechError> {
            let audio = assembler.assemble_with_progress(segments, |done, _total| worker_bar.set_position(done as u64))?;
            let bytes = encode_audio(&audio, format, bitrate)?;
            Ok((bytes, audio.duration()))
        })
        .await
        .context("Audio assembly task failed")?;
        assemble_bar.finish_and_clear();
        let (bytes, duration) = encoded?;

        FileManager::write_atomic(&request.output, &bytes)
            .with_context(|| format!("Failed to write audio to {:?}", request.output))?;

        info!(
            "Success: {:?} ({}, {}, {} of audio) in {}",
            request.output,
            format,
            FileManager::format_size(bytes.len() as u64),
            Self::format_duration(duration),
            Self::format_duration(started.elapsed())
        );

        Ok(SpeakSummary {
            output: request.output.clone(),
            format,
            chunks: chunks.len(),
            duration,
            bytes: bytes.len(),
        })
    }

    /// Text to read: the speaker notes for a `.pptx`, the file contents otherwise
    fn read_speech_source(input: &Path) -> Result<String> {
        let is_pptx = input
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pptx"));
        if !is_pptx {
            return FileManager::read_input(input);
        }
        let rows = notes::extract_notes(input).with_context(|| format!("Failed to read notes from {:?}", input))?;
        debug!("Reading the notes of {} slide(s) from {:?}", rows.len(), input);
        Ok(notes::notes_as_text(&rows))
    }

    /// Export the speaker notes of a presentation; returns where they went
    pub fn export_notes(
        input: &Path,
        output: Option<&Path>,
        format: NotesFormat,
        options: &ExportOptions,
    ) -> Result<PathBuf> {
        if !FileManager::file_exists(input) {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", input));
        }

        let rows = notes::extract_notes(input).with_context(|| format!("Failed to read notes from {:?}", input))?;
        let empty = rows.iter().filter(|row| row.notes.trim().is_empty()).count();
        if empty > 0 {
            warn!("{} of {} slide(s) have no notes", empty, rows.len());
        }

        let rendered = notes::render(&rows, format, options)?;
        let target = match output {
            Some(path) => path.to_path_buf(),
            None => FileManager::notes_output_path(input, format.extension()),
        };
        FileManager::write_output(&target, &rendered)?;

        if !FileManager::is_stdio(&target) {
            info!("Success: {:?} ({} slides, {})", target, rows.len(), format);
        }
        Ok(target)
    }

    /// Strip markdown from a file and write the plain text
    pub fn clean_text(input: &Path, output: &Path, options: CleanOptions) -> Result<()> {
        let raw = FileManager::read_input(input)?;
        let mut cleaned = MarkdownCleaner::with_options(options).clean(&raw);
        if !cleaned.is_empty() {
            cleaned.push('\n');
        }
        FileManager::write_output(output, &cleaned)
    }

    fn progress_bar(len: usize, stage: &'static str) -> ProgressBar {
        let progress_bar = ProgressBar::new(len as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message(stage);
        progress_bar
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
