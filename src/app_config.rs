use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::audio::OutputFormat;
use crate::audio::encode::SUPPORTED_BITRATES;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Conversion settings
    #[serde(default)]
    pub speech: SpeechOptions,

    /// Speech provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Options of a single text-to-speech conversion
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpeechOptions {
    /// Playback speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Gain in dB applied to the assembled audio
    #[serde(default = "default_gain_db")]
    pub gain_db: f32,

    /// Silence inserted between chunks, in milliseconds
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u32,

    /// Language code handed to the provider (ISO 639-1, optional region)
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            gain_db: default_gain_db(),
            silence_ms: default_silence_ms(),
            lang: default_lang(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl SpeechOptions {
    /// Check ranges; the language code is validated separately
    pub fn validate(&self) -> Result<()> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(anyhow!("Speed must be a positive number, got {}", self.speed));
        }
        if !self.gain_db.is_finite() {
            return Err(anyhow!("Gain must be a finite number of dB, got {}", self.gain_db));
        }
        if self.chunk_size == 0 {
            return Err(anyhow!("Chunk size must be at least 1 character"));
        }
        Ok(())
    }
}

/// Speech provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    /// Google Translate speech endpoint
    #[default]
    Google,
    /// Offline tone generator
    Mock,
}

impl SpeechProvider {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate TTS",
            Self::Mock => "Mock",
        }
    }

    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

impl std::fmt::Display for SpeechProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for SpeechProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" | "gtts" => Ok(Self::Google),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Provider type identifier
    #[serde(rename = "type", default)]
    pub provider_type: SpeechProvider,

    /// Service URL; empty means the public endpoint for `tld`
    #[serde(default)]
    pub endpoint: String,

    /// Top-level domain of the Google host (`com`, `co.jp`, ...)
    #[serde(default = "default_tld")]
    pub tld: String,

    /// Timeout of a single request in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Chunks synthesized at the same time
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Pause between consecutive requests in milliseconds
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: SpeechProvider::default(),
            endpoint: String::new(),
            tld: default_tld(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            concurrent_requests: default_concurrent_requests(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
        }
    }
}

/// Output file configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Container of the written file
    #[serde(default)]
    pub format: OutputFormat,

    /// MP3 bitrate in kbps
    #[serde(default = "default_bitrate_kbps")]
    pub bitrate_kbps: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            bitrate_kbps: default_bitrate_kbps(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_speed() -> f32 {
    1.2
}

fn default_gain_db() -> f32 {
    3.0
}

fn default_silence_ms() -> u32 {
    250
}

fn default_lang() -> String {
    "ja".to_string()
}

fn default_chunk_size() -> usize {
    1800
}

fn default_tld() -> String {
    "com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_rate_limit_delay_ms() -> u64 {
    0
}

fn default_bitrate_kbps() -> u32 {
    192
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.speech.validate()?;
        crate::language_utils::validate_language_code(&self.speech.lang)?;

        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("Provider timeout must be at least 1 second"));
        }
        if self.provider.concurrent_requests == 0 {
            return Err(anyhow!("Concurrent requests must be at least 1"));
        }
        if !self.provider.endpoint.is_empty() {
            url::Url::parse(&self.provider.endpoint)
                .with_context(|| format!("Invalid provider endpoint: {}", self.provider.endpoint))?;
        }
        if self.provider.tld.is_empty() || self.provider.tld.contains('/') {
            return Err(anyhow!("Invalid Google top-level domain: '{}'", self.provider.tld));
        }

        if self.output.format == OutputFormat::Mp3 && !SUPPORTED_BITRATES.contains(&self.output.bitrate_kbps) {
            return Err(anyhow!(
                "Unsupported MP3 bitrate {} kbps (supported: {:?})",
                self.output.bitrate_kbps,
                SUPPORTED_BITRATES
            ));
        }

        Ok(())
    }

    /// Load the configuration from `path`, writing a default file when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }
}
