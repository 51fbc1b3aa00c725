/*!
 * Error types for the notevox application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a speech provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The request did not complete in time
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The provider does not speak the requested language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The provider answered without any audio
    #[error("Provider returned no audio")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether a failed call is worth another attempt
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::ConnectionError(_)
            | Self::RateLimitExceeded(_)
            | Self::Timeout(_)
            | Self::RequestFailed(_)
            | Self::EmptyResponse => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::ParseError(_) | Self::UnsupportedLanguage(_) => false,
        }
    }
}

/// Errors raised by the text-to-audio conversion
#[derive(Error, Debug)]
pub enum SpeechError {
    /// Nothing left to synthesize after cleaning
    #[error("Input text is empty, nothing to synthesize")]
    EmptyInput,

    /// A conversion option is out of range
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// A chunk could not be synthesized, even after retries
    #[error("Synthesis failed on chunk {chunk}/{total}: {source}")]
    Provider {
        /// 1-based number of the failing chunk
        chunk: usize,
        /// Number of chunks in the run
        total: usize,
        /// Last provider error observed
        #[source]
        source: ProviderError,
    },

    /// Audio that cannot be decoded or normalized to a common format
    #[error("Unsupported audio format{}: {reason}", .chunk.map(|c| format!(" in chunk {}", c)).unwrap_or_default())]
    UnsupportedFormat {
        /// 1-based chunk number, when the failure belongs to one chunk
        chunk: Option<usize>,
        /// What was wrong with the audio
        reason: String,
    },

    /// Final encode failure
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Output write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    /// Name of the pipeline stage the error belongs to, for terminal messages
    pub fn stage(&self) -> &'static str {
        match self {
            Self::EmptyInput | Self::InvalidOption(_) => "input",
            Self::Provider { .. } => "synthesis",
            Self::UnsupportedFormat { .. } => "decode",
            Self::Encoding(_) => "encode",
            Self::Io(_) => "output",
        }
    }

    /// The 1-based chunk number involved, if any
    pub fn chunk(&self) -> Option<usize> {
        match self {
            Self::Provider { chunk, .. } => Some(*chunk),
            Self::UnsupportedFormat { chunk, .. } => *chunk,
            _ => None,
        }
    }
}

/// Errors that can occur while extracting presentation notes
#[derive(Error, Debug)]
pub enum NotesError {
    /// Failed to open or read a file
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container problem
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing problem
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// A part the presentation must contain is missing
    #[error("Missing presentation part: {0}")]
    MissingPart(String),

    /// Failure writing an export
    #[error("Export error: {0}")]
    Export(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the speech conversion
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    /// Error from notes extraction
    #[error("Notes error: {0}")]
    Notes(#[from] NotesError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
