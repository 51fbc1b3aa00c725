/*!
 * Google Translate text-to-speech client.
 *
 * Talks to the same `batchexecute` RPC the Translate web page uses for its
 * "listen" button. The endpoint only accepts short texts, so each request
 * is split into pieces of at most 100 characters whose MP3 streams are
 * concatenated.
 */

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode, header};
use serde_json::{Value, json};
use std::time::Duration;

use super::Synthesizer;
use crate::app_config::ProviderConfig;
use crate::audio::{AudioSegment, EncodedAudio};
use crate::errors::ProviderError;
use crate::text::chunk_text;

/// Longest text the endpoint accepts per request
pub const MAX_PIECE_CHARS: usize = 100;

const RPC_ID: &str = "jQ1olc";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

static AUDIO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#).unwrap_or_else(|e| panic!("invalid audio pattern: {}", e))
});

/// Google Translate TTS client
#[derive(Debug)]
pub struct GoogleTranslateTts {
    /// HTTP client for API requests
    client: Client,
    /// Full `batchexecute` URL
    endpoint: String,
    /// Request timeout, reported in errors
    timeout_secs: u64,
}

impl GoogleTranslateTts {
    /// Create a client for `translate.google.<tld>`
    pub fn new(tld: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Self::with_endpoint(Self::endpoint_for_tld(tld), timeout_secs)
    }

    /// Create a client for an explicit endpoint URL
    pub fn with_endpoint(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout_secs,
        })
    }

    /// Create a client from the provider configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        if config.endpoint.is_empty() {
            Self::new(&config.tld, config.timeout_secs)
        } else {
            Self::with_endpoint(config.endpoint.clone(), config.timeout_secs)
        }
    }

    /// Public endpoint for a Google top-level domain
    pub fn endpoint_for_tld(tld: &str) -> String {
        format!("https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute", tld)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Form body of one RPC call
    pub fn build_payload(text: &str, lang: &str) -> String {
        let parameter = json!([text, lang, Value::Null, "null"]).to_string();
        let rpc = json!([[[RPC_ID, parameter, Value::Null, "generic"]]]).to_string();
        let encoded: String = url::form_urlencoded::byte_serialize(rpc.as_bytes()).collect();
        format!("f.req={}&", encoded)
    }

    /// Extract the MP3 bytes from a `batchexecute` response body
    pub fn parse_response(body: &str) -> Result<Vec<u8>, ProviderError> {
        let mut audio = Vec::new();
        for line in body.lines().filter(|line| line.contains(RPC_ID)) {
            let captures = AUDIO_PATTERN
                .captures(line)
                .ok_or_else(|| ProviderError::UnsupportedLanguage("no audio stream in response".to_string()))?;
            let decoded = STANDARD
                .decode(&captures[1])
                .map_err(|e| ProviderError::ParseError(format!("invalid base64 audio: {}", e)))?;
            audio.extend_from_slice(&decoded);
        }

        if audio.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(audio)
    }

    async fn request_piece(&self, text: &str, lang: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded;charset=utf-8")
            .header(header::REFERER, "http://translate.google.com/")
            .body(Self::build_payload(text, lang))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Google TTS error ({}): {}", status, error_text.chars().take(200).collect::<String>());
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(status.to_string()),
                _ => ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("unknown").to_string(),
                },
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;
        Self::parse_response(&body)
    }
}

/// Pieces worth sending; punctuation-only pieces make the endpoint fail
fn speakable_pieces(text: &str) -> Result<Vec<String>, ProviderError> {
    let pieces = chunk_text(text, MAX_PIECE_CHARS).map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
    Ok(pieces
        .into_iter()
        .map(|piece| piece.text)
        .filter(|piece| piece.chars().any(char::is_alphanumeric))
        .collect())
}

/// A short silent clip, for text with nothing to pronounce
fn silent_clip() -> Result<EncodedAudio, ProviderError> {
    let silence = AudioSegment::silence(24_000, 1, 100);
    crate::audio::encode::encode_wav(&silence)
        .map(EncodedAudio::wav)
        .map_err(|e| ProviderError::ParseError(e.to_string()))
}

#[async_trait]
impl Synthesizer for GoogleTranslateTts {
    fn name(&self) -> &str {
        "google"
    }

    async fn synthesize(&self, text: &str, lang: &str) -> Result<EncodedAudio, ProviderError> {
        let pieces = speakable_pieces(text)?;
        if pieces.is_empty() {
            debug!("Nothing to pronounce in {:?}, using silence", text);
            return silent_clip();
        }

        let mut audio = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            let bytes = self.request_piece(piece, lang).await?;
            debug!("Piece {}/{}: {} chars -> {} bytes", i + 1, pieces.len(), piece.chars().count(), bytes.len());
            audio.extend_from_slice(&bytes);
        }

        Ok(EncodedAudio::mp3(audio))
    }
}
