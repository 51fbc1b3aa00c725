/*!
 * Text-to-speech provider implementations.
 *
 * This module contains the speech providers:
 * - Google: the public Google Translate speech endpoint
 * - Mock: deterministic tone generator for tests and offline runs
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{ProviderConfig, SpeechProvider};
use crate::audio::EncodedAudio;
use crate::errors::ProviderError;

/// Common trait for all speech providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the synthesis service.
#[async_trait]
pub trait Synthesizer: Send + Sync + Debug {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Synthesize `text` spoken in `lang`
    ///
    /// # Arguments
    /// * `text` - The text of one chunk
    /// * `lang` - Language code, e.g. `ja` or `zh-TW`
    ///
    /// # Returns
    /// * `Result<EncodedAudio, ProviderError>` - Encoded audio or an error
    async fn synthesize(&self, text: &str, lang: &str) -> Result<EncodedAudio, ProviderError>;

    /// Longest text the provider accepts in one call, if it has a limit
    fn max_request_chars(&self) -> Option<usize> {
        None
    }
}

/// Build the provider selected in the configuration
pub fn create_synthesizer(config: &ProviderConfig) -> Result<Arc<dyn Synthesizer>, ProviderError> {
    match config.provider_type {
        SpeechProvider::Google => Ok(Arc::new(google::GoogleTranslateTts::from_config(config)?)),
        SpeechProvider::Mock => Ok(Arc::new(mock::MockSynthesizer::working())),
    }
}

pub mod google;
pub mod mock;
