/*!
 * Tests for application configuration functionality
 */

use notevox::app_config::{Config, LogLevel, SpeechProvider};
use notevox::audio::OutputFormat;

use crate::common;

/// Test that a saved configuration loads back unchanged
#[test]
fn test_config_saveThenLoad_shouldRoundTrip() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("notevox.json");

    let mut config = Config::default();
    config.speech.speed = 1.5;
    config.speech.lang = "en".to_string();
    config.provider.provider_type = SpeechProvider::Mock;
    config.provider.concurrent_requests = 4;
    config.output.format = OutputFormat::Wav;
    config.log_level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::load_or_create(&path).unwrap();
    assert_eq!(loaded, config);
}

/// Test the on-disk key names
#[test]
fn test_config_json_shouldUseDocumentedKeys() {
    let json = serde_json::to_value(Config::default()).unwrap();
    assert_eq!(json["provider"]["type"], "google");
    assert_eq!(json["output"]["format"], "mp3");
    assert_eq!(json["speech"]["chunk_size"], 1800);
    assert_eq!(json["log_level"], "info");
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.speech.lang = "xyz".to_string();
    assert!(config.validate().is_err());
    config.speech.lang = "zh-TW".to_string();
    assert!(config.validate().is_ok());

    config.output.bitrate_kbps = 100;
    assert!(config.validate().is_err());
    // bitrate only matters for MP3
    config.output.format = OutputFormat::Wav;
    assert!(config.validate().is_ok());

    config.provider.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.provider.endpoint = "http://localhost:8080/tts".to_string();
    assert!(config.validate().is_ok());

    config.speech.speed = 0.0;
    assert!(config.validate().is_err());
}

/// Test that a broken file is reported instead of replaced
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "notevox.json", "{ not json").unwrap();
    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}
