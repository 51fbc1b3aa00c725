use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for speech language codes
///
/// Codes are ISO 639-1 (2-letter) with an optional region subtag
/// (`zh-TW`, `pt-BR`), the form speech providers expect.
/// Languages listed by `notevox languages`, in display order
pub const SUPPORTED_LANGUAGES: [&str; 12] = ["ja", "en", "zh", "ko", "es", "fr", "de", "it", "pt", "ru", "ar", "hi"];

/// A language as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    /// ISO 639-1 code
    pub code: &'static str,
    /// English name
    pub name: &'static str,
    /// Name in the language itself, when known
    pub native_name: Option<&'static str>,
}

/// Split `zh-TW` / `zh_tw` into the primary subtag and an optional region
fn split_code(code: &str) -> (String, Option<String>) {
    let normalized = code.trim().replace('_', "-");
    match normalized.split_once('-') {
        Some((primary, region)) => (primary.to_lowercase(), Some(region.to_string())),
        None => (normalized.to_lowercase(), None),
    }
}

/// Validate a language code, returning it in canonical form (`zh-TW`, `en`)
pub fn validate_language_code(code: &str) -> Result<String> {
    let (primary, region) = split_code(code);

    if primary.len() != 2 || Language::from_639_1(&primary).is_none() {
        return Err(anyhow!("Invalid language code: {}", code));
    }

    match region {
        None => Ok(primary),
        Some(region) => {
            let valid = (region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()))
                || (region.len() == 4 && region.chars().all(|c| c.is_ascii_alphabetic()))
                || (region.len() == 3 && region.chars().all(|c| c.is_ascii_digit()));
            if !valid {
                return Err(anyhow!("Invalid region in language code: {}", code));
            }
            let region = if region.len() == 4 {
                // script subtags are title-cased (zh-Hant)
                let mut chars = region.chars();
                chars
                    .next()
                    .map(|first| first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase())
                    .unwrap_or_default()
            } else {
                region.to_uppercase()
            };
            Ok(format!("{}-{}", primary, region))
        }
    }
}

/// The primary ISO 639-1 subtag of a code
pub fn primary_subtag(code: &str) -> String {
    split_code(code).0
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let primary = primary_subtag(code);
    let lang = Language::from_639_1(&primary).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Details of every listed language
pub fn supported_languages() -> Vec<LanguageInfo> {
    SUPPORTED_LANGUAGES
        .iter()
        .filter_map(|code| {
            Language::from_639_1(code).map(|lang| LanguageInfo {
                code,
                name: lang.to_name(),
                native_name: lang.to_autonym(),
            })
        })
        .collect()
}

/// Whether the code is one of the listed languages
pub fn is_listed(code: &str) -> bool {
    let primary = primary_subtag(code);
    SUPPORTED_LANGUAGES.contains(&primary.as_str())
}
