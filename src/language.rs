// src/language.rs
use serde::Serialize;

/// The language the model answers in when no translation is wanted.
pub const DEFAULT_LANGUAGE: Language = Language::English;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Hindi,
    Tamil,
    Telugu,
    Malayalam,
    Kannada,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Hindi,
        Language::Tamil,
        Language::Telugu,
        Language::Malayalam,
        Language::Kannada,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::English),
            "hi" => Some(Language::Hindi),
            "ta" => Some(Language::Tamil),
            "te" => Some(Language::Telugu),
            "ml" => Some(Language::Malayalam),
            "kn" => Some(Language::Kannada),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Malayalam => "ml",
            Language::Kannada => "kn",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Malayalam => "Malayalam",
            Language::Kannada => "Kannada",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
}

pub fn supported_languages() -> Vec<LanguageInfo> {
    Language::ALL
        .iter()
        .map(|l| LanguageInfo { code: l.code(), name: l.name() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!(Language::from_code("TA"), Some(Language::Tamil));
        assert_eq!(Language::from_code(" kn "), Some(Language::Kannada));
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(Language::from_code(""), None);
    }

    #[test]
    fn every_language_round_trips_its_code() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
    }
}
