//! Supported languages, the English pivot, and speech-voice fallback.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::FarmGuideError;

/// A language the assistant can answer in.
///
/// The agent always reasons in [`Language::PIVOT`]; other languages are
/// reached by translating its answer.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    En,
    Ur,
    Sd,
}

impl Language {
    /// The language the agent reasons in.
    pub const PIVOT: Language = Language::En;

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ur => "ur",
            Self::Sd => "sd",
        }
    }

    /// Parse a language code, rejecting anything outside the supported set.
    pub fn parse(code: &str) -> Result<Self, FarmGuideError> {
        code.trim()
            .parse()
            .map_err(|_| FarmGuideError::UnsupportedLanguage(code.to_string()))
    }

    pub fn is_pivot(self) -> bool {
        self == Self::PIVOT
    }

    /// Voice used when no native speech voice exists for this language.
    /// Sindhi is read with the Urdu voice.
    pub fn speech_fallback(self) -> Language {
        match self {
            Self::Sd => Self::Ur,
            other => other,
        }
    }

    /// Whether text in this language uses Urdu-style punctuation.
    pub fn uses_arabic_punctuation(self) -> bool {
        matches!(self, Self::Ur | Self::Sd)
    }

    /// All supported languages.
    pub fn all() -> Vec<Language> {
        Self::iter().collect()
    }

    /// Replace Latin punctuation with the local forms for Urdu and Sindhi.
    ///
    /// Decimal points and digit group separators (`2.5`, `1,000`) are kept.
    pub fn normalize_punctuation(self, text: &str) -> String {
        if !self.uses_arabic_punctuation() {
            return text.trim().to_string();
        }
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        for (i, &c) in chars.iter().enumerate() {
            let between_digits = i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            let mapped = match c {
                ',' if !between_digits => '،',
                '.' if !between_digits => '۔',
                '?' => '؟',
                ';' => '؛',
                other => other,
            };
            out.push(mapped);
        }
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_known_codes_case_insensitively() {
        assert_eq!(Language::parse("ur").unwrap(), Language::Ur);
        assert_eq!(Language::parse(" SD ").unwrap(), Language::Sd);
        assert_eq!(Language::parse("En").unwrap(), Language::En);
    }

    #[test]
    fn rejects_unknown_codes() {
        let err = Language::parse("fr").unwrap_err();
        assert!(matches!(err, FarmGuideError::UnsupportedLanguage(code) if code == "fr"));
    }

    #[test]
    fn sindhi_speech_falls_back_to_urdu() {
        assert_eq!(Language::Sd.speech_fallback(), Language::Ur);
        assert_eq!(Language::Ur.speech_fallback(), Language::Ur);
        assert_eq!(Language::En.speech_fallback(), Language::En);
    }

    #[test]
    fn urdu_punctuation_is_normalized() {
        assert_eq!(
            Language::Ur.normalize_punctuation("ہاں, یہ محفوظ ہے. کیا آپ نے پڑھا? "),
            "ہاں، یہ محفوظ ہے۔ کیا آپ نے پڑھا؟"
        );
    }

    #[test]
    fn decimals_survive_normalization() {
        assert_eq!(
            Language::Ur.normalize_punctuation("2.5 کلو, 1,000 روپے."),
            "2.5 کلو، 1,000 روپے۔"
        );
    }

    #[test]
    fn english_is_left_alone() {
        assert_eq!(Language::En.normalize_punctuation(" Yes, it is. "), "Yes, it is.");
    }

    #[test]
    fn serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::Sd).unwrap(), "\"sd\"");
        assert_eq!(Language::Ur.to_string(), "ur");
        assert_eq!(Language::all().len(), 3);
    }
}
