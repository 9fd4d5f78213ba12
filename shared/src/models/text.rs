//! Localized text
//!
//! Menu names and descriptions are stored either as a plain string or as a
//! per-language map. Lookups fall back to German, then to the first
//! non-empty translation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported display languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    Da,
    En,
    Tr,
    It,
}

impl Language {
    /// Every language, fallback language first
    pub const ALL: [Language; 5] = [
        Language::De,
        Language::En,
        Language::Da,
        Language::Tr,
        Language::It,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            Language::De => "de",
            Language::Da => "da",
            Language::En => "en",
            Language::Tr => "tr",
            Language::It => "it",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error for unknown language codes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Language::De),
            "da" => Ok(Language::Da),
            "en" => Ok(Language::En),
            "tr" => Ok(Language::Tr),
            "it" => Ok(Language::It),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// Per-language translations; any subset may be present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub de: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub da: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<String>,
}

impl Translations {
    pub fn get(&self, lang: Language) -> Option<&str> {
        let value = match lang {
            Language::De => &self.de,
            Language::Da => &self.da,
            Language::En => &self.en,
            Language::Tr => &self.tr,
            Language::It => &self.it,
        };
        value.as_deref().filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, lang: Language, text: impl Into<String>) {
        let slot = match lang {
            Language::De => &mut self.de,
            Language::Da => &mut self.da,
            Language::En => &mut self.en,
            Language::Tr => &mut self.tr,
            Language::It => &mut self.it,
        };
        *slot = Some(text.into());
    }
}

/// A plain string or a language map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Translations(Translations),
}

impl Default for LocalizedText {
    fn default() -> Self {
        LocalizedText::Plain(String::new())
    }
}

impl LocalizedText {
    /// Resolve the text for `lang`: requested language, then German, then the
    /// first non-empty translation, then the empty string.
    pub fn get(&self, lang: Language) -> &str {
        match self {
            LocalizedText::Plain(s) => s,
            LocalizedText::Translations(t) => t
                .get(lang)
                .or_else(|| t.get(Language::De))
                .or_else(|| Language::ALL.iter().find_map(|l| t.get(*l)))
                .unwrap_or(""),
        }
    }

    /// True when no language resolves to non-blank text
    pub fn is_blank(&self) -> bool {
        self.get(Language::De).trim().is_empty()
    }

    /// Case-insensitive containment against the resolved text.
    /// `needle` must already be lowercase.
    pub fn matches(&self, lang: Language, needle: &str) -> bool {
        self.get(lang).to_lowercase().contains(needle)
    }

    /// Build a language map from `(language, text)` pairs
    pub fn translated<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Language, S)>,
        S: Into<String>,
    {
        let mut t = Translations::default();
        for (lang, text) in pairs {
            t.set(lang, text);
        }
        LocalizedText::Translations(t)
    }
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        LocalizedText::Plain(s.to_string())
    }
}

impl From<String> for LocalizedText {
    fn from(s: String) -> Self {
        LocalizedText::Plain(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_ignores_language() {
        let text = LocalizedText::from("Shisha");
        assert_eq!(text.get(Language::En), "Shisha");
        assert_eq!(text.get(Language::Tr), "Shisha");
    }

    #[test]
    fn test_missing_language_falls_back_to_german() {
        let text = LocalizedText::translated([(Language::De, "Getränke"), (Language::En, "Drinks")]);
        assert_eq!(text.get(Language::En), "Drinks");
        assert_eq!(text.get(Language::Da), "Getränke");
    }

    #[test]
    fn test_fallback_to_first_non_empty_then_empty() {
        let text: LocalizedText = serde_json::from_str(r#"{"de":"","it":"Bevande"}"#).unwrap();
        assert_eq!(text.get(Language::Tr), "Bevande");

        let empty: LocalizedText = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.get(Language::De), "");
        assert!(empty.is_blank());
    }

    #[test]
    fn test_deserialize_both_shapes() {
        let plain: LocalizedText = serde_json::from_str(r#""Snacks""#).unwrap();
        assert_eq!(plain, LocalizedText::Plain("Snacks".into()));

        let map: LocalizedText =
            serde_json::from_str(r#"{"de":"Kaffee","en":"Coffee","fr":"Café"}"#).unwrap();
        assert_eq!(map.get(Language::En), "Coffee");
    }

    #[test]
    fn test_serialize_skips_missing_languages() {
        let text = LocalizedText::translated([(Language::De, "Tee")]);
        assert_eq!(serde_json::to_string(&text).unwrap(), r#"{"de":"Tee"}"#);
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("EN".parse::<Language>(), Ok(Language::En));
        assert_eq!(" tr ".parse::<Language>(), Ok(Language::Tr));
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::It.to_string(), "it");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let text = LocalizedText::translated([(Language::De, "Minze Frisch")]);
        assert!(text.matches(Language::En, "minze"));
        assert!(!text.matches(Language::En, "apfel"));
    }
}
