//! Source language detection for comment filtering.
//!
//! A comment belongs to a source language when it contains at least one code
//! point from that language's script. Mixed-script comments still match.

use anyhow::{bail, Result};

/// A supported source language and the script ranges that identify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLanguage {
    /// ISO 639-1 language code (e.g., "ko", "ja")
    code: &'static str,

    /// English name of the language
    name: &'static str,

    /// Inclusive code point ranges of the language's script
    ranges: &'static [(char, char)],
}

impl SourceLanguage {
    /// Korean, detected by Hangul syllables.
    pub const KOREAN: SourceLanguage = SourceLanguage {
        code: "ko",
        name: "Korean",
        ranges: &[('\u{AC00}', '\u{D7A3}')],
    };

    /// Japanese, detected by Hiragana and Katakana.
    pub const JAPANESE: SourceLanguage = SourceLanguage {
        code: "ja",
        name: "Japanese",
        ranges: &[('\u{3040}', '\u{309F}'), ('\u{30A0}', '\u{30FF}')],
    };

    const ALL: &'static [SourceLanguage] = &[Self::KOREAN, Self::JAPANESE];

    /// Look up a source language by its code.
    ///
    /// # Returns
    /// * `Ok(SourceLanguage)` if the code is known
    /// * `Err` for unknown codes
    pub fn from_code(code: &str) -> Result<SourceLanguage> {
        let code = code.trim().to_lowercase();
        match Self::ALL.iter().find(|lang| lang.code == code) {
            Some(lang) => Ok(*lang),
            None => bail!("Unknown source language code: '{}'", code),
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether `text` contains at least one character of this language's script.
    pub fn matches(&self, text: &str) -> bool {
        text.chars()
            .any(|c| self.ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&c)))
    }
}

impl Default for SourceLanguage {
    fn default() -> Self {
        Self::KOREAN
    }
}

/// Check whether `text` contains Korean (Hangul syllable) characters.
pub fn is_target_language(text: &str) -> bool {
    SourceLanguage::KOREAN.matches(text)
}
