//! BIP-39 mnemonic phrases
//!
//! Generation and parsing of mnemonic phrases in any of the BIP-39
//! wordlists, addressed by short locale identifiers (`en`, `ja`, `zh_tw`...).

use std::fmt;
use std::str::FromStr;

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};

/// Word counts accepted for mnemonic phrases
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Wordlist locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    English,
    Spanish,
    French,
    Italian,
    Japanese,
    Korean,
    Czech,
    ChineseSimplified,
    ChineseTraditional,
}

impl Locale {
    pub const ALL: [Locale; 9] = [
        Locale::English,
        Locale::Spanish,
        Locale::French,
        Locale::Italian,
        Locale::Japanese,
        Locale::Korean,
        Locale::Czech,
        Locale::ChineseSimplified,
        Locale::ChineseTraditional,
    ];

    /// Short identifier (`en`, `zh_cn`, ...)
    pub fn code(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Spanish => "es",
            Locale::French => "fr",
            Locale::Italian => "it",
            Locale::Japanese => "ja",
            Locale::Korean => "ko",
            Locale::Czech => "cz",
            Locale::ChineseSimplified => "zh_cn",
            Locale::ChineseTraditional => "zh_tw",
        }
    }

    fn language(&self) -> Language {
        match self {
            Locale::English => Language::English,
            Locale::Spanish => Language::Spanish,
            Locale::French => Language::French,
            Locale::Italian => Language::Italian,
            Locale::Japanese => Language::Japanese,
            Locale::Korean => Language::Korean,
            Locale::Czech => Language::Czech,
            Locale::ChineseSimplified => Language::SimplifiedChinese,
            Locale::ChineseTraditional => Language::TraditionalChinese,
        }
    }

    fn from_language(language: Language) -> Self {
        Locale::ALL
            .into_iter()
            .find(|locale| locale.language() == language)
            .unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "en" => Ok(Locale::English),
            "es" => Ok(Locale::Spanish),
            "fr" => Ok(Locale::French),
            "it" => Ok(Locale::Italian),
            "ja" => Ok(Locale::Japanese),
            "ko" => Ok(Locale::Korean),
            "cz" | "cs" => Ok(Locale::Czech),
            "zh" | "zh_cn" => Ok(Locale::ChineseSimplified),
            "zh_tw" => Ok(Locale::ChineseTraditional),
            _ => Err(WalletError::UnsupportedLocale(s.to_string())),
        }
    }
}

/// A parsed, checksum-valid mnemonic
#[derive(Clone)]
pub struct MnemonicPhrase {
    inner: Mnemonic,
}

impl fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnemonicPhrase")
            .field("locale", &self.locale())
            .field("words", &self.word_count())
            .finish_non_exhaustive()
    }
}

impl MnemonicPhrase {
    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.inner.to_string())
    }

    pub fn locale(&self) -> Locale {
        Locale::from_language(self.inner.language())
    }

    pub fn word_count(&self) -> usize {
        self.inner.word_count()
    }

    /// BIP-39 seed with an empty passphrase
    pub fn seed(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.inner.to_seed_normalized(""))
    }
}

/// Check whether a word count is a valid BIP-39 length
pub fn is_valid_word_count(count: usize) -> bool {
    VALID_WORD_COUNTS.contains(&count)
}

/// Count the whitespace-separated words in a phrase
pub fn word_count(phrase: &str) -> usize {
    phrase.split_whitespace().count()
}

/// Generate a fresh random mnemonic
pub fn generate(words: usize, locale: Locale) -> Result<MnemonicPhrase> {
    if !is_valid_word_count(words) {
        return Err(WalletError::InvalidMnemonic(format!(
            "invalid word count {}, expected one of 12, 15, 18, 21, 24",
            words
        )));
    }

    let mut entropy = Zeroizing::new(vec![0u8; words * 4 / 3]);
    rand::thread_rng().fill_bytes(&mut entropy);

    let inner = Mnemonic::from_entropy_in(locale.language(), &entropy)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

    Ok(MnemonicPhrase { inner })
}

/// Parse a phrase, auto-detecting the wordlist unless a locale is given
pub fn parse(phrase: &str, locale: Option<Locale>) -> Result<MnemonicPhrase> {
    let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");

    let inner = match locale {
        Some(locale) => Mnemonic::parse_in_normalized(locale.language(), &normalized),
        None => Mnemonic::parse_normalized(&normalized),
    }
    .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

    Ok(MnemonicPhrase { inner })
}
