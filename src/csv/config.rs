use crate::errors::{CsvError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// How the escape character changes the meaning of the text around it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// The escape character is an ordinary character
    None,
    /// The escape character protects exactly the one character after it
    SingleChar,
    /// The escape character opens a span that runs to its next occurrence
    QuotedSpan,
}

impl FromStr for EscapeMode {
    type Err = CsvError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "none" => Ok(EscapeMode::None),
            "char" | "single_char" => Ok(EscapeMode::SingleChar),
            "string" | "quoted_span" => Ok(EscapeMode::QuotedSpan),
            _ => Err(CsvError::InvalidConfig(format!("unrecognized escape mode: {name}"))),
        }
    }
}

impl fmt::Display for EscapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscapeMode::None => f.write_str("none"),
            EscapeMode::SingleChar => f.write_str("char"),
            EscapeMode::QuotedSpan => f.write_str("string"),
        }
    }
}

/// The role a single character plays for one tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharacterClass {
    Delimiter,
    Escape,
    Other,
}

/// Tokenizer settings as they appear in a config file, before validation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TokenizerSettings {
    pub delimiter: String,
    pub escape_char: Option<String>,
    pub escape_mode: String,
    pub keep_escape_markers: bool,
}

impl Default for TokenizerSettings {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            escape_char: Some("\\".to_string()),
            escape_mode: EscapeMode::SingleChar.to_string(),
            keep_escape_markers: true,
        }
    }
}

impl TokenizerSettings {
    /// Settings for a quote-aware split on `delimiter`, keeping the quotes in the output
    pub fn quoted(delimiter: &str, quote: &str) -> Self {
        Self {
            delimiter: delimiter.to_string(),
            escape_char: Some(quote.to_string()),
            escape_mode: EscapeMode::QuotedSpan.to_string(),
            keep_escape_markers: true,
        }
    }
}

/// Validated, immutable configuration for one [`Tokenizer`](super::Tokenizer)
///
/// `escape_char` is present exactly when `escape_mode` is not [`EscapeMode::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    delimiter: char,
    escape_mode: EscapeMode,
    escape_char: Option<char>,
    keep_escape_markers: bool,
}

impl TokenizerConfig {
    /// Split on `delimiter` with no escaping, keeping every character
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            escape_mode: EscapeMode::None,
            escape_char: None,
            keep_escape_markers: true,
        }
    }

    pub fn with_escape(mut self, escape_mode: EscapeMode, escape_char: char) -> Self {
        self.escape_mode = escape_mode;
        self.escape_char = match escape_mode {
            EscapeMode::None => None,
            _ => Some(escape_char),
        };
        self
    }

    pub fn keep_escape_markers(mut self, keep: bool) -> Self {
        self.keep_escape_markers = keep;
        self
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn escape_mode(&self) -> EscapeMode {
        self.escape_mode
    }

    pub fn escape_char(&self) -> Option<char> {
        self.escape_char
    }

    pub fn keeps_escape_markers(&self) -> bool {
        self.keep_escape_markers
    }

    /// The delimiter takes precedence when it is also the escape character
    pub(crate) fn classify(&self, ch: char) -> CharacterClass {
        if ch == self.delimiter {
            CharacterClass::Delimiter
        } else if self.escape_char == Some(ch) {
            CharacterClass::Escape
        } else {
            CharacterClass::Other
        }
    }
}

impl TryFrom<&TokenizerSettings> for TokenizerConfig {
    type Error = CsvError;

    fn try_from(settings: &TokenizerSettings) -> Result<Self> {
        let delimiter = single_char("delimiter", &settings.delimiter)?;
        let escape_mode: EscapeMode = settings.escape_mode.parse()?;
        let config = TokenizerConfig::new(delimiter)
            .keep_escape_markers(settings.keep_escape_markers);
        if escape_mode == EscapeMode::None {
            return Ok(config);
        }
        let escape_char = match &settings.escape_char {
            Some(value) => single_char("escape_char", value)?,
            None => {
                return Err(CsvError::InvalidConfig(format!(
                    "escape_char is required when escape_mode is {escape_mode}"
                )))
            }
        };
        Ok(config.with_escape(escape_mode, escape_char))
    }
}

impl TryFrom<TokenizerSettings> for TokenizerConfig {
    type Error = CsvError;

    fn try_from(settings: TokenizerSettings) -> Result<Self> {
        TokenizerConfig::try_from(&settings)
    }
}

fn single_char(name: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(CsvError::InvalidConfig(format!(
            "{name} must be exactly one character, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_settings_validate() {
        let config = TokenizerConfig::try_from(TokenizerSettings::default()).unwrap();
        assert_eq!(config.delimiter(), ',');
        assert_eq!(config.escape_mode(), EscapeMode::SingleChar);
        assert_eq!(config.escape_char(), Some('\\'));
        assert!(config.keeps_escape_markers());
    }

    #[rstest]
    #[case::empty_delimiter("", Some("\""), "string")]
    #[case::long_delimiter(",,", Some("\""), "string")]
    #[case::empty_escape(",", Some(""), "string")]
    #[case::long_escape(",", Some("''"), "char")]
    #[case::missing_escape(",", None, "string")]
    #[case::unknown_mode(",", Some("\""), "backslash")]
    fn test_invalid_settings(
        #[case] delimiter: &str,
        #[case] escape_char: Option<&str>,
        #[case] escape_mode: &str,
    ) {
        let settings = TokenizerSettings {
            delimiter: delimiter.to_string(),
            escape_char: escape_char.map(str::to_string),
            escape_mode: escape_mode.to_string(),
            keep_escape_markers: true,
        };
        assert!(matches!(
            TokenizerConfig::try_from(settings),
            Err(CsvError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_escape_ignored_in_none_mode() {
        let settings = TokenizerSettings {
            delimiter: "\t".to_string(),
            escape_char: Some("not a char".to_string()),
            escape_mode: "none".to_string(),
            keep_escape_markers: false,
        };
        let config = TokenizerConfig::try_from(settings).unwrap();
        assert_eq!(config.escape_char(), None);
        assert_eq!(config.classify('"'), CharacterClass::Other);
        assert_eq!(config.classify('\t'), CharacterClass::Delimiter);
    }

    #[test]
    fn test_multibyte_chars_are_single_chars() {
        let config = TokenizerConfig::try_from(TokenizerSettings::quoted("→", "«")).unwrap();
        assert_eq!(config.delimiter(), '→');
        assert_eq!(config.escape_char(), Some('«'));
    }

    #[test]
    fn test_delimiter_wins_over_escape() {
        let config = TokenizerConfig::new('|').with_escape(EscapeMode::SingleChar, '|');
        assert_eq!(config.classify('|'), CharacterClass::Delimiter);
    }

    #[rstest]
    #[case("none", EscapeMode::None)]
    #[case("char", EscapeMode::SingleChar)]
    #[case("single_char", EscapeMode::SingleChar)]
    #[case("string", EscapeMode::QuotedSpan)]
    #[case("quoted_span", EscapeMode::QuotedSpan)]
    fn test_escape_mode_names(#[case] name: &str, #[case] mode: EscapeMode) {
        assert_eq!(name.parse::<EscapeMode>().unwrap(), mode);
    }
}
