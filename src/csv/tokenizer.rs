use super::config::{CharacterClass, EscapeMode, TokenizerConfig, TokenizerSettings};
use super::fold::fold_escapes;
use crate::errors::{CsvError, Result};

/// Splits a buffer on a single delimiter character, honouring one escape discipline.
///
/// A tokenizer holds nothing but its configuration, so one instance can be reused for any
/// number of buffers, and shared across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Validate raw settings and build a tokenizer from them
    pub fn from_settings(settings: &TokenizerSettings) -> Result<Self> {
        Ok(Self::new(TokenizerConfig::try_from(settings)?))
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Split `line` into tokens, left to right.
    ///
    /// There is always one more token than there are structural delimiters, so an empty
    /// input yields a single empty token and a trailing delimiter yields a trailing empty
    /// token. Fails with [`CsvError::UnterminatedQuote`] if a quoted span is still open at
    /// the end of the input.
    pub fn tokens(&self, line: &str) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        let mut token_start = 0;
        let mut chars = line.char_indices();

        while let Some((pos, ch)) = chars.next() {
            match self.config.classify(ch) {
                CharacterClass::Delimiter => {
                    tokens.push(self.finish(&line[token_start..pos]));
                    token_start = pos + ch.len_utf8();
                }
                CharacterClass::Escape => match self.config.escape_mode() {
                    EscapeMode::SingleChar => {
                        // Skip the protected character, whatever it is
                        chars.next();
                    }
                    EscapeMode::QuotedSpan => {
                        // The closing marker is consumed here and never reopens the span
                        if !chars.any(|(_, c)| c == ch) {
                            return Err(CsvError::UnterminatedQuote {
                                token: tokens.len(),
                                offset: pos,
                            });
                        }
                    }
                    EscapeMode::None => {}
                },
                CharacterClass::Other => {}
            }
        }
        tokens.push(self.finish(&line[token_start..]));

        tracing::trace!(tokens = tokens.len(), "tokenized {} bytes", line.len());
        Ok(tokens)
    }

    fn finish(&self, raw: &str) -> String {
        match self.config.escape_char() {
            Some(escape_char) if !self.config.keeps_escape_markers() => {
                fold_escapes(raw, escape_char)
            }
            _ => raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn plain() -> Tokenizer {
        Tokenizer::new(TokenizerConfig::new(','))
    }

    fn quoted(keep: bool) -> Tokenizer {
        Tokenizer::new(
            TokenizerConfig::new(',')
                .with_escape(EscapeMode::QuotedSpan, '"')
                .keep_escape_markers(keep),
        )
    }

    fn backslash(keep: bool) -> Tokenizer {
        Tokenizer::new(
            TokenizerConfig::new(',')
                .with_escape(EscapeMode::SingleChar, '\\')
                .keep_escape_markers(keep),
        )
    }

    #[rstest]
    #[case::simple("one,two,three", vec!["one", "two", "three"])]
    #[case::leading_empty(",two,three", vec!["", "two", "three"])]
    #[case::middle_empty("one,,three", vec!["one", "", "three"])]
    #[case::trailing_empty("one,two,", vec!["one", "two", ""])]
    #[case::no_delimiter("one", vec!["one"])]
    #[case::empty_input("", vec![""])]
    #[case::only_delimiters(",,", vec!["", "", ""])]
    fn test_plain_split(#[case] line: &str, #[case] expected: Vec<&str>) {
        assert_eq!(plain().tokens(line).unwrap(), expected);
    }

    #[test]
    fn test_none_mode_ignores_quotes() {
        assert_eq!(plain().tokens("one,\"two,").unwrap(), vec!["one", "\"two", ""]);
    }

    #[test]
    fn test_quoted_span_protects_delimiter() {
        assert_eq!(
            quoted(true).tokens("1,\"Apple Street, Wenatchee, WA\",x").unwrap(),
            vec!["1", "\"Apple Street, Wenatchee, WA\"", "x"]
        );
    }

    #[test]
    fn test_quoted_span_folded() {
        assert_eq!(
            quoted(false).tokens("1,\"a, \"\"b\"\"\",x").unwrap(),
            vec!["1", "a, \"b\"", "x"]
        );
    }

    #[test]
    fn test_doubled_marker_stays_unsplit() {
        assert_eq!(
            quoted(true).tokens("\"a\"\",\"\"b\",c").unwrap(),
            vec!["\"a\"\",\"\"b\"", "c"]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            quoted(true).tokens("one,\"two,").unwrap_err(),
            CsvError::UnterminatedQuote {
                token: 1,
                offset: 4
            }
        );
    }

    #[test]
    fn test_opening_quote_as_last_char_is_unterminated() {
        assert_eq!(
            quoted(true).tokens("abc,\"").unwrap_err(),
            CsvError::UnterminatedQuote {
                token: 1,
                offset: 4
            }
        );
    }

    #[test]
    fn test_closing_quote_as_last_char_is_terminated() {
        assert_eq!(quoted(true).tokens("abc,\"d\"").unwrap(), vec!["abc", "\"d\""]);
    }

    #[test]
    fn test_single_char_escape() {
        assert_eq!(backslash(true).tokens(r"a\,b,c").unwrap(), vec![r"a\,b", "c"]);
        assert_eq!(
            backslash(false).tokens(r"a\,b,c\\,d").unwrap(),
            vec!["a,b", r"c\", "d"]
        );
    }

    #[test]
    fn test_single_char_escape_at_end() {
        assert_eq!(backslash(true).tokens(r"a,b\").unwrap(), vec!["a", r"b\"]);
    }

    #[test]
    fn test_multibyte_delimiter() {
        let tokenizer = Tokenizer::new(TokenizerConfig::new('→'));
        assert_eq!(tokenizer.tokens("α→β→").unwrap(), vec!["α", "β", ""]);
    }

    #[test]
    fn test_reusable_across_calls() {
        let tokenizer = quoted(true);
        assert!(tokenizer.tokens("\"open").is_err());
        assert_eq!(tokenizer.tokens("a,b").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_shared_between_threads() {
        let tokenizer = quoted(false);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let tokenizer = &tokenizer;
                    scope.spawn(move || tokenizer.tokens(&format!("{i},\"x,{i}\"")).unwrap())
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                assert_eq!(handle.join().unwrap(), vec![i.to_string(), format!("x,{i}")]);
            }
        });
    }
}
