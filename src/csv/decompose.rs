use super::config::TokenizerSettings;
use super::tokenizer::Tokenizer;
use crate::errors::{CsvError, Result};
use crate::Stage;

/// Split a whole file into rows of fields.
///
/// `records` runs once over all of `text`; `fields` then runs over each record. A header
/// record is dropped first when `has_header` is set, then a trailing empty record (left by
/// a final record delimiter) is dropped. Errors carry the raw record index, counting the
/// header as record 0.
pub fn decompose(
    text: &str,
    records: &Tokenizer,
    fields: &Tokenizer,
    has_header: bool,
) -> Result<Vec<Vec<String>>> {
    let mut lines = records.tokens(text).map_err(|e| {
        let record = match &e {
            CsvError::UnterminatedQuote { token, .. } => *token,
            _ => 0,
        };
        CsvError::Decompose {
            stage: Stage::Record,
            record,
            source: Box::new(e),
        }
    })?;

    let skipped = if has_header && !lines.is_empty() {
        lines.remove(0);
        1
    } else {
        0
    };
    let trailing = lines.last().is_some_and(String::is_empty);
    if trailing {
        lines.pop();
    }
    tracing::debug!(
        records = lines.len(),
        has_header,
        trailing,
        "split {} bytes into records",
        text.len()
    );

    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            fields.tokens(line).map_err(|e| CsvError::Decompose {
                stage: Stage::Field,
                record: index + skipped,
                source: Box::new(e),
            })
        })
        .collect()
}

/// A record tokenizer, a field tokenizer and the header flag, bundled for reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordDecomposer {
    records: Tokenizer,
    fields: Tokenizer,
    has_header: bool,
}

impl RecordDecomposer {
    pub fn new(records: Tokenizer, fields: Tokenizer, has_header: bool) -> Self {
        Self {
            records,
            fields,
            has_header,
        }
    }

    /// Validate both settings before anything is split
    pub fn from_settings(
        records: &TokenizerSettings,
        fields: &TokenizerSettings,
        has_header: bool,
    ) -> Result<Self> {
        Ok(Self::new(
            Tokenizer::from_settings(records)?,
            Tokenizer::from_settings(fields)?,
            has_header,
        ))
    }

    pub fn decompose(&self, text: &str) -> Result<Vec<Vec<String>>> {
        decompose(text, &self.records, &self.fields, self.has_header)
    }
}
