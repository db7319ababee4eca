//! Sources of rows for a [`Table`](crate::Table)

use crate::csv::{RecordDecomposer, TokenizerSettings};
use crate::errors::{CsvError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One row handed to a table, either by position or by column name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Positional(Vec<String>),
    Named(HashMap<String, String>),
}

impl Row {
    /// Look up a column value, by `position` for positional rows and by `name` otherwise
    pub fn get(&self, name: &str, position: usize) -> Option<&str> {
        match self {
            Row::Positional(values) => values.get(position).map(String::as_str),
            Row::Named(values) => values.get(name).map(String::as_str),
        }
    }
}

impl From<Vec<String>> for Row {
    fn from(values: Vec<String>) -> Self {
        Row::Positional(values)
    }
}

impl From<HashMap<String, String>> for Row {
    fn from(values: HashMap<String, String>) -> Self {
        Row::Named(values)
    }
}

/// Produces a finite, single-pass sequence of rows
pub trait Loader {
    fn load(&self) -> Result<Box<dyn Iterator<Item = Row> + '_>>;
}

/// Rows that are already in memory
#[derive(Debug, Clone, Default)]
pub struct RowsLoader {
    rows: Vec<Row>,
}

impl RowsLoader {
    pub fn new(rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }
}

impl Loader for RowsLoader {
    fn load(&self) -> Result<Box<dyn Iterator<Item = Row> + '_>> {
        Ok(Box::new(self.rows.iter().cloned()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub has_header: bool,
    pub record: TokenizerSettings,
    pub field: TokenizerSettings,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            has_header: true,
            record: TokenizerSettings::quoted("\n", "\""),
            field: TokenizerSettings::quoted(",", "\""),
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CsvError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Fall back to the defaults when there is no file, or it can't be used
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path.map(Self::load_from_file) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "using default loader config");
                Self::default()
            }
            None => Self::default(),
        }
    }
}

/// Loads positional rows from a delimited text file
#[derive(Debug, Clone)]
pub struct CsvLoader {
    path: PathBuf,
    decomposer: RecordDecomposer,
}

impl CsvLoader {
    /// Both tokenizer settings are validated here, before the file is touched
    pub fn new(path: impl Into<PathBuf>, config: &LoaderConfig) -> Result<Self> {
        Ok(Self {
            path: path.into(),
            decomposer: RecordDecomposer::from_settings(
                &config.record,
                &config.field,
                config.has_header,
            )?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Loader for CsvLoader {
    /// Reads the file whole: a quoted field may contain the record delimiter, so physical
    /// lines are not records.
    fn load(&self) -> Result<Box<dyn Iterator<Item = Row> + '_>> {
        let text = std::fs::read_to_string(&self.path)?;
        tracing::debug!(path = %self.path.display(), bytes = text.len(), "loading csv");
        let rows = self.decomposer.decompose(&text)?;
        Ok(Box::new(rows.into_iter().map(Row::Positional)))
    }
}
