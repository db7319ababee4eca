use crate::Stage;
use std::io;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unterminated quote in token {token}: span opened at offset {offset} is never closed")]
    UnterminatedQuote { token: usize, offset: usize },

    #[error("Failed to split {stage} {record}: {source}")]
    Decompose {
        stage: Stage,
        record: usize,
        #[source]
        source: Box<CsvError>,
    },

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Row with id \"{0}\" already exists")]
    DuplicateKey(String),

    #[error("Row with id \"{0}\" does not exist")]
    MissingRow(String),

    #[error("Error loading row {row}: {source}")]
    Load {
        row: usize,
        #[source]
        source: Box<CsvError>,
    },
}

impl From<io::Error> for CsvError {
    fn from(error: io::Error) -> Self {
        CsvError::Io(error.to_string())
    }
}

impl From<toml::de::Error> for CsvError {
    fn from(error: toml::de::Error) -> Self {
        CsvError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CsvError>;
