pub mod csv;
mod errors;
pub mod loader;
pub mod table;

use std::fmt;

pub use csv::{
    decompose, fold_escapes, EscapeMode, RecordDecomposer, Tokenizer, TokenizerConfig,
    TokenizerSettings,
};
pub use errors::{CsvError, Result};
pub use loader::{CsvLoader, Loader, LoaderConfig, Row, RowsLoader};
pub use table::{ColumnSpec, Record, Table, TableBuilder};

/// Which tokenizer of a two-level decomposition produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Record,
    Field,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Record => f.write_str("record"),
            Stage::Field => f.write_str("fields of record"),
        }
    }
}
