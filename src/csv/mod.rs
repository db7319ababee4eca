//! Split delimited text into tokens, records and fields
//!
//! Everything here is built on one primitive, the [`Tokenizer`], which splits a buffer on a
//! single delimiter character while honouring one escape discipline. A file is decomposed by
//! running one tokenizer over the whole buffer to find records, then a second, independently
//! configured tokenizer over each record to find its fields.
//!
//! Because the record pass understands quoted spans, a quoted field that contains the record
//! delimiter stays inside a single record. This is why files are read whole instead of line
//! by line.

mod config;
mod decompose;
mod fold;
mod tokenizer;

pub use config::{EscapeMode, TokenizerConfig, TokenizerSettings};
pub use decompose::{decompose, RecordDecomposer};
pub use fold::fold_escapes;
pub use tokenizer::Tokenizer;
