//! Serialization of sealed batches into artifact bytes.
//!
//! A [`FormatWriter`] turns a slice of sanitized records into the complete
//! content of one artifact. Writers are stateless and shared by every
//! stream; the [`registry::FormatRegistry`] picks one by name at startup.

use model::records::record::Record;
use thiserror::Error;

pub mod compression;
pub mod csv;
pub mod jsonl;
pub mod key;
pub mod parquet;
pub mod registry;

#[derive(Debug, Error)]
pub enum FormatError {
    /// A record still carries text that was never sanitized.
    #[error("Record {index} field '{field}' contains text that is not valid Unicode")]
    Encoding { index: usize, field: String },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Delimited serialization failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Parquet write failed: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("Arrow conversion failed: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("I/O error while encoding: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown format type: {0}")]
    UnknownFormat(String),

    #[error("Cannot write an empty batch as {0}")]
    EmptyBatch(&'static str),
}

/// Serializes a batch of records to the bytes of a single artifact.
pub trait FormatWriter: Send + Sync {
    /// Canonical format name (`jsonl`, `parquet`, `csv`).
    fn name(&self) -> &'static str;

    /// File extension without the leading dot, compression suffix included.
    fn extension(&self) -> &str;

    fn write_batch(&self, records: &[Record]) -> Result<Vec<u8>, FormatError>;
}

/// Fails with [`FormatError::Encoding`] on the first unsanitized field.
pub fn ensure_encodable(records: &[Record]) -> Result<(), FormatError> {
    for (index, record) in records.iter().enumerate() {
        if let Some((field, _)) = record
            .fields()
            .iter()
            .find(|(_, value)| value.has_unchecked_text())
        {
            return Err(FormatError::Encoding {
                index,
                field: field.clone(),
            });
        }
    }
    Ok(())
}

/// Column names of a batch: the first record's keys, then keys first seen in
/// later records, in order of appearance.
pub fn columns(records: &[Record]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.contains(&key) {
                columns.push(key);
            }
        }
    }
    columns
}
