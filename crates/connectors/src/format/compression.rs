use super::{FormatError, FormatWriter};
use flate2::{Compression as GzipLevel, write::GzEncoder};
use model::records::record::Record;
use std::io::Write;

/// Gzip wrapper for text formats; the extension gains a `.gz` suffix.
pub struct GzipWriter {
    inner: Box<dyn FormatWriter>,
    extension: String,
}

impl GzipWriter {
    pub fn new(inner: Box<dyn FormatWriter>) -> Self {
        let extension = format!("{}.gz", inner.extension());
        Self { inner, extension }
    }
}

impl FormatWriter for GzipWriter {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn write_batch(&self, records: &[Record]) -> Result<Vec<u8>, FormatError> {
        let plain = self.inner.write_batch(records)?;
        compress_gzip(&plain)
    }
}

pub fn compress_gzip(data: &[u8]) -> Result<Vec<u8>, FormatError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), GzipLevel::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::jsonl::JsonlWriter;
    use flate2::read::GzDecoder;
    use serde_json::json;
    use std::io::Read;

    #[test]
    fn test_gzip_wraps_inner_output() {
        let writer = GzipWriter::new(Box::new(JsonlWriter));
        assert_eq!(writer.extension(), "jsonl.gz");
        assert_eq!(writer.name(), "jsonl");

        let records = vec![Record::try_from(json!({"a": 1})).unwrap()];
        let bytes = writer.write_batch(&records).unwrap();

        let mut text = String::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "{\"a\":1}\n");
    }
}
