use super::{FormatError, FormatWriter, ensure_encodable};
use model::records::record::Record;

/// One JSON object per line, keys in insertion order.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonlWriter;

impl FormatWriter for JsonlWriter {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn extension(&self) -> &str {
        "jsonl"
    }

    fn write_batch(&self, records: &[Record]) -> Result<Vec<u8>, FormatError> {
        ensure_encodable(records)?;

        let mut out = Vec::with_capacity(records.iter().map(Record::size_bytes).sum());
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}
