use super::{FormatError, FormatWriter, columns, ensure_encodable};
use model::{core::value::Value, records::record::Record};

/// Header row plus one row per record.
///
/// Records do not have to share a shape: columns missing from a record, and
/// null values, are written as empty cells.
#[derive(Debug, Clone, Copy)]
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl FormatWriter for CsvWriter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extension(&self) -> &str {
        "csv"
    }

    fn write_batch(&self, records: &[Record]) -> Result<Vec<u8>, FormatError> {
        ensure_encodable(records)?;
        let header = columns(records);

        let mut writer = ::csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());
        writer.write_record(&header)?;

        for record in records {
            let mut row = Vec::with_capacity(header.len());
            for column in &header {
                row.push(cell(record.get(column))?);
            }
            writer.write_record(&row)?;
        }

        writer
            .into_inner()
            .map_err(|e| FormatError::Io(e.into_error()))
    }
}

fn cell(value: Option<&Value>) -> Result<String, FormatError> {
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Boolean(b)) => b.to_string(),
        Some(Value::Int(i)) => i.to_string(),
        Some(Value::Float(f)) => f.to_string(),
        Some(nested) => serde_json::to_string(nested)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| Record::try_from(v).unwrap())
            .collect()
    }

    #[test]
    fn test_null_fill_for_late_columns() {
        let batch = records(vec![
            json!({"id": 1, "name": "a"}),
            json!({"id": 2, "name": null}),
            json!({"id": 3, "email": "c@x.io", "name": "c"}),
        ]);

        let text = String::from_utf8(CsvWriter::default().write_batch(&batch).unwrap()).unwrap();
        assert_eq!(text, "id,name,email\n1,a,\n2,,\n3,c,c@x.io\n");
    }

    #[test]
    fn test_custom_delimiter_and_nested_values() {
        let batch = records(vec![json!({"id": 1, "tags": ["a", "b"], "ok": true, "v": 1.5})]);

        let text = String::from_utf8(CsvWriter::new(b'|').write_batch(&batch).unwrap()).unwrap();
        assert_eq!(text, "id|tags|ok|v\n1|\"[\"\"a\"\",\"\"b\"\"]\"|true|1.5\n");
    }
}
