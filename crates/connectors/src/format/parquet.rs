use super::{FormatError, FormatWriter, columns, ensure_encodable};
use arrow_array::{
    ArrayRef, RecordBatch,
    builder::{BooleanBuilder, Float64Builder, Int64Builder, StringBuilder},
};
use arrow_schema::{DataType, Field, Schema};
use engine_config::settings::format::Compression as OutputCompression;
use model::{core::value::Value, records::record::Record};
use parquet::{
    arrow::ArrowWriter,
    basic::{Compression, GzipLevel},
    file::properties::WriterProperties,
};
use std::sync::Arc;

/// Self-describing columnar output. Column types are inferred per batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetWriter {
    compression: OutputCompression,
}

impl ParquetWriter {
    pub fn new(compression: OutputCompression) -> Self {
        Self { compression }
    }

    fn properties(&self) -> WriterProperties {
        let codec = match self.compression {
            OutputCompression::None => Compression::SNAPPY,
            OutputCompression::Gzip => Compression::GZIP(GzipLevel::default()),
        };
        WriterProperties::builder().set_compression(codec).build()
    }
}

impl FormatWriter for ParquetWriter {
    fn name(&self) -> &'static str {
        "parquet"
    }

    fn extension(&self) -> &str {
        "parquet"
    }

    fn write_batch(&self, records: &[Record]) -> Result<Vec<u8>, FormatError> {
        if records.is_empty() {
            return Err(FormatError::EmptyBatch(self.name()));
        }
        ensure_encodable(records)?;

        let names = columns(records);
        let mut fields = Vec::with_capacity(names.len());
        let mut arrays = Vec::with_capacity(names.len());
        for name in names {
            let data_type = infer_type(records, name);
            arrays.push(build_array(records, name, &data_type)?);
            fields.push(Field::new(name, data_type, true));
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays)?;

        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, schema, Some(self.properties()))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(buffer)
    }
}

/// Narrowest type that holds every non-null value of a column.
fn infer_type(records: &[Record], column: &str) -> DataType {
    let mut inferred: Option<DataType> = None;

    for value in records.iter().filter_map(|r| r.get(column)) {
        let current = match value {
            Value::Null => continue,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int(_) => DataType::Int64,
            Value::Float(_) => DataType::Float64,
            _ => DataType::Utf8,
        };
        inferred = Some(match inferred {
            None => current,
            Some(prev) if prev == current => prev,
            Some(DataType::Int64) if current == DataType::Float64 => DataType::Float64,
            Some(DataType::Float64) if current == DataType::Int64 => DataType::Float64,
            Some(_) => return DataType::Utf8,
        });
    }

    inferred.unwrap_or(DataType::Utf8)
}

fn build_array(
    records: &[Record],
    column: &str,
    data_type: &DataType,
) -> Result<ArrayRef, FormatError> {
    let values = records.iter().map(|r| r.get(column));

    let array: ArrayRef = match data_type {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(records.len());
            for value in values {
                match value {
                    Some(Value::Boolean(b)) => builder.append_value(*b),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(records.len());
            for value in values {
                match value {
                    Some(Value::Int(i)) => builder.append_value(*i),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(records.len());
            for value in values {
                match value {
                    Some(Value::Float(f)) => builder.append_value(*f),
                    Some(Value::Int(i)) => builder.append_value(*i as f64),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        _ => {
            let mut builder = StringBuilder::new();
            for value in values {
                match value {
                    None | Some(Value::Null) => builder.append_null(),
                    Some(Value::String(s)) => builder.append_value(s),
                    Some(other) => builder.append_value(serde_json::to_string(other)?),
                }
            }
            Arc::new(builder.finish())
        }
    };

    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
    use bytes::Bytes;
    use ::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| Record::try_from(v).unwrap())
            .collect()
    }

    #[test]
    fn test_infer_type() {
        let batch = records(vec![
            json!({"i": 1, "f": 1, "b": true, "s": "x", "mixed": 1, "n": null}),
            json!({"i": 2, "f": 2.5, "b": null, "s": "y", "mixed": "one"}),
        ]);
        assert_eq!(infer_type(&batch, "i"), DataType::Int64);
        assert_eq!(infer_type(&batch, "f"), DataType::Float64);
        assert_eq!(infer_type(&batch, "b"), DataType::Boolean);
        assert_eq!(infer_type(&batch, "s"), DataType::Utf8);
        assert_eq!(infer_type(&batch, "mixed"), DataType::Utf8);
        assert_eq!(infer_type(&batch, "n"), DataType::Utf8);
    }

    #[test]
    fn test_round_trip_through_arrow_reader() {
        let batch = records(vec![
            json!({"id": 1, "score": 0.5, "active": true, "name": "a", "meta": {"k": 1}}),
            json!({"id": 2, "score": 2, "active": false, "name": null}),
        ]);

        for compression in [OutputCompression::None, OutputCompression::Gzip] {
            let bytes = ParquetWriter::new(compression).write_batch(&batch).unwrap();
            let mut reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))
                .unwrap()
                .build()
                .unwrap();
            let read = reader.next().unwrap().unwrap();
            assert_eq!(read.num_rows(), 2);

            let schema = read.schema();
            let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
            assert_eq!(names, vec!["id", "score", "active", "name", "meta"]);

            let ids = read.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
            assert_eq!((ids.value(0), ids.value(1)), (1, 2));
            let scores = read.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
            assert_eq!(scores.value(1), 2.0);
            let active = read.column(2).as_any().downcast_ref::<BooleanArray>().unwrap();
            assert!(active.value(0));
            let names = read.column(3).as_any().downcast_ref::<StringArray>().unwrap();
            assert!(names.is_null(1));
            let meta = read.column(4).as_any().downcast_ref::<StringArray>().unwrap();
            assert_eq!(meta.value(0), r#"{"k":1}"#);
            assert!(meta.is_null(1));
        }
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        assert!(matches!(
            ParquetWriter::default().write_batch(&[]),
            Err(FormatError::EmptyBatch("parquet"))
        ));
    }
}
