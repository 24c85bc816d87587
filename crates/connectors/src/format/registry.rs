use super::{
    FormatError, FormatWriter, compression::GzipWriter, csv::CsvWriter, jsonl::JsonlWriter,
    parquet::ParquetWriter,
};
use engine_config::settings::format::{Compression, FormatSettings};
use std::{collections::HashMap, sync::Arc};
use tracing::info;

pub type FormatFactory = fn(&FormatSettings) -> Box<dyn FormatWriter>;

/// Format writers by `format_type` name.
pub struct FormatRegistry {
    factories: HashMap<&'static str, FormatFactory>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(&["jsonl", "json"], jsonl);
        registry.register(&["parquet", "columnar"], parquet);
        registry.register(&["csv", "delimited"], csv);
        registry
    }
}

fn jsonl(_: &FormatSettings) -> Box<dyn FormatWriter> {
    Box::new(JsonlWriter)
}

fn parquet(settings: &FormatSettings) -> Box<dyn FormatWriter> {
    Box::new(ParquetWriter::new(settings.compression))
}

fn csv(settings: &FormatSettings) -> Box<dyn FormatWriter> {
    // validated config only admits ASCII delimiters
    let delimiter = u8::try_from(settings.delimiter).unwrap_or(b',');
    Box::new(CsvWriter::new(delimiter))
}

impl FormatRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, names: &[&'static str], factory: FormatFactory) {
        for name in names {
            self.factories.insert(*name, factory);
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Builds the writer for `settings.format_type`, gzip-wrapped when asked.
    ///
    /// Columnar output compresses its own pages and is never wrapped.
    pub fn create(&self, settings: &FormatSettings) -> Result<Arc<dyn FormatWriter>, FormatError> {
        let name = settings.format_type.to_ascii_lowercase();
        let factory = self
            .factories
            .get(name.as_str())
            .ok_or_else(|| FormatError::UnknownFormat(settings.format_type.clone()))?;

        let writer = factory(settings);
        let writer: Arc<dyn FormatWriter> = match settings.compression {
            Compression::Gzip if writer.name() != "parquet" => {
                Arc::new(GzipWriter::new(writer))
            }
            _ => Arc::from(writer),
        };

        info!(
            format = writer.name(),
            extension = writer.extension(),
            "Selected output format"
        );
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_config::settings::format::SUPPORTED_FORMATS;

    fn settings(format_type: &str, compression: Compression) -> FormatSettings {
        FormatSettings {
            format_type: format_type.to_string(),
            compression,
            ..FormatSettings::default()
        }
    }

    #[test]
    fn test_aliases_resolve_to_same_writer() {
        let registry = FormatRegistry::default();
        for (alias, name, ext) in [
            ("json", "jsonl", "jsonl"),
            ("JSONL", "jsonl", "jsonl"),
            ("columnar", "parquet", "parquet"),
            ("delimited", "csv", "csv"),
        ] {
            let writer = registry.create(&settings(alias, Compression::None)).unwrap();
            assert_eq!(writer.name(), name);
            assert_eq!(writer.extension(), ext);
        }
    }

    #[test]
    fn test_gzip_applies_to_text_formats_only() {
        let registry = FormatRegistry::default();
        let csv = registry.create(&settings("csv", Compression::Gzip)).unwrap();
        assert_eq!(csv.extension(), "csv.gz");
        let parquet = registry.create(&settings("parquet", Compression::Gzip)).unwrap();
        assert_eq!(parquet.extension(), "parquet");
    }

    #[test]
    fn test_registry_matches_accepted_names() {
        let mut accepted = SUPPORTED_FORMATS.to_vec();
        accepted.sort_unstable();
        assert_eq!(FormatRegistry::default().names(), accepted);
    }

    #[test]
    fn test_unknown_format() {
        let err = FormatRegistry::default()
            .create(&settings("avro", Compression::None))
            .err()
            .unwrap();
        assert!(matches!(err, FormatError::UnknownFormat(name) if name == "avro"));
    }
}
