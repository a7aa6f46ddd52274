//! Data loading utilities

use crate::error::{KnnError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Rows scanned for schema inference
const INFER_SCHEMA_ROWS: usize = 1000;

/// Delimited-file loader backed by polars
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    /// Field separator (None = infer from extension, default comma)
    delimiter: Option<u8>,
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a field separator
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Load a CSV (or TSV) file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();

        let delimiter = self.delimiter.unwrap_or_else(|| {
            match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
                _ => b',',
            }
        });

        let file = File::open(path)
            .map_err(|e| KnnError::DataError(format!("{}: {}", path.display(), e)))?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| KnnError::DataError(e.to_string()))?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV"
        );

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv() {
        let mut tmp = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(tmp, "a,b").unwrap();
        writeln!(tmp, "1,2.5").unwrap();
        writeln!(tmp, "3,4.5").unwrap();
        tmp.flush().unwrap();

        let df = DataLoader::new().load_csv(tmp.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_load_tsv_by_extension() {
        let mut tmp = tempfile::NamedTempFile::with_suffix(".tsv").unwrap();
        writeln!(tmp, "a\tb\tc").unwrap();
        writeln!(tmp, "1\t2\t3").unwrap();
        tmp.flush().unwrap();

        let df = DataLoader::new().load_csv(tmp.path()).unwrap();
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_explicit_delimiter() {
        let mut tmp = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(tmp, "a;b").unwrap();
        writeln!(tmp, "1;2").unwrap();
        tmp.flush().unwrap();

        let df = DataLoader::new().with_delimiter(b';').load_csv(tmp.path()).unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = DataLoader::new().load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, KnnError::DataError(_)));
    }
}
