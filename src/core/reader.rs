//! Lazy row reader for delimiter-separated files.
//!
//! Fields are split on a single byte with no quoting or escaping: a field that
//! contains the delimiter is split in two. The header line is read once when
//! the reader is built and is never yielded as data.

use crate::domain::model::{ColumnSchema, Record, SchemaPolicy};
use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_DELIMITER: u8 = b',';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub on_short_row: SchemaPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            on_short_row: SchemaPolicy::Skip,
        }
    }
}

impl ReaderOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_short_row_policy(mut self, policy: SchemaPolicy) -> Self {
        self.on_short_row = policy;
        self
    }
}

/// Single-use iterator over the data rows of one file.
///
/// The underlying handle is dropped as soon as the rows are exhausted or an
/// error has been yielded; dropping the reader early releases it as well.
pub struct RowReader<R: Read = File> {
    records: Option<csv::StringRecordsIntoIter<R>>,
    schema: Arc<ColumnSchema>,
    on_short_row: SchemaPolicy,
    next_index: usize,
    skipped: usize,
}

impl RowReader<File> {
    pub fn open<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EtlError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Opened {}", path.display());
        Self::from_reader(file, options)
    }
}

impl<R: Read> RowReader<R> {
    pub fn from_reader(reader: R, options: &ReaderOptions) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quoting(false)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let columns = csv_reader
            .headers()?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();

        Ok(Self {
            records: Some(csv_reader.into_records()),
            schema: Arc::new(ColumnSchema::new(columns)),
            on_short_row: options.on_short_row,
            next_index: 0,
            skipped: 0,
        })
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Rows dropped so far under [`SchemaPolicy::Skip`].
    pub fn skipped_rows(&self) -> usize {
        self.skipped
    }

    /// Data rows consumed so far, skipped ones included.
    pub fn rows_read(&self) -> usize {
        self.next_index
    }

    fn finish(&mut self) {
        self.records = None;
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.records.as_mut()?.next();
            let fields = match next {
                Some(Ok(fields)) => fields,
                Some(Err(err)) => {
                    self.finish();
                    return Some(Err(err.into()));
                }
                None => {
                    self.finish();
                    return None;
                }
            };

            let index = self.next_index;
            self.next_index += 1;

            if fields.len() < self.schema.len() {
                match self.on_short_row {
                    SchemaPolicy::Skip => {
                        self.skipped += 1;
                        tracing::debug!(
                            "Skipping row {}: {} of {} fields",
                            index,
                            fields.len(),
                            self.schema.len()
                        );
                        continue;
                    }
                    SchemaPolicy::Fail => {
                        let expected = self.schema.len();
                        self.finish();
                        return Some(Err(EtlError::SchemaMismatch {
                            row: index,
                            expected,
                            found: fields.len(),
                        }));
                    }
                }
            }

            return Some(Ok(Record::new(index, Arc::clone(&self.schema), fields)));
        }
    }
}

impl<R: Read> std::iter::FusedIterator for RowReader<R> {}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES: &str = "StockCode,Description,UnitPrice,Quantity,TotalPrice,Country\n\
        22180,RETROSPOT LAMP,19.96,4,79.84,Russia\n\
        23017,APOTHECARY JAR,24.96,1,24.96,Germany\n\
        84732D,IVORY CLOCK,0.39,2,0.78,India\n";

    fn reader(data: &str, options: ReaderOptions) -> RowReader<&[u8]> {
        RowReader::from_reader(data.as_bytes(), &options).unwrap()
    }

    #[test]
    fn test_header_is_schema_not_data() {
        let rows = reader(SALES, ReaderOptions::default());
        assert_eq!(rows.schema().len(), 6);
        assert_eq!(rows.schema().columns()[5], "Country");

        let records: Vec<Record> = rows.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("StockCode"), Some("22180"));
        assert_eq!(records[2].get("Country"), Some("India"));
        assert_eq!(
            records.iter().map(Record::index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_custom_delimiter_and_no_quoting() {
        let data = "name|note\n\"a\"|x,y\n";
        let mut rows = reader(data, ReaderOptions::default().with_delimiter(b'|'));
        let record = rows.next().unwrap().unwrap();
        // Quotes are kept verbatim and commas are ordinary characters.
        assert_eq!(record.get("name"), Some("\"a\""));
        assert_eq!(record.get("note"), Some("x,y"));
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_short_row_skipped_and_counted() {
        let data = "a,b,c\n1,2,3\n4,5\n6,7,8\n";
        let mut rows = reader(data, ReaderOptions::default());
        let indices: Vec<usize> = rows.by_ref().map(|r| r.unwrap().index()).collect();

        assert_eq!(indices, vec![0, 2]);
        assert_eq!(rows.skipped_rows(), 1);
        assert_eq!(rows.rows_read(), 3);
    }

    #[test]
    fn test_short_row_fails_fast() {
        let data = "a,b,c\n1,2,3\n4,5\n6,7,8\n";
        let mut rows = reader(
            data,
            ReaderOptions::default().with_short_row_policy(SchemaPolicy::Fail),
        );

        assert!(rows.next().unwrap().is_ok());
        match rows.next() {
            Some(Err(EtlError::SchemaMismatch {
                row,
                expected,
                found,
            })) => {
                assert_eq!((row, expected, found), (1, 3, 2));
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
        // Sequence ends after the error.
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let data = "a,b\n1,2,3\n";
        let record = reader(data, ReaderOptions::default()).next().unwrap().unwrap();
        assert_eq!(record.iter().count(), 2);
        assert_eq!(record.get("b"), Some("2"));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let mut rows = reader("", ReaderOptions::default());
        assert!(rows.schema().is_empty());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_crlf_line_endings() {
        let data = "Country,TotalPrice\r\nRussia,79.84\r\n";
        let record = reader(data, ReaderOptions::default()).next().unwrap().unwrap();
        assert_eq!(record.get("TotalPrice"), Some("79.84"));
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let result = RowReader::open("definitely/not/here.csv", &ReaderOptions::default());
        assert!(matches!(result, Err(EtlError::FileAccess { .. })));
    }
}
