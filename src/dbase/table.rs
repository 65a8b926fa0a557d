//! Table conversion pipeline.
//!
//! [`DbfTable`] is the entry point: open a file (buffered or memory-mapped)
//! or wrap an in-memory image, then call [`DbfTable::convert`]. Conversion
//! reads and validates the header, reads the descriptor array, derives the
//! [`Schema`], and hands back a lazy [`Rows`] iterator that owns the reader.
//! Nothing past the header area is read until rows are pulled.

use std::path::Path;

use serde::Serialize;

use crate::dbase::cursor::ByteCursor;
use crate::dbase::field::{read_field_descriptors, FieldDescriptor};
use crate::dbase::header::TableHeader;
use crate::dbase::record::{DeletionFlagPolicy, RecordDecoder, RecordOutcome, Row};
use crate::dbase::schema::Schema;
use crate::DbfError;

/// What the row iterator does after a per-record error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RecordErrorPolicy {
    /// Yield the error, then end the sequence.
    #[default]
    Abort,
    /// Count the record as skipped and continue at the next record.
    Skip,
}

/// Library-level conversion settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub on_record_error: RecordErrorPolicy,
    pub deletion_flags: DeletionFlagPolicy,
}

/// Counters kept by [`Rows`] while it is iterated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowStats {
    /// Rows yielded.
    pub rows: u64,
    /// Records flagged deleted.
    pub deleted: u64,
    /// Records dropped under [`RecordErrorPolicy::Skip`].
    pub skipped: u64,
}

/// An opened `.dbf` source that has not been decoded yet.
pub struct DbfTable {
    name: String,
    cursor: ByteCursor,
}

impl DbfTable {
    /// Open a file for buffered reading. The table name is the file stem.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbfError> {
        let path = path.as_ref();
        Ok(DbfTable {
            name: table_name_from_path(path),
            cursor: ByteCursor::open(path)?,
        })
    }

    /// Open a file using memory-mapped I/O.
    #[cfg(feature = "cli")]
    pub fn open_mmap<P: AsRef<Path>>(path: P) -> Result<Self, DbfError> {
        let path = path.as_ref();
        Ok(DbfTable {
            name: table_name_from_path(path),
            cursor: ByteCursor::open_mmap(path)?,
        })
    }

    /// Wrap an in-memory image under the given table name.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        DbfTable {
            name: name.into(),
            cursor: ByteCursor::from_bytes(data),
        }
    }

    /// Destination table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decode the header area and prepare the row iterator.
    ///
    /// Header, descriptor and schema errors are returned here, before any
    /// record is read.
    pub fn convert(mut self, options: &ConvertOptions) -> Result<Conversion, DbfError> {
        let header = TableHeader::read(&mut self.cursor)?;
        header.validate(self.cursor.len())?;

        let fields = read_field_descriptors(&mut self.cursor)?;
        if self.cursor.position() > header.header_length as u64 {
            return Err(DbfError::InconsistentHeader(format!(
                "field descriptors end at offset {}, past the {}-byte header length",
                self.cursor.position(),
                header.header_length
            )));
        }
        let schema = Schema::from_fields(&fields)?;
        let decoder = RecordDecoder::new(&header, &fields, options.deletion_flags)?;
        self.cursor.seek(header.header_length as u64)?;

        log::debug!(
            "Table '{}': {} columns, {} records",
            self.name,
            schema.len(),
            header.record_count
        );

        Ok(Conversion {
            table_name: self.name,
            header,
            fields,
            schema,
            rows: Rows {
                cursor: self.cursor,
                decoder,
                policy: options.on_record_error,
                stats: RowStats::default(),
                finished: false,
            },
        })
    }
}

/// Everything decoded from the header area plus the pending rows.
pub struct Conversion {
    pub table_name: String,
    pub header: TableHeader,
    pub fields: Vec<FieldDescriptor>,
    pub schema: Schema,
    pub rows: Rows,
}

/// Lazy, single-pass row sequence.
///
/// Deleted records never appear. The source is released when the iterator
/// is dropped.
pub struct Rows {
    cursor: ByteCursor,
    decoder: RecordDecoder,
    policy: RecordErrorPolicy,
    stats: RowStats,
    finished: bool,
}

impl Rows {
    /// Counters so far.
    pub fn stats(&self) -> RowStats {
        self.stats
    }

    /// Index of the next record to be read.
    pub fn next_record_index(&self) -> u32 {
        self.decoder.next_index()
    }
}

impl Iterator for Rows {
    type Item = Result<Row, DbfError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.decoder.next_record(&mut self.cursor) {
                Ok(RecordOutcome::Row(row)) => {
                    self.stats.rows += 1;
                    return Some(Ok(row));
                }
                Ok(RecordOutcome::Skipped(_)) => self.stats.deleted += 1,
                Ok(RecordOutcome::End) => self.finished = true,
                Err(e) if e.is_record_error() && self.policy == RecordErrorPolicy::Skip => {
                    log::warn!("Skipping record: {}", e);
                    self.stats.skipped += 1;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Rows {}

/// Destination table name for a source path: the file stem, unsanitized.
pub fn table_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbase::record::Value;
    use crate::dbase::write::{int_bytes, TableBuilder};

    fn three_records() -> TableBuilder {
        TableBuilder::new()
            .field("ID", b'I', 4)
            .field("NAME", b'C', 8)
            .record(&[int_bytes(1), b"one".to_vec()])
            .deleted_record(&[int_bytes(2), b"two".to_vec()])
            .record(&[int_bytes(3), b"three".to_vec()])
    }

    #[test]
    fn test_convert_yields_live_rows() {
        let conversion = DbfTable::from_bytes("t", three_records().build())
            .convert(&ConvertOptions::default())
            .unwrap();
        assert_eq!(conversion.table_name, "t");
        assert_eq!(conversion.fields.len(), 2);
        let mut rows = conversion.rows;
        let collected: Vec<Row> = rows.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].values[0], Value::Int(1));
        assert_eq!(collected[1].index, 2);
        assert_eq!(
            rows.stats(),
            RowStats {
                rows: 2,
                deleted: 1,
                skipped: 0
            }
        );
    }

    #[test]
    fn test_zero_records() {
        let image = TableBuilder::new().field("ID", b'I', 4).build();
        let conversion = DbfTable::from_bytes("empty", image)
            .convert(&ConvertOptions::default())
            .unwrap();
        assert_eq!(conversion.schema.len(), 1);
        assert_eq!(conversion.rows.count(), 0);
    }

    #[test]
    fn test_record_count_past_end_of_file() {
        let image = three_records().record_count(10).build();
        let result = DbfTable::from_bytes("t", image).convert(&ConvertOptions::default());
        assert!(matches!(result, Err(DbfError::InconsistentHeader(_))));
    }

    #[test]
    fn test_duplicate_column_fails_before_rows() {
        let image = TableBuilder::new()
            .field("ID", b'I', 4)
            .field("ID", b'I', 4)
            .build();
        assert!(matches!(
            DbfTable::from_bytes("t", image).convert(&ConvertOptions::default()),
            Err(DbfError::DuplicateColumnName(_))
        ));
    }

    fn with_corrupt_middle() -> Vec<u8> {
        TableBuilder::new()
            .field("ID", b'I', 4)
            .record(&[int_bytes(1)])
            .raw_record(b'?', int_bytes(2))
            .record(&[int_bytes(3)])
            .build()
    }

    #[test]
    fn test_abort_policy_fuses_after_error() {
        let conversion = DbfTable::from_bytes("t", with_corrupt_middle())
            .convert(&ConvertOptions::default())
            .unwrap();
        let results: Vec<_> = conversion.rows.collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(e) => assert_eq!(e.record_index(), Some(1)),
            Ok(row) => panic!("expected error, got {:?}", row),
        }
    }

    #[test]
    fn test_skip_policy_continues() {
        let options = ConvertOptions {
            on_record_error: RecordErrorPolicy::Skip,
            ..ConvertOptions::default()
        };
        let mut rows = DbfTable::from_bytes("t", with_corrupt_middle())
            .convert(&options)
            .unwrap()
            .rows;
        let ids: Vec<Value> = rows.by_ref().map(|r| r.unwrap().values[0].clone()).collect();
        assert_eq!(ids, vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(rows.stats().skipped, 1);
    }

    #[test]
    fn test_table_name_is_file_stem() {
        assert_eq!(
            table_name_from_path(Path::new("/data/Customer Orders.DBF")),
            "Customer Orders"
        );
        assert_eq!(table_name_from_path(Path::new("plain")), "plain");
    }
}
