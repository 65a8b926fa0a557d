//! dBASE Level 7 table conversion toolkit.
//!
//! The `dbf-sql` crate (library name `dbf`) decodes `.dbf` table files into a
//! typed column schema and a lazily decoded row stream, and ships sinks that
//! turn those rows into SQL scripts, CSV or JSON lines.
//!
//! # CLI Reference
//!
//! Install the `dbfsql` binary and use its subcommands:
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`dbfsql convert`](cli::app::Commands::Convert) | Convert one or more `.dbf` files (wildcards allowed) with bounded concurrency |
//! | [`dbfsql info`](cli::app::Commands::Info) | Show the table header and field descriptors |
//! | [`dbfsql schema`](cli::app::Commands::Schema) | Show the derived column schema and `CREATE TABLE` DDL |
//! | [`dbfsql export`](cli::app::Commands::Export) | Stream the rows of one table as SQL, CSV or JSON lines |
//! | [`dbfsql dump`](cli::app::Commands::Dump) | Hex dump of the header or a single record |
//!
//! # Library API
//!
//! ```no_run
//! use dbf::dbase::table::{DbfTable, ConvertOptions};
//!
//! let table = DbfTable::open("customers.dbf").unwrap();
//! let conversion = table.convert(&ConvertOptions::default()).unwrap();
//! println!("{}", conversion.schema.create_table_ddl(&conversion.table_name));
//! for row in conversion.rows {
//!     let row = row.unwrap();
//!     println!("{:?}", row.values);
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`dbase::cursor`] | Position-tracking reader with peek, seek and bounded reads |
//! | [`dbase::header`] | 68-byte table header |
//! | [`dbase::field`] | 48-byte field descriptors and the terminator convention |
//! | [`dbase::numeric`] | Sign-bit-flagged integer and double codec |
//! | [`dbase::field_types`] | Type code table shared by schema and record decoding |
//! | [`dbase::record`] | Record state machine and field value decoding |
//! | [`dbase::schema`] | Destination schema and DDL |
//! | [`dbase::table`] | Conversion pipeline (open, validate, lazy rows) |
//! | [`sink`] | Row sinks (SQL script, CSV, JSON lines) and the row transfer loop |

#[cfg(feature = "cli")]
pub mod cli;
pub mod dbase;
pub mod sink;
pub mod util;

use thiserror::Error;

/// Errors returned by `dbf` operations.
#[derive(Error, Debug)]
pub enum DbfError {
    /// An I/O error occurred (file open, read, seek, or write failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// Fewer bytes than a full table header remain in the source.
    #[error("Truncated header: need {needed} bytes, {available} available")]
    TruncatedHeader { needed: usize, available: u64 },

    /// The source ended before the field descriptor terminator was found.
    #[error("Truncated field descriptor array at offset {offset}")]
    TruncatedFieldArray { offset: u64 },

    /// Header lengths are zero or disagree with the file size.
    #[error("Inconsistent header: {0}")]
    InconsistentHeader(String),

    /// A record starts with a byte that is neither the live nor the deleted marker.
    #[error("Corrupt record flag 0x{flag:02x} at record {record}")]
    CorruptRecordFlag { record: u32, flag: u8 },

    /// A sign-bit-flagged number buffer has the wrong width.
    #[error("Invalid numeric width: expected {expected} bytes, got {actual}")]
    InvalidNumericWidth { expected: usize, actual: usize },

    /// Two field descriptors normalize to the same column name.
    #[error("Duplicate column name '{0}'")]
    DuplicateColumnName(String),

    /// A field descriptor name is empty after normalization.
    #[error("Invalid column name at field {0}")]
    InvalidColumnName(usize),

    /// A field could not be decoded; the whole record is rejected.
    #[error("Record {record}, field '{field}': {source}")]
    FieldDecode {
        record: u32,
        field: String,
        #[source]
        source: Box<DbfError>,
    },

    /// A sink rejected the schema or a row.
    #[error("Sink error: {0}")]
    Sink(String),

    /// An invalid argument was supplied (bad pattern, unknown format, etc.).
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The conversion was stopped before all rows were delivered.
    #[error("Conversion cancelled after {rows} rows")]
    Cancelled { rows: u64 },

    /// One or more files of a multi-file conversion failed.
    #[error("{failed} of {total} files failed to convert")]
    ConversionFailed { failed: usize, total: usize },
}

impl DbfError {
    /// Stable, machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DbfError::Io(_) => "Io",
            DbfError::TruncatedHeader { .. } => "TruncatedHeader",
            DbfError::TruncatedFieldArray { .. } => "TruncatedFieldArray",
            DbfError::InconsistentHeader(_) => "InconsistentHeader",
            DbfError::CorruptRecordFlag { .. } => "CorruptRecordFlag",
            DbfError::InvalidNumericWidth { .. } => "InvalidNumericWidth",
            DbfError::DuplicateColumnName(_) => "DuplicateColumnName",
            DbfError::InvalidColumnName(_) => "InvalidColumnName",
            DbfError::FieldDecode { .. } => "FieldDecodeError",
            DbfError::Sink(_) => "Sink",
            DbfError::Argument(_) => "Argument",
            DbfError::Cancelled { .. } => "Cancelled",
            DbfError::ConversionFailed { .. } => "ConversionFailed",
        }
    }

    /// Zero-based record index the error refers to, if it is a per-record failure.
    pub fn record_index(&self) -> Option<u32> {
        match self {
            DbfError::CorruptRecordFlag { record, .. } | DbfError::FieldDecode { record, .. } => {
                Some(*record)
            }
            _ => None,
        }
    }

    /// Returns true for failures that affect a single record only.
    pub fn is_record_error(&self) -> bool {
        self.record_index().is_some()
    }
}
