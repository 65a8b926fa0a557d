//! Row sinks.
//!
//! A [`RowSink`] receives the destination schema once, then every row in
//! order, then a final [`finish`](RowSink::finish). [`transfer`] drives a
//! [`Conversion`] into a sink one row at a time, so a slow sink slows
//! decoding down instead of rows piling up in memory.
//!
//! | Sink | Output |
//! |------|--------|
//! | [`sql::SqlScriptSink`] | `DROP TABLE` / `CREATE TABLE` and batched `INSERT` statements |
//! | [`csv::CsvSink`] | Header line plus RFC 4180 rows |
//! | [`json::JsonLinesSink`] | One JSON object per row |

pub mod csv;
pub mod json;
pub mod sql;

use std::io::Write;

use serde::Serialize;

use crate::dbase::record::Row;
use crate::dbase::schema::Schema;
use crate::dbase::table::{Conversion, RowStats, Rows};
use crate::DbfError;

/// Destination for decoded rows.
pub trait RowSink {
    /// Called once before any row.
    fn begin(&mut self, table: &str, schema: &Schema) -> Result<(), DbfError>;

    /// Called once per row, in record order.
    fn write_row(&mut self, row: &Row) -> Result<(), DbfError>;

    /// Called after the last row. Flushes buffered output.
    fn finish(&mut self) -> Result<(), DbfError>;
}

/// Output format of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    Sql,
    Csv,
    Json,
}

impl SinkFormat {
    /// Parse a format name (`sql`, `csv`, `json`), case-insensitive.
    pub fn parse(s: &str) -> Result<Self, DbfError> {
        match s.to_lowercase().as_str() {
            "sql" => Ok(SinkFormat::Sql),
            "csv" => Ok(SinkFormat::Csv),
            "json" | "jsonl" | "ndjson" => Ok(SinkFormat::Json),
            _ => Err(DbfError::Argument(format!(
                "Unknown format '{}'. Use sql, csv, or json.",
                s
            ))),
        }
    }

    /// File extension for output files.
    pub fn extension(&self) -> &'static str {
        match self {
            SinkFormat::Sql => "sql",
            SinkFormat::Csv => "csv",
            SinkFormat::Json => "jsonl",
        }
    }

    /// Create a sink of this format writing to `writer`.
    ///
    /// `batch_size` only applies to the SQL sink.
    pub fn create<'a, W: Write + 'a>(
        &self,
        writer: W,
        batch_size: usize,
    ) -> Box<dyn RowSink + 'a> {
        match self {
            SinkFormat::Sql => Box::new(sql::SqlScriptSink::new(writer).batch_size(batch_size)),
            SinkFormat::Csv => Box::new(csv::CsvSink::new(writer)),
            SinkFormat::Json => Box::new(json::JsonLinesSink::new(writer)),
        }
    }
}

/// Deliver every row of a conversion to a sink.
///
/// # Examples
///
/// ```
/// use dbf::dbase::table::{DbfTable, ConvertOptions};
/// use dbf::dbase::write::{TableBuilder, int_bytes};
/// use dbf::sink::{transfer, csv::CsvSink};
///
/// let image = TableBuilder::new()
///     .field("ID", b'I', 4)
///     .record(&[int_bytes(7)])
///     .build();
/// let conversion = DbfTable::from_bytes("t", image)
///     .convert(&ConvertOptions::default())
///     .unwrap();
///
/// let mut out = Vec::new();
/// let stats = transfer(conversion, &mut CsvSink::new(&mut out)).unwrap();
/// assert_eq!(stats.rows, 1);
/// assert_eq!(String::from_utf8(out).unwrap(), "ID\n7\n");
/// ```
pub fn transfer(conversion: Conversion, sink: &mut dyn RowSink) -> Result<RowStats, DbfError> {
    transfer_until(conversion, sink, |_| false)
}

/// Like [`transfer`], checking `stop` before each row.
///
/// `stop` receives the counters so far. When it returns true the sink is
/// not finished and [`DbfError::Cancelled`] is returned.
pub fn transfer_until(
    conversion: Conversion,
    sink: &mut dyn RowSink,
    stop: impl FnMut(&RowStats) -> bool,
) -> Result<RowStats, DbfError> {
    let Conversion {
        table_name,
        schema,
        mut rows,
        ..
    } = conversion;

    transfer_rows(&table_name, &schema, &mut rows, sink, stop)?;
    Ok(rows.stats())
}

/// Drive `rows` into `sink`, checking `stop` before each row.
///
/// The caller keeps `rows`, so [`Rows::stats`] still reports every deleted
/// and skipped record after a failure.
pub fn transfer_rows(
    table_name: &str,
    schema: &Schema,
    rows: &mut Rows,
    sink: &mut dyn RowSink,
    mut stop: impl FnMut(&RowStats) -> bool,
) -> Result<(), DbfError> {
    sink.begin(table_name, schema)?;
    loop {
        if stop(&rows.stats()) {
            return Err(DbfError::Cancelled {
                rows: rows.stats().rows,
            });
        }
        match rows.next() {
            Some(row) => sink.write_row(&row?)?,
            None => break,
        }
    }
    sink.finish()
}

/// Map a write failure to a sink error.
pub(crate) fn write_error(e: std::io::Error) -> DbfError {
    DbfError::Sink(format!("write failed: {}", e))
}
