//! SQL script sink.
//!
//! Writes a script that recreates the table and loads it:
//!
//! ```text
//! DROP TABLE [customers];
//! CREATE TABLE [customers] ([ID] int NULL, [NAME] varchar(30) NULL);
//! INSERT INTO [customers] ([ID], [NAME]) VALUES
//! (1, 'Ada'),
//! (2, NULL);
//! ```
//!
//! Rows are grouped into multi-row `INSERT` statements of at most
//! `batch_size` rows.

use std::io::Write;

use crate::dbase::record::{Row, Value};
use crate::dbase::schema::Schema;
use crate::sink::{write_error, RowSink};
use crate::DbfError;

/// Largest row count SQL Server accepts in one `VALUES` list.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

pub struct SqlScriptSink<W: Write> {
    writer: W,
    batch_size: usize,
    drop_existing: bool,
    insert_prefix: String,
    pending: Vec<String>,
}

impl<W: Write> SqlScriptSink<W> {
    pub fn new(writer: W) -> Self {
        SqlScriptSink {
            writer,
            batch_size: DEFAULT_BATCH_SIZE,
            drop_existing: true,
            insert_prefix: String::new(),
            pending: Vec::new(),
        }
    }

    /// Rows per `INSERT` statement. Zero is treated as one.
    pub fn batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows.max(1);
        self
    }

    /// Emit `DROP TABLE` before `CREATE TABLE` (default true).
    pub fn drop_existing(mut self, drop: bool) -> Self {
        self.drop_existing = drop;
        self
    }

    fn flush_batch(&mut self) -> Result<(), DbfError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        writeln!(
            self.writer,
            "{}\n{};",
            self.insert_prefix,
            self.pending.join(",\n")
        )
        .map_err(write_error)?;
        self.pending.clear();
        Ok(())
    }
}

impl<W: Write> RowSink for SqlScriptSink<W> {
    fn begin(&mut self, table: &str, schema: &Schema) -> Result<(), DbfError> {
        let table = quote_identifier(table);
        if self.drop_existing {
            writeln!(self.writer, "{};", schema.drop_table_ddl(&table)).map_err(write_error)?;
        }
        writeln!(self.writer, "{};", schema.create_table_ddl(&table)).map_err(write_error)?;

        let columns: Vec<String> = schema.column_names().map(quote_identifier).collect();
        self.insert_prefix = format!("INSERT INTO {} ({}) VALUES", table, columns.join(", "));
        Ok(())
    }

    fn write_row(&mut self, row: &Row) -> Result<(), DbfError> {
        let values: Vec<String> = row.values.iter().map(sql_literal).collect();
        self.pending.push(format!("({})", values.join(", ")));
        if self.pending.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DbfError> {
        self.flush_batch()?;
        self.writer.flush().map_err(write_error)
    }
}

/// Bracket-quote an identifier, doubling any `]`.
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Render a value as a SQL literal.
///
/// Non-finite doubles have no literal form and are written as `NULL`.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Int(n) => n.to_string(),
        Value::Double(d) if d.is_finite() => format!("{:?}", d),
        Value::Double(_) => "NULL".to_string(),
    }
}
