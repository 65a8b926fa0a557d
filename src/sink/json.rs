//! JSON lines sink: one object per row, keyed by column name.

use std::io::Write;

use serde_json::{Map, Value as JsonValue};

use crate::dbase::record::Row;
use crate::dbase::schema::Schema;
use crate::sink::{write_error, RowSink};
use crate::DbfError;

pub struct JsonLinesSink<W: Write> {
    writer: W,
    columns: Vec<String>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink {
            writer,
            columns: Vec::new(),
        }
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn begin(&mut self, _table: &str, schema: &Schema) -> Result<(), DbfError> {
        self.columns = schema.column_names().map(str::to_string).collect();
        Ok(())
    }

    fn write_row(&mut self, row: &Row) -> Result<(), DbfError> {
        let mut obj = Map::with_capacity(self.columns.len());
        for (name, value) in self.columns.iter().zip(&row.values) {
            let json = serde_json::to_value(value).map_err(|e| DbfError::Sink(e.to_string()))?;
            obj.insert(name.clone(), json);
        }
        serde_json::to_writer(&mut self.writer, &JsonValue::Object(obj))
            .map_err(|e| DbfError::Sink(e.to_string()))?;
        writeln!(self.writer).map_err(write_error)
    }

    fn finish(&mut self) -> Result<(), DbfError> {
        self.writer.flush().map_err(write_error)
    }
}
