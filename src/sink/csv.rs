//! CSV sink (RFC 4180 quoting, `\n` line endings).

use std::io::Write;

use crate::dbase::record::{Row, Value};
use crate::dbase::schema::Schema;
use crate::sink::{write_error, RowSink};
use crate::DbfError;

pub struct CsvSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        CsvSink { writer }
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn begin(&mut self, _table: &str, schema: &Schema) -> Result<(), DbfError> {
        let headers: Vec<String> = schema.column_names().map(escape_text).collect();
        writeln!(self.writer, "{}", headers.join(",")).map_err(write_error)
    }

    fn write_row(&mut self, row: &Row) -> Result<(), DbfError> {
        let values: Vec<String> = row.values.iter().map(csv_escape).collect();
        writeln!(self.writer, "{}", values.join(",")).map_err(write_error)
    }

    fn finish(&mut self) -> Result<(), DbfError> {
        self.writer.flush().map_err(write_error)
    }
}

/// CSV-escape a field value. Absent values are empty fields.
pub fn csv_escape(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int(n) => n.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Text(s) => escape_text(s),
    }
}

fn escape_text(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbase::table::{ConvertOptions, DbfTable};
    use crate::dbase::write::{int_bytes, TableBuilder};
    use crate::sink::transfer;

    #[test]
    fn test_csv_output() {
        let image = TableBuilder::new()
            .field("ID", b'I', 4)
            .field("NOTE", b'C', 12)
            .record(&[int_bytes(1), b"plain".to_vec()])
            .record(&[int_bytes(-2), b"a, \"b\"".to_vec()])
            .record(&[int_bytes(3), vec![0]])
            .build();
        let conversion = DbfTable::from_bytes("t", image)
            .convert(&ConvertOptions::default())
            .unwrap();
        let mut out = Vec::new();
        transfer(conversion, &mut CsvSink::new(&mut out)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ID,NOTE\n1,plain\n-2,\"a, \"\"b\"\"\"\n3,\n"
        );
    }

    #[test]
    fn test_escape_values() {
        assert_eq!(csv_escape(&Value::Null), "");
        assert_eq!(csv_escape(&Value::Double(0.5)), "0.5");
        assert_eq!(csv_escape(&Value::Text("line\nbreak".into())), "\"line\nbreak\"");
        assert_eq!(csv_escape(&Value::Text(String::new())), "");
    }
}
