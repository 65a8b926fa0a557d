//! Synthetic table image builder.
//!
//! [`TableBuilder`] assembles a complete `.dbf` byte image (header,
//! descriptors, terminator, records, end-of-file marker) from a list of
//! fields and records. It is used by unit tests, integration tests and the
//! benchmarks, and is handy for producing small fixtures by hand.

use crate::dbase::constants::*;
use crate::dbase::field::FieldDescriptor;
use crate::dbase::header::TableHeader;
use crate::dbase::numeric::{encode_f64, encode_i32};

/// Builder for an in-memory `.dbf` image.
///
/// # Examples
///
/// ```
/// use dbf::dbase::write::{TableBuilder, int_bytes};
/// use dbf::dbase::table::{DbfTable, ConvertOptions};
///
/// let image = TableBuilder::new()
///     .field("ID", b'I', 4)
///     .field("NAME", b'C', 10)
///     .record(&[int_bytes(1), b"Ada".to_vec()])
///     .build();
///
/// let conversion = DbfTable::from_bytes("people", image)
///     .convert(&ConvertOptions::default())
///     .unwrap();
/// assert_eq!(conversion.schema.columns.len(), 2);
/// assert_eq!(conversion.rows.count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    fields: Vec<FieldDescriptor>,
    records: Vec<(u8, Vec<u8>)>,
    version: u8,
    update: (u8, u8, u8),
    language_driver: u8,
    language_name: String,
    record_count: Option<u32>,
    record_length: Option<u16>,
    end_marker: bool,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        TableBuilder {
            fields: Vec::new(),
            records: Vec::new(),
            version: 0x04,
            update: (124, 1, 31),
            language_driver: 0,
            language_name: String::new(),
            record_count: None,
            record_length: None,
            end_marker: true,
        }
    }

    /// Append a field descriptor.
    pub fn field(self, name: &str, type_code: u8, length: u8) -> Self {
        self.field_with_decimals(name, type_code, length, 0)
    }

    /// Append a field descriptor with a decimal count.
    pub fn field_with_decimals(
        mut self,
        name: &str,
        type_code: u8,
        length: u8,
        decimal_count: u8,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            type_code,
            length,
            decimal_count,
            mdx_flag: 0,
            next_autoincrement: 0,
            reserved_1: [0; 2],
            reserved_2: [0; 2],
            reserved_3: [0; 4],
        });
        self
    }

    /// Append a live record. Each value is padded with blanks or truncated to
    /// its field length.
    pub fn record(self, values: &[Vec<u8>]) -> Self {
        self.record_with_flag(RECORD_VALID, values)
    }

    /// Append a deleted record.
    pub fn deleted_record(self, values: &[Vec<u8>]) -> Self {
        self.record_with_flag(RECORD_DELETED, values)
    }

    /// Append a record with an arbitrary flag byte and a raw body.
    ///
    /// The body is padded with blanks or truncated to the record length.
    pub fn raw_record(mut self, flag: u8, body: Vec<u8>) -> Self {
        self.records.push((flag, body));
        self
    }

    fn record_with_flag(mut self, flag: u8, values: &[Vec<u8>]) -> Self {
        let mut body = Vec::new();
        for (field, value) in self.fields.iter().zip(values) {
            let len = field.length as usize;
            let mut bytes = value.clone();
            bytes.resize(len, b' ');
            body.extend_from_slice(&bytes);
        }
        self.records.push((flag, body));
        self
    }

    /// Set the raw last-update bytes (years since 1900, month, day).
    pub fn last_update(mut self, year: u8, month: u8, day: u8) -> Self {
        self.update = (year, month, day);
        self
    }

    /// Set the language driver id and name.
    pub fn language(mut self, driver: u8, name: &str) -> Self {
        self.language_driver = driver;
        self.language_name = name.to_string();
        self
    }

    /// Override the record count written to the header.
    pub fn record_count(mut self, count: u32) -> Self {
        self.record_count = Some(count);
        self
    }

    /// Override the record length written to the header.
    pub fn record_length(mut self, length: u16) -> Self {
        self.record_length = Some(length);
        self
    }

    /// Omit the trailing 0x1A end-of-file marker.
    pub fn without_end_marker(mut self) -> Self {
        self.end_marker = false;
        self
    }

    /// Header that [`build`](Self::build) writes.
    pub fn header(&self) -> TableHeader {
        let natural_length: usize =
            SIZE_RECORD_FLAG + self.fields.iter().map(|f| f.length as usize).sum::<usize>();
        let mut language_name = [0u8; SIZE_LANGUAGE_NAME];
        let name = self.language_name.as_bytes();
        let n = name.len().min(SIZE_LANGUAGE_NAME);
        language_name[..n].copy_from_slice(&name[..n]);

        TableHeader {
            version: self.version,
            update_year: self.update.0,
            update_month: self.update.1,
            update_day: self.update.2,
            record_count: self
                .record_count
                .unwrap_or(self.records.len() as u32),
            header_length: (SIZE_TABLE_HEADER
                + self.fields.len() * SIZE_FIELD_DESCRIPTOR
                + 1) as u16,
            record_length: self.record_length.unwrap_or(natural_length as u16),
            reserved_1: [0; 2],
            incomplete_transaction: 0,
            encryption: 0,
            free_record_thread: 0,
            reserved_2: 0,
            reserved_3: 0,
            mdx_flag: 0,
            language_driver: self.language_driver,
            reserved_4: [0; 2],
            language_name,
            reserved_5: [0; 4],
        }
    }

    /// Assemble the image.
    pub fn build(&self) -> Vec<u8> {
        let header = self.header();
        let body_len = (header.record_length as usize).saturating_sub(SIZE_RECORD_FLAG);

        let mut out = Vec::with_capacity(
            header.header_length as usize + self.records.len() * header.record_length as usize + 1,
        );
        out.extend_from_slice(&header.to_bytes());
        for field in &self.fields {
            out.extend_from_slice(&field.to_bytes());
        }
        out.push(FIELD_ARRAY_TERMINATOR);
        for (flag, body) in &self.records {
            out.push(*flag);
            let mut body = body.clone();
            body.resize(body_len, b' ');
            out.extend_from_slice(&body);
        }
        if self.end_marker {
            out.push(END_OF_FILE_MARKER);
        }
        out
    }
}

/// Blank-padded ASCII text of exactly `len` bytes.
pub fn text_bytes(text: &str, len: usize) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(len, b' ');
    bytes
}

/// Sign-bit-flagged integer bytes.
pub fn int_bytes(value: i32) -> Vec<u8> {
    encode_i32(value).to_vec()
}

/// Sign-bit-flagged double bytes.
pub fn double_bytes(value: f64) -> Vec<u8> {
    encode_f64(value).to_vec()
}
