//! Record stream decoding.
//!
//! Records follow the header at `header_length` and are exactly
//! `record_length` bytes each. The first byte of a record is the deletion
//! flag; the remaining bytes hold the fields back to back in descriptor
//! order. [`RecordDecoder`] walks the stream one record at a time:
//!
//! ```text
//!              flag 0x20            flag 0x2A
//! Positioned ───────────► RowEmitted    Positioned ───────────► RowSkipped
//!     ▲                        │            ▲                        │
//!     └──── next record ───────┘            └──── next record ───────┘
//!
//! after record_count records: EndOfRecords
//! ```

use serde::Serialize;

use crate::dbase::constants::*;
use crate::dbase::cursor::ByteCursor;
use crate::dbase::field::FieldDescriptor;
use crate::dbase::field_types::{DecodeStrategy, TypeSpec};
use crate::dbase::header::TableHeader;
use crate::dbase::numeric;
use crate::DbfError;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// No value. Distinct from an empty string.
    Null,
    Text(String),
    Int(i32),
    Double(f64),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One live record, values aligned with the field descriptors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Zero-based physical record index (deleted records count).
    pub index: u32,
    pub values: Vec<Value>,
}

/// Where the decoder stands after its last transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordState {
    /// At a record boundary, nothing decoded yet for this record.
    Positioned,
    /// The last record was live and produced a row.
    RowEmitted,
    /// The last record was deleted and skipped.
    RowSkipped,
    /// All `record_count` records have been consumed.
    EndOfRecords,
}

/// How deletion flag bytes other than 0x20 and 0x2A are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DeletionFlagPolicy {
    /// Any other byte is a [`DbfError::CorruptRecordFlag`].
    #[default]
    Strict,
    /// Any byte other than 0x20 marks the record deleted.
    Lenient,
}

/// Result of one [`RecordDecoder::next_record`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Row(Row),
    /// Index of a deleted record.
    Skipped(u32),
    End,
}

/// Sequential decoder over the record area of one table.
pub struct RecordDecoder {
    fields: Vec<FieldDescriptor>,
    specs: Vec<&'static TypeSpec>,
    record_count: u32,
    header_length: u64,
    record_length: u64,
    next_index: u32,
    state: RecordState,
    policy: DeletionFlagPolicy,
}

impl RecordDecoder {
    /// Create a decoder for the given layout.
    ///
    /// Fails with [`DbfError::InconsistentHeader`] if the fields do not fit
    /// in the record length.
    pub fn new(
        header: &TableHeader,
        fields: &[FieldDescriptor],
        policy: DeletionFlagPolicy,
    ) -> Result<Self, DbfError> {
        let field_bytes: u64 = fields.iter().map(|f| f.length as u64).sum();
        let body_len = (header.record_length as u64).saturating_sub(SIZE_RECORD_FLAG as u64);
        if header.record_length == 0 || field_bytes > body_len {
            return Err(DbfError::InconsistentHeader(format!(
                "fields need {} bytes but records are {} bytes including the deletion flag",
                field_bytes, header.record_length
            )));
        }
        Ok(RecordDecoder {
            fields: fields.to_vec(),
            specs: fields.iter().map(|f| f.type_spec()).collect(),
            record_count: header.record_count,
            header_length: header.header_length as u64,
            record_length: header.record_length as u64,
            next_index: 0,
            state: RecordState::Positioned,
            policy,
        })
    }

    /// Current state.
    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Index of the record the next call will read.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Absolute file offset of record `index`.
    pub fn record_offset(&self, index: u32) -> u64 {
        self.header_length + index as u64 * self.record_length
    }

    /// Decode the next record.
    ///
    /// On error the record is consumed: the following call starts at the next
    /// record boundary regardless of how far this one got.
    pub fn next_record(&mut self, cursor: &mut ByteCursor) -> Result<RecordOutcome, DbfError> {
        if self.next_index >= self.record_count {
            self.state = RecordState::EndOfRecords;
            return Ok(RecordOutcome::End);
        }
        let index = self.next_index;
        self.next_index += 1;
        self.state = RecordState::Positioned;

        cursor.seek(self.record_offset(index))?;
        let flag = cursor.read_u8()?;
        let body_len = (self.record_length - SIZE_RECORD_FLAG as u64) as usize;

        let live = match (flag, self.policy) {
            (RECORD_VALID, _) => true,
            (RECORD_DELETED, _) | (_, DeletionFlagPolicy::Lenient) => false,
            (_, DeletionFlagPolicy::Strict) => {
                return Err(DbfError::CorruptRecordFlag {
                    record: index,
                    flag,
                })
            }
        };

        if !live {
            cursor.skip(body_len as u64)?;
            self.state = RecordState::RowSkipped;
            return Ok(RecordOutcome::Skipped(index));
        }

        let body = cursor.read_bytes(body_len)?;
        let mut values = Vec::with_capacity(self.fields.len());
        let mut offset = 0usize;
        for (field, spec) in self.fields.iter().zip(&self.specs) {
            let len = field.length as usize;
            let bytes = &body[offset..offset + len];
            offset += len;
            let value = decode_field(spec, bytes).map_err(|e| DbfError::FieldDecode {
                record: index,
                field: field.name.clone(),
                source: Box::new(e),
            })?;
            values.push(value);
        }

        self.state = RecordState::RowEmitted;
        Ok(RecordOutcome::Row(Row { index, values }))
    }
}

/// Decode the bytes of one field according to its type rules.
///
/// # Examples
///
/// ```
/// use dbf::dbase::field_types::TypeSpec;
/// use dbf::dbase::record::{decode_field, Value};
///
/// let c = TypeSpec::for_code(b'C');
/// assert_eq!(decode_field(c, b"Smith   ").unwrap(), Value::Text("Smith".into()));
/// assert_eq!(decode_field(c, b"\0\0\0\0").unwrap(), Value::Null);
///
/// let i = TypeSpec::for_code(b'I');
/// assert_eq!(decode_field(i, &[0x80, 0, 0, 42]).unwrap(), Value::Int(42));
/// ```
pub fn decode_field(spec: &TypeSpec, bytes: &[u8]) -> Result<Value, DbfError> {
    match spec.decode {
        DecodeStrategy::TrimmedText if text_present(bytes) => {
            let text = ascii_string(bytes.iter().copied());
            Ok(Value::Text(
                text.trim_end_matches(|c: char| c.is_ascii_whitespace() || c == '\0')
                    .to_string(),
            ))
        }
        DecodeStrategy::StrippedText if text_present(bytes) => Ok(Value::Text(ascii_string(
            bytes.iter().copied().filter(|&b| b != 0),
        ))),
        DecodeStrategy::TrimmedText | DecodeStrategy::StrippedText => Ok(Value::Null),
        DecodeStrategy::EncodedInt => numeric::decode_i32(bytes).map(Value::Int),
        DecodeStrategy::EncodedDouble => numeric::decode_f64(bytes).map(Value::Double),
        DecodeStrategy::Discard => Ok(Value::Null),
    }
}

fn text_present(bytes: &[u8]) -> bool {
    matches!(bytes.first(), Some(&b) if b != 0)
}

fn ascii_string(bytes: impl Iterator<Item = u8>) -> String {
    bytes
        .map(|b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}
