//! Field descriptor array parsing.
//!
//! The descriptors follow the table header directly. Each one is 48 bytes;
//! the array has no count field and ends where a single terminator byte
//! (`0x0D`) appears in place of the next descriptor's first name byte.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::dbase::constants::*;
use crate::dbase::cursor::ByteCursor;
use crate::dbase::field_types::TypeSpec;
use crate::DbfError;

/// Parsed field descriptor (48 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Field name with NUL padding and trailing blanks removed.
    pub name: String,
    /// Single-character ASCII type code.
    pub type_code: u8,
    /// Field width in bytes within a record.
    pub length: u8,
    /// Number of decimal places.
    pub decimal_count: u8,
    /// 0x01 if the field has an index tag in the production `.MDX`.
    pub mdx_flag: u8,
    /// Next autoincrement value (autoincrement fields only).
    pub next_autoincrement: u32,
    /// Bytes 35-36, reserved.
    pub reserved_1: [u8; 2],
    /// Bytes 38-39, reserved.
    pub reserved_2: [u8; 2],
    /// Bytes 44-47, reserved.
    pub reserved_3: [u8; 4],
}

impl FieldDescriptor {
    /// Parse a descriptor from a slice of at least 48 bytes.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < SIZE_FIELD_DESCRIPTOR {
            return None;
        }
        Some(FieldDescriptor {
            name: normalize_name(&data[FLD_NAME..FLD_NAME + SIZE_FIELD_NAME]),
            type_code: data[FLD_TYPE],
            length: data[FLD_LENGTH],
            decimal_count: data[FLD_DECIMAL_COUNT],
            mdx_flag: data[FLD_MDX_FLAG],
            next_autoincrement: LittleEndian::read_u32(&data[FLD_NEXT_AUTOINCREMENT..]),
            reserved_1: [data[FLD_RESERVED_1], data[FLD_RESERVED_1 + 1]],
            reserved_2: [data[FLD_RESERVED_2], data[FLD_RESERVED_2 + 1]],
            reserved_3: [
                data[FLD_RESERVED_3],
                data[FLD_RESERVED_3 + 1],
                data[FLD_RESERVED_3 + 2],
                data[FLD_RESERVED_3 + 3],
            ],
        })
    }

    /// Serialize back to the 48-byte on-disk layout.
    ///
    /// Names longer than 32 bytes are truncated.
    pub fn to_bytes(&self) -> [u8; SIZE_FIELD_DESCRIPTOR] {
        let mut buf = [0u8; SIZE_FIELD_DESCRIPTOR];
        let name = self.name.as_bytes();
        let n = name.len().min(SIZE_FIELD_NAME);
        buf[FLD_NAME..FLD_NAME + n].copy_from_slice(&name[..n]);
        buf[FLD_TYPE] = self.type_code;
        buf[FLD_LENGTH] = self.length;
        buf[FLD_DECIMAL_COUNT] = self.decimal_count;
        buf[FLD_RESERVED_1..FLD_RESERVED_1 + 2].copy_from_slice(&self.reserved_1);
        buf[FLD_MDX_FLAG] = self.mdx_flag;
        buf[FLD_RESERVED_2..FLD_RESERVED_2 + 2].copy_from_slice(&self.reserved_2);
        LittleEndian::write_u32(&mut buf[FLD_NEXT_AUTOINCREMENT..], self.next_autoincrement);
        buf[FLD_RESERVED_3..FLD_RESERVED_3 + 4].copy_from_slice(&self.reserved_3);
        buf
    }

    /// Type code as a character.
    pub fn type_char(&self) -> char {
        self.type_code as char
    }

    /// Conversion rules for this field's type code.
    pub fn type_spec(&self) -> &'static TypeSpec {
        TypeSpec::for_code(self.type_code)
    }

    /// Returns true if the field has a production `.MDX` index tag.
    pub fn is_indexed(&self) -> bool {
        self.mdx_flag != 0
    }
}

/// Normalize a raw 32-byte name slot: drop NUL bytes, trim trailing whitespace.
pub fn normalize_name(raw: &[u8]) -> String {
    let text: String = raw
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect();
    text.trim_end().to_string()
}

/// Read descriptors until the terminator byte, leaving the cursor one byte past it.
///
/// # Examples
///
/// ```
/// use dbf::dbase::cursor::ByteCursor;
/// use dbf::dbase::field::read_field_descriptors;
///
/// let mut cur = ByteCursor::from_bytes(vec![0x0D]);
/// let fields = read_field_descriptors(&mut cur).unwrap();
/// assert!(fields.is_empty());
/// assert_eq!(cur.position(), 1);
/// ```
pub fn read_field_descriptors(cursor: &mut ByteCursor) -> Result<Vec<FieldDescriptor>, DbfError> {
    let mut fields = Vec::new();
    loop {
        match cursor.peek_u8()? {
            None => {
                return Err(DbfError::TruncatedFieldArray {
                    offset: cursor.position(),
                })
            }
            Some(FIELD_ARRAY_TERMINATOR) => {
                cursor.read_u8()?;
                break;
            }
            Some(_) => {
                if cursor.remaining() < SIZE_FIELD_DESCRIPTOR as u64 {
                    return Err(DbfError::TruncatedFieldArray {
                        offset: cursor.position(),
                    });
                }
                let buf = cursor.read_bytes(SIZE_FIELD_DESCRIPTOR)?;
                let field = FieldDescriptor::parse(&buf).ok_or(DbfError::TruncatedFieldArray {
                    offset: cursor.position(),
                })?;
                log::debug!(
                    "Field {}: '{}' type {} length {}",
                    fields.len(),
                    field.name,
                    field.type_char(),
                    field.length
                );
                fields.push(field);
            }
        }
    }
    Ok(fields)
}
