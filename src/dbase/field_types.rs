//! Field type codes and their conversion rules.
//!
//! Each field descriptor carries a single ASCII type code. [`TYPE_TABLE`]
//! maps every known code to one [`TypeSpec`]: how the record decoder reads
//! the bytes, which semantic type the destination column gets, and how long
//! the destination text column is. The schema builder and the record decoder
//! both consult this table, so a code cannot be typed one way in the DDL and
//! decoded another way in the rows.
//!
//! | Code | Name | Decode | Destination |
//! |------|------|--------|-------------|
//! | `C` | Character | trimmed text | `varchar(len)` |
//! | `N` | Numeric | text, NULs stripped | `varchar(len)` |
//! | `L` | Logical | text, NULs stripped | `varchar(len)` |
//! | `D` | Date | text, NULs stripped | `varchar(8)` |
//! | `M` | Memo | text, NULs stripped | `varchar(10)` |
//! | `I` | Long | sign-bit integer | `int` |
//! | `+` | Autoincrement | sign-bit integer | `int` |
//! | `O` | Double | sign-bit double | `float` |
//! | `F` | Float | discarded | `float` |
//! | `B` | Binary | discarded | `int` |
//! | `G` | OLE | discarded | `varchar(len)` |
//! | `P` | Picture | discarded | `varchar(0)` |
//! | `Y` | Currency | discarded | `decimal(12,4)` |
//! | `@` | Timestamp | discarded | `int` |
//! | other | Unknown | discarded | `varchar(len)` |

use std::fmt;

use serde::Serialize;

/// How the record decoder turns a field's bytes into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecodeStrategy {
    /// ASCII text with trailing blanks and NULs trimmed.
    TrimmedText,
    /// ASCII text with every embedded NUL removed, otherwise untouched.
    StrippedText,
    /// 4-byte sign-bit-flagged integer.
    EncodedInt,
    /// 8-byte sign-bit-flagged double.
    EncodedDouble,
    /// Bytes are consumed and the value is absent.
    Discard,
}

/// Type of the destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SemanticType {
    /// Variable-length text.
    Text,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit IEEE-754 floating point.
    Float64,
    /// Fixed-point decimal.
    Decimal { precision: u8, scale: u8 },
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Text => write!(f, "text"),
            SemanticType::Int32 => write!(f, "int32"),
            SemanticType::Float64 => write!(f, "float64"),
            SemanticType::Decimal { precision, scale } => {
                write!(f, "decimal({},{})", precision, scale)
            }
        }
    }
}

/// Maximum length of a text destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxLength {
    /// Use the descriptor's field length.
    FieldLength,
    /// Fixed length regardless of the descriptor.
    Fixed(u16),
    /// Not a length-bounded type.
    Unbounded,
}

/// Conversion rules for one type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    /// ASCII type code, `0` for the unknown-code fallback.
    pub code: u8,
    /// Human-readable name.
    pub name: &'static str,
    /// Record decode strategy.
    pub decode: DecodeStrategy,
    /// Destination semantic type.
    pub semantic: SemanticType,
    /// Destination max length rule.
    pub max_length: MaxLength,
}

const fn spec(
    code: u8,
    name: &'static str,
    decode: DecodeStrategy,
    semantic: SemanticType,
    max_length: MaxLength,
) -> TypeSpec {
    TypeSpec {
        code,
        name,
        decode,
        semantic,
        max_length,
    }
}

use DecodeStrategy::*;
use MaxLength::*;
use SemanticType::*;

/// Every type code this crate knows about.
pub static TYPE_TABLE: &[TypeSpec] = &[
    spec(b'C', "Character", TrimmedText, Text, FieldLength),
    spec(b'N', "Numeric", StrippedText, Text, FieldLength),
    spec(b'L', "Logical", StrippedText, Text, FieldLength),
    spec(b'D', "Date", StrippedText, Text, Fixed(8)),
    spec(b'M', "Memo", StrippedText, Text, Fixed(10)),
    spec(b'I', "Long", EncodedInt, Int32, Unbounded),
    spec(b'+', "Autoincrement", EncodedInt, Int32, Unbounded),
    spec(b'O', "Double", EncodedDouble, Float64, Unbounded),
    spec(b'F', "Float", Discard, Float64, Unbounded),
    spec(b'B', "Binary", Discard, Int32, Unbounded),
    spec(b'G', "OLE", Discard, Text, FieldLength),
    spec(b'P', "Picture", Discard, Text, Fixed(0)),
    spec(
        b'Y',
        "Currency",
        Discard,
        Decimal {
            precision: 12,
            scale: 4,
        },
        Unbounded,
    ),
    spec(b'@', "Timestamp", Discard, Int32, Unbounded),
];

/// Fallback for codes not in [`TYPE_TABLE`].
pub static UNKNOWN_TYPE: TypeSpec = spec(0, "Unknown", Discard, Text, FieldLength);

impl TypeSpec {
    /// Look up the rules for a type code.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbf::dbase::field_types::{TypeSpec, DecodeStrategy, SemanticType};
    ///
    /// let spec = TypeSpec::for_code(b'I');
    /// assert_eq!(spec.decode, DecodeStrategy::EncodedInt);
    /// assert_eq!(spec.semantic, SemanticType::Int32);
    ///
    /// assert_eq!(TypeSpec::for_code(b'Z').name, "Unknown");
    /// ```
    pub fn for_code(code: u8) -> &'static TypeSpec {
        TYPE_TABLE
            .iter()
            .find(|s| s.code == code)
            .unwrap_or(&UNKNOWN_TYPE)
    }

    /// Returns true if values of this type are decoded (not discarded).
    pub fn is_supported(&self) -> bool {
        self.decode != DecodeStrategy::Discard
    }

    /// Destination max length for a field of `field_length` bytes.
    pub fn max_length(&self, field_length: u8) -> Option<u16> {
        match self.max_length {
            FieldLength => Some(field_length as u16),
            Fixed(n) => Some(n),
            Unbounded => None,
        }
    }

    /// Destination column definition fragment, e.g. `varchar(20) NULL`.
    pub fn ddl_fragment(&self, field_length: u8) -> String {
        let column_type = match self.semantic {
            Text => format!("varchar({})", self.max_length(field_length).unwrap_or(0)),
            Int32 => "int".to_string(),
            Float64 => "float".to_string(),
            Decimal { precision, scale } => format!("decimal({},{})", precision, scale),
        };
        format!("{} NULL", column_type)
    }
}
