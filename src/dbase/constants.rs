/// dBASE Level 7 table file structure constants.
///
/// Layout follows the dBASE 7 file format description (table header,
/// field descriptor array, record area).
// Table header (68 bytes total)
pub const SIZE_TABLE_HEADER: usize = 68;
pub const HDR_VERSION: usize = 0; // 1 byte - version bits
pub const HDR_LAST_UPDATE: usize = 1; // 3 bytes - YY (since 1900), MM, DD
pub const HDR_RECORD_COUNT: usize = 4; // 4 bytes LE - number of records
pub const HDR_HEADER_LENGTH: usize = 8; // 2 bytes LE - bytes in header incl. descriptors
pub const HDR_RECORD_LENGTH: usize = 10; // 2 bytes LE - bytes per record incl. flag
pub const HDR_RESERVED_1: usize = 12; // 2 bytes - reserved, zero
pub const HDR_INCOMPLETE_TXN: usize = 14; // 1 byte - incomplete dBASE IV transaction
pub const HDR_ENCRYPTION: usize = 15; // 1 byte - dBASE IV encryption flag
pub const HDR_FREE_RECORD_THREAD: usize = 16; // 4 bytes - multi-user reserved
pub const HDR_RESERVED_2: usize = 20; // 4 bytes - multi-user reserved
pub const HDR_RESERVED_3: usize = 24; // 4 bytes - multi-user reserved
pub const HDR_MDX_FLAG: usize = 28; // 1 byte - production .MDX present
pub const HDR_LANGUAGE_DRIVER: usize = 29; // 1 byte - language driver id
pub const HDR_RESERVED_4: usize = 30; // 2 bytes - reserved, zero
pub const HDR_LANGUAGE_NAME: usize = 32; // 32 bytes - language driver name
pub const HDR_RESERVED_5: usize = 64; // 4 bytes - reserved
pub const SIZE_LANGUAGE_NAME: usize = 32;

// Version byte bits
pub const VERSION_LEVEL_MASK: u8 = 0x07; // bits 0-2: 3 = Level 5, 4 = Level 7
pub const VERSION_MEMO_BITS: u8 = 0x88; // bit 3 / bit 7: .DBT memo file present
pub const LAST_UPDATE_BASE_YEAR: u16 = 1900;

// Field descriptor (48 bytes total)
pub const SIZE_FIELD_DESCRIPTOR: usize = 48;
pub const FLD_NAME: usize = 0; // 32 bytes - name, zero filled
pub const FLD_TYPE: usize = 32; // 1 byte - type code (ASCII)
pub const FLD_LENGTH: usize = 33; // 1 byte - field length
pub const FLD_DECIMAL_COUNT: usize = 34; // 1 byte - decimal count
pub const FLD_RESERVED_1: usize = 35; // 2 bytes
pub const FLD_MDX_FLAG: usize = 37; // 1 byte - field has an .MDX tag
pub const FLD_RESERVED_2: usize = 38; // 2 bytes
pub const FLD_NEXT_AUTOINCREMENT: usize = 40; // 4 bytes LE
pub const FLD_RESERVED_3: usize = 44; // 4 bytes
pub const SIZE_FIELD_NAME: usize = 32;

/// Marks the end of the field descriptor array.
pub const FIELD_ARRAY_TERMINATOR: u8 = 0x0D;

// Record deletion flags
pub const RECORD_VALID: u8 = 0x20;
pub const RECORD_DELETED: u8 = 0x2A;
pub const SIZE_RECORD_FLAG: usize = 1;

/// Optional end-of-file marker written after the last record. Never scanned for.
pub const END_OF_FILE_MARKER: u8 = 0x1A;

// Sign-bit-flagged numbers
pub const SIZE_ENCODED_INT: usize = 4;
pub const SIZE_ENCODED_DOUBLE: usize = 8;
pub const ENCODED_SIGN_BIT: u8 = 0x80;
