//! dBASE Level 7 binary format parsing.
//!
//! This module contains the types and functions for reading the on-disk
//! structures of a `.dbf` table: the fixed table header, the field
//! descriptor array, and the fixed-length record stream with its per-record
//! deletion flags.
//!
//! Start with [`table::DbfTable`] to open a file, then call
//! [`table::DbfTable::convert`] to get the schema and a lazy row iterator.

pub mod constants;
pub mod cursor;
pub mod field;
pub mod field_types;
pub mod header;
pub mod numeric;
pub mod record;
pub mod schema;
pub mod table;
pub mod write;
