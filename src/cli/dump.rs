//! CLI implementation for the `dbfsql dump` subcommand.

use std::io::Write;

use crate::cli::{wprint, wprintln};
use crate::dbase::constants::{RECORD_DELETED, RECORD_VALID};
use crate::dbase::cursor::ByteCursor;
use crate::dbase::header::TableHeader;
use crate::util::hex::hex_dump;
use crate::DbfError;

pub struct DumpOptions {
    pub file: String,
    pub record: Option<u32>,
    pub header: bool,
    pub raw: bool,
    pub mmap: bool,
}

/// Hex dump of the header area (default) or of one record.
pub fn execute(opts: &DumpOptions, writer: &mut dyn Write) -> Result<(), DbfError> {
    let mut cursor = if opts.mmap {
        ByteCursor::open_mmap(&opts.file)?
    } else {
        ByteCursor::open(&opts.file)?
    };
    let header = TableHeader::read(&mut cursor)?;

    let (offset, length, what) = match opts.record {
        Some(index) if !opts.header => {
            if index >= header.record_count {
                return Err(DbfError::Argument(format!(
                    "Record {} is out of range: table has {} records",
                    index, header.record_count
                )));
            }
            let offset =
                header.header_length as u64 + index as u64 * header.record_length as u64;
            (offset, header.record_length as u64, format!("record {}", index))
        }
        _ => (0, header.header_length as u64, "header area".to_string()),
    };

    cursor.seek(offset)?;
    let length = length.min(cursor.remaining()) as usize;
    let data = cursor.read_bytes(length)?;

    if opts.raw {
        return writer
            .write_all(&data)
            .map_err(|e| DbfError::Io(format!("Cannot write to stdout: {}", e)));
    }

    wprintln!(
        writer,
        "Hex dump of {} {} at offset {} ({} bytes):",
        opts.file,
        what,
        offset,
        length
    )?;
    if opts.record.is_some() && !opts.header {
        if let Some(&flag) = data.first() {
            wprint!(writer, "Deletion flag: 0x{:02x} ", flag)?;
            wprintln!(
                writer,
                "({})",
                match flag {
                    RECORD_VALID => "live",
                    RECORD_DELETED => "deleted",
                    _ => "corrupt",
                }
            )?;
        }
    }
    wprintln!(writer)?;
    wprintln!(writer, "{}", hex_dump(&data, offset))?;
    Ok(())
}
