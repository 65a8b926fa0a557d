//! CLI implementation for the `dbfsql info` subcommand.

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{write_json, wprintln};
use crate::dbase::cursor::ByteCursor;
use crate::dbase::field::{read_field_descriptors, FieldDescriptor};
use crate::dbase::header::TableHeader;
use crate::dbase::record::{DeletionFlagPolicy, RecordDecoder};
use crate::dbase::schema::Schema;
use crate::dbase::table::table_name_from_path;
use crate::util::hex::{format_hex32, format_offset};
use crate::DbfError;

/// Options for the `dbfsql info` subcommand.
pub struct InfoOptions {
    /// Path to the .dbf file.
    pub file: String,
    /// Emit output as JSON.
    pub json: bool,
    /// Use memory-mapped I/O for file access.
    pub mmap: bool,
}

#[derive(Serialize)]
struct InfoJson<'a> {
    file: &'a str,
    table: &'a str,
    file_size: u64,
    level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_update: Option<String>,
    language_name: String,
    has_memo: bool,
    has_mdx: bool,
    encrypted: bool,
    incomplete_transaction: bool,
    header: &'a TableHeader,
    fields: &'a [FieldDescriptor],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

/// Display the table header and the field descriptor array.
///
/// Only the header area is decoded; records are not read. Layout and
/// column-name problems that would stop a conversion are listed as warnings
/// so the descriptors of a broken table can still be inspected.
pub fn execute(opts: &InfoOptions, writer: &mut dyn Write) -> Result<(), DbfError> {
    let mut cursor = if opts.mmap {
        ByteCursor::open_mmap(&opts.file)?
    } else {
        ByteCursor::open(&opts.file)?
    };
    let file_size = cursor.len();
    let table_name = table_name_from_path(Path::new(&opts.file));
    let header = TableHeader::read(&mut cursor)?;
    let fields = read_field_descriptors(&mut cursor)?;
    let warnings = layout_warnings(&header, &fields, file_size, cursor.position());
    for warning in &warnings {
        log::warn!("{}: {}", opts.file, warning);
    }

    if opts.json {
        return write_json(
            writer,
            &InfoJson {
                file: &opts.file,
                table: &table_name,
                file_size,
                level: header.level(),
                last_update: header.last_update().map(|d| d.to_string()),
                language_name: header.language_name(),
                has_memo: header.has_memo(),
                has_mdx: header.has_mdx(),
                encrypted: header.is_encrypted(),
                incomplete_transaction: header.has_incomplete_transaction(),
                header: &header,
                fields: &fields,
                warnings,
            },
        );
    }

    wprintln!(writer, "{}", format!("Table: {}", table_name).bold())?;
    wprintln!(writer, "  File:            {}", opts.file)?;
    wprintln!(writer, "  File size:       {}", format_offset(file_size))?;
    wprintln!(
        writer,
        "  Version:         0x{:02x} (level {})",
        header.version,
        header.level()
    )?;
    match header.last_update() {
        Some(date) => wprintln!(writer, "  Last update:     {}", date)?,
        None => wprintln!(
            writer,
            "  Last update:     {}",
            format!(
                "invalid ({} {} {})",
                header.update_year, header.update_month, header.update_day
            )
            .yellow()
        )?,
    }
    wprintln!(writer, "  Records:         {}", header.record_count)?;
    wprintln!(writer, "  Header length:   {}", header.header_length)?;
    wprintln!(writer, "  Record length:   {}", header.record_length)?;
    wprintln!(
        writer,
        "  Language driver: 0x{:02x} {}",
        header.language_driver,
        header.language_name()
    )?;
    wprintln!(
        writer,
        "  Free record thread: {}",
        format_hex32(header.free_record_thread)
    )?;

    let mut flags = Vec::new();
    if header.has_memo() {
        flags.push("memo");
    }
    if header.has_mdx() {
        flags.push("mdx");
    }
    if header.is_encrypted() {
        flags.push("encrypted");
    }
    if header.has_incomplete_transaction() {
        flags.push("incomplete-transaction");
    }
    wprintln!(
        writer,
        "  Flags:           {}",
        if flags.is_empty() {
            "none".to_string()
        } else {
            flags.join(", ")
        }
    )?;

    wprintln!(writer)?;
    wprintln!(writer, "{}", format!("Fields ({}):", fields.len()).bold())?;
    wprintln!(
        writer,
        "  {:<4} {:<32} {:<4} {:<14} {:>6} {:>4} {:>4}",
        "#",
        "NAME",
        "TYPE",
        "KIND",
        "LENGTH",
        "DEC",
        "MDX"
    )?;
    for (i, field) in fields.iter().enumerate() {
        let spec = field.type_spec();
        let kind = if spec.is_supported() {
            spec.name.normal()
        } else {
            spec.name.dimmed()
        };
        wprintln!(
            writer,
            "  {:<4} {:<32} {:<4} {:<14} {:>6} {:>4} {:>4}",
            i,
            field.name,
            field.type_char(),
            kind,
            field.length,
            field.decimal_count,
            if field.is_indexed() { "Y" } else { "" }
        )?;
    }

    if !warnings.is_empty() {
        wprintln!(writer)?;
        for warning in &warnings {
            wprintln!(writer, "{}", format!("Warning: {}", warning).yellow())?;
        }
    }
    Ok(())
}

/// Everything `convert` would reject after the descriptors were read.
fn layout_warnings(
    header: &TableHeader,
    fields: &[FieldDescriptor],
    file_size: u64,
    descriptors_end: u64,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Err(e) = header.validate(file_size) {
        warnings.push(e.to_string());
    }
    if descriptors_end > header.header_length as u64 {
        warnings.push(format!(
            "field descriptors end at offset {}, past the {}-byte header length",
            descriptors_end, header.header_length
        ));
    }
    if let Err(e) = Schema::from_fields(fields) {
        warnings.push(e.to_string());
    }
    if let Err(e) = RecordDecoder::new(header, fields, DeletionFlagPolicy::Strict) {
        warnings.push(e.to_string());
    }
    warnings
}
