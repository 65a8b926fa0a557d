//! CLI implementation for the `dbfsql schema` subcommand.
//!
//! Derives the destination column schema from the field descriptors and
//! prints it together with the `CREATE TABLE` statement a sink would run.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_table, write_json, wprintln};
use crate::dbase::schema::Column;
use crate::dbase::table::ConvertOptions;
use crate::DbfError;

/// Options for the `dbfsql schema` subcommand.
pub struct SchemaOptions {
    /// Path to the .dbf file.
    pub file: String,
    /// Destination table name override.
    pub table: Option<String>,
    /// Output in JSON format.
    pub json: bool,
    /// Use memory-mapped I/O for file access.
    pub mmap: bool,
}

#[derive(Serialize)]
struct SchemaJson<'a> {
    table: &'a str,
    columns: &'a [Column],
    ddl: String,
}

/// Show the column schema and DDL for a table.
pub fn execute(opts: &SchemaOptions, writer: &mut dyn Write) -> Result<(), DbfError> {
    let conversion = open_table(&opts.file, opts.mmap)?.convert(&ConvertOptions::default())?;
    let table = opts.table.as_deref().unwrap_or(&conversion.table_name);
    let schema = &conversion.schema;
    let ddl = schema.create_table_ddl(table);

    if opts.json {
        return write_json(
            writer,
            &SchemaJson {
                table,
                columns: &schema.columns,
                ddl,
            },
        );
    }

    wprintln!(writer, "{}", format!("Schema: {}", table).bold())?;
    wprintln!(
        writer,
        "  {:<32} {:<4} {:<16} {:<20}",
        "COLUMN",
        "TYPE",
        "SEMANTIC",
        "DDL"
    )?;
    for col in &schema.columns {
        wprintln!(
            writer,
            "  {:<32} {:<4} {:<16} {:<20}",
            col.name,
            col.type_code,
            col.semantic.to_string(),
            col.ddl
        )?;
    }
    wprintln!(writer)?;
    wprintln!(writer, "{};", ddl)?;
    Ok(())
}
