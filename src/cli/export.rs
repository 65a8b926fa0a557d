//! CLI implementation for the `dbfsql export` subcommand.
//!
//! Streams the rows of a single table to the output writer through one of
//! the sinks. Rows are pulled one at a time, so memory use does not grow
//! with table size.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli::{convert_options, open_table};
use crate::sink::{transfer_until, SinkFormat};
use crate::DbfError;

/// Options for the `dbfsql export` subcommand.
pub struct ExportOptions {
    /// Path to the .dbf file.
    pub file: String,
    /// Output format: sql, csv, or json.
    pub format: String,
    /// Rows per INSERT statement for the sql format.
    pub batch_size: usize,
    /// Skip undecodable records instead of stopping.
    pub skip_bad_records: bool,
    /// Treat unknown deletion flags as deleted.
    pub lenient_flags: bool,
    /// Use memory-mapped I/O for file access.
    pub mmap: bool,
    /// Set to request cancellation.
    pub cancel: Arc<AtomicBool>,
}

/// Export all rows of a table.
pub fn execute(opts: &ExportOptions, writer: &mut dyn Write) -> Result<(), DbfError> {
    let format = SinkFormat::parse(&opts.format)?;
    let conversion = open_table(&opts.file, opts.mmap)?
        .convert(&convert_options(opts.skip_bad_records, opts.lenient_flags))?;

    let mut sink = format.create(writer, opts.batch_size);
    let stats = transfer_until(conversion, sink.as_mut(), |_| {
        opts.cancel.load(Ordering::Relaxed)
    })?;

    log::info!(
        "{}: {} rows exported, {} deleted, {} skipped",
        opts.file,
        stats.rows,
        stats.deleted,
        stats.skipped
    );
    if stats.skipped > 0 {
        log::warn!("{}: {} undecodable records skipped", opts.file, stats.skipped);
    }
    Ok(())
}
