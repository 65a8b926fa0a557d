//! CLI subcommand implementations for the `dbfsql` binary.
//!
//! CLI argument parsing uses clap derive macros, with the top-level
//! [`app::Cli`] struct and [`app::Commands`] enum defined in [`app`] and
//! shared between `main.rs` and `build.rs` (for man page generation) via
//! `include!()`.
//!
//! Each subcommand module follows the same pattern: an `Options` struct holding
//! the parsed arguments and a `pub fn execute(opts, writer) -> Result<(), DbfError>`
//! entry point. The `writer: &mut dyn Write` parameter allows output to be
//! captured in tests or redirected to a file via the global `--output` flag.
//!
//! # Subcommands
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `dbfsql convert` | [`convert`] | Convert many tables in parallel into SQL, CSV or JSON lines files |
//! | `dbfsql info` | [`info`] | Table header, flags and field descriptors |
//! | `dbfsql schema` | [`schema`] | Destination columns and `CREATE TABLE` DDL |
//! | `dbfsql export` | [`export`] | Stream one table's rows to the output |
//! | `dbfsql dump` | [`dump`] | Hex dump of the header area or one record |
//!
//! # Common patterns
//!
//! - **`--json`**: `convert`, `info` and `schema` support structured JSON
//!   output via `#[derive(Serialize)]` structs and `serde_json`.
//! - **`--mmap`** (global): memory-map source files instead of buffered reads.
//! - **`--threads` / `-t`** (global): bound on concurrent conversions.
//! - **`--color`** (global): control colored terminal output (`auto`,
//!   `always`, `never`).
//! - **`--output` / `-o`** (global): redirect output to a file instead of stdout.
//! - **`--log-level`** (global): diagnostic logging through `env_logger`;
//!   `RUST_LOG` overrides it.
//!
//! The `wprintln!` and `wprint!` macros wrap `writeln!`/`write!` to convert
//! `io::Error` into `DbfError`.

pub mod app;
pub mod convert;
pub mod dump;
pub mod export;
pub mod info;
pub mod schema;

/// Write a line to the given writer, converting io::Error to DbfError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::DbfError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::DbfError::Io(e.to_string()))
    };
}

/// Write (without newline) to the given writer, converting io::Error to DbfError.
macro_rules! wprint {
    ($w:expr, $($arg:tt)*) => {
        write!($w, $($arg)*).map_err(|e| $crate::DbfError::Io(e.to_string()))
    };
}

pub(crate) use wprint;
pub(crate) use wprintln;

use std::io::Write;

use crate::dbase::record::DeletionFlagPolicy;
use crate::dbase::table::{ConvertOptions, DbfTable, RecordErrorPolicy};
use crate::DbfError;
use indicatif::{ProgressBar, ProgressStyle};

/// Open a table file, selecting mmap or buffered I/O based on the flag.
pub(crate) fn open_table(path: &str, use_mmap: bool) -> Result<DbfTable, DbfError> {
    if use_mmap {
        DbfTable::open_mmap(path)
    } else {
        DbfTable::open(path)
    }
}

/// Library conversion options from the shared command-line switches.
pub(crate) fn convert_options(skip_bad_records: bool, lenient_flags: bool) -> ConvertOptions {
    ConvertOptions {
        on_record_error: if skip_bad_records {
            RecordErrorPolicy::Skip
        } else {
            RecordErrorPolicy::Abort
        },
        deletion_flags: if lenient_flags {
            DeletionFlagPolicy::Lenient
        } else {
            DeletionFlagPolicy::Strict
        },
    }
}

/// Create a styled progress bar for iterating over files or records.
pub(crate) fn create_progress_bar(count: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(count);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
            unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Serialize a report as pretty JSON and write it.
pub(crate) fn write_json<T: serde::Serialize>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), DbfError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| DbfError::Io(format!("JSON serialization error: {}", e)))?;
    wprintln!(writer, "{}", json)
}
