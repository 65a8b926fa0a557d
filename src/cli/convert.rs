//! CLI implementation for the `dbfsql convert` subcommand.
//!
//! Expands the source patterns, then converts every matched table on a
//! bounded rayon pool: at most `--threads` files are open at once, and a
//! worker that finishes one file picks up the next queued one. Tables share
//! nothing; each gets its own reader, sink and output file
//! `<out-dir>/<table>.<ext>`. A Ctrl-C sets the cancellation flag, which every
//! worker checks between rows.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;

use crate::cli::{convert_options, create_progress_bar, open_table, write_json, wprintln};
use crate::dbase::table::{
    table_name_from_path, Conversion, ConvertOptions as TableOptions, RowStats,
};
use crate::sink::{transfer_rows, SinkFormat};
use crate::util::fs::expand_source_pattern;
use crate::util::journal::ConversionJournal;
use crate::DbfError;

/// Options for the `dbfsql convert` subcommand.
pub struct ConvertOptions {
    /// Source files or wildcard patterns.
    pub sources: Vec<String>,
    /// Directory receiving one output file per table.
    pub out_dir: String,
    /// Output format: sql, csv, or json.
    pub format: String,
    /// Rows per INSERT statement for the sql format.
    pub batch_size: usize,
    /// Skip undecodable records instead of failing the file.
    pub skip_bad_records: bool,
    /// Treat unknown deletion flags as deleted.
    pub lenient_flags: bool,
    /// Maximum concurrent conversions (0 = number of CPUs).
    pub threads: usize,
    /// Use memory-mapped I/O for source files.
    pub mmap: bool,
    /// Append NDJSON events to this journal file.
    pub journal: Option<String>,
    /// Emit the report as JSON.
    pub json: bool,
    /// Set to request cancellation.
    pub cancel: Arc<AtomicBool>,
}

#[derive(Serialize)]
struct ConvertReport {
    out_dir: String,
    format: SinkFormat,
    files: Vec<FileReport>,
    summary: ConvertSummary,
}

#[derive(Serialize, Clone)]
struct FileReport {
    file: String,
    table: String,
    output: String,
    status: FileStatus,
    columns: usize,
    #[serde(flatten)]
    stats: RowStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<FailureReport>,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum FileStatus {
    Converted,
    Failed,
    Cancelled,
}

#[derive(Serialize, Clone)]
struct FailureReport {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<u32>,
}

#[derive(Serialize)]
struct ConvertSummary {
    total_files: usize,
    files_converted: usize,
    files_failed: usize,
    rows_written: u64,
    records_deleted: u64,
    records_skipped: u64,
}

/// Shared, read-only state for the workers.
struct Job<'a> {
    out_dir: &'a Path,
    format: SinkFormat,
    batch_size: usize,
    table_options: TableOptions,
    mmap: bool,
    cancel: &'a AtomicBool,
    journal: Option<&'a ConversionJournal>,
    progress: Option<&'a ProgressBar>,
}

/// Convert all matched tables and report per-file outcomes.
///
/// Returns [`DbfError::ConversionFailed`] after printing the report if any
/// file failed or was cancelled.
pub fn execute(opts: &ConvertOptions, writer: &mut dyn Write) -> Result<(), DbfError> {
    let format = SinkFormat::parse(&opts.format)?;
    let files = resolve_sources(&opts.sources)?;
    let out_dir = PathBuf::from(&opts.out_dir);
    check_output_collisions(&files, &out_dir, format)?;

    std::fs::create_dir_all(&out_dir)
        .map_err(|e| DbfError::Io(format!("Cannot create {}: {}", out_dir.display(), e)))?;

    let journal = match &opts.journal {
        Some(path) => {
            let journal = ConversionJournal::open(path)?;
            let args: Vec<String> = std::env::args().collect();
            if let Err(e) = journal.start_session(args, files.len()) {
                log::warn!("{}", e);
            }
            Some(journal)
        }
        None => None,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.threads)
        .build()
        .map_err(|e| DbfError::Argument(format!("Cannot start worker pool: {}", e)))?;
    log::info!(
        "Converting {} files with {} workers",
        files.len(),
        pool.current_num_threads()
    );

    let pb = if !opts.json {
        Some(create_progress_bar(files.len() as u64, "files"))
    } else {
        None
    };

    let job = Job {
        out_dir: &out_dir,
        format,
        batch_size: opts.batch_size,
        table_options: convert_options(opts.skip_bad_records, opts.lenient_flags),
        mmap: opts.mmap,
        cancel: &opts.cancel,
        journal: journal.as_ref(),
        progress: pb.as_ref(),
    };

    let results: Vec<FileReport> =
        pool.install(|| files.par_iter().map(|path| convert_file(path, &job)).collect());

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }
    if let Some(ref journal) = journal {
        if let Err(e) = journal.end_session() {
            log::warn!("{}", e);
        }
    }

    let summary = ConvertSummary {
        total_files: results.len(),
        files_converted: results
            .iter()
            .filter(|r| r.status == FileStatus::Converted)
            .count(),
        files_failed: results
            .iter()
            .filter(|r| r.status != FileStatus::Converted)
            .count(),
        rows_written: results.iter().map(|r| r.stats.rows).sum(),
        records_deleted: results.iter().map(|r| r.stats.deleted).sum(),
        records_skipped: results.iter().map(|r| r.stats.skipped).sum(),
    };
    let failed = summary.files_failed;
    let total = summary.total_files;

    if opts.json {
        write_json(
            writer,
            &ConvertReport {
                out_dir: opts.out_dir.clone(),
                format,
                files: results,
                summary,
            },
        )?;
    } else {
        print_text_report(writer, opts, format, &results, &summary)?;
    }

    if failed > 0 {
        return Err(DbfError::ConversionFailed { failed, total });
    }
    Ok(())
}

/// Expand every pattern, keeping first-seen order and dropping duplicates.
fn resolve_sources(sources: &[String]) -> Result<Vec<PathBuf>, DbfError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in sources {
        let matched = expand_source_pattern(pattern)?;
        if matched.is_empty() {
            log::warn!("Pattern '{}' matched no files", pattern);
        }
        for path in matched {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    if files.is_empty() {
        return Err(DbfError::Argument(format!(
            "No source files match: {}",
            sources.join(" ")
        )));
    }
    Ok(files)
}

fn output_path(out_dir: &Path, path: &Path, format: SinkFormat) -> PathBuf {
    out_dir.join(format!(
        "{}.{}",
        table_name_from_path(path),
        format.extension()
    ))
}

/// Two sources with the same stem would overwrite each other's output.
fn check_output_collisions(
    files: &[PathBuf],
    out_dir: &Path,
    format: SinkFormat,
) -> Result<(), DbfError> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for path in files {
        let out = output_path(out_dir, path, format);
        if let Some(first) = seen.insert(out.clone(), path) {
            return Err(DbfError::Argument(format!(
                "{} and {} would both be written to {}",
                first.display(),
                path.display(),
                out.display()
            )));
        }
    }
    Ok(())
}

fn convert_file(path: &Path, job: &Job<'_>) -> FileReport {
    let file = path.display().to_string();
    let table = table_name_from_path(path);
    let out_path = output_path(job.out_dir, path, job.format);
    let output = out_path.display().to_string();

    let outcome = run_conversion(path, &out_path, job);
    if let Some(pb) = job.progress {
        pb.inc(1);
    }

    match outcome {
        Ok((columns, stats)) => {
            log::info!("{}: {} rows -> {}", file, stats.rows, output);
            if let Some(journal) = job.journal {
                if let Err(e) =
                    journal.log_converted(&file, &table, &output, stats.rows, stats.deleted, stats.skipped)
                {
                    log::warn!("{}", e);
                }
            }
            FileReport {
                file,
                table,
                output,
                status: FileStatus::Converted,
                columns,
                stats,
                error: None,
            }
        }
        Err((columns, stats, err)) => {
            log::error!("{}: {}", file, err);
            if let Some(journal) = job.journal {
                if let Err(e) = journal.log_failed(&file, &err) {
                    log::warn!("{}", e);
                }
            }
            FileReport {
                file,
                table,
                output,
                status: if matches!(err, DbfError::Cancelled { .. }) {
                    FileStatus::Cancelled
                } else {
                    FileStatus::Failed
                },
                columns,
                stats,
                error: Some(FailureReport {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                    record: err.record_index(),
                }),
            }
        }
    }
}

type Outcome = Result<(usize, RowStats), (usize, RowStats, DbfError)>;

/// Convert one table into `out_path`.
///
/// Only a file this call created is removed on failure; an output left by an
/// earlier run stays untouched until the sink is about to replace it.
fn run_conversion(path: &Path, out_path: &Path, job: &Job<'_>) -> Outcome {
    let fail = |e: DbfError| (0, RowStats::default(), e);

    if job.cancel.load(Ordering::Relaxed) {
        return Err(fail(DbfError::Cancelled { rows: 0 }));
    }

    let table = open_table(&path.to_string_lossy(), job.mmap).map_err(fail)?;
    let Conversion {
        table_name,
        schema,
        mut rows,
        ..
    } = table.convert(&job.table_options).map_err(fail)?;
    let columns = schema.len();

    let file = File::create(out_path)
        .map_err(|e| DbfError::Io(format!("Cannot create {}: {}", out_path.display(), e)))
        .map_err(|e| (columns, RowStats::default(), e))?;
    let mut sink = job.format.create(BufWriter::new(file), job.batch_size);

    let result = transfer_rows(&table_name, &schema, &mut rows, sink.as_mut(), |_| {
        job.cancel.load(Ordering::Relaxed)
    });
    drop(sink);

    let stats = rows.stats();
    match result {
        Ok(()) => Ok((columns, stats)),
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(out_path) {
                log::warn!("Cannot remove {}: {}", out_path.display(), rm);
            }
            Err((columns, stats, e))
        }
    }
}

fn print_text_report(
    writer: &mut dyn Write,
    opts: &ConvertOptions,
    format: SinkFormat,
    results: &[FileReport],
    summary: &ConvertSummary,
) -> Result<(), DbfError> {
    wprintln!(
        writer,
        "Convert: {} files -> {} ({})\n",
        summary.total_files,
        opts.out_dir,
        format.extension()
    )?;

    for r in results {
        match (&r.status, &r.error) {
            (FileStatus::Converted, _) => {
                let mut label = format!("{} rows", r.stats.rows);
                if r.stats.deleted > 0 {
                    label.push_str(&format!(", {} deleted", r.stats.deleted));
                }
                if r.stats.skipped > 0 {
                    label.push_str(&format!(", {} skipped", r.stats.skipped));
                }
                let label = if r.stats.skipped > 0 {
                    label.yellow()
                } else {
                    label.green()
                };
                wprintln!(writer, "  {:<40} {}", r.file, label)?;
            }
            (status, error) => {
                let tag = if *status == FileStatus::Cancelled {
                    "CANCELLED".yellow()
                } else {
                    "ERROR".red()
                };
                let message = error
                    .as_ref()
                    .map(|e| format!("{}: {}", e.kind, e.message))
                    .unwrap_or_default();
                wprintln!(writer, "  {:<40} {}   {}", r.file, tag, message)?;
            }
        }
    }

    wprintln!(writer)?;
    wprintln!(writer, "Summary:")?;
    wprintln!(
        writer,
        "  Files: {} ({} converted{})",
        summary.total_files,
        summary.files_converted,
        if summary.files_failed > 0 {
            format!(", {} failed", summary.files_failed)
                .red()
                .to_string()
        } else {
            String::new()
        }
    )?;
    wprintln!(
        writer,
        "  Rows: {} written, {} deleted, {} skipped",
        summary.rows_written,
        summary.records_deleted,
        summary.records_skipped
    )?;
    Ok(())
}
