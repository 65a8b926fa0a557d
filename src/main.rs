#[cfg(not(feature = "cli"))]
compile_error!("The `dbfsql` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dbf::cli;
use dbf::cli::app::{Cli, ColorMode, Commands, LogLevel};
use dbf::DbfError;

fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.log_level);

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, DbfError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(BufWriter::new(f)) as Box<dyn Write>)
            .map_err(|e| DbfError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // First Ctrl-C asks workers to stop between rows
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("Interrupted, stopping after the current row...");
            cancel.store(true, Ordering::Relaxed);
        }) {
            log::warn!("Cannot install Ctrl-C handler: {}", e);
        }
    }

    let result = match cli.command {
        Commands::Convert {
            sources,
            out_dir,
            format,
            batch_size,
            skip_bad_records,
            lenient_flags,
            journal,
            json,
        } => cli::convert::execute(
            &cli::convert::ConvertOptions {
                sources,
                out_dir,
                format,
                batch_size,
                skip_bad_records,
                lenient_flags,
                threads: cli.threads,
                mmap: cli.mmap,
                journal,
                json,
                cancel: Arc::clone(&cancel),
            },
            &mut writer,
        ),

        Commands::Info { file, json } => cli::info::execute(
            &cli::info::InfoOptions {
                file,
                json,
                mmap: cli.mmap,
            },
            &mut writer,
        ),

        Commands::Schema { file, table, json } => cli::schema::execute(
            &cli::schema::SchemaOptions {
                file,
                table,
                json,
                mmap: cli.mmap,
            },
            &mut writer,
        ),

        Commands::Export {
            file,
            format,
            batch_size,
            skip_bad_records,
            lenient_flags,
        } => cli::export::execute(
            &cli::export::ExportOptions {
                file,
                format,
                batch_size,
                skip_bad_records,
                lenient_flags,
                mmap: cli.mmap,
                cancel: Arc::clone(&cancel),
            },
            &mut writer,
        ),

        Commands::Dump {
            file,
            record,
            header,
            raw,
        } => cli::dump::execute(
            &cli::dump::DumpOptions {
                file,
                record,
                header,
                raw,
                mmap: cli.mmap,
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "dbfsql", &mut std::io::stdout());
            Ok(())
        }
    };

    let flushed = writer
        .flush()
        .map_err(|e| DbfError::Io(format!("Cannot flush output: {}", e)));

    if let Err(e) = result.and(flushed) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
