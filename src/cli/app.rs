use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "dbfsql")]
#[command(about = "dBASE Level 7 table conversion toolkit")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Maximum number of files converted at once (0 = number of CPUs)
    #[arg(short = 't', long, default_value = "0", global = true)]
    pub threads: usize,

    /// Use memory-mapped I/O for source files
    #[arg(long, global = true)]
    pub mmap: bool,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert .dbf tables to SQL scripts, CSV or JSON lines
    Convert {
        /// Source files or patterns (e.g. "$DATA/*.dbf")
        #[arg(required = true)]
        sources: Vec<String>,

        /// Directory for the converted files
        #[arg(short = 'd', long = "out-dir", default_value = ".")]
        out_dir: String,

        /// Output format: sql, csv, or json
        #[arg(short = 'F', long, default_value = "sql")]
        format: String,

        /// Rows per INSERT statement (sql format)
        #[arg(long = "batch-size", default_value = "1000")]
        batch_size: usize,

        /// Skip records that fail to decode instead of failing the file
        #[arg(long = "skip-bad-records")]
        skip_bad_records: bool,

        /// Treat any deletion flag other than 0x20 as deleted
        #[arg(long = "lenient-flags")]
        lenient_flags: bool,

        /// Append NDJSON conversion events to this file
        #[arg(long)]
        journal: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the table header and field descriptors
    Info {
        /// Path to the .dbf file
        #[arg(short, long)]
        file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the derived column schema and CREATE TABLE statement
    Schema {
        /// Path to the .dbf file
        #[arg(short, long)]
        file: String,

        /// Destination table name (default: file stem)
        #[arg(long)]
        table: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Stream the rows of one table
    Export {
        /// Path to the .dbf file
        #[arg(short, long)]
        file: String,

        /// Output format: sql, csv, or json
        #[arg(short = 'F', long, default_value = "csv")]
        format: String,

        /// Rows per INSERT statement (sql format)
        #[arg(long = "batch-size", default_value = "1000")]
        batch_size: usize,

        /// Skip records that fail to decode
        #[arg(long = "skip-bad-records")]
        skip_bad_records: bool,

        /// Treat any deletion flag other than 0x20 as deleted
        #[arg(long = "lenient-flags")]
        lenient_flags: bool,
    },

    /// Hex dump of the header area or a single record
    Dump {
        /// Path to the .dbf file
        #[arg(short, long)]
        file: String,

        /// Zero-based record index to dump
        #[arg(short, long, conflicts_with = "header")]
        record: Option<u32>,

        /// Dump the header and field descriptor area
        #[arg(long)]
        header: bool,

        /// Output raw binary bytes (no formatting)
        #[arg(long)]
        raw: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
