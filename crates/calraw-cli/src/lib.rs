//! calraw CLI library.
//!
//! Command-line interface for the campaign-finance raw-data pipeline:
//!
//! - **Update**: full pipeline — download, clean, load (`calraw update`)
//! - **Download**: archive fetch only (`calraw download`)
//! - **Clean one file**: `calraw clean-file CVR_SO_CD.TSV`
//! - **Load one table**: `calraw load-table cvr_so`
//! - **Status**: last recorded version and runs (`calraw status`)

pub mod commands;
pub mod error;
pub mod progress;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

/// calraw - campaign-finance raw data pipeline
#[derive(Parser, Debug)]
#[command(name = "calraw")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download, clean and load the latest archive
    Update {
        /// Skip downloading the archive
        #[arg(long)]
        skip_download: bool,

        /// Skip cleaning the raw data files
        #[arg(long)]
        skip_clean: bool,

        /// Skip loading the cleaned files
        #[arg(long)]
        skip_load: bool,

        /// Keep the archive and intermediate files after each stage
        #[arg(long)]
        keep_files: bool,

        /// Run without asking for confirmation
        #[arg(long)]
        noinput: bool,

        /// Run against pre-seeded test data (skips download, keeps files)
        #[arg(long)]
        test_mode: bool,

        /// Schema registry app to load into
        #[arg(short, long, alias = "target-app", default_value = "calaccess")]
        app: String,
    },

    /// Download and extract the latest archive
    Download {
        /// Keep the archive after extraction
        #[arg(long)]
        keep_files: bool,
    },

    /// Clean one raw data file
    CleanFile {
        /// Raw file name (e.g. CVR_SO_CD.TSV)
        name: String,

        /// Keep the raw file after cleaning
        #[arg(long)]
        keep_files: bool,
    },

    /// Load one cleaned file into its table
    LoadTable {
        /// Model name (e.g. cvr_so)
        model: String,

        /// Keep the cleaned file after loading
        #[arg(long)]
        keep_files: bool,

        /// Schema registry app to load into
        #[arg(short, long, alias = "target-app", default_value = "calaccess")]
        app: String,
    },

    /// Show the last recorded version and runs
    Status,
}
