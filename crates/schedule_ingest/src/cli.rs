//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "schedule_ingest",
    version,
    about = "Scrape timetable pages into courses and reconcile them against stored courses"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file (layout constants, lookup tables, HTTP settings).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a saved timetable page and print its courses.
    Parse {
        #[arg(value_name = "HTML_FILE")]
        page: PathBuf,
    },

    /// Fetch timetable pages and print the courses of each.
    Fetch {
        /// Absolute URLs, or paths relative to `fetch.base_url`.
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// Print the course events needed to move stored courses to a page's courses.
    Diff {
        /// JSON array of stored courses (each with an `id`).
        #[arg(value_name = "STORED_JSON")]
        stored: PathBuf,

        #[arg(value_name = "HTML_FILE")]
        page: PathBuf,
    },
}
