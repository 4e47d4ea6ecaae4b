#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the daily crime report pipeline.
//!
//! Exits `0` on a clean run, `2` when output was written but has parse
//! errors or too few rows, and `1` on fatal errors.
//!
//! Uses `indicatif-log-bridge` (via [`crime_report_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the download bar never fight for the terminal.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::commands::OutputOptions;
use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "crime_report",
    about = "Daily crime report PDF to JSON pipeline"
)]
struct Cli {
    /// Config file to use instead of the built-in `crime_report.toml`
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a report PDF to `<json_dir>/YYYYMMDD.json`
    Process {
        /// Path to the report PDF
        pdf: PathBuf,
        /// Name the output by this date (YYYY-MM-DD) instead of the date
        /// read from the report header
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Directory for the JSON output (overrides `paths.json_dir`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Also copy the PDF to `<pdf_dir>/YYYYMMDD.pdf`
        #[arg(long)]
        archive: bool,
        /// Let an empty extraction replace an existing report
        #[arg(long)]
        force: bool,
    },
    /// Download the current report, then extract and archive it
    Fetch {
        /// Report URL (overrides `fetch.url`)
        #[arg(long)]
        url: Option<String>,
        /// Name the output by this date (YYYY-MM-DD) instead of the date
        /// read from the report header
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Directory for the JSON output (overrides `paths.json_dir`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Let an empty extraction replace an existing report
        #[arg(long)]
        force: bool,
    },
    /// Rebuild `manifest.json` from the dated reports in a directory
    Manifest {
        /// Report directory (defaults to `paths.json_dir`)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Export stored reports to CSV
    Csv {
        /// JSON report file or directory (defaults to `paths.json_dir`)
        input: Option<PathBuf>,
        /// Output CSV file or directory (defaults under `paths.csv_dir`)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Combine every report into a single `combined.csv`
        #[arg(long)]
        combined: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let multi = crime_report_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    let status = match cli.command {
        Commands::Process {
            pdf,
            date,
            output_dir,
            archive,
            force,
        } => {
            let options = OutputOptions::new(&config.paths, date, output_dir, force);
            commands::process(&pdf, archive, &options, &config)?
        }
        Commands::Fetch {
            url,
            date,
            output_dir,
            force,
        } => {
            let options = OutputOptions::new(&config.paths, date, output_dir, force);
            commands::fetch(url, &options, &config, &multi).await?
        }
        Commands::Manifest { dir } => {
            let dir = dir.unwrap_or_else(|| config.paths.json_dir.clone());
            commands::rebuild_manifest(&dir)?
        }
        Commands::Csv {
            input,
            output,
            combined,
        } => commands::csv(input, output, combined, &config.paths)?,
    };

    if status == commands::RunStatus::NeedsReview {
        log::warn!("Finished with problems that need review");
    }
    Ok(status.exit_code())
}
