//! Output formatting for check reports
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing
//! - CSV output for spreadsheets
//! - HTML output for sharing in a browser

mod csv;
mod html;
mod json;
mod text;

pub use csv::CsvFormatter;
pub use html::HtmlFormatter;
pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::domain::CheckReport;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
    /// CSV output, one row per dependency
    Csv,
    /// Standalone HTML page
    Html,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only failing dependencies and the summary
    Quiet,
    /// Normal output
    #[default]
    Normal,
    /// Detailed output with sources and resolver notes
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Output format (text, json, csv)
    pub format: OutputFormat,
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    pub fn new(format: OutputFormat, verbosity: Verbosity) -> Self {
        Self {
            format,
            verbosity,
            color: true,
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(format: OutputFormat, verbose: bool, quiet: bool, color: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            color,
        }
    }
}

/// Run metadata printed alongside the results
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Project directory name
    pub project_name: String,
    pub project_path: PathBuf,
    pub scan_date: DateTime<Local>,
    /// Wall-clock time of the run, when measured
    pub elapsed: Option<Duration>,
}

impl ReportContext {
    pub fn new(project_path: &Path) -> Self {
        let project_name = project_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| project_path.display().to_string());
        Self {
            project_name,
            project_path: project_path.to_path_buf(),
            scan_date: Local::now(),
            elapsed: None,
        }
    }

    pub fn with_scan_date(mut self, scan_date: DateTime<Local>) -> Self {
        self.scan_date = scan_date;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format and write the full report
    fn format(
        &self,
        report: &CheckReport,
        context: &ReportContext,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
        OutputFormat::Csv => Box::new(CsvFormatter::new()),
        OutputFormat::Html => Box::new(HtmlFormatter::new()),
    }
}
