//! Text output formatter for human-readable display
//!
//! This module provides:
//! - A report header with project, scan date, threshold and elapsed time
//! - Results grouped by status, most severe first
//! - Upgrade recommendations with breaking-change markers
//! - A one-line summary

use crate::domain::{CheckReport, CheckResult, Status, StatusCounts};
use crate::output::{OutputFormatter, ReportContext, Verbosity};
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    /// Quiet runs only list what needs action
    fn shows(&self, status: Status) -> bool {
        match self.verbosity {
            Verbosity::Quiet => matches!(status, Status::Critical | Status::Warning),
            Verbosity::Normal | Verbosity::Verbose => true,
        }
    }

    fn paint_status(&self, status: Status, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match status {
            Status::Critical => text.red().bold().to_string(),
            Status::Warning => text.yellow().bold().to_string(),
            Status::Ok => text.green().to_string(),
            Status::Unknown => text.dimmed().to_string(),
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn write_header(
        &self,
        report: &CheckReport,
        context: &ReportContext,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let title = format!(
            "End-of-life report for {} ({})",
            context.project_name,
            context.project_path.display()
        );
        if self.color {
            writeln!(writer, "{}", title.bold())?;
        } else {
            writeln!(writer, "{}", title)?;
        }

        let mut details = format!(
            "Scan date: {} | threshold: {} days",
            context.scan_date.format("%Y-%m-%d %H:%M:%S"),
            report.threshold_days
        );
        if let Some(elapsed) = context.elapsed {
            details.push_str(&format!(" | elapsed: {}", format_elapsed(elapsed)));
        }
        writeln!(writer, "{}", self.dim(&details))?;
        writeln!(writer)
    }

    /// Describe the EOL position of one result
    fn describe(&self, result: &CheckResult) -> String {
        match (result.status, result.eol_date, result.days_remaining) {
            (Status::Critical, Some(date), Some(days)) if days == 0 => {
                format!("EOL today ({})", date)
            }
            (Status::Critical, Some(date), Some(days)) => {
                format!("EOL since {} ({} days ago)", date, days.abs())
            }
            (Status::Critical, _, _) => "has reached end of life".to_string(),
            (Status::Warning, Some(date), Some(days)) => format!("EOL in {} days ({})", days, date),
            (Status::Ok, Some(date), Some(days)) => format!("EOL in {} days ({})", days, date),
            (Status::Ok, _, _) => "no EOL date announced".to_string(),
            _ => result
                .note
                .clone()
                .unwrap_or_else(|| "no EOL information available".to_string()),
        }
    }

    fn write_result(
        &self,
        result: &CheckResult,
        name_width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let dep = &result.dependency;
        let name = format!("{:width$}", dep.name, width = name_width);
        let version = format!("{:12}", dep.resolved_version);
        let description = self.describe(result);

        if self.color {
            writeln!(writer, "  {} {} {}", name.bold(), version.dimmed(), description)?;
        } else {
            writeln!(writer, "  {} {} {}", name, version, description)?;
        }

        let indent = " ".repeat(name_width + 3);
        if let Some(ref recommended) = result.recommended_version {
            let mut line = format!("→ upgrade to {}", recommended);
            if result.is_breaking_change {
                line.push_str(" (major version change)");
            }
            let line = if self.color && result.is_breaking_change {
                line.yellow().to_string()
            } else {
                line
            };
            writeln!(writer, "{}{}", indent, line)?;
        }

        if self.verbosity == Verbosity::Verbose {
            let mut facts = vec![
                dep.ecosystem.display_name().to_string(),
                if dep.is_direct { "direct" } else { "transitive" }.to_string(),
            ];
            if let (Some(product), Some(cycle)) = (&result.product, &result.cycle) {
                facts.push(format!("{} {}", product, cycle));
            }
            if !dep.source_file.as_os_str().is_empty() {
                facts.push(dep.source_file.display().to_string());
            }
            let known = matches!(result.status, Status::Critical | Status::Warning | Status::Ok);
            if let (Some(note), true) = (&result.note, known) {
                facts.push(note.clone());
            }
            let facts = format!("[{}]", facts.join(", "));
            writeln!(writer, "{}{}", indent, self.dim(&facts))?;
        }

        Ok(())
    }

    fn write_summary(
        &self,
        counts: &StatusCounts,
        threshold_days: u32,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if counts.total() == 0 {
            return writeln!(writer, "No dependencies found or analyzed");
        }

        let parts: Vec<String> = Status::all()
            .iter()
            .map(|&status| {
                let text = format!("{} {}", counts.get(status), status.label().to_lowercase());
                if counts.get(status) > 0 {
                    self.paint_status(status, &text)
                } else {
                    text
                }
            })
            .collect();

        writeln!(
            writer,
            "Summary: {} ({} dependencies, warning threshold {} days)",
            parts.join(", "),
            counts.total(),
            threshold_days
        )
    }
}

impl OutputFormatter for TextFormatter {
    fn format(
        &self,
        report: &CheckReport,
        context: &ReportContext,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write_header(report, context, writer)?;

        let name_width = report
            .results
            .iter()
            .map(|r| r.dependency.name.len())
            .max()
            .unwrap_or(0)
            .max(20);

        for &status in Status::all() {
            let group: Vec<&CheckResult> = report.with_status(status).collect();
            if group.is_empty() || !self.shows(status) {
                continue;
            }

            let heading = format!("{} ({})", status.label(), group.len());
            writeln!(writer, "{}", self.paint_status(status, &heading))?;
            for result in group {
                self.write_result(result, name_width, writer)?;
            }
            writeln!(writer)?;
        }

        self.write_summary(&report.counts, report.threshold_days, writer)
    }
}

/// `350 ms`, `2.50 s`, `1 min 5.00 s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0} ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.2} s", secs)
    } else {
        let minutes = (secs / 60.0).floor();
        format!("{} min {:.2} s", minutes as u64, secs - minutes * 60.0)
    }
}
