//! CSV output formatter
//!
//! One header row, then one row per result in report order. Fields are
//! quoted per RFC 4180 and rows end with CRLF.

use crate::domain::{CheckReport, CheckResult};
use crate::output::{OutputFormatter, ReportContext};
use std::borrow::Cow;
use std::io::Write;

const HEADER: [&str; 14] = [
    "Project",
    "Name",
    "Version",
    "Declared Version",
    "Ecosystem",
    "Direct",
    "Status",
    "Product",
    "Cycle",
    "EOL Date",
    "Days Remaining",
    "Recommended Version",
    "Breaking Change",
    "Note",
];

/// CSV formatter for spreadsheet import
#[derive(Debug, Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn new() -> Self {
        Self
    }

    fn row(project: &str, result: &CheckResult) -> Vec<String> {
        let dep = &result.dependency;
        let yes_no = |flag: bool| if flag { "yes" } else { "no" }.to_string();
        vec![
            project.to_string(),
            dep.name.clone(),
            dep.resolved_version.clone(),
            dep.declared_version.clone(),
            dep.ecosystem.display_name().to_string(),
            yes_no(dep.is_direct),
            result.status.label().to_string(),
            result.product.clone().unwrap_or_default(),
            result.cycle.clone().unwrap_or_default(),
            result.eol_date.map(|d| d.to_string()).unwrap_or_default(),
            result.days_remaining.map(|d| d.to_string()).unwrap_or_default(),
            result.recommended_version.clone().unwrap_or_default(),
            yes_no(result.is_breaking_change),
            result.note.clone().unwrap_or_default(),
        ]
    }
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn write_row<S: AsRef<str>>(writer: &mut dyn Write, fields: &[S]) -> std::io::Result<()> {
    let line: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f.as_ref())).collect();
    write!(writer, "{}\r\n", line.join(","))
}

impl OutputFormatter for CsvFormatter {
    fn format(
        &self,
        report: &CheckReport,
        context: &ReportContext,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        write_row(writer, &HEADER)?;
        for result in &report.results {
            write_row(writer, &Self::row(&context.project_name, result))?;
        }
        Ok(())
    }
}
