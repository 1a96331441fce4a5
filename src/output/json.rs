//! JSON output formatter for machine processing

use crate::domain::{CheckReport, CheckResult, Ecosystem, Status, StatusCounts};
use crate::output::{OutputFormatter, ReportContext};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
struct JsonOutput<'a> {
    project_name: &'a str,
    project_path: String,
    /// RFC 3339 timestamp
    scan_date: String,
    threshold_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u128>,
    summary: JsonSummary,
    dependencies: Vec<JsonDependency<'a>>,
}

#[derive(Serialize)]
struct JsonSummary {
    #[serde(flatten)]
    counts: StatusCounts,
    total: usize,
}

/// JSON representation of one result
#[derive(Serialize)]
struct JsonDependency<'a> {
    name: &'a str,
    version: &'a str,
    declared_version: &'a str,
    ecosystem: Ecosystem,
    direct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    status: Status,
    product: Option<&'a str>,
    cycle: Option<&'a str>,
    eol_date: Option<NaiveDate>,
    days_remaining: Option<i64>,
    recommended_version: Option<&'a str>,
    breaking_change: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

impl<'a> From<&'a CheckResult> for JsonDependency<'a> {
    fn from(result: &'a CheckResult) -> Self {
        let dep = &result.dependency;
        Self {
            name: &dep.name,
            version: &dep.resolved_version,
            declared_version: &dep.declared_version,
            ecosystem: dep.ecosystem,
            direct: dep.is_direct,
            source: (!dep.source_file.as_os_str().is_empty())
                .then(|| dep.source_file.display().to_string()),
            status: result.status,
            product: result.product.as_deref(),
            cycle: result.cycle.as_deref(),
            eol_date: result.eol_date,
            days_remaining: result.days_remaining,
            recommended_version: result.recommended_version.as_deref(),
            breaking_change: result.is_breaking_change,
            note: result.note.as_deref(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(
        &self,
        report: &CheckReport,
        context: &ReportContext,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonOutput {
            project_name: &context.project_name,
            project_path: context.project_path.display().to_string(),
            scan_date: context.scan_date.to_rfc3339(),
            threshold_days: report.threshold_days,
            elapsed_ms: context.elapsed.map(|e| e.as_millis()),
            summary: JsonSummary {
                counts: report.counts,
                total: report.counts.total(),
            },
            dependencies: report.results.iter().map(JsonDependency::from).collect(),
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::{sample_context, sample_report};
    use serde_json::Value;

    fn render() -> Value {
        let mut out = Vec::new();
        JsonFormatter::new()
            .format(&sample_report(), &sample_context(), &mut out)
            .unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_json_header_and_summary() {
        let json = render();
        assert_eq!(json["project_name"], "web-app");
        assert_eq!(json["threshold_days"], 90);
        assert!(json["scan_date"].as_str().unwrap().starts_with("2023-03-01T09:30:00"));
        assert!(json.get("elapsed_ms").is_none());
        assert_eq!(json["summary"]["critical"], 1);
        assert_eq!(json["summary"]["ok"], 1);
        assert_eq!(json["summary"]["unknown"], 1);
        assert_eq!(json["summary"]["total"], 3);
    }

    #[test]
    fn test_json_dependency_fields() {
        let json = render();
        let react = &json["dependencies"][0];
        assert_eq!(react["name"], "react");
        assert_eq!(react["version"], "16.8.0");
        assert_eq!(react["declared_version"], "^16.8.0");
        assert_eq!(react["ecosystem"], "node");
        assert_eq!(react["status"], "CRITICAL");
        assert_eq!(react["eol_date"], "2022-06-14");
        assert_eq!(react["days_remaining"], -260);
        assert_eq!(react["recommended_version"], "18.3.1");
        assert_eq!(react["breaking_change"], true);

        let left_pad = &json["dependencies"][2];
        assert_eq!(left_pad["status"], "UNKNOWN");
        assert_eq!(left_pad["direct"], false);
        assert!(left_pad["eol_date"].is_null());
        assert_eq!(left_pad["note"], "not tracked by endoflife.date");
    }
}
