//! HTML output formatter
//!
//! A standalone page: run metadata, per-status summary lines and one table
//! row per result in report order.

use crate::domain::{CheckReport, CheckResult, Status};
use crate::output::text::format_elapsed;
use crate::output::{OutputFormatter, ReportContext};
use std::borrow::Cow;
use std::io::Write;

const STYLE: &str = "\
    body { font-family: Arial, sans-serif; margin: 20px; }
    h1 { color: #333; }
    .summary { margin: 20px 0; }
    .critical { color: #d9534f; }
    .warning { color: #f0ad4e; }
    .ok { color: #5cb85c; }
    .unknown { color: #777; }
    table { border-collapse: collapse; width: 100%; }
    th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
    th { background-color: #f2f2f2; }
    tr:nth-child(even) { background-color: #f9f9f9; }
    .breaking { font-weight: bold; }";

const COLUMNS: [&str; 9] = [
    "Status",
    "Name",
    "Version",
    "Ecosystem",
    "Cycle",
    "EOL Date",
    "Days Remaining",
    "Recommended Version",
    "Note",
];

/// HTML formatter for sharing reports in a browser
#[derive(Debug, Default)]
pub struct HtmlFormatter;

impl HtmlFormatter {
    pub fn new() -> Self {
        Self
    }

    fn write_summary(report: &CheckReport, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "  <div class=\"summary\">")?;
        writeln!(writer, "    <h2>Summary</h2>")?;

        let counts = &report.counts;
        if counts.total() == 0 {
            writeln!(writer, "    <p>No dependencies found or analyzed</p>")?;
        }
        let lines = [
            (Status::Critical, "have reached end of life".to_string()),
            (
                Status::Warning,
                format!("reach end of life within {} days", report.threshold_days),
            ),
            (Status::Ok, "are supported".to_string()),
            (Status::Unknown, "have no end-of-life data".to_string()),
        ];
        for (status, text) in lines {
            let count = counts.get(status);
            if count > 0 {
                writeln!(
                    writer,
                    "    <p class=\"{}\">{}: {} dependencies {}</p>",
                    css_class(status),
                    status.label(),
                    count,
                    escape(&text)
                )?;
            }
        }

        writeln!(writer, "  </div>")
    }

    fn write_row(result: &CheckResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let dep = &result.dependency;
        let days = match result.days_remaining {
            Some(days) if days < 0 => format!("{} days ago", days.abs()),
            Some(days) => format!("{} days", days),
            None => "-".to_string(),
        };
        let recommended = match result.recommended_version {
            Some(ref version) if result.is_breaking_change => {
                format!("<span class=\"breaking\">{} (major)</span>", escape(version))
            }
            Some(ref version) => escape(version).into_owned(),
            None => "-".to_string(),
        };
        let cells = [
            escape(dep.name.as_str()).into_owned(),
            escape(dep.resolved_version.as_str()).into_owned(),
            escape(dep.ecosystem.display_name()).into_owned(),
            escape(result.cycle.as_deref().unwrap_or("-")).into_owned(),
            result.eol_date.map_or_else(|| "-".to_string(), |d| d.to_string()),
            days,
            recommended,
            escape(result.note.as_deref().unwrap_or("")).into_owned(),
        ];

        writeln!(writer, "      <tr class=\"{}\">", css_class(result.status))?;
        writeln!(writer, "        <td>{}</td>", result.status.label())?;
        for cell in cells {
            writeln!(writer, "        <td>{}</td>", cell)?;
        }
        writeln!(writer, "      </tr>")
    }
}

fn css_class(status: Status) -> &'static str {
    match status {
        Status::Critical => "critical",
        Status::Warning => "warning",
        Status::Ok => "ok",
        Status::Unknown => "unknown",
    }
}

/// Escape text for element content and double-quoted attributes
fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

impl OutputFormatter for HtmlFormatter {
    fn format(
        &self,
        report: &CheckReport,
        context: &ReportContext,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let project_name = escape(&context.project_name);
        let project_path = context.project_path.display().to_string();

        writeln!(writer, "<!DOCTYPE html>")?;
        writeln!(writer, "<html lang=\"en\">")?;
        writeln!(writer, "<head>")?;
        writeln!(writer, "  <meta charset=\"UTF-8\">")?;
        writeln!(writer, "  <title>End-of-life report for {}</title>", project_name)?;
        writeln!(writer, "  <style>\n{}\n  </style>", STYLE)?;
        writeln!(writer, "</head>")?;
        writeln!(writer, "<body>")?;

        writeln!(writer, "  <h1>End-of-life report for {}</h1>", project_name)?;
        writeln!(writer, "  <p><strong>Project:</strong> {}</p>", escape(&project_path))?;
        let mut details = format!(
            "<strong>Scan date:</strong> {} | <strong>Threshold:</strong> {} days",
            context.scan_date.format("%Y-%m-%d %H:%M:%S"),
            report.threshold_days
        );
        if let Some(elapsed) = context.elapsed {
            details.push_str(&format!(" | <strong>Elapsed:</strong> {}", format_elapsed(elapsed)));
        }
        writeln!(writer, "  <p>{}</p>", details)?;

        Self::write_summary(report, writer)?;

        if !report.results.is_empty() {
            writeln!(writer, "  <div class=\"details\">")?;
            writeln!(writer, "    <h2>Details</h2>")?;
            writeln!(writer, "    <table>")?;
            writeln!(writer, "      <tr>")?;
            for column in COLUMNS {
                writeln!(writer, "        <th>{}</th>", column)?;
            }
            writeln!(writer, "      </tr>")?;
            for result in &report.results {
                Self::write_row(result, writer)?;
            }
            writeln!(writer, "    </table>")?;
            writeln!(writer, "  </div>")?;
        }

        writeln!(writer, "</body>")?;
        writeln!(writer, "</html>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CheckReport, Dependency, Ecosystem};
    use crate::output::fixtures::{sample_context, sample_report};

    fn render(report: &CheckReport) -> String {
        let mut out = Vec::new();
        HtmlFormatter::new()
            .format(report, &sample_context(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("react"), "react");
        assert_eq!(
            escape("<script>\"a\" & 'b'</script>"),
            "&lt;script&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_html_report() {
        let html = render(&sample_report());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>End-of-life report for web-app</h1>"));
        assert!(html.contains(
            "<p class=\"critical\">CRITICAL: 1 dependencies have reached end of life</p>"
        ));
        assert!(html.contains("<p class=\"ok\">OK: 1 dependencies are supported</p>"));
        assert!(!html.contains("class=\"warning\">WARNING"));
        assert!(html.contains("<td>260 days ago</td>"));
        assert!(html.contains("<span class=\"breaking\">18.3.1 (major)</span>"));
        assert!(html.contains("<td>not tracked by endoflife.date</td>"));
        assert_eq!(html.matches("<tr class=").count(), 3);
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_rows_follow_report_order() {
        let html = render(&sample_report());
        let react = html.find("<td>react</td>").unwrap();
        let django = html.find("<td>django</td>").unwrap();
        let left_pad = html.find("<td>left-pad</td>").unwrap();
        assert!(react < django && django < left_pad);
    }

    #[test]
    fn test_names_are_escaped() {
        let result = CheckResult::unknown(
            Dependency::manifest("<img src=x>", "1.0.0", Ecosystem::Node),
            "lookup failed: <timeout>",
        );
        let html = render(&CheckReport::new(vec![result], 90));

        assert!(html.contains("<td>&lt;img src=x&gt;</td>"));
        assert!(html.contains("lookup failed: &lt;timeout&gt;"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_empty_report() {
        let html = render(&CheckReport::new(vec![], 90));
        assert!(html.contains("No dependencies found or analyzed"));
        assert!(!html.contains("<table>"));
    }
}
