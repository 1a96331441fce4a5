//! Per-dependency classification results

use super::Dependency;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// EOL status, ordered by severity (most severe first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// End of life reached
    Critical,
    /// End of life within the warning threshold
    Warning,
    /// Supported beyond the warning threshold
    Ok,
    /// No EOL data could be found
    Unknown,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Critical => "CRITICAL",
            Status::Warning => "WARNING",
            Status::Ok => "OK",
            Status::Unknown => "UNKNOWN",
        }
    }

    pub fn all() -> &'static [Status] {
        &[Status::Critical, Status::Warning, Status::Ok, Status::Unknown]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of one aggregated dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub dependency: Dependency,
    pub status: Status,
    /// Dataset product the dependency resolved to
    pub product: Option<String>,
    /// Release cycle matched in the dataset
    pub cycle: Option<String>,
    pub eol_date: Option<NaiveDate>,
    /// Negative once the EOL date has passed
    pub days_remaining: Option<i64>,
    pub recommended_version: Option<String>,
    pub is_breaking_change: bool,
    /// Why the status is UNKNOWN, when it is
    pub note: Option<String>,
}

impl CheckResult {
    /// An UNKNOWN result carrying the reason
    pub fn unknown(dependency: Dependency, note: impl Into<String>) -> Self {
        Self {
            dependency,
            status: Status::Unknown,
            product: None,
            cycle: None,
            eol_date: None,
            days_remaining: None,
            recommended_version: None,
            is_breaking_change: false,
            note: Some(note.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        let mut statuses = vec![Status::Unknown, Status::Ok, Status::Critical, Status::Warning];
        statuses.sort();
        assert_eq!(statuses, Status::all());
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Status::Critical).unwrap(), "\"CRITICAL\"");
        assert_eq!(serde_json::to_string(&Status::Ok).unwrap(), "\"OK\"");
    }
}
