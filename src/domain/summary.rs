//! Run-level report aggregating per-dependency results

use super::{CheckResult, Status};
use serde::{Deserialize, Serialize};

/// Count of results per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub critical: usize,
    pub warning: usize,
    pub ok: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn from_results(results: &[CheckResult]) -> Self {
        results.iter().fold(Self::default(), |mut counts, result| {
            counts.record(result.status);
            counts
        })
    }

    fn record(&mut self, status: Status) {
        match status {
            Status::Critical => self.critical += 1,
            Status::Warning => self.warning += 1,
            Status::Ok => self.ok += 1,
            Status::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.ok + self.unknown
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Critical => self.critical,
            Status::Warning => self.warning,
            Status::Ok => self.ok,
            Status::Unknown => self.unknown,
        }
    }
}

/// Ordered results of one check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
    pub counts: StatusCounts,
    pub threshold_days: u32,
}

impl CheckReport {
    /// Builds a report; `results` are expected in final order
    pub fn new(results: Vec<CheckResult>, threshold_days: u32) -> Self {
        let counts = StatusCounts::from_results(&results);
        Self {
            results,
            counts,
            threshold_days,
        }
    }

    pub fn has_critical(&self) -> bool {
        self.counts.critical > 0
    }

    /// Process exit code: 2 when any dependency is past its end of life
    pub fn exit_code(&self) -> i32 {
        if self.has_critical() {
            2
        } else {
            0
        }
    }

    pub fn with_status(&self, status: Status) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(move |r| r.status == status)
    }
}
