//! EOL dataset records as stored in the cache

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// End-of-life state of a release cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum Eol {
    /// Support ends (or ended) on this date
    Date(NaiveDate),
    /// The dataset says `eol: false`; no end of life is planned
    NotPlanned,
    /// The dataset says `eol: true` without publishing a date
    Reached,
}

impl Eol {
    /// The end-of-life date, if one is published
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Eol::Date(date) => Some(*date),
            Eol::NotPlanned | Eol::Reached => None,
        }
    }

    /// True when the cycle is still supported strictly after `day`
    pub fn supported_after(&self, day: NaiveDate) -> bool {
        match self {
            Eol::Date(date) => *date > day,
            Eol::NotPlanned => true,
            Eol::Reached => false,
        }
    }
}

/// One release cycle of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Cycle label, e.g. `16` for React or `3.11` for Python
    pub label: String,
    pub eol: Eol,
    /// Latest release within the cycle
    pub latest: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub is_lts: bool,
}

impl VersionRecord {
    pub fn new(label: impl Into<String>, eol: Eol) -> Self {
        Self {
            label: label.into(),
            eol,
            latest: None,
            release_date: None,
            is_lts: false,
        }
    }

    pub fn with_latest(mut self, latest: impl Into<String>) -> Self {
        self.latest = Some(latest.into());
        self
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn with_lts(mut self, is_lts: bool) -> Self {
        self.is_lts = is_lts;
        self
    }

    pub fn eol_date(&self) -> Option<NaiveDate> {
        self.eol.date()
    }

    /// Version to recommend when upgrading into this cycle
    pub fn upgrade_target(&self) -> &str {
        self.latest.as_deref().unwrap_or(&self.label)
    }
}

/// Whether the dataset knows a product at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAvailability {
    pub product: String,
    pub is_available: bool,
    pub checked_at: DateTime<Utc>,
}

impl ProductAvailability {
    pub fn new(product: impl Into<String>, is_available: bool) -> Self {
        Self {
            product: product.into(),
            is_available,
            checked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_eol_supported_after() {
        let day = date("2024-01-01");
        assert!(Eol::NotPlanned.supported_after(day));
        assert!(!Eol::Reached.supported_after(day));
        assert!(Eol::Date(date("2024-01-02")).supported_after(day));
        assert!(!Eol::Date(day).supported_after(day));
    }

    #[test]
    fn test_upgrade_target_prefers_latest() {
        let record = VersionRecord::new("18", Eol::NotPlanned).with_latest("18.3.1");
        assert_eq!(record.upgrade_target(), "18.3.1");
        let bare = VersionRecord::new("18", Eol::NotPlanned);
        assert_eq!(bare.upgrade_target(), "18");
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = VersionRecord::new("3.11", Eol::Date(date("2027-10-24")))
            .with_latest("3.11.9")
            .with_release_date(date("2022-10-24"));
        let json = serde_json::to_string(&record).unwrap();
        let parsed: VersionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
