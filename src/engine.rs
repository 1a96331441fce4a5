//! Status classification, upgrade recommendation and result ordering

use crate::domain::{CheckResult, Dependency, Eol, Status, VersionRecord};
use crate::eol::Resolution;
use crate::version::{self, Version};
use chrono::{Days, NaiveDate};

/// Status and days remaining for an EOL state
///
/// `eol == today` is CRITICAL; `eol == today + threshold` is WARNING.
pub fn status_for(eol: &Eol, threshold_days: u32, today: NaiveDate) -> (Status, Option<i64>) {
    match eol {
        Eol::NotPlanned => (Status::Ok, None),
        Eol::Reached => (Status::Critical, None),
        Eol::Date(date) => {
            let days = (*date - today).num_days();
            let status = if days <= 0 {
                Status::Critical
            } else if days <= i64::from(threshold_days) {
                Status::Warning
            } else {
                Status::Ok
            };
            (status, Some(days))
        }
    }
}

/// `latest` of the newest cycle still supported past the warning window
pub fn recommend(
    known_cycles: &[VersionRecord],
    threshold_days: u32,
    today: NaiveDate,
) -> Option<String> {
    let horizon = today.checked_add_days(Days::new(u64::from(threshold_days)))?;
    known_cycles
        .iter()
        .filter(|record| record.eol.supported_after(horizon))
        .filter_map(|record| Version::parse(&record.label).ok().map(|v| (v, record)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, record)| record.upgrade_target().to_string())
}

/// Classify one dependency
///
/// Pure: the same inputs always yield the same result. `known_cycles` is
/// only consulted for CRITICAL and WARNING results.
pub fn classify(
    dependency: &Dependency,
    resolution: &Resolution,
    known_cycles: &[VersionRecord],
    threshold_days: u32,
    today: NaiveDate,
) -> CheckResult {
    let (product, record) = match resolution {
        Resolution::Resolved { product, record } => (product, record),
        Resolution::NotFound { product, .. } => {
            let mut result =
                CheckResult::unknown(dependency.clone(), resolution.note().unwrap_or_default());
            result.product = product.clone();
            return result;
        }
    };

    let (status, days_remaining) = status_for(&record.eol, threshold_days, today);

    let recommended_version = match status {
        Status::Critical | Status::Warning => recommend(known_cycles, threshold_days, today),
        Status::Ok | Status::Unknown => None,
    };

    let is_breaking_change = recommended_version
        .as_deref()
        .map(|to| version::is_major_upgrade(&dependency.resolved_version, to).unwrap_or(false))
        .unwrap_or(false);

    CheckResult {
        dependency: dependency.clone(),
        status,
        product: Some(product.clone()),
        cycle: Some(record.label.clone()),
        eol_date: record.eol_date(),
        days_remaining,
        recommended_version,
        is_breaking_change,
        note: None,
    }
}

/// CRITICAL, WARNING, OK, UNKNOWN; stable by name within a status
pub fn order_results(results: &mut [CheckResult]) {
    results.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| a.dependency.name.cmp(&b.dependency.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ecosystem;
    use crate::eol::NotFoundReason;
    use rstest::rstest;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn react_cycles() -> Vec<VersionRecord> {
        vec![
            VersionRecord::new("18", Eol::NotPlanned).with_latest("18.3.1"),
            VersionRecord::new("17", Eol::Date(date("2022-10-20"))).with_latest("17.0.2"),
            VersionRecord::new("16", Eol::Date(date("2022-06-14"))).with_latest("16.14.0"),
        ]
    }

    fn resolved(product: &str, record: VersionRecord) -> Resolution {
        Resolution::Resolved {
            product: product.to_string(),
            record,
        }
    }

    #[rstest]
    #[case(Eol::Date(date("2024-01-01")), Status::Critical, Some(0))]
    #[case(Eol::Date(date("2023-12-01")), Status::Critical, Some(-31))]
    #[case(Eol::Date(date("2024-01-02")), Status::Warning, Some(1))]
    #[case(Eol::Date(date("2024-03-31")), Status::Warning, Some(90))]
    #[case(Eol::Date(date("2024-04-01")), Status::Ok, Some(91))]
    #[case(Eol::NotPlanned, Status::Ok, None)]
    #[case(Eol::Reached, Status::Critical, None)]
    fn test_status_boundaries(
        #[case] eol: Eol,
        #[case] status: Status,
        #[case] days: Option<i64>,
    ) {
        assert_eq!(status_for(&eol, 90, date("2024-01-01")), (status, days));
    }

    #[test]
    fn react_16_past_eol_is_critical_with_breaking_upgrade() {
        let dep = Dependency::manifest("react", "16.8.0", Ecosystem::Node);
        let record = react_cycles()[2].clone();

        let result = classify(
            &dep,
            &resolved("react", record),
            &react_cycles(),
            90,
            date("2023-03-01"),
        );

        assert_eq!(result.status, Status::Critical);
        assert!(result.days_remaining.unwrap() < 0);
        assert_eq!(result.eol_date, Some(date("2022-06-14")));
        assert_eq!(result.cycle.as_deref(), Some("16"));
        assert_eq!(result.recommended_version.as_deref(), Some("18.3.1"));
        assert!(result.is_breaking_change);
    }

    #[test]
    fn warning_recommends_newest_supported_cycle() {
        let cycles = vec![
            VersionRecord::new("3.12", Eol::Date(date("2028-10-31"))).with_latest("3.12.4"),
            VersionRecord::new("3.11", Eol::Date(date("2027-10-24"))).with_latest("3.11.9"),
            VersionRecord::new("3.8", Eol::Date(date("2024-10-07"))).with_latest("3.8.19"),
        ];
        let dep = Dependency::manifest("python", "3.8.10", Ecosystem::Python);

        let result = classify(
            &dep,
            &resolved("python", cycles[2].clone()),
            &cycles,
            90,
            date("2024-08-01"),
        );

        assert_eq!(result.status, Status::Warning);
        assert_eq!(result.recommended_version.as_deref(), Some("3.12.4"));
        assert!(!result.is_breaking_change);
    }

    #[test]
    fn no_recommendation_when_every_cycle_is_ending() {
        let cycles = vec![VersionRecord::new("1", Eol::Date(date("2024-02-01")))];
        let dep = Dependency::manifest("python", "1.0", Ecosystem::Python);

        let resolution = resolved("python", cycles[0].clone());
        let result = classify(&dep, &resolution, &cycles, 90, date("2024-01-01"));
        assert_eq!(result.status, Status::Warning);
        assert_eq!(result.recommended_version, None);
        assert!(!result.is_breaking_change);
    }

    #[test]
    fn recommendation_falls_back_to_label() {
        let cycles = vec![VersionRecord::new("5.0", Eol::NotPlanned)];
        assert_eq!(recommend(&cycles, 90, date("2024-01-01")).as_deref(), Some("5.0"));
    }

    #[test]
    fn ok_result_has_no_recommendation() {
        let dep = Dependency::manifest("react", "18.2.0", Ecosystem::Node);
        let result = classify(
            &dep,
            &resolved("react", react_cycles()[0].clone()),
            &react_cycles(),
            90,
            date("2024-01-01"),
        );
        assert_eq!(result.status, Status::Ok);
        assert_eq!(result.days_remaining, None);
        assert_eq!(result.recommended_version, None);
    }

    #[test]
    fn unparseable_current_version_is_not_breaking() {
        let dep = Dependency::manifest("react", "next", Ecosystem::Node);
        let result = classify(
            &dep,
            &resolved("react", react_cycles()[2].clone()),
            &react_cycles(),
            90,
            date("2023-03-01"),
        );
        assert_eq!(result.recommended_version.as_deref(), Some("18.3.1"));
        assert!(!result.is_breaking_change);
    }

    #[test]
    fn not_found_is_unknown_with_note() {
        let dep = Dependency::manifest("left-pad", "1.3.0", Ecosystem::Node);
        let resolution = Resolution::not_found(NotFoundReason::Unmapped, None);

        let result = classify(&dep, &resolution, &[], 90, date("2024-01-01"));
        assert_eq!(result.status, Status::Unknown);
        assert_eq!(result.eol_date, None);
        assert_eq!(result.recommended_version, None);
        assert_eq!(result.note.as_deref(), Some("not tracked by endoflife.date"));
    }

    #[test]
    fn classify_is_pure() {
        let dep = Dependency::manifest("react", "16.8.0", Ecosystem::Node);
        let resolution = resolved("react", react_cycles()[2].clone());
        let a = classify(&dep, &resolution, &react_cycles(), 90, date("2023-03-01"));
        let b = classify(&dep, &resolution, &react_cycles(), 90, date("2023-03-01"));
        assert_eq!(a, b);
    }

    #[test]
    fn ordering_by_severity_then_name() {
        let mk = |name: &str, status: Status| {
            let dep = Dependency::manifest(name, "1.0", Ecosystem::Node);
            let mut r = CheckResult::unknown(dep, "");
            r.status = status;
            r
        };
        let mut results = vec![
            mk("zeta", Status::Unknown),
            mk("beta", Status::Ok),
            mk("alpha", Status::Ok),
            mk("gamma", Status::Warning),
            mk("delta", Status::Critical),
        ];
        order_results(&mut results);
        let names: Vec<&str> = results.iter().map(|r| r.dependency.name.as_str()).collect();
        assert_eq!(names, vec!["delta", "gamma", "alpha", "beta", "zeta"]);
    }
}
