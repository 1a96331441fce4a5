//! Ordered fallback strategies for locating a version's release cycle

use crate::domain::VersionRecord;
use crate::error::ResolutionError;
use crate::version::{self, Version};
use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

/// Cycle lookups the strategies run against (cache first, then remote)
#[async_trait]
pub trait CycleLookup: Send + Sync {
    async fn cycle(&self, product: &str, label: &str)
        -> Result<Option<VersionRecord>, ResolutionError>;

    async fn cycles(&self, product: &str) -> Result<Vec<VersionRecord>, ResolutionError>;
}

/// One way of matching a version to a release cycle
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        lookup: &dyn CycleLookup,
        product: &str,
        version: &str,
    ) -> Result<Option<VersionRecord>, ResolutionError>;
}

/// Cycle labelled exactly as the version (`3.11` for Python 3.11)
pub struct ExactLabel;

#[async_trait]
impl ResolutionStrategy for ExactLabel {
    fn name(&self) -> &'static str {
        "exact"
    }

    async fn attempt(
        &self,
        lookup: &dyn CycleLookup,
        product: &str,
        version: &str,
    ) -> Result<Option<VersionRecord>, ResolutionError> {
        lookup.cycle(product, version.trim()).await
    }
}

/// Cycle labelled with the version's `major.minor`
pub struct MajorMinor;

#[async_trait]
impl ResolutionStrategy for MajorMinor {
    fn name(&self) -> &'static str {
        "major-minor"
    }

    async fn attempt(
        &self,
        lookup: &dyn CycleLookup,
        product: &str,
        version: &str,
    ) -> Result<Option<VersionRecord>, ResolutionError> {
        let Ok(key) = version::major_minor_key(version) else {
            return Ok(None);
        };
        if key == version.trim() {
            // Same request as the exact lookup
            return Ok(None);
        }
        lookup.cycle(product, &key).await
    }
}

/// Closest cycle from the product's full version set
pub struct BestMatch;

#[async_trait]
impl ResolutionStrategy for BestMatch {
    fn name(&self) -> &'static str {
        "best-match"
    }

    async fn attempt(
        &self,
        lookup: &dyn CycleLookup,
        product: &str,
        version: &str,
    ) -> Result<Option<VersionRecord>, ResolutionError> {
        let records = lookup.cycles(product).await?;
        Ok(select_best_match(&records, version).cloned())
    }
}

/// The default chain: exact label, then `major.minor`, then best match
pub fn default_strategies() -> Vec<Box<dyn ResolutionStrategy>> {
    vec![Box::new(ExactLabel), Box::new(MajorMinor), Box::new(BestMatch)]
}

/// Runs `attempts` in order and returns the first `Some`
///
/// A failing attempt does not stop the chain. If nothing matched and at
/// least one attempt failed, the last failure is returned.
pub async fn first_success<'a, T, E, I>(attempts: I) -> Result<Option<T>, E>
where
    I: IntoIterator<Item = BoxFuture<'a, Result<Option<T>, E>>>,
{
    let mut last_error = None;
    for attempt in attempts {
        match attempt.await {
            Ok(Some(found)) => return Ok(Some(found)),
            Ok(None) => {}
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

/// Runs the strategy chain for one `(product, version)` query
pub async fn run_strategies(
    strategies: &[Box<dyn ResolutionStrategy>],
    lookup: &dyn CycleLookup,
    product: &str,
    version: &str,
) -> Result<Option<VersionRecord>, ResolutionError> {
    // Built up front so the returned future stays `Send` under `tokio::spawn`
    let mut attempts = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        debug!("Queueing {} lookup for {} {}", strategy.name(), product, version);
        attempts.push(strategy.attempt(lookup, product, version));
    }
    first_success(attempts).await
}

/// Picks the cycle that best describes `query` from `records`
///
/// Preference order:
/// 1. greatest cycle sharing the query's `major.minor` that is not newer
/// 2. greatest cycle not newer than the query
/// 3. a cycle sharing the query's `major.minor` (only newer ones exist)
///
/// Records whose label does not parse are ignored.
pub fn select_best_match<'r>(
    records: &'r [VersionRecord],
    query: &str,
) -> Option<&'r VersionRecord> {
    let query = Version::parse(query).ok()?;
    let key = query.major_minor_key();

    let parsed: Vec<(Version, &VersionRecord)> = records
        .iter()
        .filter_map(|record| Version::parse(&record.label).ok().map(|v| (v, record)))
        .collect();

    let greatest_not_newer = |same_key: bool| {
        parsed
            .iter()
            .filter(|(v, _)| *v <= query && (!same_key || v.major_minor_key() == key))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, record)| *record)
    };

    greatest_not_newer(true)
        .or_else(|| greatest_not_newer(false))
        .or_else(|| {
            parsed
                .iter()
                .filter(|(v, _)| v.major_minor_key() == key)
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, record)| *record)
        })
}
