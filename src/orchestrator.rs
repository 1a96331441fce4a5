//! Check orchestrator coordinating one run
//!
//! Workflow: aggregate → resolve (bounded, concurrent) → classify → order.
//! Each dependency resolves in its own tokio task gated by a semaphore and
//! bounded by its own deadline; a slow or failing dependency degrades to
//! UNKNOWN without affecting the others.

use crate::aggregate::aggregate;
use crate::config::{CheckConfig, IgnoreList};
use crate::domain::{CheckReport, Dependency, Status, VersionRecord};
use crate::engine::{classify, order_results, status_for};
use crate::eol::{EolResolver, NotFoundReason, Resolution};
use crate::error::ResolutionError;
use crate::progress::Progress;
use chrono::{Local, NaiveDate};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Resolver output for one aggregated dependency
struct Lookup {
    resolution: Resolution,
    known_cycles: Vec<VersionRecord>,
}

/// Runs EOL checks over collected dependency sources
pub struct EolChecker {
    resolver: Arc<EolResolver>,
    config: CheckConfig,
    today: Option<NaiveDate>,
}

impl EolChecker {
    pub fn new(resolver: Arc<EolResolver>, config: CheckConfig) -> Self {
        Self {
            resolver,
            config,
            today: None,
        }
    }

    /// Pin the reference date (builder pattern); defaults to the local date
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Check every dependency in `sources`
    pub async fn check(&self, sources: &[Vec<Dependency>], ignore: &IgnoreList) -> CheckReport {
        self.check_with_progress(sources, ignore, &mut Progress::new(self.config.show_progress))
            .await
    }

    pub async fn check_with_progress(
        &self,
        sources: &[Vec<Dependency>],
        ignore: &IgnoreList,
        progress: &mut Progress,
    ) -> CheckReport {
        let today = self.today();
        let threshold = self.config.threshold_days;

        let dependencies = aggregate(sources, ignore);
        info!(
            "Checking {} unique dependencies from {} sources",
            dependencies.len(),
            sources.len()
        );

        progress.start(dependencies.len() as u64, "Checking end-of-life data");
        let lookups = self.resolve_all(&dependencies, today, progress).await;
        progress.finish_and_clear();

        let mut results: Vec<_> = dependencies
            .iter()
            .zip(lookups.iter())
            .map(|(dep, lookup)| {
                classify(dep, &lookup.resolution, &lookup.known_cycles, threshold, today)
            })
            .collect();
        order_results(&mut results);

        let report = CheckReport::new(results, threshold);
        info!(
            "Finished: {} critical, {} warning, {} ok, {} unknown",
            report.counts.critical, report.counts.warning, report.counts.ok, report.counts.unknown
        );
        report
    }

    /// Resolve every dependency concurrently; output is index-aligned with input
    async fn resolve_all(
        &self,
        dependencies: &[Dependency],
        today: NaiveDate,
        progress: &Progress,
    ) -> Vec<Lookup> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let timeout = self.config.task_timeout;
        let threshold = self.config.threshold_days;

        let mut pending: FuturesUnordered<_> = dependencies
            .iter()
            .enumerate()
            .map(|(index, dep)| {
                let resolver = self.resolver.clone();
                let semaphore = semaphore.clone();
                let name = dep.name.clone();
                let version = dep.resolved_version.clone();

                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let work = resolve_one(&resolver, &name, &version, threshold, today);
                    match tokio::time::timeout(timeout, work).await {
                        Ok(lookup) => lookup,
                        Err(_) => {
                            warn!("Resolving {} {} timed out after {:?}", name, version, timeout);
                            let product = resolver
                                .product_for(&name)
                                .unwrap_or(name.as_str())
                                .to_string();
                            Lookup {
                                resolution: Resolution::failed(
                                    &product,
                                    &ResolutionError::timeout(&product, timeout),
                                ),
                                known_cycles: Vec::new(),
                            }
                        }
                    }
                });

                async move { (index, handle.await) }
            })
            .collect();

        let mut lookups: Vec<Option<Lookup>> = dependencies.iter().map(|_| None).collect();
        while let Some((index, joined)) = pending.next().await {
            let dep = &dependencies[index];
            let lookup = match joined {
                Ok(lookup) => lookup,
                Err(e) => {
                    warn!("Task for {} aborted: {}", dep.name, e);
                    Lookup {
                        resolution: Resolution::failed(
                            &dep.name,
                            &ResolutionError::network(&dep.name, e.to_string()),
                        ),
                        known_cycles: Vec::new(),
                    }
                }
            };
            progress.inc(&dep.name);
            lookups[index] = Some(lookup);
        }

        lookups
            .into_iter()
            .map(|lookup| {
                lookup.unwrap_or_else(|| Lookup {
                    resolution: Resolution::not_found(NotFoundReason::Failed, None),
                    known_cycles: Vec::new(),
                })
            })
            .collect()
    }
}

/// Resolve one dependency; fetch the version set only when an upgrade
/// recommendation will be needed
async fn resolve_one(
    resolver: &EolResolver,
    name: &str,
    version: &str,
    threshold_days: u32,
    today: NaiveDate,
) -> Lookup {
    let resolution = resolver.resolve(name, version).await;

    let known_cycles = match &resolution {
        Resolution::Resolved { product, record } => {
            match status_for(&record.eol, threshold_days, today).0 {
                Status::Critical | Status::Warning => resolver.known_cycles(product).await,
                Status::Ok | Status::Unknown => Vec::new(),
            }
        }
        Resolution::NotFound { .. } => Vec::new(),
    };

    debug!("{} {} resolved: {:?}", name, version, resolution.note());
    Lookup {
        resolution,
        known_cycles,
    }
}
