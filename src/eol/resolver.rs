//! Resolves `(package, version)` pairs to release-cycle EOL records

use super::aliases::AliasTable;
use super::source::EolDataSource;
use super::strategy::{default_strategies, run_strategies, CycleLookup, ResolutionStrategy};
use crate::cache::{CacheNamespace, EolCache};
use crate::config::CheckConfig;
use crate::domain::{ProductAvailability, VersionRecord};
use crate::error::ResolutionError;
use crate::version::Version;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Why no record was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The package name has no dataset product
    Unmapped,
    /// The dataset does not know the product
    Unavailable,
    /// No cycle matches the version
    NoMatchingCycle,
    /// Lookup failed (network, payload, timeout, cache)
    Failed,
    /// Offline and nothing usable was cached
    Offline,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NotFoundReason::Unmapped => "not tracked by endoflife.date",
            NotFoundReason::Unavailable => "product unavailable on endoflife.date",
            NotFoundReason::NoMatchingCycle => "no matching release cycle",
            NotFoundReason::Failed => "lookup failed",
            NotFoundReason::Offline => "no cached data (offline)",
        };
        f.write_str(text)
    }
}

/// Outcome of resolving one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        product: String,
        record: VersionRecord,
    },
    NotFound {
        reason: NotFoundReason,
        product: Option<String>,
        /// Error text kept for diagnostics
        detail: Option<String>,
    },
}

impl Resolution {
    pub fn not_found(reason: NotFoundReason, product: Option<&str>) -> Self {
        Resolution::NotFound {
            reason,
            product: product.map(str::to_string),
            detail: None,
        }
    }

    pub fn failed(product: &str, error: &ResolutionError) -> Self {
        Resolution::NotFound {
            reason: NotFoundReason::Failed,
            product: Some(product.to_string()),
            detail: Some(error.to_string()),
        }
    }

    pub fn product(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { product, .. } => Some(product),
            Resolution::NotFound { product, .. } => product.as_deref(),
        }
    }

    /// Human-readable reason for an UNKNOWN result
    pub fn note(&self) -> Option<String> {
        match self {
            Resolution::Resolved { .. } => None,
            Resolution::NotFound {
                reason,
                detail: Some(detail),
                ..
            } => Some(format!("{}: {}", reason, detail)),
            Resolution::NotFound { reason, .. } => Some(reason.to_string()),
        }
    }
}

/// EOL resolver backed by the persisted cache and a remote source
pub struct EolResolver {
    aliases: AliasTable,
    source: Arc<dyn EolDataSource>,
    cache: Arc<EolCache>,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    force_update: bool,
    cache_ttl: Duration,
    availability_ttl: Duration,
}

impl EolResolver {
    pub fn new(source: Arc<dyn EolDataSource>, cache: Arc<EolCache>, config: &CheckConfig) -> Self {
        Self {
            aliases: AliasTable::builtin().with_extra(config.aliases.clone()),
            source,
            cache,
            strategies: default_strategies(),
            force_update: config.force_update,
            cache_ttl: config.cache_ttl,
            availability_ttl: config.availability_ttl,
        }
    }

    /// Replace the fallback chain (builder pattern)
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn product_for(&self, package_name: &str) -> Option<&str> {
        self.aliases.product_for(package_name)
    }

    fn is_offline(&self) -> bool {
        self.cache.is_offline()
    }

    /// Resolve a package version to its release cycle
    ///
    /// Never fails: every error degrades to `Resolution::NotFound`.
    pub async fn resolve(&self, package_name: &str, version: &str) -> Resolution {
        let Some(product) = self.product_for(package_name) else {
            debug!("{} is not mapped to an endoflife.date product", package_name);
            return Resolution::not_found(NotFoundReason::Unmapped, None);
        };

        if let Err(e) = Version::parse(version) {
            return Resolution::NotFound {
                reason: NotFoundReason::NoMatchingCycle,
                product: Some(product.to_string()),
                detail: Some(e.to_string()),
            };
        }

        match self.availability(product).await {
            Ok(Some(true)) => {}
            Ok(Some(false)) => {
                return Resolution::not_found(NotFoundReason::Unavailable, Some(product));
            }
            Ok(None) => return Resolution::not_found(NotFoundReason::Offline, Some(product)),
            Err(e) => {
                debug!("Availability check for {} failed: {}", product, e);
                return Resolution::failed(product, &e);
            }
        }

        match run_strategies(&self.strategies, self, product, version).await {
            Ok(Some(record)) => {
                debug!("{} {} -> cycle {}", product, version, record.label);
                Resolution::Resolved {
                    product: product.to_string(),
                    record,
                }
            }
            Ok(None) if self.is_offline() => {
                Resolution::not_found(NotFoundReason::Offline, Some(product))
            }
            Ok(None) => Resolution::not_found(NotFoundReason::NoMatchingCycle, Some(product)),
            Err(e) => {
                debug!("Resolving {} {} failed: {}", product, version, e);
                Resolution::failed(product, &e)
            }
        }
    }

    /// Every known cycle of `product`; empty when nothing can be fetched
    pub async fn known_cycles(&self, product: &str) -> Vec<VersionRecord> {
        match self.cycles(product).await {
            Ok(records) => records,
            Err(e) => {
                debug!("Could not load version set for {}: {}", product, e);
                Vec::new()
            }
        }
    }

    /// Cached product availability; `Ok(None)` when offline without data
    async fn availability(&self, product: &str) -> Result<Option<bool>, ResolutionError> {
        if !self.force_update {
            if let Some(cached) = self
                .cache
                .get::<ProductAvailability>(CacheNamespace::Availability, product)?
            {
                return Ok(Some(cached.is_available));
            }
        }

        if self.is_offline() {
            return Ok(None);
        }

        let is_available = self.source.product_exists(product).await?;
        self.cache.put(
            CacheNamespace::Availability,
            product,
            &ProductAvailability::new(product, is_available),
            Some(self.availability_ttl),
        )?;
        Ok(Some(is_available))
    }
}

#[async_trait]
impl CycleLookup for EolResolver {
    async fn cycle(
        &self,
        product: &str,
        label: &str,
    ) -> Result<Option<VersionRecord>, ResolutionError> {
        let key = format!("{}/{}", product, label);
        if !self.force_update {
            if let Some(cached) = self
                .cache
                .get::<Option<VersionRecord>>(CacheNamespace::Version, &key)?
            {
                return Ok(cached);
            }
        }

        if self.is_offline() {
            return Ok(None);
        }

        let record = self.source.fetch_cycle(product, label).await?;
        self.cache
            .put(CacheNamespace::Version, &key, &record, Some(self.cache_ttl))?;
        Ok(record)
    }

    async fn cycles(&self, product: &str) -> Result<Vec<VersionRecord>, ResolutionError> {
        if !self.force_update {
            if let Some(cached) = self
                .cache
                .get::<Vec<VersionRecord>>(CacheNamespace::VersionSet, product)?
            {
                return Ok(cached);
            }
        }

        if self.is_offline() {
            return Ok(Vec::new());
        }

        let records = self.source.fetch_all_cycles(product).await?;
        self.cache
            .put(CacheNamespace::VersionSet, product, &records, Some(self.cache_ttl))?;
        Ok(records)
    }
}
