//! EOL data resolution against endoflife.date
//!
//! - Alias table mapping package names to dataset products
//! - HTTP client with retry logic
//! - `EolDataSource` seam and its endoflife.date implementation
//! - Fallback strategies and the cache-backed resolver

mod aliases;
mod client;
mod resolver;
mod source;
mod strategy;

pub use aliases::AliasTable;
pub use client::HttpClient;
pub use resolver::{EolResolver, NotFoundReason, Resolution};
pub use source::{EndOfLifeClient, EolDataSource, DEFAULT_BASE_URL};
#[cfg(test)]
pub use source::MockEolDataSource;
pub use strategy::{
    default_strategies, first_success, run_strategies, select_best_match, BestMatch, CycleLookup,
    ExactLabel, MajorMinor, ResolutionStrategy,
};
