//! Dependency collectors for supported ecosystems
//!
//! Each collector detects its files in a project directory and produces one
//! `Vec<Dependency>` per manifest, lockfile or build-tool run:
//! - Node.js (package.json, yarn.lock, `npm ls`)
//! - Python (requirements.txt, pyproject.toml)
//! - Java (pom.xml, `mvn dependency:tree`, build.gradle, `gradle dependencies`)
//!
//! A file that fails to parse or a build tool that fails to run is logged
//! and skipped; collection itself never aborts a run.

mod gradle;
mod maven;
mod npm;
mod python;
mod tool;

pub use gradle::GradleCollector;
pub use maven::MavenCollector;
pub use npm::NpmCollector;
pub use python::PythonCollector;
pub use tool::{display_command, CommandOutput, CommandRunner, SystemCommandRunner};

#[cfg(test)]
pub use tool::MockCommandRunner;

use crate::domain::{Dependency, Ecosystem};
use crate::error::CollectError;
use std::path::Path;
use tracing::{debug, info, warn};

/// Placeholder version for declarations without a usable version
pub const LATEST: &str = "latest";

/// Output of a collection pass
#[derive(Debug, Default)]
pub struct Collected {
    /// One list per file or build-tool run, in discovery order
    pub sources: Vec<Vec<Dependency>>,
    /// Non-fatal failures encountered along the way
    pub errors: Vec<CollectError>,
}

impl Collected {
    /// Record the outcome of one source; empty lists are dropped
    pub fn push(&mut self, result: Result<Vec<Dependency>, CollectError>) {
        match result {
            Ok(deps) if deps.is_empty() => {}
            Ok(deps) => self.sources.push(deps),
            Err(e) => {
                warn!("{}", e);
                self.errors.push(e);
            }
        }
    }

    /// Total records across all sources, before aggregation
    pub fn dependency_count(&self) -> usize {
        self.sources.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Trait for per-ecosystem dependency collectors
pub trait Collector {
    /// The ecosystem this collector handles
    fn ecosystem(&self) -> Ecosystem;

    /// Whether the project directory contains files this collector reads
    fn detect(&self, project_dir: &Path) -> bool;

    /// Collect every source list; `runner` is `None` when build tools are disabled
    fn collect(&self, project_dir: &Path, runner: Option<&dyn CommandRunner>, out: &mut Collected);
}

/// All collectors in reporting order
pub fn collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(NpmCollector),
        Box::new(PythonCollector),
        Box::new(MavenCollector),
        Box::new(GradleCollector),
    ]
}

/// Collect dependencies from every detected ecosystem in `project_dir`
pub fn collect_project(
    project_dir: &Path,
    use_build_tools: bool,
    runner: &dyn CommandRunner,
) -> Collected {
    let mut collected = Collected::default();
    let runner = use_build_tools.then_some(runner);

    for collector in collectors() {
        if !collector.detect(project_dir) {
            debug!("No {} files detected", collector.ecosystem());
            continue;
        }
        let before = collected.dependency_count();
        collector.collect(project_dir, runner, &mut collected);
        info!(
            "Collected {} {} dependency records",
            collected.dependency_count() - before,
            collector.ecosystem()
        );
    }

    collected
}

/// Read a project file, mapping failures to [`CollectError::ReadError`]
pub(crate) fn read_file(path: &Path) -> Result<String, CollectError> {
    std::fs::read_to_string(path).map_err(|e| CollectError::read_error(path, e))
}

/// Reduce a version requirement to its base version
///
/// Range operators and a leading `v` are stripped, and only the first
/// clause of a compound range is kept: `^16.8.0` → `16.8.0`,
/// `>=3.8,<4` → `3.8`, `>= 14 <19` → `14`. Empty requirements become
/// [`LATEST`].
pub(crate) fn clean_version(requirement: &str) -> String {
    let first = requirement.split([',', '|']).next().unwrap_or_default();
    let stripped = first
        .trim()
        .trim_start_matches(|c: char| {
            matches!(c, '^' | '~' | '>' | '<' | '=' | '!') || c.is_whitespace()
        })
        .trim_start_matches('v');

    match stripped.split_whitespace().next() {
        Some(version) => version.to_string(),
        None => LATEST.to_string(),
    }
}
