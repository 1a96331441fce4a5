//! Canonical dependency record shared by every collector

use super::Ecosystem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a dependency fact came from
///
/// Build-tool output and lockfiles carry exact resolved versions, so they
/// take precedence over versions read from a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Direct manifest parse (package.json, requirements.txt, pom.xml)
    Manifest,
    /// Build-tool output or lockfile (npm ls, mvn dependency:tree, yarn.lock)
    BuildTool,
}

/// Represents a project dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name as declared
    pub name: String,
    /// Version specification as written by the project
    pub declared_version: String,
    /// Best known concrete version
    pub resolved_version: String,
    /// The ecosystem this dependency belongs to
    pub ecosystem: Ecosystem,
    /// Whether the project declares this dependency itself
    pub is_direct: bool,
    /// File or command this fact was read from
    pub source_file: PathBuf,
    /// Precision class of the source
    pub source_kind: SourceKind,
}

/// Identity of a dependency within one aggregated set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyKey {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
}

impl Dependency {
    /// Creates a new dependency whose resolved version equals the declared one
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        ecosystem: Ecosystem,
        source_kind: SourceKind,
    ) -> Self {
        let version = version.into();
        Self {
            name: name.into(),
            declared_version: version.clone(),
            resolved_version: version,
            ecosystem,
            is_direct: true,
            source_file: PathBuf::new(),
            source_kind,
        }
    }

    /// Creates a direct dependency read from a manifest
    pub fn manifest(
        name: impl Into<String>,
        version: impl Into<String>,
        ecosystem: Ecosystem,
    ) -> Self {
        Self::new(name, version, ecosystem, SourceKind::Manifest)
    }

    /// Creates a dependency reported by a build tool or lockfile
    pub fn build_tool(
        name: impl Into<String>,
        version: impl Into<String>,
        ecosystem: Ecosystem,
        is_direct: bool,
    ) -> Self {
        Self::new(name, version, ecosystem, SourceKind::BuildTool).with_direct(is_direct)
    }

    /// Sets the declared version specification (builder pattern)
    pub fn with_declared(mut self, declared: impl Into<String>) -> Self {
        self.declared_version = declared.into();
        self
    }

    /// Sets the direct/transitive flag (builder pattern)
    pub fn with_direct(mut self, is_direct: bool) -> Self {
        self.is_direct = is_direct;
        self
    }

    /// Sets the source file (builder pattern)
    pub fn with_source(mut self, source_file: impl Into<PathBuf>) -> Self {
        self.source_file = source_file.into();
        self
    }

    /// Name in its ecosystem-canonical form
    pub fn normalized_name(&self) -> String {
        self.ecosystem.normalize_name(&self.name)
    }

    /// Identity key `(ecosystem, normalized name, resolved version)`
    pub fn key(&self) -> DependencyKey {
        DependencyKey {
            ecosystem: self.ecosystem,
            name: self.normalized_name(),
            version: self.resolved_version.clone(),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_direct { "" } else { " (transitive)" };
        write!(
            f,
            "{}@{}{} [{}]",
            self.name, self.resolved_version, marker, self.ecosystem
        )
    }
}
