//! Ecosystem type definitions for supported package managers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported package-management ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Node.js ecosystem (package.json, yarn.lock, npm ls)
    Node,
    /// Python ecosystem (requirements.txt, pyproject.toml)
    Python,
    /// JVM ecosystem (pom.xml, mvn dependency:tree)
    Java,
}

impl Ecosystem {
    /// Returns the display name for this ecosystem
    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::Node => "Node.js",
            Ecosystem::Python => "Python",
            Ecosystem::Java => "Java",
        }
    }

    /// Returns all supported ecosystems
    pub fn all() -> &'static [Ecosystem] {
        &[Ecosystem::Node, Ecosystem::Python, Ecosystem::Java]
    }

    /// Canonical form of a package name used for identity comparisons
    ///
    /// Python names follow PEP 503 (`Flask_SQLAlchemy` == `flask-sqlalchemy`);
    /// npm and Maven names are only case-folded.
    pub fn normalize_name(&self, name: &str) -> String {
        let lower = name.trim().to_lowercase();
        match self {
            Ecosystem::Python => {
                let mut normalized = String::with_capacity(lower.len());
                let mut last_was_sep = false;
                for c in lower.chars() {
                    if matches!(c, '-' | '_' | '.') {
                        if !last_was_sep {
                            normalized.push('-');
                        }
                        last_was_sep = true;
                    } else {
                        normalized.push(c);
                        last_was_sep = false;
                    }
                }
                normalized
            }
            Ecosystem::Node | Ecosystem::Java => lower,
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
