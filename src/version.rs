//! Permissive version model shared by every ecosystem
//!
//! Versions are read as a leading run of dot-separated numbers plus an
//! optional free-form suffix:
//! - `v1.2.3` and `V1.2.3` are the same as `1.2.3`
//! - `2` compares equal to `2.0.0`
//! - `1.2.3-rc1`, `1.2.3+build5`, `5.0.0.RELEASE` keep their suffix for
//!   display; suffixes only break ties, compared lexicographically

use crate::error::VersionParseError;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[vV]?(\d+(?:\.\d+)*)(.*)$").unwrap());

/// A parsed version
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    numbers: Vec<u64>,
    suffix: String,
}

impl Version {
    /// Parse a version string permissively
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| VersionParseError::new(input))?;

        let numbers = caps[1]
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionParseError::new(input))?;

        Ok(Self {
            raw: trimmed.to_string(),
            numbers,
            suffix: caps[2].to_string(),
        })
    }

    /// Original text, trimmed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric components as written (no zero padding)
    pub fn components(&self) -> &[u64] {
        &self.numbers
    }

    /// Non-numeric remainder such as `-rc1`
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn major(&self) -> u64 {
        self.component(0)
    }

    pub fn minor(&self) -> u64 {
        self.component(1)
    }

    /// Component at `index`, missing components read as 0
    fn component(&self, index: usize) -> u64 {
        self.numbers.get(index).copied().unwrap_or(0)
    }

    /// `major.minor` with a missing minor read as 0
    pub fn major_minor_key(&self) -> String {
        format!("{}.{}", self.major(), self.minor())
    }

    /// True when `self` is a less specific spelling of `other`
    ///
    /// `1.2` refines to `1.2.3`; `1.2` does not refine to `1.20`.
    pub fn is_prefix_of(&self, other: &Version) -> bool {
        self.numbers.len() <= other.numbers.len()
            && other.numbers.starts_with(&self.numbers)
            && (self.suffix.is_empty() || self.suffix == other.suffix)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| self.suffix.cmp(&other.suffix))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compare two version strings
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionParseError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

/// Extract the `major.minor` key of a version string
pub fn major_minor_key(version: &str) -> Result<String, VersionParseError> {
    Ok(Version::parse(version)?.major_minor_key())
}

/// True iff the major component differs and `to` is newer than `from`
pub fn is_major_upgrade(from: &str, to: &str) -> Result<bool, VersionParseError> {
    let from = Version::parse(from)?;
    let to = Version::parse(to)?;
    Ok(from.major() != to.major() && to > from)
}
