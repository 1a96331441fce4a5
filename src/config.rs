//! Run configuration, project config file and ignore lists

use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

// =============================================================================
// Defaults
// =============================================================================

/// Days before end of life at which a dependency turns WARNING
pub const DEFAULT_THRESHOLD_DAYS: u32 = 90;

/// Lifetime of cached cycle data
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Lifetime of cached product availability
pub const DEFAULT_AVAILABILITY_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Per-dependency resolution deadline
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(60);

/// Project configuration file looked up in the project root
pub const PROJECT_CONFIG_FILE: &str = ".eol-check.toml";

static TTL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\d+[dhms])+$").unwrap());
static TTL_PART_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)([dhms])").unwrap());

/// Parse a duration such as `1d`, `12h`, `30m`, `45s`, `1d12h` or bare seconds
pub fn parse_ttl(value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        value: value.to_string(),
    };
    let s = value.trim().to_lowercase();

    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse().map(Duration::from_secs).map_err(|_| invalid());
    }
    if !TTL_RE.is_match(&s) {
        return Err(invalid());
    }

    let mut seconds: u64 = 0;
    for caps in TTL_PART_RE.captures_iter(&s) {
        let amount: u64 = caps[1].parse().map_err(|_| invalid())?;
        let unit = match &caps[2] {
            "d" => 86_400,
            "h" => 3_600,
            "m" => 60,
            _ => 1,
        };
        seconds = amount
            .checked_mul(unit)
            .and_then(|part| seconds.checked_add(part))
            .ok_or_else(invalid)?;
    }
    Ok(Duration::from_secs(seconds))
}

/// Compact rendering of a duration, inverse of [`parse_ttl`]
pub fn format_ttl(duration: Duration) -> String {
    let total = duration.as_secs();
    if total == 0 {
        return "0s".to_string();
    }
    let parts = [
        (total / 86_400, 'd'),
        ((total % 86_400) / 3_600, 'h'),
        ((total % 3_600) / 60, 'm'),
        (total % 60, 's'),
    ];
    parts
        .iter()
        .filter(|(amount, _)| *amount > 0)
        .map(|(amount, unit)| format!("{}{}", amount, unit))
        .collect()
}

/// Twice the available parallelism
pub fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
}

/// `<user cache dir>/eol-check`
pub fn default_cache_dir() -> Result<PathBuf, ConfigError> {
    dirs::cache_dir()
        .map(|dir| dir.join("eol-check"))
        .ok_or(ConfigError::NoCacheDir)
}

// =============================================================================
// Run configuration
// =============================================================================

/// Immutable settings for one check run
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub threshold_days: u32,
    pub offline: bool,
    pub force_update: bool,
    pub verbose: bool,
    pub cache_ttl: Duration,
    pub availability_ttl: Duration,
    pub max_workers: usize,
    pub task_timeout: Duration,
    /// Extra package name to product mappings
    pub aliases: BTreeMap<String, String>,
    pub use_build_tools: bool,
    pub show_progress: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            threshold_days: DEFAULT_THRESHOLD_DAYS,
            offline: false,
            force_update: false,
            verbose: false,
            cache_ttl: DEFAULT_CACHE_TTL,
            availability_ttl: DEFAULT_AVAILABILITY_TTL,
            max_workers: default_max_workers(),
            task_timeout: DEFAULT_TASK_TIMEOUT,
            aliases: BTreeMap::new(),
            use_build_tools: true,
            show_progress: false,
        }
    }
}

impl CheckConfig {
    pub fn with_threshold_days(mut self, days: u32) -> Self {
        self.threshold_days = days;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_aliases<I>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.aliases.extend(aliases);
        self
    }

    /// Rejects option combinations that cannot be honoured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offline && self.force_update {
            return Err(ConfigError::ConflictingOptions {
                message: "--offline and --update cannot be used together".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Project file
// =============================================================================

/// Contents of `.eol-check.toml`
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub threshold: Option<u32>,
    pub ignore: Vec<String>,
    pub aliases: BTreeMap<String, String>,
}

impl ProjectConfig {
    /// Loads the project file from `project_dir`; absent file means defaults
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(PROJECT_CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::ConfigFile {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|message| ConfigError::ConfigFile { path, message })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}

// =============================================================================
// Ignore list
// =============================================================================

/// Dependency names excluded from checking (exact, case-sensitive)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    names: HashSet<String>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// One name per line; blank lines and `#` comments are skipped
    pub fn parse(content: &str) -> Self {
        let names = content
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IgnoreFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Adds names (builder pattern)
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
