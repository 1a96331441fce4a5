//! CLI argument parsing module for eol-check

use crate::config::{
    default_cache_dir, parse_ttl, CheckConfig, IgnoreList, ProjectConfig, DEFAULT_THRESHOLD_DAYS,
};
use crate::error::ConfigError;
use crate::output::OutputFormat;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Parse duration string in format: 1d, 12h, 30m, 45s, 1d12h or bare seconds
fn parse_duration(s: &str) -> Result<Duration, String> {
    parse_ttl(s).map_err(|e| e.to_string())
}

/// Check project dependencies against end-of-life data
#[derive(Parser, Debug, Clone)]
#[command(
    name = "eol-check",
    version,
    about = "Check project dependencies against endoflife.date"
)]
pub struct CliArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    // Output options
    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Days before end of life to start warning
    #[arg(short, long)]
    pub threshold: Option<u32>,

    // Cache options
    /// Use only cached data; never touch the network
    #[arg(long)]
    pub offline: bool,

    /// Ignore cached data and refetch everything
    #[arg(long = "update")]
    pub force_update: bool,

    /// How long fetched EOL data stays fresh (e.g., 1d, 12h, 30m, 1d12h)
    #[arg(long, value_parser = parse_duration, default_value = "1d")]
    pub cache_ttl: Duration,

    /// Cache directory (default: user cache directory)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Remove every cached entry and exit
    #[arg(long)]
    pub clear_cache: bool,

    // General options
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable quiet mode - only failing dependencies and the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// File listing dependency names to skip, one per line
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// Maximum number of concurrent lookups
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Deadline for resolving a single dependency
    #[arg(long, value_parser = parse_duration, default_value = "60s")]
    pub task_timeout: Duration,

    /// Do not run npm or mvn to discover resolved versions
    #[arg(long)]
    pub no_build_tools: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl CliArgs {
    /// Merge CLI flags over the project file and defaults
    pub fn check_config(&self, project: &ProjectConfig) -> Result<CheckConfig, ConfigError> {
        let threshold = self
            .threshold
            .or(project.threshold)
            .unwrap_or(DEFAULT_THRESHOLD_DAYS);

        let mut config = CheckConfig::default()
            .with_threshold_days(threshold)
            .with_offline(self.offline)
            .with_force_update(self.force_update)
            .with_task_timeout(self.task_timeout)
            .with_aliases(project.aliases.clone());
        if let Some(max_workers) = self.max_workers {
            config = config.with_max_workers(max_workers);
        }
        config.verbose = self.verbose;
        config.cache_ttl = self.cache_ttl;
        config.use_build_tools = !self.no_build_tools;
        config.show_progress = self.show_progress();

        config.validate()?;
        Ok(config)
    }

    /// Names from `--ignore-file` plus the project file's `ignore` list
    pub fn ignore_list(&self, project: &ProjectConfig) -> Result<IgnoreList, ConfigError> {
        let list = match self.ignore_file {
            Some(ref path) => IgnoreList::from_file(path)?,
            None => IgnoreList::new(),
        };
        Ok(list.with_names(project.ignore.iter().cloned()))
    }

    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        match self.cache_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => default_cache_dir(),
        }
    }

    /// Progress bars only accompany interactive text reports
    pub fn show_progress(&self) -> bool {
        !self.no_progress && !self.quiet && self.format == OutputFormat::Text
    }
}
