//! eol-check - end-of-life checker CLI tool
//!
//! Scans a project's dependencies and reports which have reached, or are
//! about to reach, end of life according to endoflife.date:
//! - Node.js (package.json, yarn.lock, npm ls)
//! - Python (requirements.txt, pyproject.toml)
//! - Java (pom.xml, mvn dependency:tree, build.gradle, gradle dependencies)
//!
//! Exit codes: 0 when nothing is past end of life, 2 when at least one
//! dependency is CRITICAL, 1 on fatal errors.

use anyhow::Context;
use clap::Parser;
use eol_check::cache::EolCache;
use eol_check::cli::CliArgs;
use eol_check::collect::{collect_project, SystemCommandRunner};
use eol_check::config::{format_ttl, CheckConfig, ProjectConfig};
use eol_check::eol::{EndOfLifeClient, EolResolver, HttpClient};
use eol_check::error::{AppError, IoError};
use eol_check::logging;
use eol_check::orchestrator::EolChecker;
use eol_check::output::{create_formatter, OutputConfig, ReportContext};
use eol_check::progress::Progress;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = logging::init(args.verbose, args.quiet) {
        eprintln!("Warning: {}", e);
    }

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let project_dir = project_dir(&args.path)?;
    let project = ProjectConfig::load(&project_dir)?;
    let config = args.check_config(&project)?;
    let cache = open_cache(&args, &config)?;

    if args.clear_cache {
        let removed = cache.clear()?;
        println!("Removed {} cached entries from {}", removed, cache.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    if args.verbose {
        log_cache_stats(&cache, &config);
    }

    let ignore = args.ignore_list(&project)?;
    let started = Instant::now();

    let mut progress = Progress::new(config.show_progress);
    progress.spinner("Collecting dependencies");
    let runner = SystemCommandRunner::new();
    let collected = collect_project(&project_dir, config.use_build_tools, &runner);
    progress.finish_and_clear();

    if collected.is_empty() {
        warn!("No dependencies found in {}", project_dir.display());
    } else {
        info!(
            "Collected {} dependency records from {} sources",
            collected.dependency_count(),
            collected.sources.len()
        );
    }

    let source = Arc::new(EndOfLifeClient::new(HttpClient::new()?));
    let resolver = Arc::new(EolResolver::new(source, Arc::new(cache), &config));
    let checker = EolChecker::new(resolver, config.clone());
    let report = checker
        .check_with_progress(&collected.sources, &ignore, &mut progress)
        .await;

    let context = ReportContext::new(&project_dir).with_elapsed(started.elapsed());
    let color = args.output.is_none() && io::stdout().is_terminal();
    let formatter = create_formatter(OutputConfig::from_cli(
        args.format,
        args.verbose,
        args.quiet,
        color,
    ));

    match args.output {
        Some(ref path) => {
            let file = File::create(path).map_err(|e| AppError::from(IoError::generic(path, e)))?;
            let mut writer = BufWriter::new(file);
            formatter.format(&report, &context, &mut writer)?;
            writer
                .flush()
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            if !args.quiet {
                eprintln!("Report written to {}", path.display());
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            formatter
                .format(&report, &context, &mut stdout)
                .context("failed to write report")?;
            stdout.flush()?;
        }
    }

    if args.verbose && !collected.errors.is_empty() {
        eprintln!();
        eprintln!("Collection problems:");
        for error in &collected.errors {
            eprintln!("  - {}", error);
        }
    }

    Ok(ExitCode::from(report.exit_code() as u8))
}

fn project_dir(path: &Path) -> Result<PathBuf, AppError> {
    if !path.is_dir() {
        return Err(IoError::directory_not_found(path).into());
    }
    path.canonicalize()
        .map_err(|e| IoError::generic(path, e).into())
}

fn open_cache(args: &CliArgs, config: &CheckConfig) -> Result<EolCache, AppError> {
    let dir = args.cache_dir()?;
    Ok(EolCache::open(&dir, config.offline)?)
}

/// Cache location and entry counts, for verbose runs
fn log_cache_stats(cache: &EolCache, config: &CheckConfig) {
    debug!("eol-check v{}", env!("CARGO_PKG_VERSION"));
    match cache.stats() {
        Ok(stats) => {
            info!(
                "Cache {}: {} availability, {} version, {} version-set entries \
                 ({} expired); ttl {}",
                stats.path.display(),
                stats.availability,
                stats.version,
                stats.version_set,
                stats.expired,
                format_ttl(config.cache_ttl)
            );
        }
        Err(e) => warn!("Could not read cache statistics: {}", e),
    }
}
