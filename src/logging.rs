//! Tracing subscriber setup for the binary
//!
//! Logs go to stderr so reports on stdout stay machine-readable.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity flags
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "eol_check=debug,warn"
    } else {
        "warn"
    }
}

/// Install the global subscriber; `RUST_LOG` overrides the flags
pub fn init(verbose: bool, quiet: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init()
        .map_err(|e| format!("failed to initialize tracing subscriber: {}", e))
}
