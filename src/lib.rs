//! eol-check - end-of-life checker library
//!
//! Collects a project's dependencies, resolves each against
//! endoflife.date through a persisted cache and classifies it as
//! CRITICAL, WARNING, OK or UNKNOWN:
//! - Node.js (package.json, yarn.lock, npm ls)
//! - Python (requirements.txt, pyproject.toml)
//! - Java (pom.xml, mvn dependency:tree, build.gradle, gradle dependencies)

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod collect;
pub mod config;
pub mod domain;
pub mod engine;
pub mod eol;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod version;
