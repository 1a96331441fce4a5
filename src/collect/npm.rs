//! Node.js collector
//!
//! Handles:
//! - package.json (dependencies, devDependencies, peerDependencies,
//!   optionalDependencies, engines.node)
//! - yarn.lock (classic and berry)
//! - `npm ls --json --all`

use super::tool::first_error_line;
use super::{clean_version, read_file, Collected, Collector, CommandRunner};
use crate::domain::{Dependency, Ecosystem};
use crate::error::CollectError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

const DEPENDENCY_SECTIONS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

static YARN_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s+version:?\s+"?([^"\s]+)"?\s*$"#).unwrap());

/// Collector for npm and yarn projects
pub struct NpmCollector;

impl Collector for NpmCollector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join("package.json").is_file()
    }

    fn collect(&self, project_dir: &Path, runner: Option<&dyn CommandRunner>, out: &mut Collected) {
        let manifest_path = project_dir.join("package.json");
        let manifest = read_file(&manifest_path)
            .and_then(|content| parse_package_json(&content, &manifest_path));
        let declared: HashSet<String> = manifest
            .as_ref()
            .map(|deps| deps.iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default();
        out.push(manifest);

        let lock_path = project_dir.join("yarn.lock");
        if lock_path.is_file() {
            out.push(
                read_file(&lock_path)
                    .map(|content| parse_yarn_lock(&content, &declared, &lock_path)),
            );
        }

        if let Some(runner) = runner {
            if project_dir.join("node_modules").is_dir() {
                out.push(run_npm_ls(runner, project_dir));
            } else {
                debug!("Skipping npm ls: node_modules is not installed");
            }
        }
    }
}

/// Parse package.json into direct manifest dependencies
pub fn parse_package_json(content: &str, path: &Path) -> Result<Vec<Dependency>, CollectError> {
    let json: Value = serde_json::from_str(content)
        .map_err(|e| CollectError::json_parse_error(path, e.to_string()))?;

    let mut dependencies = Vec::new();
    for section in DEPENDENCY_SECTIONS {
        if let Some(deps) = json.get(section).and_then(Value::as_object) {
            parse_dependency_object(deps, path, &mut dependencies);
        }
    }

    // engines.node is the runtime requirement
    if let Some(node) = json.pointer("/engines/node").and_then(Value::as_str) {
        dependencies.push(manifest_dependency("node", node, path));
    }

    Ok(dependencies)
}

fn parse_dependency_object(deps: &Map<String, Value>, path: &Path, out: &mut Vec<Dependency>) {
    for (name, spec) in deps {
        match spec.as_str() {
            Some(spec) => out.push(manifest_dependency(name, spec, path)),
            None => debug!("Skipping {} in {}: non-string version", name, path.display()),
        }
    }
}

fn manifest_dependency(name: &str, spec: &str, path: &Path) -> Dependency {
    Dependency::manifest(name, clean_version(spec), Ecosystem::Node)
        .with_declared(spec)
        .with_source(path)
}

/// Parse yarn.lock entries into resolved dependencies
///
/// A package is direct when package.json declares it.
pub fn parse_yarn_lock(content: &str, declared: &HashSet<String>, path: &Path) -> Vec<Dependency> {
    let mut dependencies = Vec::new();
    let mut seen = HashSet::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            current = line.strip_suffix(':').and_then(lock_entry_name);
            continue;
        }

        let Some(name) = current.as_ref() else {
            continue;
        };
        if let Some(caps) = YARN_VERSION_RE.captures(line) {
            let version = caps[1].to_string();
            if seen.insert((name.clone(), version.clone())) {
                dependencies.push(
                    Dependency::build_tool(name, version, Ecosystem::Node, declared.contains(name))
                        .with_source(path),
                );
            }
            current = None;
        }
    }

    dependencies
}

/// Package name from a lockfile header like `"@babel/core@^7.0.0", "@babel/core@^7.1.0"`
fn lock_entry_name(header: &str) -> Option<String> {
    let first = header.split(", ").next()?.trim().trim_matches('"');
    // Skip the leading '@' of a scoped name
    let at = first.get(1..)?.find('@')? + 1;
    let name = &first[..at];
    (!name.is_empty()).then(|| name.to_string())
}

fn run_npm_ls(
    runner: &dyn CommandRunner,
    project_dir: &Path,
) -> Result<Vec<Dependency>, CollectError> {
    let args: Vec<String> = ["ls", "--json", "--all"].iter().map(|s| s.to_string()).collect();
    let output = runner.run("npm", &args, project_dir)?;

    // npm ls exits non-zero on peer or extraneous problems but still prints the tree
    if output.stdout.trim().is_empty() {
        return Err(CollectError::CommandFailed {
            command: "npm ls --json --all".to_string(),
            message: first_error_line(&output),
        });
    }

    parse_npm_ls(&output.stdout, &project_dir.join("package.json"))
}

/// Parse `npm ls --json --all` output; top-level packages are direct
pub fn parse_npm_ls(content: &str, path: &Path) -> Result<Vec<Dependency>, CollectError> {
    let json: Value = serde_json::from_str(content)
        .map_err(|e| CollectError::json_parse_error("npm ls output", e.to_string()))?;

    let mut dependencies = Vec::new();
    let mut index = HashMap::new();
    if let Some(deps) = json.get("dependencies").and_then(Value::as_object) {
        walk_tree(deps, true, path, &mut dependencies, &mut index);
    }
    Ok(dependencies)
}

fn walk_tree(
    deps: &Map<String, Value>,
    is_direct: bool,
    path: &Path,
    out: &mut Vec<Dependency>,
    index: &mut HashMap<(String, String), usize>,
) {
    for (name, node) in deps {
        // Missing or unmet packages carry no version
        if let Some(version) = node.get("version").and_then(Value::as_str) {
            match index.get(&(name.clone(), version.to_string())) {
                Some(&i) => out[i].is_direct |= is_direct,
                None => {
                    index.insert((name.clone(), version.to_string()), out.len());
                    out.push(
                        Dependency::build_tool(name, version, Ecosystem::Node, is_direct)
                            .with_source(path),
                    );
                }
            }
        }

        if let Some(children) = node.get("dependencies").and_then(Value::as_object) {
            walk_tree(children, false, path, out, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{CommandOutput, MockCommandRunner};
    use crate::domain::SourceKind;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn path() -> PathBuf {
        PathBuf::from("package.json")
    }

    #[test]
    fn test_parse_package_json() {
        let content = r#"{
            "name": "web",
            "dependencies": {"react": "^16.8.0", "lodash": "~4.17.21"},
            "devDependencies": {"typescript": "5.2.2"},
            "engines": {"node": ">=18"}
        }"#;

        let deps = parse_package_json(content, &path()).unwrap();
        assert_eq!(deps.len(), 4);

        let react = deps.iter().find(|d| d.name == "react").unwrap();
        assert_eq!(react.resolved_version, "16.8.0");
        assert_eq!(react.declared_version, "^16.8.0");
        assert!(react.is_direct);
        assert_eq!(react.source_kind, SourceKind::Manifest);

        let node = deps.iter().find(|d| d.name == "node").unwrap();
        assert_eq!(node.resolved_version, "18");
    }

    #[test]
    fn test_parse_package_json_without_dependencies() {
        let deps = parse_package_json(r#"{"name": "empty"}"#, &path()).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_parse_package_json_invalid() {
        let result = parse_package_json("{", &path());
        assert!(matches!(result, Err(CollectError::JsonParseError { .. })));
    }

    #[test]
    fn test_parse_yarn_lock_classic() {
        let content = r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"@babel/code-frame@^7.0.0", "@babel/code-frame@^7.10.4":
  version "7.12.13"
  resolved "https://registry.yarnpkg.com/@babel/code-frame/-/code-frame-7.12.13.tgz"

react@^16.8.0:
  version "16.14.0"
  dependencies:
    loose-envify "^1.1.0"

loose-envify@^1.1.0:
  version "1.4.0"
"#;
        let declared: HashSet<String> = ["react".to_string()].into_iter().collect();

        let deps = parse_yarn_lock(content, &declared, Path::new("yarn.lock"));
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].name, "@babel/code-frame");
        assert_eq!(deps[0].resolved_version, "7.12.13");
        assert!(!deps[0].is_direct);
        assert_eq!(deps[1].name, "react");
        assert_eq!(deps[1].resolved_version, "16.14.0");
        assert!(deps[1].is_direct);
        assert_eq!(deps[1].source_kind, SourceKind::BuildTool);
    }

    #[test]
    fn test_parse_yarn_lock_berry() {
        let content = r#"__metadata:
  version: 6
  cacheKey: 8

"lodash@npm:^4.17.21":
  version: 4.17.21
  resolution: "lodash@npm:4.17.21"
"#;
        let deps = parse_yarn_lock(content, &HashSet::new(), Path::new("yarn.lock"));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "lodash");
        assert_eq!(deps[0].resolved_version, "4.17.21");
    }

    #[test]
    fn test_parse_npm_ls() {
        let content = r#"{
            "name": "web",
            "dependencies": {
                "react": {
                    "version": "16.8.0",
                    "dependencies": {
                        "loose-envify": {"version": "1.4.0"},
                        "scheduler": {"version": "0.13.6", "dependencies": {"loose-envify": {"version": "1.4.0"}}}
                    }
                },
                "loose-envify": {"version": "1.4.0"},
                "left-pad": {"required": "^1.3.0", "missing": true}
            }
        }"#;

        let deps = parse_npm_ls(content, &path()).unwrap();
        let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["loose-envify", "react", "scheduler"]);

        let envify = deps.iter().find(|d| d.name == "loose-envify").unwrap();
        assert!(envify.is_direct);
        let scheduler = deps.iter().find(|d| d.name == "scheduler").unwrap();
        assert!(!scheduler.is_direct);
    }

    #[test]
    fn test_collect_runs_npm_ls_when_installed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"dependencies": {"react": "^16.8.0"}}"#,
        )
        .unwrap();
        fs::create_dir(temp_dir.path().join("node_modules")).unwrap();

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, args, _| {
                program == "npm" && args.first().map(String::as_str) == Some("ls")
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(CommandOutput {
                    success: false,
                    stdout: r#"{"dependencies": {"react": {"version": "16.8.0"}}}"#.to_string(),
                    stderr: "npm ERR! peer dep missing".to_string(),
                })
            });

        let mut collected = Collected::default();
        NpmCollector.collect(temp_dir.path(), Some(&runner), &mut collected);

        assert_eq!(collected.sources.len(), 2);
        assert_eq!(collected.sources[1][0].source_kind, SourceKind::BuildTool);
        assert!(collected.errors.is_empty());
    }

    #[test]
    fn test_collect_reports_failed_npm_ls() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"dependencies": {"react": "^16.8.0"}}"#,
        )
        .unwrap();
        fs::create_dir(temp_dir.path().join("node_modules")).unwrap();

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_, _, _| Ok(CommandOutput::failure("npm: command not found")));

        let mut collected = Collected::default();
        NpmCollector.collect(temp_dir.path(), Some(&runner), &mut collected);

        assert_eq!(collected.sources.len(), 1);
        assert!(matches!(collected.errors[0], CollectError::CommandFailed { .. }));
    }
}
