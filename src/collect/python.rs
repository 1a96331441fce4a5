//! Python collector
//!
//! Handles:
//! - requirements.txt (pins, ranges, extras and markers; options skipped)
//! - pyproject.toml `[project] dependencies` and `requires-python` (PEP 621)
//! - pyproject.toml `[tool.poetry.*dependencies]` (Poetry)

use super::{clean_version, read_file, Collected, Collector, CommandRunner, LATEST};
use crate::domain::{Dependency, Ecosystem};
use crate::error::CollectError;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use toml::{Table, Value};
use tracing::debug;

// name, optional [extras], then the version clause up to a marker
static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?\s*([^;]*)").unwrap()
});

/// Collector for pip and Poetry projects
pub struct PythonCollector;

impl Collector for PythonCollector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join("requirements.txt").is_file()
            || project_dir.join("pyproject.toml").is_file()
    }

    fn collect(
        &self,
        project_dir: &Path,
        _runner: Option<&dyn CommandRunner>,
        out: &mut Collected,
    ) {
        let requirements = project_dir.join("requirements.txt");
        if requirements.is_file() {
            out.push(
                read_file(&requirements).map(|content| parse_requirements(&content, &requirements)),
            );
        }

        let pyproject = project_dir.join("pyproject.toml");
        if pyproject.is_file() {
            out.push(
                read_file(&pyproject).and_then(|content| parse_pyproject(&content, &pyproject)),
            );
        }
    }
}

/// Parse requirements.txt
///
/// Comments, `-r`/`-e`/`--index-url` style options and URL or path
/// requirements are skipped. Unpinned names get version `latest`.
pub fn parse_requirements(content: &str, path: &Path) -> Vec<Dependency> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter(|line| !line.contains("://") && !line.starts_with('.') && !line.starts_with('/'))
        .filter_map(|line| parse_requirement(line, path))
        .collect()
}

/// Parse one PEP 508 requirement like `django[argon2]>=4.2,<5 ; python_version>"3.8"`
fn parse_requirement(requirement: &str, path: &Path) -> Option<Dependency> {
    let caps = REQUIREMENT_RE.captures(requirement.trim())?;
    let name = caps.get(1)?.as_str();
    let spec = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

    let spec = spec.trim_start_matches('(').trim_end_matches(')').trim();
    let version = if spec.is_empty() {
        LATEST.to_string()
    } else {
        clean_version(spec)
    };

    Some(
        Dependency::manifest(name, version, Ecosystem::Python)
            .with_declared(spec)
            .with_source(path),
    )
}

/// Parse pyproject.toml (PEP 621 and Poetry sections)
pub fn parse_pyproject(content: &str, path: &Path) -> Result<Vec<Dependency>, CollectError> {
    let toml: Table = toml::from_str(content)
        .map_err(|e| CollectError::toml_parse_error(path, e.to_string()))?;

    let mut dependencies = Vec::new();

    if let Some(project) = toml.get("project") {
        if let Some(requires) = project.get("requires-python").and_then(Value::as_str) {
            dependencies.push(python_runtime(requires, path));
        }

        let optional = project
            .get("optional-dependencies")
            .and_then(Value::as_table)
            .into_iter()
            .flat_map(|groups| groups.values());
        let declared = project.get("dependencies").into_iter().chain(optional);

        let requirements = declared
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str);
        for requirement in requirements {
            dependencies.extend(parse_requirement(requirement, path));
        }
    }

    if let Some(poetry) = toml.get("tool").and_then(|t| t.get("poetry")) {
        let groups = poetry
            .get("group")
            .and_then(Value::as_table)
            .into_iter()
            .flat_map(|groups| groups.values())
            .filter_map(|group| group.get("dependencies"));
        let tables = poetry
            .get("dependencies")
            .into_iter()
            .chain(poetry.get("dev-dependencies"))
            .chain(groups)
            .filter_map(Value::as_table);

        for table in tables {
            for (name, spec) in table {
                if let Some(dep) = poetry_dependency(name, spec, path) {
                    dependencies.push(dep);
                }
            }
        }
    }

    Ok(dependencies)
}

/// `python = "^3.9"` and friends; table specs without a version (git, path) are skipped
fn poetry_dependency(name: &str, spec: &Value, path: &Path) -> Option<Dependency> {
    let spec = match spec {
        Value::String(s) => s.as_str(),
        Value::Table(t) => match t.get("version").and_then(Value::as_str) {
            Some(v) => v,
            None => {
                debug!("Skipping {} in {}: no version", name, path.display());
                return None;
            }
        },
        _ => return None,
    };

    if name.eq_ignore_ascii_case("python") {
        return Some(python_runtime(spec, path));
    }

    Some(
        Dependency::manifest(name, clean_version(spec), Ecosystem::Python)
            .with_declared(spec)
            .with_source(path),
    )
}

fn python_runtime(spec: &str, path: &Path) -> Dependency {
    Dependency::manifest("python", clean_version(spec), Ecosystem::Python)
        .with_declared(spec)
        .with_source(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn path() -> &'static Path {
        Path::new("requirements.txt")
    }

    #[rstest]
    #[case("django==4.2.7", "django", "4.2.7")]
    #[case("requests>=2.28,<3", "requests", "2.28")]
    #[case("flask ~= 2.3", "flask", "2.3")]
    #[case("uvicorn[standard]==0.23.2", "uvicorn", "0.23.2")]
    #[case("numpy==1.26.0; python_version >= \"3.9\"", "numpy", "1.26.0")]
    #[case("pytest", "pytest", "latest")]
    #[case("Flask_SQLAlchemy (>=3.0)", "Flask_SQLAlchemy", "3.0")]
    fn test_parse_requirement(#[case] line: &str, #[case] name: &str, #[case] version: &str) {
        let dep = parse_requirement(line, path()).unwrap();
        assert_eq!(dep.name, name);
        assert_eq!(dep.resolved_version, version);
        assert!(dep.is_direct);
    }

    #[test]
    fn test_parse_requirements_skips_options_and_comments() {
        let content = r#"
# production requirements
-r base.txt
--index-url https://pypi.example.com/simple
-e git+https://github.com/org/repo.git#egg=repo
django==4.2.7  # LTS
git+https://github.com/org/other.git
./local-package

celery>=5.3
"#;
        let deps = parse_requirements(content, path());
        let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["django", "celery"]);
        assert_eq!(deps[0].declared_version, "==4.2.7");
    }

    #[test]
    fn test_parse_pyproject_pep621() {
        let content = r#"
[project]
name = "service"
requires-python = ">=3.10"
dependencies = ["django>=4.2,<5", "celery==5.3.4"]

[project.optional-dependencies]
dev = ["pytest>=7"]
"#;
        let deps = parse_pyproject(content, Path::new("pyproject.toml")).unwrap();
        let pairs: Vec<(&str, &str)> = deps
            .iter()
            .map(|d| (d.name.as_str(), d.resolved_version.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("python", "3.10"), ("django", "4.2"), ("celery", "5.3.4"), ("pytest", "7")]
        );
    }

    #[test]
    fn test_parse_pyproject_poetry() {
        let content = r#"
[tool.poetry.dependencies]
python = "^3.9"
django = "^4.2"
requests = { version = "~2.31", extras = ["socks"] }
internal = { git = "https://example.com/internal.git" }

[tool.poetry.group.dev.dependencies]
pytest = "7.4.0"
"#;
        let deps = parse_pyproject(content, Path::new("pyproject.toml")).unwrap();
        let find = |name: &str| {
            deps.iter()
                .find(|d| d.name == name)
                .map(|d| d.resolved_version.clone())
        };

        assert_eq!(find("python").as_deref(), Some("3.9"));
        assert_eq!(find("django").as_deref(), Some("4.2"));
        assert_eq!(find("requests").as_deref(), Some("2.31"));
        assert_eq!(find("pytest").as_deref(), Some("7.4.0"));
        assert_eq!(find("internal"), None);
    }

    #[test]
    fn test_parse_pyproject_invalid() {
        let result = parse_pyproject("[project", Path::new("pyproject.toml"));
        assert!(matches!(result, Err(CollectError::TomlParseError { .. })));
    }
}
