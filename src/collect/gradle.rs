//! Gradle collector
//!
//! Handles:
//! - build.gradle / build.gradle.kts (Java release, string-notation
//!   dependency declarations with `$property` substitution)
//! - `gradle dependencies --configuration runtimeClasspath` output

use super::maven::normalize_java_release;
use super::tool::{display_command, first_error_line};
use super::{read_file, Collected, Collector, CommandRunner, LATEST};
use crate::domain::{Dependency, Ecosystem};
use crate::error::CollectError;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const BUILD_FILES: [&str; 2] = ["build.gradle", "build.gradle.kts"];

static JAVA_RELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:sourceCompatibility\s*=\s*(?:['"]([^'"]+)['"]|JavaVersion\.VERSION_([0-9_]+)|([0-9][0-9.]*))|JavaLanguageVersion\.of\(\s*(\d+)\s*\))"#,
    )
    .unwrap()
});

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:implementation|api|compile|runtime|runtimeOnly|compileOnly|testImplementation|testCompile|testRuntimeOnly|annotationProcessor)\s*\(?\s*['"]([^'"]+)['"]"#,
    )
    .unwrap()
});

// `def x = '1'`, `val x = "1"`, `ext.x = '1'` and plain `x = '1'` inside `ext {}`
static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:def\s+|val\s+|ext\.)?([A-Za-z_][\w.]*)\s*=\s*['"]([^'"$]+)['"]"#)
        .unwrap()
});

static INTERPOLATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{?([A-Za-z_][\w.]*)\}?").unwrap());

static TREE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([| ]*)[+\\]--- (.+)$").unwrap());

/// Collector for Gradle projects
pub struct GradleCollector;

impl GradleCollector {
    fn build_file(project_dir: &Path) -> Option<PathBuf> {
        BUILD_FILES
            .iter()
            .map(|name| project_dir.join(name))
            .find(|path| path.is_file())
    }
}

impl Collector for GradleCollector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Java
    }

    fn detect(&self, project_dir: &Path) -> bool {
        Self::build_file(project_dir).is_some()
    }

    fn collect(&self, project_dir: &Path, runner: Option<&dyn CommandRunner>, out: &mut Collected) {
        let Some(build_file) = Self::build_file(project_dir) else {
            return;
        };
        out.push(read_file(&build_file).map(|content| parse_build_file(&content, &build_file)));

        if let Some(runner) = runner {
            out.push(run_dependency_tree(runner, project_dir, &build_file));
        }
    }
}

/// Parse a Gradle build script into direct manifest dependencies
///
/// Only string notation (`"group:artifact:version"`) is understood; map
/// notation and version catalogs are skipped.
pub fn parse_build_file(content: &str, path: &Path) -> Vec<Dependency> {
    let properties: HashMap<&str, &str> = ASSIGNMENT_RE
        .captures_iter(content)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect();
    let substitute = |value: &str| {
        INTERPOLATION_RE
            .replace_all(value, |caps: &Captures| {
                let name = caps[1].trim_start_matches("ext.");
                properties.get(name).map_or_else(|| caps[0].to_string(), |v| v.to_string())
            })
            .into_owned()
    };

    let mut dependencies = Vec::new();

    if let Some(release) = java_release(content) {
        dependencies.push(
            Dependency::manifest("java", normalize_java_release(&release), Ecosystem::Java)
                .with_declared(release)
                .with_source(path),
        );
    }

    for caps in DECLARATION_RE.captures_iter(content) {
        let notation = substitute(&caps[1]);
        let notation = notation.split('@').next().unwrap_or_default();
        let parts: Vec<&str> = notation.split(':').collect();
        let (artifact, version) = match parts.as_slice() {
            [_, artifact] => (*artifact, LATEST),
            [_, artifact, version, ..] if !version.is_empty() => (*artifact, *version),
            [_, artifact, ..] => (*artifact, LATEST),
            _ => continue,
        };
        if artifact.is_empty() {
            continue;
        }
        dependencies
            .push(Dependency::manifest(artifact, version, Ecosystem::Java).with_source(path));
    }

    dependencies
}

fn java_release(content: &str) -> Option<String> {
    let caps = JAVA_RELEASE_RE.captures(content)?;
    if let Some(quoted) = caps.get(1).or(caps.get(3)).or(caps.get(4)) {
        return Some(quoted.as_str().to_string());
    }
    // JavaVersion.VERSION_1_8 → 1.8
    caps.get(2).map(|m| m.as_str().replace('_', "."))
}

fn run_dependency_tree(
    runner: &dyn CommandRunner,
    project_dir: &Path,
    build_file: &Path,
) -> Result<Vec<Dependency>, CollectError> {
    let args: Vec<String> = [
        "dependencies",
        "--configuration",
        "runtimeClasspath",
        "--console=plain",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let output = runner.run("gradle", &args, project_dir)?;

    if !output.success {
        return Err(CollectError::CommandFailed {
            command: display_command("gradle", &args),
            message: first_error_line(&output),
        });
    }

    Ok(parse_dependency_tree(&output.stdout, build_file))
}

/// Parse `gradle dependencies` tree output; top-level entries are direct
///
/// Conflict resolution (`1.0 -> 1.2`) reports the selected version.
/// Project dependencies and entries without a version are skipped.
pub fn parse_dependency_tree(content: &str, path: &Path) -> Vec<Dependency> {
    let mut dependencies = Vec::new();
    let mut seen = HashSet::new();

    for line in content.lines() {
        let Some(caps) = TREE_LINE_RE.captures(line) else {
            continue;
        };
        let body = caps[2].trim();
        if body.starts_with("project ") {
            continue;
        }
        let Some((artifact, version)) = tree_entry(body) else {
            continue;
        };
        let is_direct = caps[1].is_empty();

        if seen.insert((artifact.to_string(), version.to_string(), is_direct)) {
            dependencies.push(
                Dependency::build_tool(artifact, version, Ecosystem::Java, is_direct)
                    .with_source(path),
            );
        }
    }

    dependencies
}

fn tree_entry(body: &str) -> Option<(&str, &str)> {
    // (*) repeated subtree, (c) constraint, (n) not resolved
    let body = ["(*)", "(c)", "(n)"]
        .iter()
        .fold(body, |b, marker| b.strip_suffix(marker).map_or(b, str::trim_end));

    let (coordinates, selected) = match body.rsplit_once(" -> ") {
        Some((coordinates, selected)) => (coordinates, Some(selected.trim())),
        None => (body, None),
    };

    let mut parts = coordinates.split(':');
    parts.next()?;
    let artifact = parts.next()?.trim();
    let version = selected.or_else(|| parts.next().map(str::trim))?;
    (!artifact.is_empty() && !version.is_empty()).then_some((artifact, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{CommandOutput, MockCommandRunner};
    use crate::domain::SourceKind;
    use std::fs;
    use tempfile::TempDir;

    const BUILD_GRADLE: &str = r#"plugins {
    id 'java'
    id 'org.springframework.boot' version '2.7.0'
}

sourceCompatibility = '1.8'

ext {
    guavaVersion = '31.1-jre'
}

dependencies {
    implementation 'org.springframework.boot:spring-boot-starter-web'
    implementation "com.google.guava:guava:${guavaVersion}"
    runtimeOnly 'org.postgresql:postgresql:42.5.0'
    testImplementation 'junit:junit:4.13.2@jar'
}
"#;

    const TREE: &str = r#"
> Task :dependencies

------------------------------------------------------------
Root project 'demo'
------------------------------------------------------------

runtimeClasspath - Runtime classpath of source set 'main'.
+--- org.springframework.boot:spring-boot-starter-web -> 2.7.0
|    +--- org.springframework.boot:spring-boot-starter:2.7.0
|    |    \--- org.yaml:snakeyaml:1.30
|    \--- org.springframework:spring-core:5.3.20 (*)
+--- com.google.guava:guava:31.1-jre
|    \--- com.google.guava:failureaccess:1.0.1
+--- org.apache.commons:commons-lang3:3.12.0 -> 3.13.0
+--- project :common
\--- org.postgresql:postgresql:42.5.0

(*) - dependencies omitted (listed previously)
"#;

    #[test]
    fn test_parse_build_file() {
        let deps = parse_build_file(BUILD_GRADLE, Path::new("build.gradle"));
        let pairs: Vec<(&str, &str)> = deps
            .iter()
            .map(|d| (d.name.as_str(), d.resolved_version.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("java", "8"),
                ("spring-boot-starter-web", "latest"),
                ("guava", "31.1-jre"),
                ("postgresql", "42.5.0"),
                ("junit", "4.13.2"),
            ]
        );
        assert_eq!(deps[0].declared_version, "1.8");
        assert!(deps.iter().all(|d| d.is_direct && d.source_kind == SourceKind::Manifest));
    }

    #[test]
    fn test_parse_kotlin_dsl() {
        let content = r#"
val springVersion = "5.3.8"

java {
    toolchain {
        languageVersion.set(JavaLanguageVersion.of(17))
    }
}

dependencies {
    implementation("org.springframework:spring-core:$springVersion")
    api("org.slf4j:slf4j-api:1.7.36")
}
"#;
        let deps = parse_build_file(content, Path::new("build.gradle.kts"));
        let pairs: Vec<(&str, &str)> = deps
            .iter()
            .map(|d| (d.name.as_str(), d.resolved_version.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![("java", "17"), ("spring-core", "5.3.8"), ("slf4j-api", "1.7.36")]
        );
    }

    #[test]
    fn test_java_version_constant() {
        let content = "sourceCompatibility = JavaVersion.VERSION_11\n";
        let deps = parse_build_file(content, Path::new("build.gradle"));
        assert_eq!(deps[0].name, "java");
        assert_eq!(deps[0].resolved_version, "11");
    }

    #[test]
    fn test_unknown_property_left_in_place() {
        let deps = parse_build_file(
            "dependencies {\n    implementation \"io.netty:netty-all:$nettyVersion\"\n}\n",
            Path::new("build.gradle"),
        );
        assert_eq!(deps[0].resolved_version, "$nettyVersion");
    }

    #[test]
    fn test_parse_dependency_tree() {
        let deps = parse_dependency_tree(TREE, Path::new("build.gradle"));
        let summary: Vec<(&str, &str, bool)> = deps
            .iter()
            .map(|d| (d.name.as_str(), d.resolved_version.as_str(), d.is_direct))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("spring-boot-starter-web", "2.7.0", true),
                ("spring-boot-starter", "2.7.0", false),
                ("snakeyaml", "1.30", false),
                ("spring-core", "5.3.20", false),
                ("guava", "31.1-jre", true),
                ("failureaccess", "1.0.1", false),
                ("commons-lang3", "3.13.0", true),
                ("postgresql", "42.5.0", true),
            ]
        );
        assert!(deps.iter().all(|d| d.source_kind == SourceKind::BuildTool));
    }

    #[test]
    fn test_collect_runs_gradle() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("build.gradle"), BUILD_GRADLE).unwrap();

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, args, _| {
                program == "gradle" && args.iter().any(|a| a == "runtimeClasspath")
            })
            .times(1)
            .returning(|_, _, _| Ok(CommandOutput::success(TREE)));

        let mut collected = Collected::default();
        GradleCollector.collect(temp_dir.path(), Some(&runner), &mut collected);

        assert_eq!(collected.sources.len(), 2);
        assert!(collected.errors.is_empty());
        assert!(collected.sources[1].iter().all(|d| d.source_kind == SourceKind::BuildTool));
    }

    #[test]
    fn test_collect_with_failing_gradle_keeps_build_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("build.gradle.kts"),
            "dependencies {\n    implementation(\"junit:junit:4.13.2\")\n}\n",
        )
        .unwrap();

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_, _, _| {
                Ok(CommandOutput::failure("FAILURE: Build failed with an exception."))
            });

        let mut collected = Collected::default();
        GradleCollector.collect(temp_dir.path(), Some(&runner), &mut collected);

        assert_eq!(collected.sources.len(), 1);
        assert_eq!(collected.sources[0][0].name, "junit");
        assert_eq!(collected.errors.len(), 1);
        assert!(collected.errors[0].to_string().contains("Build failed"));
    }

    #[test]
    fn test_detect() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!GradleCollector.detect(temp_dir.path()));
        fs::write(temp_dir.path().join("build.gradle.kts"), "").unwrap();
        assert!(GradleCollector.detect(temp_dir.path()));
    }
}
