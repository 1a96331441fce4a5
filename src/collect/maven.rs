//! Maven collector
//!
//! Handles:
//! - pom.xml (parent, Java release property, `<dependencies>` with
//!   `${property}` substitution)
//! - `mvn dependency:tree` text output

use super::tool::{display_command, first_error_line};
use super::{read_file, Collected, Collector, CommandRunner, LATEST};
use crate::domain::{Dependency, Ecosystem};
use crate::error::CollectError;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

/// Properties consulted, in order, for the Java release
const JAVA_PROPERTIES: [&str; 4] = [
    "java.version",
    "maven.compiler.release",
    "maven.compiler.source",
    "maven.compiler.target",
];

static PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

// indentation, then `+- ` or `\- `, then group:artifact:type[:classifier]:version[:scope]
static TREE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\[INFO\] )?([| ]*)[+\\]- (\S+)").unwrap());

/// Collector for Maven projects
pub struct MavenCollector;

impl Collector for MavenCollector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Java
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join("pom.xml").is_file()
    }

    fn collect(&self, project_dir: &Path, runner: Option<&dyn CommandRunner>, out: &mut Collected) {
        let pom = project_dir.join("pom.xml");
        out.push(read_file(&pom).and_then(|content| parse_pom(&content, &pom)));

        if let Some(runner) = runner {
            out.push(run_dependency_tree(runner, project_dir));
        }
    }
}

#[derive(Debug, Default)]
struct Coordinates {
    artifact_id: String,
    version: Option<String>,
}

#[derive(Debug, Default)]
struct PomModel {
    version: Option<String>,
    parent: Option<Coordinates>,
    properties: HashMap<String, String>,
    dependencies: Vec<Coordinates>,
}

impl PomModel {
    fn property(&self, name: &str) -> Option<&str> {
        match name {
            "project.version" | "version" => self.version.as_deref(),
            "project.parent.version" | "parent.version" => {
                self.parent.as_ref().and_then(|p| p.version.as_deref())
            }
            _ => self.properties.get(name).map(String::as_str),
        }
    }

    /// Replace `${name}` references; unknown properties are left in place
    fn substitute(&self, value: &str) -> String {
        PROPERTY_RE
            .replace_all(value, |caps: &Captures| {
                self.property(&caps[1]).unwrap_or(&caps[0]).to_string()
            })
            .into_owned()
    }
}

/// Parse pom.xml into direct manifest dependencies
pub fn parse_pom(content: &str, path: &Path) -> Result<Vec<Dependency>, CollectError> {
    let model = read_pom_model(content, path)?;
    let mut dependencies = Vec::new();

    if let Some(release) = JAVA_PROPERTIES.iter().find_map(|p| model.properties.get(*p)) {
        let release = model.substitute(release);
        dependencies.push(
            Dependency::manifest("java", normalize_java_release(&release), Ecosystem::Java)
                .with_declared(release)
                .with_source(path),
        );
    }

    let declared = model.parent.iter().chain(model.dependencies.iter());
    for coordinates in declared.filter(|c| !c.artifact_id.is_empty()) {
        let declared_version = coordinates
            .version
            .as_deref()
            .map(|v| model.substitute(v))
            .unwrap_or_else(|| LATEST.to_string());
        dependencies.push(
            Dependency::manifest(&coordinates.artifact_id, declared_version, Ecosystem::Java)
                .with_source(path),
        );
    }

    Ok(dependencies)
}

fn read_pom_model(content: &str, path: &Path) -> Result<PomModel, CollectError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut model = PomModel::default();
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<Coordinates> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            let message = format!("{} at position {}", e, reader.buffer_position());
            CollectError::xml_parse_error(path, message)
        })?;

        match event {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if name == "dependency" && is_at(&stack, &["project", "dependencies"]) {
                    current = Some(Coordinates::default());
                } else if name == "parent" && is_at(&stack, &["project"]) {
                    model.parent = Some(Coordinates::default());
                }
                stack.push(name);
            }
            Event::End(_) => {
                if is_at(&stack, &["project", "dependencies", "dependency"]) {
                    model.dependencies.extend(current.take());
                }
                stack.pop();
            }
            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map_err(|err| CollectError::xml_parse_error(path, err.to_string()))?
                    .into_owned();
                apply_text(&mut model, &mut current, &stack, text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(model)
}

fn is_at(stack: &[String], path: &[&str]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a == b)
}

fn apply_text(
    model: &mut PomModel,
    current: &mut Option<Coordinates>,
    stack: &[String],
    text: String,
) {
    let names: Vec<&str> = stack.iter().map(String::as_str).collect();
    match names.as_slice() {
        ["project", "version"] => model.version = Some(text),
        ["project", "properties", property] => {
            model.properties.insert(property.to_string(), text);
        }
        ["project", "parent", field] => {
            if let Some(parent) = model.parent.as_mut() {
                set_field(parent, field, text);
            }
        }
        ["project", "dependencies", "dependency", field] => {
            if let Some(dep) = current.as_mut() {
                set_field(dep, field, text);
            }
        }
        _ => {}
    }
}

fn set_field(coordinates: &mut Coordinates, field: &str, text: String) {
    match field {
        "artifactId" => coordinates.artifact_id = text,
        "version" => coordinates.version = Some(text),
        _ => {}
    }
}

/// `1.8` → `8`; later releases are already bare
pub(super) fn normalize_java_release(release: &str) -> String {
    match release.strip_prefix("1.") {
        Some(rest) if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) => rest.to_string(),
        _ => release.to_string(),
    }
}

fn run_dependency_tree(
    runner: &dyn CommandRunner,
    project_dir: &Path,
) -> Result<Vec<Dependency>, CollectError> {
    let args: Vec<String> = ["dependency:tree", "-DoutputType=text", "-B"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let output = runner.run("mvn", &args, project_dir)?;

    if !output.success {
        return Err(CollectError::CommandFailed {
            command: display_command("mvn", &args),
            message: first_error_line(&output),
        });
    }

    Ok(parse_dependency_tree(&output.stdout, &project_dir.join("pom.xml")))
}

/// Parse `mvn dependency:tree` text output; depth one is direct
pub fn parse_dependency_tree(content: &str, path: &Path) -> Vec<Dependency> {
    let mut dependencies = Vec::new();
    let mut seen = HashSet::new();

    for line in content.lines() {
        let Some(caps) = TREE_LINE_RE.captures(line) else {
            continue;
        };
        let is_direct = caps[1].is_empty();
        let parts: Vec<&str> = caps[2].split(':').collect();

        // group:artifact:type:classifier:version:scope carries a classifier
        let version = match parts.len() {
            6 => parts[4],
            4 | 5 => parts[3],
            _ => continue,
        };
        let artifact = parts[1];

        if seen.insert((artifact.to_string(), version.to_string(), is_direct)) {
            dependencies.push(
                Dependency::build_tool(artifact, version, Ecosystem::Java, is_direct)
                    .with_source(path),
            );
        }
    }

    dependencies
}
