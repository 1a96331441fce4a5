//! Merges per-source dependency lists into one deduplicated set

use crate::config::IgnoreList;
use crate::domain::{Dependency, SourceKind};
use crate::version::Version;
use tracing::debug;

/// Merge `sources` in order, dropping ignored names
///
/// Two occurrences of the same `(ecosystem, normalized name)` collapse when
/// their versions agree: equal, one a refinement of the other (`1.2` vs
/// `1.2.3`), or one of them unparseable (`latest`, `*`). The merged record
/// keeps the more precise version and is direct if any occurrence was.
///
/// Refining a record can make it agree with a record kept earlier, so
/// passes repeat until one merges nothing. The result holds unique keys and
/// aggregating it again returns it unchanged.
pub fn aggregate(sources: &[Vec<Dependency>], ignore: &IgnoreList) -> Vec<Dependency> {
    let wanted = sources.iter().flatten().filter(|dep| {
        let ignored = ignore.contains(&dep.name);
        if ignored {
            debug!("Ignoring {}", dep.name);
        }
        !ignored
    });

    let mut merged = merge_pass(wanted);
    loop {
        let next = merge_pass(merged.iter());
        if next.len() == merged.len() {
            return merged;
        }
        merged = next;
    }
}

/// One left-to-right merge; an exact key match is preferred over a refinement
fn merge_pass<'a>(deps: impl Iterator<Item = &'a Dependency>) -> Vec<Dependency> {
    let mut merged: Vec<Dependency> = Vec::new();

    for dep in deps {
        let key = dep.key();
        let name = &key.name;
        let target = merged.iter().position(|candidate| candidate.key() == key).or_else(|| {
            merged.iter().position(|candidate| {
                candidate.ecosystem == dep.ecosystem
                    && candidate.normalized_name() == *name
                    && versions_agree(&candidate.resolved_version, &dep.resolved_version)
            })
        });

        match target {
            Some(index) => merge_into(&mut merged[index], dep),
            None => merged.push(dep.clone()),
        }
    }

    merged
}

/// True when two version strings can describe the same installed version
fn versions_agree(a: &str, b: &str) -> bool {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => a == b || a.is_prefix_of(&b) || b.is_prefix_of(&a),
        _ => true,
    }
}

/// Precision rank: build-tool facts beat manifest facts, then parsed beats
/// unparsed, then more numeric components win
fn precision(dep: &Dependency) -> (bool, bool, usize) {
    let parsed = Version::parse(&dep.resolved_version).ok();
    (
        dep.source_kind == SourceKind::BuildTool,
        parsed.is_some(),
        parsed.map(|v| v.components().len()).unwrap_or(0),
    )
}

fn merge_into(existing: &mut Dependency, incoming: &Dependency) {
    let is_direct = existing.is_direct || incoming.is_direct;

    let declared = match (existing.source_kind, incoming.source_kind) {
        (SourceKind::BuildTool, SourceKind::Manifest) => incoming.declared_version.clone(),
        _ => existing.declared_version.clone(),
    };

    if precision(incoming) > precision(existing) {
        debug!(
            "Refining {} {} -> {}",
            existing.name, existing.resolved_version, incoming.resolved_version
        );
        existing.resolved_version = incoming.resolved_version.clone();
        existing.source_kind = incoming.source_kind;
        existing.source_file = incoming.source_file.clone();
    }

    existing.declared_version = declared;
    existing.is_direct = is_direct;
}
