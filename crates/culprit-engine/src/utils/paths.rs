//! File-path identity heuristics.
//!
//! Crash paths and changelog paths rarely agree byte for byte: build bots
//! prefix absolute checkout roots, dependencies get moved around, and some
//! frames only carry a partial path. These helpers decide when two paths
//! name the same file, and map raw crash paths onto known dependencies.

use crate::dependency::Dependency;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Minimum number of shared components for two long paths to be the same file
const MIN_SHARED_COMPONENTS: usize = 3;

static TEST_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let suffixes = [
        "_unittest",
        "_unittests",
        "_browsertest",
        "_browsertests",
        "_browser_test",
        "_browser_tests",
        "_perftest",
        "_perftests",
        "_performancetest",
        "_performancetests",
        "_ui_test",
        "_uitest",
        "_interactive_uitest",
        "_apitest",
        "_test",
        "_tests",
    ];
    Regex::new(&format!(r"(?i)(^|/)[^/]*({})\.[^/.]+$", suffixes.join("|"))).unwrap()
});

fn component_counts(parts: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for part in parts {
        *counts.entry(part.as_str()).or_insert(0) += 1;
    }
    counts
}

fn lowercase_components(path: &str) -> Vec<String> {
    path.to_lowercase().split('/').map(str::to_string).collect()
}

/// Fuzzy file-path equality.
///
/// Both paths are split on `/`, lower-cased and treated as multisets of
/// components. If either path has fewer than three components, all of its
/// components must appear in the other path. Otherwise the two paths must
/// share at least three components (counting multiplicity) and end in the
/// same file name.
pub fn is_same_file_path(path_1: &str, path_2: &str) -> bool {
    if path_1 == path_2 {
        return true;
    }

    if path_1.is_empty() || path_2.is_empty() {
        return false;
    }

    let parts_1 = lowercase_components(path_1);
    let parts_2 = lowercase_components(path_2);
    let counts_1 = component_counts(&parts_1);
    let counts_2 = component_counts(&parts_2);

    let is_contained = |short: &HashMap<&str, usize>, long: &HashMap<&str, usize>| {
        short
            .iter()
            .all(|(part, count)| long.get(part).copied().unwrap_or(0) >= *count)
    };

    let short_1 = parts_1.len() < MIN_SHARED_COMPONENTS;
    let short_2 = parts_2.len() < MIN_SHARED_COMPONENTS;
    if short_1 || short_2 {
        return (short_1 && is_contained(&counts_1, &counts_2))
            || (short_2 && is_contained(&counts_2, &counts_1));
    }

    if parts_1.last() != parts_2.last() {
        return false;
    }

    let shared: usize = counts_1
        .iter()
        .map(|(part, count)| (*count).min(counts_2.get(part).copied().unwrap_or(0)))
        .sum();

    shared >= MIN_SHARED_COMPONENTS
}

/// Whether a path looks like a test-only file (`foo_unittest.cc`, `bar_browsertest.mm`,
/// plain `baz_test.cc`)
pub fn is_test_file(path: &str) -> bool {
    TEST_FILE_RE.is_match(path)
}

/// Directory part of a `/`-separated path, without trailing slash
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Normalize a raw crash path: unify separators, drop `.` and resolve `..`.
///
/// Leading slashes are dropped, so absolute bot paths become relative.
pub fn normalize_path(raw_path: &str) -> String {
    let unified = raw_path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    parts.join("/")
}

/// Map a raw crash path onto a known dependency.
///
/// The longest dependency path found at a component boundary wins. Returns
/// `(dep_path, dependency-relative file path, repo_url)`; when no dependency
/// matches, `dep_path` is empty and the normalized path is returned whole.
pub fn resolve_dep_path(
    raw_path: &str,
    dependencies: &BTreeMap<String, Dependency>,
) -> (String, String, Option<String>) {
    let normalized = normalize_path(raw_path);

    let mut candidates: Vec<&Dependency> = dependencies.values().collect();
    candidates.sort_by(|a, b| b.path.len().cmp(&a.path.len()));

    for dependency in candidates {
        let dep_path = dependency.path.trim_end_matches('/');
        if dep_path.is_empty() {
            continue;
        }

        let prefix = format!("{}/", dep_path);
        let start = if normalized.starts_with(&prefix) {
            Some(0)
        } else {
            normalized
                .find(&format!("/{}", prefix))
                .map(|pos| pos + 1)
        };

        if let Some(start) = start {
            let file_path = normalized[start + prefix.len()..].to_string();
            return (
                dependency.path.clone(),
                file_path,
                Some(dependency.repo_url.clone()),
            );
        }
    }

    (String::new(), normalized, None)
}
