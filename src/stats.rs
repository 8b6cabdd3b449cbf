//! # Version Statistics
//!
//! Aggregates how often each resolved version of the queried package occurs
//! across the dependency trees returned for all repositories. The counts are
//! an estimate: the engine prints every shared subtree exactly once.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::{DependencyNode, DependencyTree};

/// Resolved version → occurrence count.
pub type VersionCounts = BTreeMap<String, u64>;

/// Counts, per resolved version, how often `package` occurs anywhere in `nodes`.
pub fn tree_stats(nodes: &[DependencyNode], package: &str) -> VersionCounts {
    let mut counts = VersionCounts::new();
    collect(nodes, package, &mut counts);
    counts
}

fn collect(nodes: &[DependencyNode], package: &str, acc: &mut VersionCounts) {
    for node in nodes {
        if node.descriptor.0 == package {
            *acc.entry(node.version.clone()).or_insert(0) += 1;
        }
        collect(&node.children, package, acc);
    }
}

/// Sums a sequence of per-repository counts into one, e.g.
/// `combine([{a: 2, b: 3}, {a: 1, d: 7}]) == {a: 3, b: 3, d: 7}`.
pub fn combine(stats: impl IntoIterator<Item = VersionCounts>) -> VersionCounts {
    let mut acc = VersionCounts::new();
    for counts in stats {
        for (version, count) in counts {
            *acc.entry(version).or_insert(0) += count;
        }
    }
    acc
}

/// One row of the version table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionCount {
    pub version: String,
    pub occurrences: u64,
}

/// Aggregated statistics for one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchStats {
    /// Repositories with at least one match.
    pub repositories: usize,
    /// Total top-level dependencies (tree roots) across all repositories.
    pub top_level_dependents: usize,
    /// Versions sorted by descending occurrence count (ties by version string).
    pub versions: Vec<VersionCount>,
}

/// Computes the full statistics block over per-repository results.
pub fn search_stats(results: &[(String, DependencyTree)], package: &str) -> SearchStats {
    let combined = combine(results.iter().map(|(_, tree)| tree_stats(tree, package)));

    let mut versions: Vec<VersionCount> = combined
        .into_iter()
        .map(|(version, occurrences)| VersionCount {
            version,
            occurrences,
        })
        .collect();
    versions.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.version.cmp(&b.version))
    });

    SearchStats {
        repositories: results.len(),
        top_level_dependents: results.iter().map(|(_, tree)| tree.len()).sum(),
        versions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, version: &str, children: Vec<DependencyNode>) -> DependencyNode {
        DependencyNode {
            descriptor: (name.to_string(), format!("^{version}")),
            version: version.to_string(),
            children,
        }
    }

    #[test]
    fn counts_target_occurrences_at_any_depth() {
        let tree = vec![node(
            "webpack",
            "5.90.0",
            vec![
                node("react", "19.0.0", vec![]),
                node("loader", "2.0.0", vec![node("react", "18.3.1", vec![])]),
            ],
        )];
        let counts = tree_stats(&tree, "react");
        assert_eq!(counts.get("19.0.0"), Some(&1));
        assert_eq!(counts.get("18.3.1"), Some(&1));
        // The non-target packages are not counted.
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn combine_sums_per_key() {
        let a = VersionCounts::from([("a".to_string(), 2), ("b".to_string(), 3)]);
        let b = VersionCounts::from([("a".to_string(), 1), ("d".to_string(), 7)]);
        let combined = combine([a, b]);
        assert_eq!(
            combined,
            VersionCounts::from([
                ("a".to_string(), 3),
                ("b".to_string(), 3),
                ("d".to_string(), 7)
            ])
        );
    }

    #[test]
    fn stats_sort_by_occurrences_then_version() {
        let results = vec![
            (
                "repo-a".to_string(),
                vec![node("app", "1.0.0", vec![node("react", "19.0.0", vec![])])],
            ),
            (
                "repo-b".to_string(),
                vec![
                    node("app", "1.0.0", vec![node("react", "18.3.1", vec![])]),
                    node("tool", "2.0.0", vec![node("react", "18.3.1", vec![])]),
                ],
            ),
        ];
        let stats = search_stats(&results, "react");

        assert_eq!(stats.repositories, 2);
        assert_eq!(stats.top_level_dependents, 3);
        assert_eq!(
            stats.versions,
            vec![
                VersionCount {
                    version: "18.3.1".into(),
                    occurrences: 2
                },
                VersionCount {
                    version: "19.0.0".into(),
                    occurrences: 1
                },
            ]
        );
    }
}
