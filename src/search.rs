//! # Search Orchestration
//!
//! Ties the pieces together: normalize the query, prefilter the repositories
//! whose lockfile could match, fan the engine out over the candidates in
//! parallel, and render the surviving results as an indented tree or JSON.

use std::collections::BTreeSet;
use std::io;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::engine::{DependencyNode, DependencyTree, QueryEngine};
use crate::error::{LockwhyError, Result};
use crate::lockfiles::LockfilesMap;
use crate::query::{self, Query};
use crate::stats::{self, SearchStats};

/// The outcome of one search across all repositories.
#[derive(Debug)]
pub struct SearchOutcome {
    pub query: Query,
    /// `(repository, dependency tree)` pairs, repositories in map order.
    /// Repositories where the package was not found are absent.
    pub results: Vec<(String, DependencyTree)>,
    pub stats: SearchStats,
}

/// Runs `input` against every candidate repository in `lockfiles`.
///
/// The engine runs once per candidate repository; invocations are independent
/// and fan out in parallel. A failing invocation fails the whole search, with
/// the repository named in the error; "package not found" results are simply
/// dropped.
pub fn search(
    lockfiles: &LockfilesMap,
    input: &str,
    engine: &dyn QueryEngine,
    selected: Option<&BTreeSet<String>>,
) -> Result<SearchOutcome> {
    let query = query::parse(input);

    let candidates: Vec<&str> = query::candidate_repos(lockfiles, &query.package)
        .into_iter()
        .filter(|repo| selected.map_or(true, |s| s.contains(*repo)))
        .collect();
    debug!(
        package = %query.package,
        candidates = candidates.len(),
        "prefiltered repositories"
    );

    let resolved: Vec<(String, Option<DependencyTree>)> = candidates
        .par_iter()
        .map(|repo| {
            engine
                .resolve(lockfiles[*repo].as_str(), &query)
                .map(|tree| (repo.to_string(), tree))
                .map_err(|e| match e {
                    LockwhyError::Engine(msg) => LockwhyError::Engine(format!("{repo}: {msg}")),
                    other => other,
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let results: Vec<(String, DependencyTree)> = resolved
        .into_iter()
        .filter_map(|(repo, tree)| tree.map(|t| (repo, t)))
        .collect();

    let stats = stats::search_stats(&results, &query.package);
    Ok(SearchOutcome {
        query,
        results,
        stats,
    })
}

/// Renders the outcome as the indented tree view.
pub fn render_text(outcome: &SearchOutcome, out: &mut impl io::Write) -> io::Result<()> {
    writeln!(out, "Searched for: {}", outcome.query.raw)?;

    if outcome.results.is_empty() {
        writeln!(out, "No results found")?;
        return Ok(());
    }

    let stats = &outcome.stats;
    if stats.repositories == 1 {
        writeln!(out, "1 repository contains matching packages")?;
    } else {
        writeln!(
            out,
            "{} repositories contain matching packages",
            stats.repositories
        )?;
    }
    if stats.top_level_dependents == 1 {
        writeln!(out, "1 top level dependency depends on matching packages")?;
    } else {
        writeln!(
            out,
            "{} top level dependencies depend on matching packages",
            stats.top_level_dependents
        )?;
    }
    match stats.versions.len() {
        0 => {}
        1 => writeln!(
            out,
            "1 matching version found: {}",
            stats.versions[0].version
        )?,
        n => {
            writeln!(out, "{n} matching versions found (occurrences / versions):")?;
            for row in &stats.versions {
                writeln!(out, "  {:>5}  {}", row.occurrences, row.version)?;
            }
            writeln!(
                out,
                "  (occurrence counts are an estimate: every dependency's subtree is printed just once)"
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Results:")?;
    for (repo, tree) in &outcome.results {
        writeln!(out, "{repo}")?;
        render_tree(tree, &outcome.query.package, "", out)?;
    }
    Ok(())
}

fn render_tree(
    nodes: &[DependencyNode],
    package: &str,
    prefix: &str,
    out: &mut impl io::Write,
) -> io::Result<()> {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "└─" } else { "├─" };
        let (name, descriptor) = &node.descriptor;
        if name == package {
            writeln!(
                out,
                "{prefix}{branch} ✔ {name}@{} ({descriptor})",
                node.version
            )?;
        } else {
            writeln!(
                out,
                "{prefix}{branch} {name}@{} (via {descriptor})",
                node.version
            )?;
        }
        let child_prefix = format!("{prefix}{}", if last { "   " } else { "│  " });
        render_tree(&node.children, package, &child_prefix, out)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonResult<'a> {
    repository: &'a str,
    dependencies: &'a [DependencyNode],
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    query: &'a str,
    package: &'a str,
    stats: &'a SearchStats,
    results: Vec<JsonResult<'a>>,
}

/// Renders the outcome as machine-readable JSON.
pub fn render_json(outcome: &SearchOutcome, out: &mut impl io::Write) -> Result<()> {
    let doc = JsonOutcome {
        query: &outcome.query.raw,
        package: &outcome.query.package,
        stats: &outcome.stats,
        results: outcome
            .results
            .iter()
            .map(|(repo, tree)| JsonResult {
                repository: repo,
                dependencies: tree,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &doc)?;
    writeln!(out).map_err(|e| LockwhyError::Other(Box::new(e)))?;
    Ok(())
}
