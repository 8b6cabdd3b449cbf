//! # Query Normalization
//!
//! User queries arrive in several shapes: `react`, `react ^19.0.0`,
//! `react@19.0.0` (copy-pasted from results), `foo>1`. This module normalizes
//! them into the `<package> [<constraint>]` form the engine expects and
//! prefilters the repositories that could possibly match.

use std::sync::OnceLock;

use regex::Regex;

use crate::lockfiles::LockfilesMap;

/// A normalized package query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The full normalized query string.
    pub raw: String,
    /// The package name (first whitespace-separated token).
    pub package: String,
    /// The version constraint, if any.
    pub constraint: Option<String>,
}

fn at_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The name may itself start with `@` (scoped packages), so only the `@`
    // after the name splits name and version.
    RE.get_or_init(|| Regex::new(r"^(@?[A-Za-z0-9_/-]+)@").expect("static regex"))
}

fn range_op_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([<>])").expect("static regex"))
}

fn bare_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^ ]+) +([0-9][0-9a-zA-Z_.-]?.*)$").expect("static regex"))
}

fn spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" +").expect("static regex"))
}

/// Normalizes a raw user query:
///
/// 1. `name@1.2.3` becomes `name 1.2.3` (scoped `@scope/name` prefixes kept);
/// 2. a space is inserted before `<` and `>` so `foo>1` parses;
/// 3. a bare version (`foo 1.2`) becomes an exact query (`foo =1.2`), since
///    the engine's semver treats bare versions as caret ranges;
/// 4. runs of spaces collapse, the result is trimmed.
pub fn normalize(input: &str) -> String {
    let mut q = input.trim().to_string();
    q = at_version_re().replace(&q, "${1} ").into_owned();
    q = range_op_re().replace_all(&q, " ${1}").into_owned();
    if let Some(caps) = bare_version_re().captures(&q) {
        q = format!("{} ={}", &caps[1], &caps[2]);
    }
    q = spaces_re().replace_all(&q, " ").into_owned();
    q.trim().to_string()
}

/// Normalizes `input` and splits it into package name and constraint.
pub fn parse(input: &str) -> Query {
    let raw = normalize(input);
    let mut parts = raw.splitn(2, ' ');
    let package = parts.next().unwrap_or_default().to_string();
    let constraint = parts
        .next()
        .map(str::to_string)
        .filter(|s| !s.is_empty());
    Query {
        raw,
        package,
        constraint,
    }
}

/// Best-effort check whether `package` occurs in a lockfile. Can return false
/// positives, never false negatives: any resolvable package appears at least
/// once as `<package>@` (possibly followed by a version, depending on the
/// lockfile generation).
pub fn package_maybe_in_lockfile(lockfile: &str, package: &str) -> bool {
    lockfile.contains(&format!("{package}@"))
}

/// The repositories whose lockfile could contain `package`, in map order.
/// An empty package name has no candidates.
pub fn candidate_repos<'a>(lockfiles: &'a LockfilesMap, package: &str) -> Vec<&'a str> {
    if package.is_empty() {
        return Vec::new();
    }
    lockfiles
        .iter()
        .filter(|(_, text)| package_maybe_in_lockfile(text, package))
        .map(|(repo, _)| repo.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_version_becomes_exact_query() {
        assert_eq!(normalize("react@19.0.0"), "react =19.0.0");
        assert_eq!(normalize("foo@1.2"), "foo =1.2");
    }

    #[test]
    fn scoped_names_keep_their_at_sign() {
        assert_eq!(normalize("@babel/core@7.24.0"), "@babel/core =7.24.0");
        assert_eq!(normalize("@babel/core"), "@babel/core");
    }

    #[test]
    fn range_operators_get_a_space() {
        assert_eq!(normalize("foo>1"), "foo >1");
        assert_eq!(normalize("foo >=15.0.0, <20.0.0"), "foo >=15.0.0, <20.0.0");
    }

    #[test]
    fn caret_ranges_pass_through() {
        assert_eq!(normalize("react ^19.0.0"), "react ^19.0.0");
    }

    #[test]
    fn bare_version_defaults_to_exact() {
        assert_eq!(normalize("foo 1.2"), "foo =1.2");
        // Already exact: stable under re-normalization.
        assert_eq!(normalize("foo =1.2"), "foo =1.2");
    }

    #[test]
    fn whitespace_is_collapsed_and_trimmed() {
        assert_eq!(normalize("  react   ^19.0.0 "), "react ^19.0.0");
    }

    #[test]
    fn parse_splits_package_and_constraint() {
        let q = parse("react@19.0.0");
        assert_eq!(q.package, "react");
        assert_eq!(q.constraint.as_deref(), Some("=19.0.0"));

        let q = parse("react");
        assert_eq!(q.package, "react");
        assert_eq!(q.constraint, None);
    }

    #[test]
    fn prefilter_matches_on_name_at() {
        let lockfile = "react@^19.0.0:\n  version \"19.0.0\"\n";
        assert!(package_maybe_in_lockfile(lockfile, "react"));
        assert!(!package_maybe_in_lockfile(lockfile, "vue"));
    }

    #[test]
    fn empty_package_has_no_candidates() {
        let mut lockfiles = LockfilesMap::new();
        lockfiles.insert("a".into(), "react@1:\n".into());
        assert!(candidate_repos(&lockfiles, "").is_empty());
        assert_eq!(candidate_repos(&lockfiles, "react"), vec!["a"]);
    }
}
