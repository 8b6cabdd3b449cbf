//! # Dependency-Query Engine
//!
//! The actual dependency resolution lives in an external resolver binary
//! (by default `yarn-why`): it receives the lockfile text on stdin and the
//! query as arguments, and prints a JSON dependency tree on stdout. This
//! module is the seam around that black box — one invocation per
//! (repository, query) pair.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LockwhyError, Result};
use crate::query::Query;

/// Exact stdout payload the engine emits (with a non-zero exit) when the
/// queried package does not occur in the lockfile.
pub const NOT_FOUND_SENTINEL: &str = "Package not found";

/// One node of the dependency tree the engine reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// `[name, version-range-descriptor]` pair.
    pub descriptor: (String, String),
    /// The resolved version.
    #[serde(default)]
    pub version: String,
    /// Dependents further down; absent for leaves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DependencyNode>,
}

/// The ordered roots the engine returns for one repository: the top-level
/// dependencies through which the queried package is reachable.
pub type DependencyTree = Vec<DependencyNode>;

/// A resolver that answers "which dependency chains lead to this package"
/// for a single lockfile.
pub trait QueryEngine: Sync {
    /// Resolves `query` against `lockfile`. `Ok(None)` means the package is
    /// not present in that lockfile; it is not an error.
    fn resolve(&self, lockfile: &str, query: &Query) -> Result<Option<DependencyTree>>;
}

/// Invokes an external resolver process per lockfile.
pub struct CommandEngine {
    program: PathBuf,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl QueryEngine for CommandEngine {
    fn resolve(&self, lockfile: &str, query: &Query) -> Result<Option<DependencyTree>> {
        debug!(program = %self.program.display(), query = %query.raw, "invoking engine");

        let mut command = Command::new(&self.program);
        command.arg("--json").arg(&query.package);
        if let Some(constraint) = &query.constraint {
            command.arg(constraint);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LockwhyError::io(e, &self.program))?;

        // The engine consumes all of stdin before producing any output, so a
        // sequential write-then-wait cannot deadlock. Dropping the handle
        // closes the pipe.
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| LockwhyError::Engine("engine stdin unavailable".into()))?;
            stdin
                .write_all(lockfile.as_bytes())
                .map_err(|e| LockwhyError::io(e, &self.program))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| LockwhyError::io(e, &self.program))?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            if stdout.trim_end() == NOT_FOUND_SENTINEL {
                return Ok(None);
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LockwhyError::Engine(format!(
                "{}: {}",
                self.program.display(),
                stderr.trim_end()
            )));
        }

        let tree: DependencyTree = serde_json::from_str(&stdout)?;
        Ok(Some(tree))
    }
}
