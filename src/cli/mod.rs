use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Search all stored lockfiles for the packages that depend on a package.
    #[command(alias = "s")]
    Search {
        /// Package query, e.g. "react", "react ^19.0.0" or "react@19.0.0".
        #[arg(required = true)]
        query: Vec<String>,

        /// Path or http(s) URL of the lockfiles archive (.tar.gz or plain .tar).
        #[arg(short, long)]
        lockfiles: String,

        /// Restrict the search to these repositories (comma-separated). Searches all when omitted.
        #[arg(long, value_delimiter = ',')]
        repos: Vec<String>,

        /// Resolver program invoked once per lockfile. If not provided, LOCKWHY_ENGINE or "yarn-why" is used.
        #[arg(long)]
        engine: Option<PathBuf>,

        /// Number of parallel resolver invocations. [0 = auto-detect based on CPU cores]
        #[arg(long, default_value_t = 0)]
        threads: usize,

        /// Emit machine-readable JSON instead of the tree view.
        #[arg(long)]
        json: bool,
    },

    /// List the repositories stored in a lockfiles archive without searching it.
    #[command(alias = "l")]
    List {
        /// Path or http(s) URL of the lockfiles archive.
        #[arg(short, long)]
        lockfiles: String,
    },

    /// Build a gzip-compressed lockfiles archive from a directory tree.
    #[command(alias = "p")]
    Pack {
        /// Directory scanned recursively for yarn.lock files.
        #[arg(required = true)]
        root: PathBuf,

        /// The path for the output archive file (e.g. lockfiles.tar.gz).
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Environment variable consulted when `--engine` is absent.
pub const ENGINE_ENV_VAR: &str = "LOCKWHY_ENGINE";
/// Resolver program used when neither `--engine` nor the env var is set.
pub const DEFAULT_ENGINE: &str = "yarn-why";

/// Gets the resolver program from the command-line option, the `LOCKWHY_ENGINE`
/// environment variable, or the default.
///
/// This function centralizes engine resolution logic.
/// Priority:
/// 1. `--engine` command-line argument.
/// 2. `LOCKWHY_ENGINE` environment variable.
/// 3. The bundled default, `yarn-why`, expected on PATH.
pub fn engine_from_opt_or_env(engine_opt: Option<PathBuf>) -> PathBuf {
    if let Some(program) = engine_opt {
        return program;
    }
    if let Ok(program) = std::env::var(ENGINE_ENV_VAR) {
        return PathBuf::from(program);
    }
    PathBuf::from(DEFAULT_ENGINE)
}

/// Parses command-line arguments using `clap` and returns the command to execute.
///
/// This is the main entry point for the CLI logic.
/// It handles parsing and returns a `Commands` enum variant, or an error if parsing fails.
pub fn run() -> Result<Commands, Box<dyn std::error::Error>> {
    let args = Args::parse();
    Ok(args.command)
}
