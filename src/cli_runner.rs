//! Reusable CLI runner so the `lockwhy` binary stays a thin shell around the
//! library: parse the command, wire the collaborators together, print.

use std::collections::BTreeSet;
use std::io;

use crate::cli::{self, Commands};
use crate::engine::CommandEngine;
use crate::{lockfiles, search};

/// Public entry for running CLI logic.
pub fn run_cli_app() -> Result<(), Box<dyn std::error::Error>> {
    let command = cli::run()?;

    match &command {
        Commands::Search {
            query,
            lockfiles: source,
            repos,
            engine,
            threads,
            json,
        } => {
            let auto_threads = if *threads == 0 {
                num_cpus::get()
            } else {
                *threads
            };
            rayon::ThreadPoolBuilder::new()
                .num_threads(auto_threads)
                .build_global()
                .ok();

            let map = lockfiles::load(source)?;
            let engine = CommandEngine::new(cli::engine_from_opt_or_env(engine.clone()));
            let selected: Option<BTreeSet<String>> = if repos.is_empty() {
                None
            } else {
                Some(repos.iter().cloned().collect())
            };

            let outcome = search::search(&map, &query.join(" "), &engine, selected.as_ref())?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            if *json {
                search::render_json(&outcome, &mut out)?;
            } else {
                search::render_text(&outcome, &mut out)?;
            }
        }
        Commands::List { lockfiles: source } => {
            let map = lockfiles::load(source)?;
            println!("Lockfiles archive ({} repositories):", map.len());
            for (repo, text) in &map {
                println!("- {} ({} bytes)", repo, text.len());
            }
        }
        Commands::Pack { root, output } => {
            let count = lockfiles::pack(root, output)?;
            println!("Packed {} lockfiles into {}", count, output.display());
        }
    }

    Ok(())
}
