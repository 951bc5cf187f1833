//! `check` command: run stages 1-5 and report diagnostics without emitting.

use std::path::PathBuf;

use crate::config::Settings;
use crate::pipeline::{self, BundleRequest};

pub fn run_check(entry: PathBuf, source_roots: Vec<PathBuf>, settings: &Settings) {
    let source_roots = if source_roots.is_empty() {
        settings.bundle.source_roots.clone()
    } else {
        source_roots
    };

    let request = BundleRequest {
        entry: &entry,
        source_roots,
        strict: settings.bundle.strict,
        tree_shake: settings.bundle.tree_shake,
    };

    let diagnostics = match pipeline::check(&request) {
        Ok(diagnostics) => diagnostics,
        Err(err) => {
            eprintln!("error: {err}");
            for suggestion in err.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
            std::process::exit(1);
        }
    };

    if diagnostics.is_empty() {
        println!("No issues found.");
        return;
    }

    for diagnostic in &diagnostics {
        println!("warning: {diagnostic}");
    }
    println!("{} diagnostic(s) found.", diagnostics.len());
}
