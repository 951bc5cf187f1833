//! `bundle` command: run the full pipeline and write the result atomically.

use std::path::PathBuf;

use crate::atomic_write::write_atomic;
use crate::config::Settings;
use crate::pipeline::{self, BundleRequest};

#[allow(clippy::too_many_arguments)]
pub fn run_bundle(
    entry: PathBuf,
    output: PathBuf,
    source_roots: Vec<PathBuf>,
    emit_requirements: bool,
    no_tree_shake: bool,
    strict: bool,
    settings: &Settings,
) {
    let source_roots = if source_roots.is_empty() {
        settings.bundle.source_roots.clone()
    } else {
        source_roots
    };

    let request = BundleRequest {
        entry: &entry,
        source_roots,
        strict: strict || settings.bundle.strict,
        tree_shake: !no_tree_shake && settings.bundle.tree_shake,
    };

    let outcome = match pipeline::run(&request) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error: {err}");
            for suggestion in err.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
            std::process::exit(1);
        }
    };

    for diagnostic in &outcome.diagnostics {
        tracing::warn!("{diagnostic}");
    }

    if let Err(err) = write_atomic(&output, &outcome.source) {
        eprintln!("error: failed to write bundle to '{}': {err}", output.display());
        std::process::exit(1);
    }
    println!("Bundled {} -> {}", entry.display(), output.display());

    if emit_requirements || settings.bundle.emit_requirements {
        let requirements_path = output.with_file_name(requirements_file_name(&output));
        let contents = outcome
            .third_party_packages
            .iter()
            .map(|pkg| format!("{pkg}\n"))
            .collect::<String>();
        if let Err(err) = write_atomic(&requirements_path, &contents) {
            eprintln!(
                "error: failed to write requirements to '{}': {err}",
                requirements_path.display()
            );
            std::process::exit(1);
        }
        println!("Wrote {}", requirements_path.display());
    }
}

fn requirements_file_name(output: &std::path::Path) -> String {
    match output.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => format!("{stem}.requirements.txt"),
        None => "requirements.txt".to_string(),
    }
}
