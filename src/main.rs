use clap::Parser;
use cribo::cli::commands::{bundle, check, completions, init};
use cribo::cli::{Cli, Commands};
use cribo::config::Settings;

fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init { .. }) {
        let Commands::Init { force } = cli.command else {
            unreachable!()
        };
        init::run_init(force);
        return;
    }

    let settings = match cli.config.as_ref() {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    cribo::logging::init_with_config(&verbosity_override(&settings.logging, cli.verbose));

    match cli.command {
        Commands::Init { .. } => unreachable!(),
        Commands::Bundle {
            entry,
            output,
            source_roots,
            emit_requirements,
            no_tree_shake,
            strict,
        } => {
            bundle::run_bundle(
                entry,
                output,
                source_roots,
                emit_requirements,
                no_tree_shake,
                strict,
                &settings,
            );
        }
        Commands::Check { entry, source_roots } => {
            check::run_check(entry, source_roots, &settings);
        }
        Commands::Completions { shell } => {
            completions::run_install_completion(shell);
        }
    }
}

/// `-v`/`-vv` raise the default tracing level above whatever `cribo.toml`
/// configured, without touching per-module overrides.
fn verbosity_override(logging: &cribo::config::LoggingConfig, verbose: u8) -> cribo::config::LoggingConfig {
    let mut logging = logging.clone();
    logging.default = match verbose {
        0 => logging.default,
        1 => "info".to_string(),
        _ => "debug".to_string(),
    };
    logging
}
