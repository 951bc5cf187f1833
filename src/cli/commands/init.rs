//! `init` command: write a default `cribo.toml`.

use crate::config::Settings;

/// Run init command - create configuration file.
pub fn run_init(force: bool) {
    match Settings::init_config_file(force) {
        Ok(path) => {
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
