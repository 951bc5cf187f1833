//! CLI module: command-line parsing and dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CompletionShell};
