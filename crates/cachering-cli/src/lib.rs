//! CLI argument parsing for the `cachering-node` binary (§6).

pub mod config;

pub use config::Cli;
