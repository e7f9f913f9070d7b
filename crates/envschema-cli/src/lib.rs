//! # envschema-cli
//!
//! Command-line interface for envschema.
//!
//! ## Commands
//!
//! - `envschema resolve` — Print the resolved configuration as JSON
//! - `envschema vars` — List the variables a schema reads and whether they are set
//! - `envschema check` — Fail if any variable without a default is unset
//! - `envschema completions` — Generate shell completions

pub mod commands;

pub use commands::Cli;
