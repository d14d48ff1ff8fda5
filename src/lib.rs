//! pagequery - page query pipeline for static site builds
//!
//! Extracts GraphQL queries embedded in tagged templates of JS/TS components,
//! compiles them as one project against a schema, and keeps pages in sync with
//! their component's query while sources change.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (commands and report output)
//! - `config`: Configuration file loading and parsing
//! - `core`: Extraction, compilation, watching and rewriting

pub mod cli;
pub mod config;
pub mod core;
