//! Extraction, compilation and change propagation for page queries.
//!
//! Leaves first:
//!
//! - `tag` / `extract`: locating query tags in a parsed module and reading back
//!   their compiled artifacts
//! - `locations` / `graphql::schema`: where sources and the schema live, and the
//!   schema model
//! - `compiler`: the whole-project compile pass
//! - `watcher`: page registration, change propagation and bootstrap tracking
//! - `rewrite`: the build-time tag replacement

pub mod artifacts;
pub mod compiler;
pub mod error;
pub mod executor;
pub mod extract;
pub mod file_scanner;
pub mod graphql;
pub mod locations;
pub mod parsers;
pub mod rewrite;
pub mod store;
pub mod tag;
pub mod timer;
pub mod watcher;

pub use compiler::{CompileQueries, CompiledQueries, CompiledQuery, QueryCompiler};
pub use error::{CompileError, ExtractError, SchemaError, TagError};
pub use locations::Locations;
pub use watcher::{ChangeOutcome, QueryWatcher};
