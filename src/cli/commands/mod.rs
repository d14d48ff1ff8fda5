pub mod check;
pub mod compile;
pub mod extract;
pub mod init;
pub mod watch;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::args::CommonArgs;
use crate::{
    config::{CONFIG_FILE_NAME, Config, load_config},
    core::{Locations, QueryCompiler, extract::ExtractOptions},
};

/// Resolved configuration shared by every command.
pub struct CommandContext {
    pub config: Config,
    /// Absolute project root.
    pub root: PathBuf,
    pub locations: Locations,
}

impl CommandContext {
    pub fn new(args: &CommonArgs) -> Result<Self> {
        let start = fs::canonicalize(&args.root)
            .with_context(|| format!("Invalid project root: {:?}", args.root))?;
        let loaded = load_config(&start)?;

        // In verbose mode, inform user if using default config
        if args.verbose && !loaded.from_file {
            eprintln!("Note: No {CONFIG_FILE_NAME} found, using default configuration");
        }

        let mut config = loaded.config;
        if let Some(source_root) = &args.source_root {
            config.source_root = source_root.clone();
        }
        if let Some(schema) = &args.schema {
            config.schema_path = schema.clone();
        }
        config.validate()?;

        let locations = Locations::resolve(&loaded.root, &config);
        debug!(
            base_dir = %locations.base_dir.display(),
            schema = %locations.schema_path.display(),
            "resolved project locations"
        );
        Ok(Self {
            config,
            root: loaded.root,
            locations,
        })
    }

    pub fn compiler(&self) -> QueryCompiler {
        QueryCompiler::new(&self.locations, &self.config)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            tag: self.config.tag_name.clone(),
            generated_extension: self.config.generated_extension.clone(),
        }
    }
}
