//! Generated query artifacts next to their source files.
//!
//! A compiled root query defined in `src/pages/a.js` lives at
//! `src/pages/__generated__/<OperationName>.generated.<ext>`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::core::compiler::CompiledQueries;

/// Directory name holding generated artifacts, skipped by the source scan.
pub const GENERATED_DIR: &str = "__generated__";

/// Where the artifact for operation `name`, defined in `source_file`, lives.
pub fn artifact_path(source_file: &Path, name: &str, extension: &str) -> PathBuf {
    let dir = source_file.parent().unwrap_or_else(|| Path::new(""));
    dir.join(GENERATED_DIR)
        .join(format!("{name}.generated.{extension}"))
}

/// Persists compiled queries handed over by a compile pass.
pub trait ArtifactWriter {
    /// Write every compiled query; returns the number of files actually changed.
    fn write_all(&self, compiled: &CompiledQueries) -> io::Result<usize>;
}

/// Writes artifacts to disk, leaving files whose content is unchanged untouched.
#[derive(Debug, Clone)]
pub struct FsArtifactWriter {
    extension: String,
}

impl FsArtifactWriter {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl ArtifactWriter for FsArtifactWriter {
    fn write_all(&self, compiled: &CompiledQueries) -> io::Result<usize> {
        let mut written = 0;
        for (source_file, queries) in compiled {
            for query in queries {
                let path = artifact_path(source_file, &query.name, &self.extension);
                if fs::read_to_string(&path).is_ok_and(|existing| existing == query.text) {
                    continue;
                }
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, &query.text)?;
                debug!(path = %path.display(), query = %query.name, "wrote artifact");
                written += 1;
            }
        }
        Ok(written)
    }
}
