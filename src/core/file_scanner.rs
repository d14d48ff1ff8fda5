use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::core::{artifacts::GENERATED_DIR, error::CompileError};

/// Directories never scanned for sources.
const SKIPPED_DIRS: &[&str] = &["node_modules", GENERATED_DIR];

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal directory paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Source file filter shared by the scan and the file-watch bridge.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extensions: Vec<String>,
    literal_ignore_paths: Vec<PathBuf>,
    glob_patterns: Vec<Pattern>,
}

impl SourceFilter {
    pub fn new(base_dir: &Path, extensions: &[String], ignore_patterns: &[String]) -> Self {
        let mut literal_ignore_paths = Vec::new();
        let mut glob_patterns = Vec::new();

        for p in ignore_patterns {
            if is_glob_pattern(p) {
                match Pattern::new(p) {
                    Ok(pattern) => glob_patterns.push(pattern),
                    Err(e) => warn!(pattern = %p, error = %e, "invalid ignore pattern"),
                }
            } else {
                // Literal path mode: convert to absolute path for prefix matching
                literal_ignore_paths.push(base_dir.join(p));
            }
        }

        Self {
            extensions: extensions.to_vec(),
            literal_ignore_paths,
            glob_patterns,
        }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self
            .literal_ignore_paths
            .iter()
            .any(|ignore_path| path.starts_with(ignore_path))
        {
            return true;
        }
        let path_str = path.to_string_lossy();
        self.glob_patterns.iter().any(|p| p.matches(&path_str))
    }

    /// Whether `path` names a source file to scan, by name alone.
    pub fn is_source_file(&self, path: &Path) -> bool {
        if is_editor_temp_file(path) || self.is_ignored(path) {
            return false;
        }
        if path
            .components()
            .any(|c| SKIPPED_DIRS.iter().any(|dir| c.as_os_str() == *dir))
        {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

/// Editor swap and backup files that share a source extension.
fn is_editor_temp_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    name.starts_with(".#") || name.ends_with('~') || name.ends_with(".swp")
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name)
}

/// All source files under `base_dir`, sorted.
///
/// Unreadable entries fail the scan rather than being skipped.
pub fn scan_files(base_dir: &Path, filter: &SourceFilter) -> Result<Vec<PathBuf>, CompileError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(base_dir)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry) && !filter.is_ignored(entry.path()));
    for entry in walker {
        let entry = entry.map_err(|source| CompileError::Scan {
            path: base_dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && filter.is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
