//! Schema & Location Provider: where sources and the schema live.

use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    /// Root of the scanned source tree.
    pub base_dir: PathBuf,
    /// Schema definition language file.
    pub schema_path: PathBuf,
}

impl Locations {
    /// Resolve locations for the project at `root`. Pure: nothing is read.
    pub fn resolve(root: &Path, config: &Config) -> Self {
        Self {
            base_dir: root.join(&config.source_root),
            schema_path: root.join(&config.schema_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let locations = Locations::resolve(Path::new("/proj"), &Config::default());
        assert_eq!(
            locations,
            Locations {
                base_dir: PathBuf::from("/proj/src"),
                schema_path: PathBuf::from("/proj/.cache/schema.graphql"),
            }
        );
    }

    #[test]
    fn test_resolve_configured_paths() {
        let config = Config {
            source_root: "app".to_string(),
            schema_path: "graphql/schema.graphql".to_string(),
            ..Default::default()
        };
        let locations = Locations::resolve(Path::new("/proj"), &config);
        assert_eq!(locations.base_dir, PathBuf::from("/proj/app"));
        assert_eq!(locations.schema_path, PathBuf::from("/proj/graphql/schema.graphql"));
    }
}
