//! Project management
//!
//! A project is a directory holding `exgraph.toml`. It ties the catalog
//! location, audit settings and reference corrections together.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{Config, PROJECT_CONFIG_FILE};
use super::store::CatalogStore;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Cannot determine the current directory")]
    NoWorkingDirectory,

    #[error("Catalog not found: {0}. Use --catalog or set `catalog` in exgraph.toml.")]
    CatalogMissing(PathBuf),
}

const DEFAULT_PROJECT_CONFIG: &str = r#"# exgraph configuration

# Catalog document, relative to this file
catalog = "exercises.json"

[audit]
# Skills with fewer exercises are reported as incomplete
min_skill_stages = 3
# Allowed movement patterns (empty list disables the check)
patterns = ["push", "pull", "legs", "core", "skill_full_body"]

# Known-wrong prerequisite IDs and their replacements, used by `exgraph fix`.
# A replacement that is not in the catalog removes the reference instead.
[corrections]
"#;

/// An exgraph working context
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens a project at the given path (the config file is optional)
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    ///
    /// Falls back to the current directory with default settings when no
    /// `exgraph.toml` exists.
    pub fn open_current() -> Result<Self> {
        match Config::find_project_root() {
            Some(root) => Self::open(root),
            None => {
                let root = std::env::current_dir().map_err(|_| ProjectError::NoWorkingDirectory)?;
                let config = Config::load()?;
                Ok(Self { root, config })
            }
        }
    }

    /// Writes a default `exgraph.toml` at the given path
    ///
    /// An existing config file is left untouched.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create directory: {}", root.display()))?;

        let config_path = root.join(PROJECT_CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_PROJECT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the store for the catalog in use
    pub fn catalog_store(&self, explicit: Option<&Path>) -> CatalogStore {
        CatalogStore::new(self.config.catalog_path(explicit, &self.root))
    }

    /// Returns the catalog store, failing if its document does not exist
    pub fn existing_catalog_store(&self, explicit: Option<&Path>) -> Result<CatalogStore> {
        let store = self.catalog_store(explicit);
        if !store.exists() {
            return Err(ProjectError::CatalogMissing(store.path().to_path_buf()).into());
        }
        Ok(store)
    }
}
