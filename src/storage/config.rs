//! Configuration handling for exgraph
//!
//! Configuration is stored in `exgraph.toml` (project, found by walking up
//! from the current directory) and `~/.config/exgraph/config.toml` (global).
//! Project values win over global ones.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AuditRules, ExerciseId};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "exgraph.toml";

/// Catalog file used when nothing else is configured
pub const DEFAULT_CATALOG: &str = "exercises.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Audit thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Skills with fewer exercises are reported as incomplete
    pub min_skill_stages: usize,

    /// Allowed movement patterns (empty disables the check)
    pub patterns: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        let rules = AuditRules::default();
        Self {
            min_skill_stages: rules.min_skill_stages,
            patterns: rules.patterns,
        }
    }
}

impl AuditConfig {
    pub fn rules(&self) -> AuditRules {
        AuditRules {
            min_skill_stages: self.min_skill_stages,
            patterns: self.patterns.clone(),
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Catalog document, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// Audit settings
    pub audit: AuditConfig,

    /// Reference corrections applied by `exgraph fix` (wrong id -> correct id)
    pub corrections: BTreeMap<ExerciseId, ExerciseId>,
}

impl ProjectConfig {
    /// Checks values serde cannot express constraints for
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit.min_skill_stages == 0 {
            return Err(ConfigError::Invalid(
                "audit.min_skill_stages must be at least 1".to_string(),
            ));
        }
        if let Some((wrong, _)) = self.corrections.iter().find(|(wrong, right)| wrong == right) {
            return Err(ConfigError::Invalid(format!(
                "correction for \"{}\" maps it to itself",
                wrong
            )));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Catalog used outside any project
    pub catalog: Option<PathBuf>,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "exgraph", "exgraph").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        match Self::find_project_root() {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for `exgraph.toml`
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(PROJECT_CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns true if a project config was found
    pub fn is_in_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Resolves the catalog path
    ///
    /// Precedence: explicit override, project `catalog` (relative to the
    /// project root), global `catalog`, then `exercises.json` in the project
    /// root or `base`.
    pub fn catalog_path(&self, explicit: Option<&Path>, base: &Path) -> PathBuf {
        let root = self.project_root.as_deref().unwrap_or(base);

        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = &self.project.catalog {
            return root.join(path);
        }
        if let Some(path) = &self.global.catalog {
            return path.clone();
        }
        root.join(DEFAULT_CATALOG)
    }
}
