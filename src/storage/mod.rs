//! # Storage Layer
//!
//! Persistence for the exercise catalog and exgraph settings.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Catalog | JSON document (`exercises` array, `indexes.by_id`) | `exercises.json` or as configured |
//! | Project config | TOML | `exgraph.toml` |
//! | Global config | TOML | `~/.config/exgraph/config.toml` |
//! | Mastered set | JSON array or one ID per line | anywhere (`--mastered-file`) |
//!
//! ## Concurrency Safety
//!
//! - [`CatalogStore`] takes a shared lock to read and an exclusive lock to write
//! - Writes are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point: resolves config and the catalog location
//! - [`CatalogStore`] - Read/write the catalog document
//! - [`Config`] - Project and global configuration

mod config;
mod project;
mod store;

pub use config::{
    AuditConfig, Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, DEFAULT_CATALOG,
    PROJECT_CONFIG_FILE,
};
pub use project::{Project, ProjectError};
pub use store::{read_exercise_batch, read_mastered, CatalogStore};
