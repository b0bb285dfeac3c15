//! Catalog access shared by every command

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use super::output::Output;
use crate::domain::{AuditRules, Catalog, ExerciseId};
use crate::storage::{CatalogStore, Config, Project};

/// The project plus the catalog override given on the command line
pub struct Session {
    project: Project,
    catalog: Option<PathBuf>,
}

impl Session {
    pub fn new(project: Project, catalog: Option<PathBuf>) -> Self {
        Self { project, catalog }
    }

    pub fn config(&self) -> &Config {
        self.project.config()
    }

    pub fn audit_rules(&self) -> AuditRules {
        self.config().project.audit.rules()
    }

    pub fn corrections(&self) -> &BTreeMap<ExerciseId, ExerciseId> {
        &self.config().project.corrections
    }

    /// Path of the catalog in use, whether or not it exists
    pub fn catalog_path(&self) -> PathBuf {
        self.project.catalog_store(self.catalog.as_deref()).path().to_path_buf()
    }

    /// Loads the catalog
    pub fn load(&self, output: &Output) -> Result<(CatalogStore, Catalog)> {
        let store = self.project.existing_catalog_store(self.catalog.as_deref())?;
        output.verbose_ctx("catalog", &format!("Reading {}", store.path().display()));

        let catalog = store.read()?;
        output.verbose_ctx("catalog", &format!("Loaded {} exercises", catalog.len()));

        Ok((store, catalog))
    }

    /// Writes the catalog back unless this is a dry run
    pub fn save(&self, store: &CatalogStore, catalog: &Catalog, dry_run: bool, output: &Output) -> Result<()> {
        if dry_run {
            output.verbose_ctx("catalog", "Dry run, nothing written");
            return Ok(());
        }
        store.write(catalog)?;
        output.verbose_ctx("catalog", &format!("Wrote {}", store.path().display()));
        Ok(())
    }
}
