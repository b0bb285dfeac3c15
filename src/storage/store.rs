//! JSON storage for the exercise catalog
//!
//! The catalog lives in one JSON document that is read whole and written
//! whole. Uses file locking for concurrent access safety; writes go to a
//! temp file first and are renamed into place.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde_json::Value;

use crate::domain::{parse_exercises, Catalog, Exercise, ExerciseId};

/// Store for the catalog document
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Creates a store for the document at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the document
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and parses the whole catalog
    pub fn read(&self) -> Result<Catalog> {
        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open catalog: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on catalog")?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .with_context(|| format!("Failed to read catalog: {}", self.path.display()))?;

        // Lock is released when file is dropped
        Catalog::from_json_str(&content)
            .with_context(|| format!("Failed to load catalog: {}", self.path.display()))
    }

    /// Writes the whole catalog (atomic rewrite)
    pub fn write(&self, catalog: &Catalog) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = catalog
            .to_json_pretty()
            .context("Failed to serialize catalog")?;

        // Write to temp file first
        let temp_path = self.path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on catalog")?;

            let mut writer = BufWriter::new(&file);
            writeln!(writer, "{}", content).context("Failed to write catalog")?;
            writer.flush().context("Failed to flush catalog")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

/// Reads exercises to merge into a catalog
///
/// Accepts either a bare JSON array of exercises or a full catalog document
/// with an `exercises` array. Repeated IDs are returned as they appear.
pub fn read_exercise_batch(path: &Path) -> Result<Vec<Exercise>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read exercises: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse exercises: {}", path.display()))?;

    parse_exercises(value).with_context(|| format!("Invalid exercises in {}", path.display()))
}

/// Reads a learner's mastered set
///
/// Accepts a JSON array of IDs, or plain text with one ID per line (blank
/// lines and `#` comments ignored).
pub fn read_mastered(path: &Path) -> Result<HashSet<ExerciseId>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mastered set: {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse mastered set: {}", path.display()));
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.parse::<ExerciseId>()
                .with_context(|| format!("Invalid exercise ID in {}", path.display()))
        })
        .collect()
}
