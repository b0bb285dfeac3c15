//! Domain models for exgraph
//!
//! The exercise graph model: catalog, prerequisite graph, integrity checks
//! and progression queries. No I/O happens here.

mod id;
mod exercise;
mod catalog;
mod graph;
mod integrity;
mod progression;
mod naming;
mod audit;
mod stats;

pub use id::{ExerciseId, IdError};
pub use exercise::{DifficultyScore, Exercise};
pub use catalog::{parse_exercises, Catalog, CatalogError, Correction, MergeReport};
pub use graph::{Cycle, GraphError, PrerequisiteGraph};
pub use integrity::{Relation, Violation};
pub use progression::{LockStatus, TreeLine};
pub use naming::{name_issues, normalize_display_name, NameChange, NameIssue};
pub use audit::{AuditReport, AuditRules, Warning, WarningKind};
pub use stats::CatalogStats;
