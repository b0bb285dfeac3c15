//! exgraph - integrity checks and progression queries for exercise catalogs
//!
//! A catalog is a JSON document listing exercises and the prerequisites
//! linking them. exgraph finds dangling references and prerequisite cycles,
//! repairs them, and answers learner questions such as "what can I train
//! now?" for a set of mastered exercises.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Catalog, CatalogError, Exercise, ExerciseId};
