//! Exercise domain model
//!
//! An exercise is one node of the prerequisite graph. Only `id`,
//! `prerequisites` and `progresses_to` take part in graph logic; the other
//! typed fields feed grouping and audit rules. Fields this model does not
//! know about are carried in `extra` so a load/save cycle never loses data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

use super::id::ExerciseId;

/// Difficulty score as written in the document
///
/// Kept as a JSON number so integer scores are written back as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyScore(Number);

impl DifficultyScore {
    /// Returns the score as a float for ordering and comparisons
    pub fn value(&self) -> f64 {
        self.0.as_f64().unwrap_or(0.0)
    }
}

impl From<i32> for DifficultyScore {
    fn from(score: i32) -> Self {
        Self(Number::from(score))
    }
}

impl From<f64> for DifficultyScore {
    fn from(score: f64) -> Self {
        Self(Number::from_f64(score).unwrap_or_else(|| Number::from(0)))
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier
    pub id: ExerciseId,

    /// Human-readable label
    pub name: String,

    /// Skill-progression family, if the exercise belongs to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,

    /// Movement pattern tag (push, pull, legs, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_score: Option<DifficultyScore>,

    /// Exercises that must all be mastered first
    #[serde(default)]
    pub prerequisites: Vec<ExerciseId>,

    /// Inverse of `prerequisites`; `None` when the document does not maintain it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progresses_to: Option<Vec<ExerciseId>>,

    /// Fields not modelled here, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Exercise {
    /// Creates an exercise with no links and no tags
    pub fn new(id: ExerciseId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            skill: None,
            pattern: None,
            category: None,
            level: None,
            difficulty_score: None,
            prerequisites: Vec::new(),
            progresses_to: None,
            extra: Map::new(),
        }
    }

    /// Sets the prerequisite list
    pub fn with_prerequisites(mut self, prerequisites: impl IntoIterator<Item = ExerciseId>) -> Self {
        self.prerequisites = prerequisites.into_iter().collect();
        self
    }

    /// Sets the skill family
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    /// Sets the difficulty score
    pub fn with_difficulty(mut self, score: impl Into<DifficultyScore>) -> Self {
        self.difficulty_score = Some(score.into());
        self
    }

    /// Sets the movement pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Difficulty as a float; a missing score counts as zero
    pub fn difficulty(&self) -> f64 {
        self.difficulty_score
            .as_ref()
            .map(DifficultyScore::value)
            .unwrap_or(0.0)
    }

    /// Compares two exercises by difficulty (total order, NaN last)
    pub fn cmp_difficulty(&self, other: &Exercise) -> Ordering {
        self.difficulty().total_cmp(&other.difficulty())
    }

    /// Returns true if the exercise has no prerequisites
    pub fn is_root(&self) -> bool {
        self.prerequisites.is_empty()
    }

    /// Returns true if `id` is one of the prerequisites
    pub fn requires(&self, id: &ExerciseId) -> bool {
        self.prerequisites.contains(id)
    }

    /// Returns the stored progression list, empty when not maintained
    pub fn progressions(&self) -> &[ExerciseId] {
        self.progresses_to.as_deref().unwrap_or(&[])
    }

    /// Returns true if all prerequisites satisfy `mastered`
    pub fn is_unlocked_by(&self, mastered: impl Fn(&ExerciseId) -> bool) -> bool {
        self.prerequisites.iter().all(mastered)
    }
}
