//! The exercise catalog
//!
//! A catalog is the ordered sequence of exercises loaded from one document,
//! plus the document's other top-level fields. The sequence is the only
//! source of truth: the by-ID lookup index is built lazily on first use and
//! thrown away by every mutation, and a persisted `indexes.by_id` block is
//! never read, only regenerated on output.

use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::exercise::Exercise;
use super::graph::PrerequisiteGraph;
use super::id::ExerciseId;

const EXERCISES_KEY: &str = "exercises";
const INDEXES_KEY: &str = "indexes";
const BY_ID_KEY: &str = "by_id";

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("Malformed catalog data{}: {reason}", at_position(.position))]
    MalformedData {
        /// Position of the offending entry in `exercises`, if known
        position: Option<usize>,
        reason: String,
    },

    #[error("Duplicate exercise ID: {0}")]
    DuplicateId(ExerciseId),

    #[error("Unknown target exercise: {0}")]
    UnknownTarget(ExerciseId),

    #[error("Exercise not found: {0}")]
    UnknownExercise(ExerciseId),
}

fn at_position(position: &Option<usize>) -> String {
    position
        .map(|p| format!(" at exercise #{}", p))
        .unwrap_or_default()
}

impl CatalogError {
    fn malformed(position: Option<usize>, reason: impl Into<String>) -> Self {
        CatalogError::MalformedData {
            position,
            reason: reason.into(),
        }
    }
}

/// Outcome of merging a batch of exercises into the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub added: Vec<ExerciseId>,
    /// IDs already present (or repeated within the batch) and left out
    pub skipped: Vec<ExerciseId>,
}

/// One action taken by [`Catalog::apply_corrections`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    pub exercise: ExerciseId,
    pub reference: ExerciseId,
    /// Replacement, or `None` when the reference was removed
    pub replacement: Option<ExerciseId>,
}

/// The in-memory exercise collection
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    exercises: Vec<Exercise>,

    /// Top-level document fields; `exercises` is a placeholder slot
    document: Map<String, Value>,

    index: OnceCell<HashMap<ExerciseId, usize>>,
}

impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.exercises == other.exercises && self.document == other.document
    }
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from exercises, rejecting duplicate IDs
    pub fn from_exercises(exercises: impl IntoIterator<Item = Exercise>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for exercise in exercises {
            catalog.insert(exercise)?;
        }
        Ok(catalog)
    }

    /// Parses a catalog document from JSON text
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(source)
            .map_err(|e| CatalogError::malformed(None, e.to_string()))?;
        Self::from_value(value)
    }

    /// Builds a catalog from a parsed document
    ///
    /// Requires an object with an `exercises` array whose entries each carry
    /// a string `id` and `name`. Any `indexes.by_id` block is ignored.
    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        let mut document = match value {
            Value::Object(map) => map,
            _ => return Err(CatalogError::malformed(None, "document is not a JSON object")),
        };

        let entries = take_entries(&mut document)?;

        // The persisted index is derived data; keep only its slot
        if let Some(Value::Object(indexes)) = document.get_mut(INDEXES_KEY) {
            if let Some(by_id) = indexes.get_mut(BY_ID_KEY) {
                *by_id = Value::Null;
            }
        }

        let mut catalog = Self {
            exercises: Vec::with_capacity(entries.len()),
            document,
            index: OnceCell::new(),
        };

        for (position, entry) in entries.into_iter().enumerate() {
            let exercise = parse_entry(position, entry)?;
            catalog.insert(exercise)?;
        }

        Ok(catalog)
    }

    /// Serializes the catalog back into a document
    ///
    /// Other top-level fields keep their original position. If the document
    /// has an `indexes` object, its `by_id` map is regenerated from the
    /// exercise sequence.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut document = self.document.clone();
        document.insert(EXERCISES_KEY.to_string(), serde_json::to_value(&self.exercises)?);

        if let Some(Value::Object(indexes)) = document.get_mut(INDEXES_KEY) {
            let by_id: Map<String, Value> = self
                .exercises
                .iter()
                .enumerate()
                .map(|(pos, ex)| (ex.id.to_string(), Value::from(pos)))
                .collect();
            indexes.insert(BY_ID_KEY.to_string(), Value::Object(by_id));
        }

        Ok(Value::Object(document))
    }

    /// Serializes the catalog as 2-space indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_value()?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter()
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    fn index(&self) -> &HashMap<ExerciseId, usize> {
        self.index.get_or_init(|| {
            self.exercises
                .iter()
                .enumerate()
                .map(|(pos, ex)| (ex.id.clone(), pos))
                .collect()
        })
    }

    // Every mutation goes through here so the index can never go stale
    fn exercises_mut(&mut self) -> &mut Vec<Exercise> {
        self.index.take();
        &mut self.exercises
    }

    /// Position of an exercise in the sequence
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index().get(id).copied()
    }

    /// Looks up an exercise by ID
    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.position(id).map(|pos| &self.exercises[pos])
    }

    /// Returns true if an exercise with this ID exists
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn require(&self, id: &ExerciseId) -> Result<usize, CatalogError> {
        self.position(id.as_str())
            .ok_or_else(|| CatalogError::UnknownExercise(id.clone()))
    }

    /// Builds the prerequisite graph for structural queries
    pub fn graph(&self) -> PrerequisiteGraph {
        PrerequisiteGraph::from_exercises(&self.exercises)
    }

    /// Appends an exercise; fails if the ID is taken
    pub fn insert(&mut self, exercise: Exercise) -> Result<(), CatalogError> {
        if self.contains(exercise.id.as_str()) {
            return Err(CatalogError::DuplicateId(exercise.id));
        }

        // Appending moves no existing entry, so the index is extended in place
        let position = self.exercises.len();
        if let Some(index) = self.index.get_mut() {
            index.insert(exercise.id.clone(), position);
        }
        self.exercises.push(exercise);
        Ok(())
    }

    /// Appends exercises, skipping any whose ID is already present
    ///
    /// The first occurrence of an ID wins, whether it was already in the
    /// catalog or earlier in the batch.
    pub fn merge(&mut self, exercises: impl IntoIterator<Item = Exercise>) -> MergeReport {
        let mut report = MergeReport::default();
        for exercise in exercises {
            let id = exercise.id.clone();
            match self.insert(exercise) {
                Ok(()) => report.added.push(id),
                Err(_) => report.skipped.push(id),
            }
        }
        report
    }

    /// Replaces every reference to `wrong` with `correct`, in both relations
    ///
    /// Fails with [`CatalogError::UnknownTarget`] if `correct` does not exist.
    /// A list that already holds `correct` keeps a single copy at its first
    /// position. A repair that closes a cycle is not refused; run cycle
    /// detection to find out. Returns the number of references replaced.
    pub fn repair_reference(
        &mut self,
        wrong: &ExerciseId,
        correct: &ExerciseId,
    ) -> Result<usize, CatalogError> {
        if !self.contains(correct.as_str()) {
            return Err(CatalogError::UnknownTarget(correct.clone()));
        }
        if wrong == correct {
            return Ok(0);
        }

        let mut replaced = 0;
        for exercise in self.exercises_mut() {
            replaced += replace_in(&mut exercise.prerequisites, wrong, correct);
            if let Some(progressions) = exercise.progresses_to.as_mut() {
                replaced += replace_in(progressions, wrong, correct);
            }
        }
        Ok(replaced)
    }

    /// Removes one occurrence of `reference` from an exercise's prerequisites
    ///
    /// Returns false if the exercise did not list it.
    pub fn drop_reference(
        &mut self,
        exercise: &ExerciseId,
        reference: &ExerciseId,
    ) -> Result<bool, CatalogError> {
        let pos = self.require(exercise)?;
        let prerequisites = &mut self.exercises_mut()[pos].prerequisites;

        match prerequisites.iter().position(|p| p == reference) {
            Some(i) => {
                prerequisites.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replaces an exercise's prerequisite list, returning the old one
    ///
    /// Every new prerequisite must exist in the catalog.
    pub fn set_prerequisites(
        &mut self,
        exercise: &ExerciseId,
        prerequisites: Vec<ExerciseId>,
    ) -> Result<Vec<ExerciseId>, CatalogError> {
        let pos = self.require(exercise)?;
        if let Some(missing) = prerequisites.iter().find(|p| !self.contains(p.as_str())) {
            return Err(CatalogError::UnknownTarget(missing.clone()));
        }

        let mut deduped: Vec<ExerciseId> = Vec::with_capacity(prerequisites.len());
        for prerequisite in prerequisites {
            if !deduped.contains(&prerequisite) {
                deduped.push(prerequisite);
            }
        }

        let slot = &mut self.exercises_mut()[pos].prerequisites;
        Ok(std::mem::replace(slot, deduped))
    }

    /// Repairs every dangling prerequisite using a correction mapping
    ///
    /// A dangling reference whose mapped replacement exists is replaced;
    /// one without a usable mapping is removed. Valid references are never
    /// touched. Returns every action taken, in catalog order.
    pub fn apply_corrections(
        &mut self,
        corrections: &BTreeMap<ExerciseId, ExerciseId>,
    ) -> Vec<Correction> {
        let known: std::collections::HashSet<ExerciseId> = self.index().keys().cloned().collect();
        let mut actions = Vec::new();

        for exercise in self.exercises_mut() {
            if exercise.prerequisites.iter().all(|reference| known.contains(reference)) {
                continue;
            }

            let original = std::mem::take(&mut exercise.prerequisites);
            let mut kept: Vec<ExerciseId> = Vec::with_capacity(original.len());
            for reference in &original {
                if known.contains(reference) {
                    kept.push(reference.clone());
                    continue;
                }

                let replacement = corrections
                    .get(reference)
                    .filter(|target| known.contains(*target))
                    .cloned();
                // A replacement already listed is not added twice
                if let Some(target) = &replacement {
                    if !original.contains(target) && !kept.contains(target) {
                        kept.push(target.clone());
                    }
                }
                actions.push(Correction {
                    exercise: exercise.id.clone(),
                    reference: reference.clone(),
                    replacement,
                });
            }
            exercise.prerequisites = kept;
        }

        actions
    }

    /// Rewrites every `progresses_to` list as the inverse of `prerequisites`
    ///
    /// Prerequisites are the source of truth; dangling ones are not
    /// propagated. Lists are ordered by catalog position. Returns the IDs
    /// whose lists changed.
    pub fn rebuild_progressions(&mut self) -> Vec<ExerciseId> {
        let graph = self.graph();
        let mut changed = Vec::new();

        for exercise in self.exercises_mut() {
            let derived = graph.dependents(&exercise.id);
            if exercise.progresses_to.as_ref() != Some(&derived) {
                exercise.progresses_to = Some(derived);
                changed.push(exercise.id.clone());
            }
        }

        changed
    }

    /// Changes an exercise's display name, returning the old one
    pub fn rename(&mut self, id: &ExerciseId, name: impl Into<String>) -> Result<String, CatalogError> {
        let pos = self.require(id)?;
        let slot = &mut self.exercises_mut()[pos].name;
        Ok(std::mem::replace(slot, name.into()))
    }
}

/// Parses exercise entries from a bare array or a document's `exercises`
///
/// Each entry is validated like a catalog entry, but repeated IDs are kept
/// so the caller decides which occurrence wins.
pub fn parse_exercises(value: Value) -> Result<Vec<Exercise>, CatalogError> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut document) => take_entries(&mut document)?,
        _ => {
            return Err(CatalogError::malformed(
                None,
                "expected an array or an object with an `exercises` array",
            ))
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| parse_entry(position, entry))
        .collect()
}

fn take_entries(document: &mut Map<String, Value>) -> Result<Vec<Value>, CatalogError> {
    match document.get_mut(EXERCISES_KEY).map(Value::take) {
        Some(Value::Array(entries)) => Ok(entries),
        Some(_) => Err(CatalogError::malformed(None, "`exercises` is not an array")),
        None => Err(CatalogError::malformed(None, "missing `exercises` array")),
    }
}

fn parse_entry(position: usize, entry: Value) -> Result<Exercise, CatalogError> {
    let object = entry
        .as_object()
        .ok_or_else(|| CatalogError::malformed(Some(position), "entry is not an object"))?;

    match object.get("id") {
        Some(Value::String(_)) => {}
        Some(_) => return Err(CatalogError::malformed(Some(position), "`id` is not a string")),
        None => return Err(CatalogError::malformed(Some(position), "missing required field `id`")),
    }
    match object.get("name") {
        Some(Value::String(_)) => {}
        Some(_) => return Err(CatalogError::malformed(Some(position), "`name` is not a string")),
        None => {
            return Err(CatalogError::malformed(
                Some(position),
                format!("missing required field `name` (id {})", object["id"]),
            ))
        }
    }

    serde_json::from_value(entry).map_err(|e| CatalogError::malformed(Some(position), e.to_string()))
}

fn replace_in(list: &mut Vec<ExerciseId>, wrong: &ExerciseId, correct: &ExerciseId) -> usize {
    let replaced = list.iter().filter(|id| *id == wrong).count();
    if replaced == 0 {
        return 0;
    }

    let mut seen_correct = false;
    list.retain_mut(|id| {
        if id == wrong {
            *id = correct.clone();
        }
        if id == correct {
            let keep = !seen_correct;
            seen_correct = true;
            return keep;
        }
        true
    });
    replaced
}
