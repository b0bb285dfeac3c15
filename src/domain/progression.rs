//! Progression queries
//!
//! Everything a learner-facing view asks of the catalog: what is unlocked
//! for a mastered set, what comes next after an exercise, and how skill
//! families are ordered. All queries are pure.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::catalog::Catalog;
use super::exercise::Exercise;
use super::id::ExerciseId;

/// Unlock state of one exercise the learner has not mastered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockStatus {
    pub id: ExerciseId,
    /// Prerequisites not yet mastered; empty means unlocked
    pub missing: Vec<ExerciseId>,
}

impl LockStatus {
    pub fn is_unlocked(&self) -> bool {
        self.missing.is_empty()
    }
}

/// One line of a rendered progression tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLine {
    pub depth: usize,
    pub id: ExerciseId,
    /// Set when the exercise was already printed higher up
    pub repeated: bool,
}

impl Catalog {
    /// Exercises not in `mastered` whose prerequisites are all in `mastered`
    ///
    /// Exercises without prerequisites are always unlocked unless mastered.
    /// A prerequisite that does not exist can only be satisfied by naming it
    /// in `mastered`, so dangling references keep an exercise locked.
    pub fn evaluate_unlocked(&self, mastered: &HashSet<ExerciseId>) -> BTreeSet<ExerciseId> {
        self.iter()
            .filter(|ex| !mastered.contains(&ex.id))
            .filter(|ex| ex.is_unlocked_by(|p| mastered.contains(p)))
            .map(|ex| ex.id.clone())
            .collect()
    }

    /// Unlock state of every exercise not in `mastered`, in catalog order
    pub fn lock_status(&self, mastered: &HashSet<ExerciseId>) -> Vec<LockStatus> {
        self.iter()
            .filter(|ex| !mastered.contains(&ex.id))
            .map(|ex| LockStatus {
                id: ex.id.clone(),
                missing: ex
                    .prerequisites
                    .iter()
                    .filter(|p| !mastered.contains(*p))
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// Exercises that list `id` as a prerequisite, in catalog order
    pub fn derived_progressions(&self, id: &ExerciseId) -> Vec<ExerciseId> {
        self.iter()
            .filter(|ex| ex.requires(id))
            .map(|ex| ex.id.clone())
            .collect()
    }

    /// Returns true if the stored `progresses_to` of `id` matches the inverse
    /// of `prerequisites` (compared as sets)
    ///
    /// An exercise that does not maintain `progresses_to` is never consistent.
    pub fn progressions_consistent(&self, id: &ExerciseId) -> bool {
        let Some(stored) = self.get(id.as_str()).and_then(|ex| ex.progresses_to.as_ref()) else {
            return false;
        };
        let derived_list = self.derived_progressions(id);
        let stored: HashSet<&ExerciseId> = stored.iter().collect();
        let derived: HashSet<&ExerciseId> = derived_list.iter().collect();
        stored == derived
    }

    /// What to train after `id`
    ///
    /// Returns the stored `progresses_to` list when it agrees with the
    /// prerequisites; otherwise derives the list by scanning the catalog.
    /// Unknown IDs have no next steps.
    pub fn next_steps(&self, id: &ExerciseId) -> Vec<ExerciseId> {
        match self.get(id.as_str()) {
            None => vec![],
            Some(ex) if self.progressions_consistent(id) => ex.progressions().to_vec(),
            Some(_) => self.derived_progressions(id),
        }
    }

    /// Exercises with no prerequisites, in catalog order
    pub fn roots(&self) -> Vec<&Exercise> {
        self.iter().filter(|ex| ex.is_root()).collect()
    }

    /// Skill families, each ordered by difficulty ascending
    ///
    /// Ties keep catalog order. Exercises without a skill are left out.
    pub fn group_by_skill(&self) -> BTreeMap<String, Vec<&Exercise>> {
        let mut groups: BTreeMap<String, Vec<&Exercise>> = BTreeMap::new();
        for exercise in self.iter() {
            if let Some(skill) = &exercise.skill {
                groups.entry(skill.clone()).or_default().push(exercise);
            }
        }
        for exercises in groups.values_mut() {
            exercises.sort_by(|a, b| a.cmp_difficulty(b));
        }
        groups
    }

    /// Depth-first progression tree of one skill family
    ///
    /// Roots are the skill's exercises with no prerequisite inside the same
    /// skill, easiest first. Children are in-skill exercises that require
    /// the parent. An exercise reached a second time is emitted once more
    /// with `repeated` set and not expanded, which also bounds cycles.
    pub fn skill_tree(&self, skill: &str) -> Vec<TreeLine> {
        let members: Vec<&Exercise> = self
            .iter()
            .filter(|ex| ex.skill.as_deref() == Some(skill))
            .collect();
        let in_skill = |id: &ExerciseId| {
            self.get(id.as_str())
                .is_some_and(|ex| ex.skill.as_deref() == Some(skill))
        };

        let mut roots: Vec<&Exercise> = members
            .iter()
            .copied()
            .filter(|ex| !ex.prerequisites.iter().any(|p| in_skill(p)))
            .collect();
        roots.sort_by(|a, b| a.cmp_difficulty(b));

        let mut lines = Vec::new();
        let mut visited = HashSet::new();
        for root in roots {
            let mut stack = vec![(root, 0usize)];
            while let Some((exercise, depth)) = stack.pop() {
                if !visited.insert(exercise.id.clone()) {
                    lines.push(TreeLine {
                        depth,
                        id: exercise.id.clone(),
                        repeated: true,
                    });
                    continue;
                }
                lines.push(TreeLine {
                    depth,
                    id: exercise.id.clone(),
                    repeated: false,
                });

                // Reverse so the first child is popped first
                for child in members.iter().rev().copied().filter(|c| c.requires(&exercise.id)) {
                    stack.push((child, depth + 1));
                }
            }
        }
        lines
    }
}
