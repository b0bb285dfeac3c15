//! Catalog audit
//!
//! Combines the structural checks (dangling references, cycles) with
//! data-quality rules that do not break the graph but usually point at an
//! editing mistake: drift between the two relations, difficulty going down
//! along a chain, thin skill families, duplicate or badly styled names,
//! unknown movement patterns and isolated exercises.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::catalog::Catalog;
use super::graph::Cycle;
use super::id::ExerciseId;
use super::integrity::Violation;
use super::naming::name_issues;

/// Tunable audit thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRules {
    /// Skills with fewer exercises are reported as incomplete
    pub min_skill_stages: usize,

    /// Allowed movement patterns; empty disables the pattern check
    pub patterns: Vec<String>,
}

impl Default for AuditRules {
    fn default() -> Self {
        Self {
            min_skill_stages: 3,
            patterns: ["push", "pull", "legs", "core", "skill_full_body"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    InverseDrift,
    DifficultyRegression,
    IncompleteSkill,
    DuplicateName,
    InvalidPattern,
    Orphan,
    NameStyle,
}

impl WarningKind {
    pub fn label(&self) -> &'static str {
        match self {
            WarningKind::InverseDrift => "INVERSE_DRIFT",
            WarningKind::DifficultyRegression => "DIFFICULTY_REGRESSION",
            WarningKind::IncompleteSkill => "INCOMPLETE_SKILL",
            WarningKind::DuplicateName => "DUPLICATE_NAME",
            WarningKind::InvalidPattern => "INVALID_PATTERN",
            WarningKind::Orphan => "ORPHANED_EXERCISE",
            WarningKind::NameStyle => "NAME_STYLE",
        }
    }
}

/// A data-quality finding that does not break the graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// The exercise concerned, when the warning is about one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<ExerciseId>,
    pub message: String,
}

impl Warning {
    fn about(kind: WarningKind, exercise: &ExerciseId, message: String) -> Self {
        Self {
            kind,
            exercise: Some(exercise.clone()),
            message,
        }
    }
}

/// Everything the audit found
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub total_exercises: usize,
    pub total_skills: usize,
    pub violations: Vec<Violation>,
    pub cycles: Vec<Cycle>,
    pub warnings: Vec<Warning>,
}

impl AuditReport {
    /// Dangling references and cycles count as errors
    pub fn error_count(&self) -> usize {
        self.violations.len() + self.cycles.len()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

impl Catalog {
    /// Runs every structural check and data-quality rule
    pub fn audit(&self, rules: &AuditRules) -> AuditReport {
        let skills = self.group_by_skill();

        let mut warnings = Vec::new();
        warnings.extend(self.inverse_drift());
        warnings.extend(self.difficulty_regressions());
        for (skill, exercises) in &skills {
            if exercises.len() < rules.min_skill_stages {
                warnings.push(Warning {
                    kind: WarningKind::IncompleteSkill,
                    exercise: None,
                    message: format!(
                        "skill \"{}\" has only {} exercise(s); at least {} expected",
                        skill,
                        exercises.len(),
                        rules.min_skill_stages
                    ),
                });
            }
        }
        warnings.extend(self.duplicate_names());
        warnings.extend(self.invalid_patterns(&rules.patterns));
        warnings.extend(self.orphans());
        warnings.extend(self.name_style());

        AuditReport {
            total_exercises: self.len(),
            total_skills: skills.len(),
            violations: self.validate_references(),
            cycles: self.detect_cycles(),
            warnings,
        }
    }

    fn inverse_drift(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for exercise in self.iter() {
            // A lists B as a progression, but B does not require A
            for next in exercise.progressions() {
                if let Some(target) = self.get(next.as_str()) {
                    if !target.requires(&exercise.id) {
                        warnings.push(Warning::about(
                            WarningKind::InverseDrift,
                            &exercise.id,
                            format!(
                                "\"{}\" progresses to \"{}\" but \"{}\" does not require it",
                                exercise.id, next, next
                            ),
                        ));
                    }
                }
            }

            // B requires A, but A maintains a progression list without B
            for prerequisite in &exercise.prerequisites {
                let Some(source) = self.get(prerequisite.as_str()) else {
                    continue;
                };
                if let Some(progressions) = &source.progresses_to {
                    if !progressions.contains(&exercise.id) {
                        warnings.push(Warning::about(
                            WarningKind::InverseDrift,
                            &exercise.id,
                            format!(
                                "\"{}\" requires \"{}\" but is missing from its progresses_to",
                                exercise.id, prerequisite
                            ),
                        ));
                    }
                }
            }
        }

        warnings
    }

    fn difficulty_regressions(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for exercise in self.iter() {
            let Some(score) = &exercise.difficulty_score else {
                continue;
            };
            for prerequisite in &exercise.prerequisites {
                let Some(prereq) = self.get(prerequisite.as_str()) else {
                    continue;
                };
                let Some(prereq_score) = &prereq.difficulty_score else {
                    continue;
                };
                if prereq_score.value() > score.value() {
                    warnings.push(Warning::about(
                        WarningKind::DifficultyRegression,
                        &exercise.id,
                        format!(
                            "\"{}\" (difficulty {}) requires harder \"{}\" (difficulty {})",
                            exercise.id,
                            score.value(),
                            prereq.id,
                            prereq_score.value()
                        ),
                    ));
                }
            }
        }

        warnings
    }

    fn duplicate_names(&self) -> Vec<Warning> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for exercise in self.iter() {
            let count = counts.entry(exercise.name.as_str()).or_insert(0);
            if *count == 0 {
                order.push(exercise.name.as_str());
            }
            *count += 1;
        }

        order
            .into_iter()
            .filter(|name| counts[name] > 1)
            .map(|name| Warning {
                kind: WarningKind::DuplicateName,
                exercise: None,
                message: format!("name \"{}\" is used {} times", name, counts[name]),
            })
            .collect()
    }

    fn invalid_patterns(&self, allowed: &[String]) -> Vec<Warning> {
        if allowed.is_empty() {
            return vec![];
        }

        self.iter()
            .filter_map(|exercise| {
                let message = match exercise.pattern.as_deref() {
                    None => format!("\"{}\" has no movement pattern", exercise.id),
                    Some(p) if !allowed.iter().any(|a| a == p) => {
                        format!("\"{}\" has invalid pattern \"{}\"", exercise.id, p)
                    }
                    Some(_) => return None,
                };
                Some(Warning::about(WarningKind::InvalidPattern, &exercise.id, message))
            })
            .collect()
    }

    fn orphans(&self) -> Vec<Warning> {
        let referenced: HashSet<&ExerciseId> = self
            .iter()
            .flat_map(|ex| ex.prerequisites.iter().chain(ex.progressions()))
            .collect();

        self.iter()
            .filter(|ex| {
                ex.prerequisites.is_empty()
                    && ex.progressions().is_empty()
                    && ex.skill.is_none()
                    && !referenced.contains(&ex.id)
            })
            .map(|ex| {
                Warning::about(
                    WarningKind::Orphan,
                    &ex.id,
                    format!(
                        "\"{}\" is isolated (no prerequisites, progressions or skill)",
                        ex.id
                    ),
                )
            })
            .collect()
    }

    fn name_style(&self) -> Vec<Warning> {
        self.iter()
            .flat_map(|ex| {
                name_issues(&ex.name).into_iter().map(move |issue| {
                    Warning::about(
                        WarningKind::NameStyle,
                        &ex.id,
                        format!("name \"{}\": {}", ex.name, issue.describe()),
                    )
                })
            })
            .collect()
    }
}
