//! Catalog statistics

use serde::Serialize;
use std::collections::BTreeMap;

use super::catalog::Catalog;

/// Summary counts over a catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total_exercises: usize,
    /// Exercises per movement pattern; missing patterns are counted as "none"
    pub by_pattern: BTreeMap<String, usize>,
    pub by_skill: BTreeMap<String, usize>,
    pub max_difficulty: Option<f64>,
    pub roots: usize,
    pub prerequisite_links: usize,
}

impl Catalog {
    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            total_exercises: self.len(),
            roots: self.roots().len(),
            ..CatalogStats::default()
        };

        for exercise in self.iter() {
            let pattern = exercise.pattern.clone().unwrap_or_else(|| "none".to_string());
            *stats.by_pattern.entry(pattern).or_default() += 1;
            if let Some(skill) = &exercise.skill {
                *stats.by_skill.entry(skill.clone()).or_default() += 1;
            }
            if let Some(score) = &exercise.difficulty_score {
                let value = score.value();
                stats.max_difficulty = Some(stats.max_difficulty.map_or(value, |m| m.max(value)));
            }
            stats.prerequisite_links += exercise.prerequisites.len();
        }

        stats
    }
}
