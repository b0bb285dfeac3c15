//! Structural integrity checks
//!
//! Reference validation and cycle detection. Both are total: they report
//! what they find as data and never fail, since their input is exactly the
//! untrusted data whose defects they exist to surface.

use serde::Serialize;
use std::fmt;

use super::catalog::Catalog;
use super::graph::Cycle;
use super::id::ExerciseId;

/// Which list a reference was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Prerequisites,
    ProgressesTo,
}

impl Relation {
    /// Field name as it appears in the document
    pub fn label(&self) -> &'static str {
        match self {
            Relation::Prerequisites => "prerequisites",
            Relation::ProgressesTo => "progresses_to",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A reference to an exercise that does not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The exercise holding the reference
    pub exercise: ExerciseId,
    /// The dangling ID
    pub reference: ExerciseId,
    pub relation: Relation,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} --[{}]--> {} (not found)",
            self.exercise, self.relation, self.reference
        )
    }
}

impl Catalog {
    /// Reports every dangling reference in either relation
    ///
    /// Violations come in catalog order; within one exercise, prerequisites
    /// before progressions, each in list order.
    pub fn validate_references(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        for exercise in self.iter() {
            let lists = [
                (Relation::Prerequisites, exercise.prerequisites.as_slice()),
                (Relation::ProgressesTo, exercise.progressions()),
            ];
            for (relation, ids) in lists {
                for reference in ids {
                    if !self.contains(reference.as_str()) {
                        violations.push(Violation {
                            exercise: exercise.id.clone(),
                            reference: reference.clone(),
                            relation,
                        });
                    }
                }
            }
        }

        violations
    }

    /// Reports every distinct prerequisite cycle
    ///
    /// An empty result means the prerequisite relation is a DAG.
    pub fn detect_cycles(&self) -> Vec<Cycle> {
        self.graph().cycles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Exercise;
    use proptest::prelude::*;

    fn id(s: &str) -> ExerciseId {
        ExerciseId::new(s).unwrap()
    }

    fn ex(s: &str, prereqs: &[&str]) -> Exercise {
        Exercise::new(id(s), s.to_uppercase()).with_prerequisites(prereqs.iter().map(|p| id(p)))
    }

    #[test]
    fn scenario_reports_single_dangling_reference() {
        let catalog =
            Catalog::from_exercises([ex("a", &[]), ex("b", &["a"]), ex("c", &["b", "x"])]).unwrap();

        let violations = catalog.validate_references();

        assert_eq!(
            violations,
            vec![Violation {
                exercise: id("c"),
                reference: id("x"),
                relation: Relation::Prerequisites,
            }]
        );
        assert_eq!(violations[0].to_string(), "c --[prerequisites]--> x (not found)");
    }

    #[test]
    fn progression_references_are_checked() {
        let catalog = Catalog::from_exercises([Exercise {
            progresses_to: Some(vec![id("ghost"), id("ghost2")]),
            ..ex("a", &["nope"])
        }])
        .unwrap();

        let violations = catalog.validate_references();
        let relations: Vec<_> = violations.iter().map(|v| v.relation).collect();
        assert_eq!(
            relations,
            vec![Relation::Prerequisites, Relation::ProgressesTo, Relation::ProgressesTo]
        );
    }

    #[test]
    fn clean_catalog_has_no_violations() {
        let catalog = Catalog::from_exercises([ex("a", &[]), ex("b", &["a"])]).unwrap();
        assert!(catalog.validate_references().is_empty());
    }

    #[test]
    fn repair_clears_violations_for_corrected_id() {
        let mut catalog =
            Catalog::from_exercises([ex("a", &[]), ex("b", &["x"]), ex("c", &["x", "y"])]).unwrap();

        catalog.repair_reference(&id("x"), &id("a")).unwrap();

        let remaining = catalog.validate_references();
        assert!(remaining.iter().all(|v| v.reference != id("x")));
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].reference, id("y"));
    }

    #[test]
    fn closing_edge_makes_cycle_visible() {
        let mut catalog = Catalog::from_exercises([ex("a", &[]), ex("b", &["a"])]).unwrap();
        assert!(catalog.detect_cycles().is_empty());

        catalog.set_prerequisites(&id("a"), vec![id("b")]).unwrap();

        let cycles = catalog.detect_cycles();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].contains(&id("a")));
        assert!(cycles[0].contains(&id("b")));
    }

    // Catalogs where exercise i may only require exercises j < i are DAGs
    fn dag_catalog() -> impl Strategy<Value = Catalog> {
        (1usize..30)
            .prop_flat_map(|n| {
                proptest::collection::vec(proptest::collection::vec(any::<prop::sample::Index>(), 0..4), n)
            })
            .prop_map(|edges| {
                let exercises = edges.iter().enumerate().map(|(i, picks)| {
                    let prereqs: Vec<ExerciseId> = if i == 0 {
                        vec![]
                    } else {
                        picks.iter().map(|p| id(&format!("e{}", p.index(i)))).collect()
                    };
                    Exercise::new(id(&format!("e{}", i)), "E").with_prerequisites(prereqs)
                });
                Catalog::from_exercises(exercises).unwrap()
            })
    }

    proptest! {
        #[test]
        fn dag_has_no_cycles(catalog in dag_catalog()) {
            prop_assert!(catalog.detect_cycles().is_empty());
            prop_assert!(catalog.graph().is_acyclic());
        }

        #[test]
        fn cycles_agree_with_petgraph(
            refs in proptest::collection::vec(proptest::collection::vec(0usize..8, 0..3), 1..8)
        ) {
            let exercises = refs.iter().enumerate().map(|(i, r)| {
                Exercise::new(id(&format!("e{}", i)), "E")
                    .with_prerequisites(r.iter().map(|j| id(&format!("e{}", j))))
            });
            let catalog = Catalog::from_exercises(exercises).unwrap();
            let graph = catalog.graph();
            let cycles = catalog.detect_cycles();

            prop_assert_eq!(cycles.is_empty(), graph.is_acyclic());

            // Consecutive IDs are real edges, including the closing one
            for cycle in &cycles {
                let ids = cycle.ids();
                for (k, from) in ids.iter().enumerate() {
                    let to = &ids[(k + 1) % ids.len()];
                    prop_assert!(catalog.get(to.as_str()).unwrap().requires(from));
                }
            }
        }

        #[test]
        fn every_reference_exists_or_is_reported(
            refs in proptest::collection::vec(proptest::collection::vec(0usize..12, 0..4), 1..10)
        ) {
            let exercises = refs.iter().enumerate().map(|(i, r)| {
                Exercise::new(id(&format!("e{}", i)), "E")
                    .with_prerequisites(r.iter().map(|j| id(&format!("e{}", j))))
            });
            let catalog = Catalog::from_exercises(exercises).unwrap();
            let violations = catalog.validate_references();

            for exercise in catalog.iter() {
                for reference in &exercise.prerequisites {
                    let reported = violations
                        .iter()
                        .any(|v| v.exercise == exercise.id && &v.reference == reference);
                    prop_assert!(catalog.contains(reference.as_str()) || reported);
                    prop_assert!(!(catalog.contains(reference.as_str()) && reported));
                }
            }
        }
    }
}
