//! Prerequisite graph for exercises
//!
//! Structural queries over the prerequisite relation: cycle detection and
//! dependent lookup. Uses petgraph for graph storage.
//!
//! Edges point from a prerequisite to the exercise that requires it, i.e. in
//! progression order. References to exercises that are not in the graph are
//! skipped when building from a catalog; reporting them is the job of
//! reference validation.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use super::exercise::Exercise;
use super::id::ExerciseId;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Exercise not found: {0}")]
    ExerciseNotFound(ExerciseId),
}

/// A closed chain of prerequisites, in progression order
///
/// `[a, b]` means `a` is required by `b` and `b` is required by `a`. The
/// sequence is rotated so it starts at its smallest ID, which makes equal
/// cycles compare equal regardless of where the traversal entered them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cycle(Vec<ExerciseId>);

impl Cycle {
    fn canonical(mut ids: Vec<ExerciseId>) -> Self {
        if let Some(min_pos) = ids
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(pos, _)| pos)
        {
            ids.rotate_left(min_pos);
        }
        Self(ids)
    }

    /// IDs on the cycle, in progression order
    pub fn ids(&self) -> &[ExerciseId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &ExerciseId) -> bool {
        self.0.contains(id)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in &self.0 {
            write!(f, "{} -> ", id)?;
        }
        match self.0.first() {
            Some(first) => write!(f, "{}", first),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Directed prerequisite graph
#[derive(Debug, Default)]
pub struct PrerequisiteGraph {
    /// The underlying directed graph
    graph: DiGraph<ExerciseId, ()>,

    /// Map from ExerciseId to node index
    node_map: HashMap<ExerciseId, NodeIndex>,
}

impl PrerequisiteGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds a graph from exercises, skipping dangling references
    pub fn from_exercises<'a>(exercises: impl IntoIterator<Item = &'a Exercise>) -> Self {
        let mut graph = Self::new();

        // First pass: add all nodes
        let exercises: Vec<_> = exercises.into_iter().collect();
        for exercise in &exercises {
            graph.add_exercise(exercise.id.clone());
        }

        // Second pass: add the edges whose endpoints both exist
        for exercise in &exercises {
            for prerequisite in &exercise.prerequisites {
                if graph.contains(prerequisite) {
                    // Both endpoints were added in the first pass
                    let _ = graph.add_prerequisite(&exercise.id, prerequisite);
                }
            }
        }

        graph
    }

    /// Adds an exercise node (no-op if already present)
    pub fn add_exercise(&mut self, id: ExerciseId) {
        if !self.node_map.contains_key(&id) {
            let idx = self.graph.add_node(id.clone());
            self.node_map.insert(id, idx);
        }
    }

    /// Adds an edge: `exercise` requires `prerequisite`
    ///
    /// Self-references and cycles are accepted; they are a data defect that
    /// [`PrerequisiteGraph::cycles`] reports rather than something to refuse.
    pub fn add_prerequisite(
        &mut self,
        exercise: &ExerciseId,
        prerequisite: &ExerciseId,
    ) -> Result<(), GraphError> {
        let exercise_idx = self
            .node_map
            .get(exercise)
            .ok_or_else(|| GraphError::ExerciseNotFound(exercise.clone()))?;

        let prereq_idx = self
            .node_map
            .get(prerequisite)
            .ok_or_else(|| GraphError::ExerciseNotFound(prerequisite.clone()))?;

        // Edge: prerequisite -> exercise
        self.graph.update_edge(*prereq_idx, *exercise_idx, ());
        Ok(())
    }

    /// Exercises that directly require `id`, in insertion order
    pub fn dependents(&self, id: &ExerciseId) -> Vec<ExerciseId> {
        let idx = match self.node_map.get(id) {
            Some(idx) => *idx,
            None => return vec![],
        };

        self.sorted_neighbors(idx, Direction::Outgoing)
            .into_iter()
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }

    // petgraph yields neighbors newest-edge first; node order is insertion order
    fn sorted_neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<_> = self.graph.neighbors_directed(idx, direction).collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    /// Returns true if the prerequisite relation has no cycle
    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Finds cycles with a depth-first traversal from every node
    ///
    /// Each back edge found closes one cycle: the slice of the recursion
    /// stack from the back edge's target to the current node. This is not
    /// an enumeration of every elementary cycle. Every exercise that lies
    /// on some cycle appears in at least one reported cycle, and no cycle
    /// is reported twice. Order follows discovery.
    pub fn cycles(&self) -> Vec<Cycle> {
        if self.is_acyclic() {
            return Vec::new();
        }

        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut seen = HashSet::new();
        let mut cycles = Vec::new();

        for start in self.graph.node_indices() {
            if marks[start.index()] != Mark::Unvisited {
                continue;
            }

            let mut path = vec![start];
            let mut stack = vec![(self.sorted_neighbors(start, Direction::Outgoing), 0usize)];
            marks[start.index()] = Mark::OnStack;

            while let Some((neighbors, pos)) = stack.last_mut() {
                if let Some(&next) = neighbors.get(*pos) {
                    *pos += 1;
                    match marks[next.index()] {
                        Mark::Unvisited => {
                            marks[next.index()] = Mark::OnStack;
                            path.push(next);
                            stack.push((self.sorted_neighbors(next, Direction::Outgoing), 0));
                        }
                        Mark::OnStack => {
                            if let Some(from) = path.iter().position(|n| *n == next) {
                                let ids = path[from..]
                                    .iter()
                                    .filter_map(|n| self.graph.node_weight(*n).cloned())
                                    .collect();
                                let cycle = Cycle::canonical(ids);
                                if seen.insert(cycle.clone()) {
                                    cycles.push(cycle);
                                }
                            }
                        }
                        Mark::Done => {}
                    }
                } else {
                    if let Some(done) = path.pop() {
                        marks[done.index()] = Mark::Done;
                    }
                    stack.pop();
                }
            }
        }

        cycles
    }

    /// Returns true if the graph contains the exercise
    pub fn contains(&self, id: &ExerciseId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Returns the number of exercises in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns the number of prerequisite edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
