use log::debug;
use num_traits::Float;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::config::Config;
use crate::error::{KspError, Result};
use crate::graph::collapse::collapse;
use crate::graph::dijkstra::distance_tree;
use crate::graph::{MatrixFormat, Model, SparseMatrix, State, StateSet, Targets, WeightedDigraph};
use crate::ksp::enumerator::{EnumerationStats, Enumerator};
use crate::ksp::materialize::{materialize, MaterializedPath};
use crate::ksp::path::Path;

/// Generates the loopless paths from a set of initial states to a set of
/// target states in order of increasing distance, where the distance of a
/// path is the negative logarithm of its probability.
///
/// Paths are computed on demand and kept, so asking for rank `k` after rank
/// `k - 1` only does the work between the two.
///
/// # Examples
/// ```
/// use ksp::{ShortestPathsGenerator, SparseMatrix, MatrixFormat, graph::state_set};
///
/// // 0 -> 1 (0.5), 0 -> 2 (0.5), 1 -> 2 (1.0)
/// let matrix = SparseMatrix::from_dense(&[
///     vec![0.0, 0.5, 0.5],
///     vec![0.0, 0.0, 1.0],
///     vec![0.0, 0.0, 1.0],
/// ]).unwrap();
/// let initial = state_set(3, [0]);
/// let mut generator = ShortestPathsGenerator::with_target_vector(
///     &matrix, &[0.0, 0.0, 1.0], &initial, MatrixFormat::Straight,
/// ).unwrap();
///
/// assert_eq!(generator.path_as_list(1).unwrap(), vec![0, 2]);
/// assert_eq!(generator.path_as_list(2).unwrap(), vec![0, 1, 2]);
/// assert!(generator.distance(3).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ShortestPathsGenerator<T = f64> {
    graph: WeightedDigraph<T>,
    enumerator: Enumerator<T>,
}

impl<T: Float + Debug> ShortestPathsGenerator<T> {
    /// Paths from the model's initial states to the states in `targets`.
    pub fn from_model<M: Model<T>>(model: &M, targets: &StateSet) -> Result<Self> {
        Self::for_model(model, Targets::States(targets))
    }

    /// Paths from the model's initial states to `target`.
    pub fn from_model_with_target<M: Model<T>>(model: &M, target: State) -> Result<Self> {
        Self::for_model(model, Targets::State(target))
    }

    /// Paths from the model's initial states to any state in `targets`.
    pub fn from_model_with_target_list<M: Model<T>>(model: &M, targets: &[State]) -> Result<Self> {
        Self::for_model(model, Targets::List(targets))
    }

    /// Paths from the model's initial states to the states carrying `label`.
    ///
    /// # Errors
    /// * `UnknownLabel` if the model has no such label
    pub fn from_model_with_label<M: Model<T>>(model: &M, label: &str) -> Result<Self> {
        let targets = model
            .states_with_label(label)
            .ok_or_else(|| KspError::UnknownLabel(label.to_string()))?;
        Self::for_model(model, Targets::States(&targets))
    }

    /// Paths over `matrix` from `initial_states`, where entry `s` of
    /// `target_probabilities` is the probability of reaching the target in
    /// one step from `s`.
    pub fn with_target_vector(
        matrix: &SparseMatrix<T>,
        target_probabilities: &[T],
        initial_states: &StateSet,
        format: MatrixFormat,
    ) -> Result<Self> {
        Self::from_parts(
            matrix,
            Targets::Vector(target_probabilities),
            initial_states,
            format,
            &Config::default(),
        )
    }

    /// Like [`with_target_vector`](Self::with_target_vector) with the
    /// one-step target probabilities given only for the states that have one.
    pub fn with_target_map(
        matrix: &SparseMatrix<T>,
        target_probabilities: &HashMap<State, T>,
        initial_states: &StateSet,
        format: MatrixFormat,
    ) -> Result<Self> {
        Self::from_parts(
            matrix,
            Targets::Map(target_probabilities),
            initial_states,
            format,
            &Config::default(),
        )
    }

    fn for_model<M: Model<T>>(model: &M, targets: Targets<'_, T>) -> Result<Self> {
        Self::from_parts(
            model.transition_matrix(),
            targets,
            model.initial_states(),
            MatrixFormat::Straight,
            &Config::default(),
        )
    }

    /// Builds the collapsed graph, its distance tree and the rank-1 paths.
    ///
    /// # Errors
    /// * `MalformedModel` if the matrix or the target description is invalid
    /// * `EmptyInitialSet` / `EmptyTargetSet` if either side is empty
    pub fn from_parts(
        matrix: &SparseMatrix<T>,
        targets: Targets<'_, T>,
        initial_states: &StateSet,
        format: MatrixFormat,
        config: &Config<T>,
    ) -> Result<Self> {
        if !matrix.is_square() {
            return Err(KspError::malformed(format!(
                "transition matrix is {}x{}, expected a square matrix",
                matrix.row_count(),
                matrix.column_count()
            )));
        }
        let boundary = collapse(matrix.row_count(), initial_states, targets, config)?;
        let graph = WeightedDigraph::new(matrix, format, &boundary, config)?;
        let tree = distance_tree(&graph, graph.virtual_source());
        let enumerator = Enumerator::new(&graph, &tree);
        debug!(
            "shortest paths generator over {} states, target set {}",
            graph.state_count(),
            if tree.is_reachable(graph.virtual_sink()) {
                "reachable"
            } else {
                "unreachable"
            }
        );
        Ok(ShortestPathsGenerator { graph, enumerator })
    }

    /// Distance of the `k`-th shortest path to the target set.
    ///
    /// # Errors
    /// * `InvalidRank` if `k` is 0
    /// * `UnreachableState` if no target state is reachable
    /// * `RankExhausted` if fewer than `k` loopless paths exist
    pub fn distance(&mut self, k: usize) -> Result<T> {
        let sink = self.graph.virtual_sink();
        Ok(self.enumerator.path_of(&self.graph, sink, k)?.distance)
    }

    /// States visited by the `k`-th shortest path, as a set over all states.
    pub fn states(&mut self, k: usize) -> Result<StateSet> {
        Ok(self.materialize(k)?.state_set)
    }

    /// States visited by the `k`-th shortest path, from the initial state to
    /// the target state.
    pub fn path_as_list(&mut self, k: usize) -> Result<Vec<State>> {
        Ok(self.materialize(k)?.states)
    }

    /// Distance, ordered states and state set of the `k`-th shortest path.
    pub fn materialize(&mut self, k: usize) -> Result<MaterializedPath<T>> {
        materialize(&self.graph, &mut self.enumerator, k)
    }

    /// The rank-`k` loopless path from the initial states to `state`.
    ///
    /// # Errors
    /// * `MalformedModel` if `state` does not exist
    /// * plus the errors of [`distance`](Self::distance)
    pub fn path_to(&mut self, state: State, k: usize) -> Result<Path<T>> {
        if state >= self.graph.state_count() {
            return Err(KspError::malformed(format!(
                "state {} outside a model with {} states",
                state,
                self.graph.state_count()
            )));
        }
        self.enumerator.path_of(&self.graph, state, k)
    }

    /// A path that is already computed, without computing more.
    pub fn committed_path(&self, node: usize, k: usize) -> Option<&Path<T>> {
        self.enumerator.table().get(node, k)
    }

    /// Number of paths already computed for `node`.
    pub fn paths_found(&self, node: usize) -> usize {
        self.enumerator.table().len(node)
    }

    pub fn state_count(&self) -> usize {
        self.graph.state_count()
    }

    pub fn graph(&self) -> &WeightedDigraph<T> {
        &self.graph
    }

    pub fn stats(&self) -> EnumerationStats {
        self.enumerator.stats()
    }
}
