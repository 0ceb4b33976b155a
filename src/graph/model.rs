use num_traits::Float;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::error::{KspError, Result};
use crate::graph::{SparseMatrix, StateSet};

/// A discrete-time probabilistic transition system that owns its initial
/// states and state labels.
pub trait Model<T: Float + Debug> {
    /// Row-stochastic (or sub-stochastic) transition probabilities.
    fn transition_matrix(&self) -> &SparseMatrix<T>;

    fn initial_states(&self) -> &StateSet;

    /// States carrying `label`, or `None` if the label is unknown.
    fn states_with_label(&self, label: &str) -> Option<StateSet>;

    fn state_count(&self) -> usize {
        self.transition_matrix().row_count()
    }
}

/// A discrete-time Markov chain with a label map.
#[derive(Debug, Clone)]
pub struct Dtmc<T> {
    transitions: SparseMatrix<T>,
    initial_states: StateSet,
    labels: HashMap<String, StateSet>,
}

impl<T: Float + Debug> Dtmc<T> {
    /// # Errors
    /// * `MalformedModel` if the matrix is not square or an initial state is
    ///   out of range
    pub fn new(transitions: SparseMatrix<T>, initial_states: StateSet) -> Result<Self> {
        if !transitions.is_square() {
            return Err(KspError::malformed(format!(
                "transition matrix is {}x{}, expected a square matrix",
                transitions.row_count(),
                transitions.column_count()
            )));
        }
        check_in_range(&initial_states, transitions.row_count(), "initial state")?;
        Ok(Dtmc {
            transitions,
            initial_states,
            labels: HashMap::new(),
        })
    }

    /// Attaches `label` to `states`, replacing any previous assignment.
    pub fn add_label<S: Into<String>>(&mut self, label: S, states: StateSet) -> Result<()> {
        check_in_range(&states, self.transitions.row_count(), "labelled state")?;
        self.labels.insert(label.into(), states);
        Ok(())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }
}

fn check_in_range(states: &StateSet, len: usize, what: &str) -> Result<()> {
    match states.iter_ones().find(|&s| s >= len) {
        Some(s) => Err(KspError::malformed(format!(
            "{} {} outside a model with {} states",
            what, s, len
        ))),
        None => Ok(()),
    }
}

impl<T: Float + Debug> Model<T> for Dtmc<T> {
    fn transition_matrix(&self) -> &SparseMatrix<T> {
        &self.transitions
    }

    fn initial_states(&self) -> &StateSet {
        &self.initial_states
    }

    fn states_with_label(&self, label: &str) -> Option<StateSet> {
        self.labels.get(label).cloned()
    }
}
