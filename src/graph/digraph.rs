use log::debug;
use num_traits::Float;
use std::fmt::{self, Debug};
use std::str::FromStr;

use crate::config::Config;
use crate::error::{KspError, Node, Result};
use crate::graph::{Boundary, SparseMatrix, State};

/// How the entries of a transition matrix encode probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixFormat {
    /// Entry `(i, j)` is the probability of moving from `i` to `j`.
    Straight,
    /// Entry `(i, j)` is `[i == j] - P(i, j)`, the layout handed to linear
    /// equation solvers.
    ResidualForm,
}

impl MatrixFormat {
    /// Recovers the transition probability stored at `(row, column)`.
    pub fn probability<T: Float>(self, row: State, column: State, value: T) -> T {
        match self {
            MatrixFormat::Straight => value,
            MatrixFormat::ResidualForm if row == column => T::one() - value,
            MatrixFormat::ResidualForm => -value,
        }
    }
}

impl fmt::Display for MatrixFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixFormat::Straight => write!(f, "Straight"),
            MatrixFormat::ResidualForm => write!(f, "I_Minus_P"),
        }
    }
}

impl FromStr for MatrixFormat {
    type Err = KspError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Straight" | "straight" => Ok(MatrixFormat::Straight),
            "I_Minus_P" | "iMinusP" | "ResidualForm" => Ok(MatrixFormat::ResidualForm),
            other => Err(KspError::UnsupportedMatrixFormat(other.to_string())),
        }
    }
}

/// Maps a probability in `(0, 1]` to a non-negative additive distance.
fn distance<T: Float>(probability: T) -> T {
    T::zero() - probability.min(T::one()).ln()
}

/// A directed edge of the collapsed graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge<T> {
    pub from: usize,
    pub to: usize,
    pub weight: T,
}

#[derive(Debug, Clone)]
struct Adjacency<T> {
    offsets: Vec<usize>,
    arcs: Vec<(usize, T)>,
}

impl<T: Copy> Adjacency<T> {
    fn from_lists(lists: Vec<Vec<(usize, T)>>) -> Self {
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        offsets.push(0);
        let mut arcs = Vec::with_capacity(lists.iter().map(Vec::len).sum());
        for list in lists {
            arcs.extend(list);
            offsets.push(arcs.len());
        }
        Adjacency { offsets, arcs }
    }

    fn arcs(&self, node: usize) -> &[(usize, T)] {
        match (self.offsets.get(node), self.offsets.get(node + 1)) {
            (Some(&s), Some(&e)) => &self.arcs[s..e],
            _ => &[],
        }
    }
}

/// Directed graph over the states of a transition system plus a virtual
/// source and a virtual sink, weighted by `-ln(probability)`.
///
/// Real states keep their indices `0..state_count`. The virtual source is
/// node `state_count` and the virtual sink is node `state_count + 1`.
/// Outgoing edges of a state are ordered by target; the sink edge comes last.
#[derive(Debug, Clone)]
pub struct WeightedDigraph<T> {
    state_count: usize,
    format: MatrixFormat,
    forward: Adjacency<T>,
    backward: Adjacency<T>,
}

impl<T: Float + Debug> WeightedDigraph<T> {
    /// Builds the collapsed graph.
    ///
    /// # Errors
    /// * `MalformedModel` if the matrix is not square, does not match the
    ///   boundary, stores a negative probability or a probability above
    ///   `1 + tolerance`, or a row's probabilities sum above `1 + tolerance`
    pub fn new(
        matrix: &SparseMatrix<T>,
        format: MatrixFormat,
        boundary: &Boundary<T>,
        config: &Config<T>,
    ) -> Result<Self> {
        if !matrix.is_square() {
            return Err(KspError::malformed(format!(
                "transition matrix is {}x{}, expected a square matrix",
                matrix.row_count(),
                matrix.column_count()
            )));
        }
        let n = matrix.row_count();
        if let Some(&s) = boundary
            .initial_states
            .iter()
            .chain(boundary.targets.iter().map(|(s, _)| s))
            .find(|&&s| s >= n)
        {
            return Err(KspError::malformed(format!(
                "boundary state {} outside a model with {} states",
                s, n
            )));
        }

        let source = n;
        let sink = n + 1;
        let limit = T::one() + config.tolerance;
        let mut lists: Vec<Vec<(usize, T)>> = vec![Vec::new(); n + 2];
        let mut target_probability = vec![None; n];
        for &(s, p) in &boundary.targets {
            target_probability[s] = Some(p);
        }

        for (row, list) in lists.iter_mut().enumerate().take(n) {
            let mut entries: Vec<(State, T)> = matrix
                .row(row)
                .map(|(column, value)| (column, format.probability(row, column, value)))
                .collect();
            // an absent diagonal of I - P stands for a certain self loop
            if format == MatrixFormat::ResidualForm && matrix.get(row, row).is_none() {
                entries.push((row, T::one()));
                entries.sort_by_key(|&(column, _)| column);
            }

            let mut mass = T::zero();
            for (column, p) in entries {
                if !p.is_finite() || p < T::zero() || p > limit {
                    return Err(KspError::malformed(format!(
                        "entry ({}, {}) gives transition probability {:?} under {}",
                        row, column, p, format
                    )));
                }
                if p.is_zero() {
                    continue;
                }
                mass = mass + p;
                list.push((column, distance(p)));
            }
            if mass > limit {
                return Err(KspError::malformed(format!(
                    "row {} has probability mass {:?}",
                    row, mass
                )));
            }
            if let Some(p) = target_probability[row] {
                list.push((sink, distance(p)));
            }
        }
        lists[source] = boundary
            .initial_states
            .iter()
            .map(|&s| (s, T::zero()))
            .collect();

        let mut reverse: Vec<Vec<(usize, T)>> = vec![Vec::new(); n + 2];
        for (from, list) in lists.iter().enumerate() {
            for &(to, weight) in list {
                reverse[to].push((from, weight));
            }
        }

        let graph = WeightedDigraph {
            state_count: n,
            format,
            forward: Adjacency::from_lists(lists),
            backward: Adjacency::from_lists(reverse),
        };
        debug!(
            "collapsed graph: {} states, {} edges, {} initial, {} target ({})",
            n,
            graph.edge_count(),
            boundary.initial_states.len(),
            boundary.targets.len(),
            format
        );
        Ok(graph)
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Number of nodes including the two virtual ones.
    pub fn node_count(&self) -> usize {
        self.state_count + 2
    }

    pub fn edge_count(&self) -> usize {
        self.forward.arcs.len()
    }

    pub fn format(&self) -> MatrixFormat {
        self.format
    }

    pub fn virtual_source(&self) -> usize {
        self.state_count
    }

    pub fn virtual_sink(&self) -> usize {
        self.state_count + 1
    }

    pub fn is_virtual(&self, node: usize) -> bool {
        node >= self.state_count
    }

    pub fn node(&self, node: usize) -> Node {
        if node == self.virtual_source() {
            Node::VirtualSource
        } else if node == self.virtual_sink() {
            Node::VirtualSink
        } else {
            Node::State(node)
        }
    }

    pub fn edges_from(&self, node: usize) -> impl Iterator<Item = Edge<T>> + '_ {
        self.forward
            .arcs(node)
            .iter()
            .map(move |&(to, weight)| Edge {
                from: node,
                to,
                weight,
            })
    }

    pub fn edges_to(&self, node: usize) -> impl Iterator<Item = Edge<T>> + '_ {
        self.backward
            .arcs(node)
            .iter()
            .map(move |&(from, weight)| Edge {
                from,
                to: node,
                weight,
            })
    }
}
