use bitvec::vec::BitVec;
use num_traits::Float;
use std::fmt::Debug;

use crate::error::Result;
use crate::graph::{State, StateSet, WeightedDigraph};
use crate::ksp::enumerator::Enumerator;

/// A path to the target set written out state by state.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedPath<T> {
    pub distance: T,
    /// Visited states from an initial state to a target state.
    pub states: Vec<State>,
    /// The same states as a set over the whole state space.
    pub state_set: StateSet,
}

/// Follows the predecessor links of the rank-`k` path to the virtual sink
/// back to the virtual source.
///
/// # Errors
/// * `UnreachableState` if no target state is reachable
/// * `RankExhausted` if fewer than `k` loopless paths reach the target set
pub fn materialize<T>(
    graph: &WeightedDigraph<T>,
    enumerator: &mut Enumerator<T>,
    k: usize,
) -> Result<MaterializedPath<T>>
where
    T: Float + Debug,
{
    let sink = graph.virtual_sink();
    let path = enumerator.path_of(graph, sink, k)?;

    let mut states: Vec<State> = enumerator
        .table()
        .chain(sink, k)
        .filter(|&node| !graph.is_virtual(node))
        .collect();
    states.reverse();

    let mut state_set = BitVec::repeat(false, graph.state_count());
    for &s in &states {
        state_set.set(s, true);
    }

    Ok(MaterializedPath {
        distance: path.distance,
        states,
        state_set,
    })
}
