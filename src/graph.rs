use bitvec::vec::BitVec;

pub mod collapse;
pub mod digraph;
pub mod dijkstra;
pub mod model;
pub mod sparse;

/// Index of a state of the transition system.
pub type State = usize;

/// Set of states, one bit per state.
pub type StateSet = BitVec;

pub use collapse::{Boundary, Targets};
pub use digraph::{Edge, MatrixFormat, WeightedDigraph};
pub use dijkstra::DistanceTree;
pub use model::{Dtmc, Model};
pub use sparse::{SparseMatrix, SparseMatrixBuilder};

/// Builds a state set of at least `len` bits containing `states`.
///
/// The set grows if a state lies beyond `len`.
pub fn state_set<I>(len: usize, states: I) -> StateSet
where
    I: IntoIterator<Item = State>,
{
    let mut set = BitVec::repeat(false, len);
    for s in states {
        if s >= set.len() {
            set.resize(s + 1, false);
        }
        set.set(s, true);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_set() {
        let set = state_set(4, [0, 2]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.iter_ones().collect::<Vec<_>>(), vec![0, 2]);

        let grown = state_set(2, [5]);
        assert_eq!(grown.len(), 6);
        assert!(grown[5]);
    }
}
