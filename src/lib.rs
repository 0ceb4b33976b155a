//! Incremental k-shortest loopless path enumeration over the graph of a
//! discrete probabilistic transition system.
//!
//! Edge distances are `-ln(p)` of the transition probabilities, so the
//! shortest path is the most probable one.

pub mod config;
pub mod error;
pub mod graph;
pub mod ksp;

pub use config::Config;
pub use error::{KspError, Node, Result};
pub use graph::{Dtmc, MatrixFormat, Model, SparseMatrix, State, StateSet, Targets};
pub use ksp::{Path, ShortestPathsGenerator};
