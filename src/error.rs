use std::fmt;
use thiserror::Error;

use crate::graph::State;

/// A node of the collapsed graph, as reported in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// A state of the underlying transition system.
    State(State),
    /// The synthetic node joining all initial states.
    VirtualSource,
    /// The synthetic node joining all target states.
    VirtualSink,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::State(s) => write!(f, "state {}", s),
            Node::VirtualSource => write!(f, "the virtual source"),
            Node::VirtualSink => write!(f, "the target set"),
        }
    }
}

/// Errors raised while building a generator or querying it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KspError {
    #[error("malformed model: {0}")]
    MalformedModel(String),

    #[error("unsupported matrix format: {0}")]
    UnsupportedMatrixFormat(String),

    #[error("the set of initial states is empty")]
    EmptyInitialSet,

    #[error("the set of target states is empty")]
    EmptyTargetSet,

    #[error("unknown label: {0}")]
    UnknownLabel(String),

    #[error("{0} is not reachable from any initial state")]
    UnreachableState(Node),

    #[error("{node} has {available} loopless path(s), rank {rank} was requested")]
    RankExhausted {
        node: Node,
        rank: usize,
        available: usize,
    },

    #[error("path ranks start at 1")]
    InvalidRank,
}

impl KspError {
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        KspError::MalformedModel(message.into())
    }
}

pub type Result<T> = std::result::Result<T, KspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            KspError::malformed("row 3 sums to 1.5").to_string(),
            "malformed model: row 3 sums to 1.5"
        );
        assert_eq!(
            KspError::UnreachableState(Node::VirtualSink).to_string(),
            "the target set is not reachable from any initial state"
        );
        let err = KspError::RankExhausted {
            node: Node::State(4),
            rank: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "state 4 has 2 loopless path(s), rank 3 was requested"
        );
    }
}
