use std::fmt::{self, Display};

/// The `k`-th shortest path to a node, stored as a link to the path it extends.
///
/// `predecessor` is absent only for the single path of the virtual source.
/// Equality compares the predecessor link and ignores `distance`.
#[derive(Debug, Clone, Copy)]
pub struct Path<T> {
    pub predecessor: Option<usize>,
    /// Rank (1-based) of the predecessor's path this path extends.
    pub predecessor_rank: usize,
    pub distance: T,
}

impl<T> Path<T> {
    pub fn new(predecessor: usize, predecessor_rank: usize, distance: T) -> Self {
        Path {
            predecessor: Some(predecessor),
            predecessor_rank,
            distance,
        }
    }

    /// A path without predecessor node.
    pub fn initial(predecessor_rank: usize, distance: T) -> Self {
        Path {
            predecessor: None,
            predecessor_rank,
            distance,
        }
    }
}

impl<T> PartialEq for Path<T> {
    fn eq(&self, other: &Self) -> bool {
        self.predecessor == other.predecessor && self.predecessor_rank == other.predecessor_rank
    }
}

impl<T> Eq for Path<T> {}

impl<T: Display> Display for Path<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Path with predecessorNode: '")?;
        match self.predecessor {
            Some(p) => write!(f, "{}", p)?,
            None => write!(f, "None")?,
        }
        write!(
            f,
            "' predecessorK: '{}' distance: '{}'>",
            self.predecessor_rank, self.distance
        )
    }
}

/// Committed paths per node, in rank order.
///
/// Lists only grow. Entry `k - 1` of a node's list is its rank-`k` path.
#[derive(Debug, Clone)]
pub struct PathTable<T> {
    paths: Vec<Vec<Path<T>>>,
}

impl<T: Copy> PathTable<T> {
    pub fn new(node_count: usize) -> Self {
        PathTable {
            paths: vec![Vec::new(); node_count],
        }
    }

    pub fn get(&self, node: usize, rank: usize) -> Option<&Path<T>> {
        if rank == 0 {
            return None;
        }
        self.paths.get(node)?.get(rank - 1)
    }

    /// Number of committed ranks of `node`.
    pub fn len(&self, node: usize) -> usize {
        self.paths.get(node).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.iter().all(Vec::is_empty)
    }

    /// Appends the next rank of `node` and returns that rank.
    pub(crate) fn push(&mut self, node: usize, path: Path<T>) -> usize {
        let list = &mut self.paths[node];
        list.push(path);
        list.len()
    }

    pub fn paths(&self, node: usize) -> &[Path<T>] {
        self.paths.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Walks the predecessor links from `(node, rank)` back to the path
    /// without predecessor, yielding every node on the way, `node` first.
    pub fn chain(&self, node: usize, rank: usize) -> Chain<'_, T> {
        Chain {
            table: self,
            next: Some((node, rank)),
        }
    }
}

/// Iterator returned by [`PathTable::chain`].
pub struct Chain<'a, T> {
    table: &'a PathTable<T>,
    next: Option<(usize, usize)>,
}

impl<T: Copy> Iterator for Chain<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let (node, rank) = self.next?;
        self.next = self
            .table
            .get(node, rank)
            .and_then(|p| p.predecessor.map(|pred| (pred, p.predecessor_rank)));
        Some(node)
    }
}
