use log::debug;
use num_traits::Float;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use crate::graph::WeightedDigraph;

/// Entry in the priority queue for Dijkstra's algorithm
#[derive(Copy, Clone, Debug)]
struct QueueEntry<T> {
    node: usize,
    distance: T,
}

impl<T: PartialOrd> Eq for QueueEntry<T> {}

impl<T: PartialOrd> PartialEq for QueueEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: PartialOrd> PartialOrd for QueueEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: PartialOrd> Ord for QueueEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap, lower node first on ties
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Shortest distances and predecessors from a single root node.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTree<T> {
    source: usize,
    distances: Vec<Option<T>>,
    predecessors: Vec<Option<usize>>,
}

impl<T: Float> DistanceTree<T> {
    /// The node the search started from.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Shortest distance between the root and `node`, `None` if there is no path.
    pub fn distance(&self, node: usize) -> Option<T> {
        self.distances.get(node).copied().flatten()
    }

    /// Neighbour of `node` on its shortest path towards the root. `None` for
    /// the root and for unreachable nodes.
    pub fn predecessor(&self, node: usize) -> Option<usize> {
        self.predecessors.get(node).copied().flatten()
    }

    pub fn is_reachable(&self, node: usize) -> bool {
        self.distance(node).is_some()
    }

    pub fn reachable_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_some()).count()
    }
}

/// Computes the shortest-path tree rooted at `source` over the non-negative
/// edge weights of `graph`.
///
/// A node keeps the first predecessor that reached it with its final
/// distance, so on ties the predecessor settled earliest wins.
///
/// # Complexity
/// * Time: O((V + E) log V) where V is the number of nodes and E is the number of edges
/// * Space: O(V)
pub fn distance_tree<T>(graph: &WeightedDigraph<T>, source: usize) -> DistanceTree<T>
where
    T: Float + Debug,
{
    let tree = search(graph.node_count(), source, move |node| {
        graph.edges_from(node).map(|edge| (edge.to, edge.weight))
    });
    debug!(
        "distance tree from node {}: {} of {} nodes reachable",
        source,
        tree.reachable_count(),
        graph.node_count()
    );
    tree
}

/// Computes the shortest distance from every node to `target` by searching
/// the reversed edges. In the returned tree the predecessor of a node is the
/// next node on its shortest path towards `target`.
pub fn distance_tree_to<T>(graph: &WeightedDigraph<T>, target: usize) -> DistanceTree<T>
where
    T: Float + Debug,
{
    let tree = search(graph.node_count(), target, move |node| {
        graph.edges_to(node).map(|edge| (edge.from, edge.weight))
    });
    debug!(
        "distance tree to node {}: {} of {} nodes lead there",
        target,
        tree.reachable_count(),
        graph.node_count()
    );
    tree
}

fn search<T, F, I>(n: usize, root: usize, neighbors: F) -> DistanceTree<T>
where
    T: Float,
    F: Fn(usize) -> I,
    I: Iterator<Item = (usize, T)>,
{
    let mut distances: Vec<Option<T>> = vec![None; n];
    let mut predecessors: Vec<Option<usize>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    if root < n {
        distances[root] = Some(T::zero());
        heap.push(QueueEntry {
            node: root,
            distance: T::zero(),
        });
    }

    while let Some(QueueEntry { node, distance }) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;

        for (next, weight) in neighbors(node) {
            if settled[next] {
                continue;
            }
            let candidate = distance + weight;
            let improves = match distances[next] {
                Some(current) => candidate < current,
                None => true,
            };
            if improves {
                distances[next] = Some(candidate);
                predecessors[next] = Some(node);
                heap.push(QueueEntry {
                    node: next,
                    distance: candidate,
                });
            }
        }
    }

    DistanceTree {
        source: root,
        distances,
        predecessors,
    }
}
