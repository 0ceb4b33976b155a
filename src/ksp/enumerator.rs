//! Lazy enumeration of the loopless paths to every node, in rank order.
//!
//! The rank-1 path of each node comes from the baseline distance tree. Every
//! committed path of a node `u` offers one candidate to each successor `w`
//! that is not already on it: the same path extended by the edge `u -> w`.
//! Candidates wait in the candidate set of `w`, ordered by distance.
//!
//! A frontier holds one entry per waiting candidate and each step commits the
//! best candidate of the node at its head. Entries are ordered by slack, the
//! sum of the reduced weights `w(u, v) + h(v) - h(u)` along the path, where
//! the potential `h` is the shortest distance to the virtual sink. Reduced
//! weights are never negative, so a prefix is committed before any of its
//! extensions, and within one node slack and distance differ by a constant,
//! so the ranks of each node come out sorted and complete. A query for rank
//! `k` of the sink only commits paths whose slack does not exceed the slack
//! of the answer.
//!
//! Nodes that cannot reach the virtual sink never feed a node that can, so
//! their candidates are kept on a separate frontier that only advances when
//! such a node is queried. They all get the largest potential of the nodes
//! that do reach the sink.

use bitvec::vec::BitVec;
use log::{debug, trace};
use num_traits::Float;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use crate::error::{KspError, Result};
use crate::graph::dijkstra::distance_tree_to;
use crate::graph::{DistanceTree, Edge, WeightedDigraph};
use crate::ksp::path::{Path, PathTable};

/// A not yet committed extension of a predecessor's path.
#[derive(Copy, Clone, Debug)]
struct Candidate<T> {
    predecessor: usize,
    predecessor_rank: usize,
    distance: T,
    slack: T,
}

impl<T: PartialOrd> Eq for Candidate<T> {}

impl<T: PartialOrd> PartialEq for Candidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: PartialOrd> PartialOrd for Candidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: PartialOrd> Ord for Candidate<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap; ties go to the lower predecessor,
        // then to its lower rank
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.predecessor.cmp(&self.predecessor))
            .then_with(|| other.predecessor_rank.cmp(&self.predecessor_rank))
    }
}

/// One frontier entry per waiting candidate of `node`.
#[derive(Copy, Clone, Debug)]
struct Scheduled<T> {
    node: usize,
    slack: T,
    distance: T,
}

impl<T: PartialOrd> Eq for Scheduled<T> {}

impl<T: PartialOrd> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: PartialOrd> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: PartialOrd> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Least slack first; on equal slack the entry further along its
        // route wins, then the lower node
        other
            .slack
            .partial_cmp(&self.slack)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                self.distance
                    .partial_cmp(&other.distance)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Counters of the work done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerationStats {
    /// Paths committed beyond rank 1.
    pub committed: usize,
    /// Candidates dropped because they would revisit a node.
    pub rejected: usize,
    /// Candidates waiting in candidate sets.
    pub pending: usize,
}

/// The path table together with the candidate sets that extend it.
#[derive(Debug, Clone)]
pub struct Enumerator<T> {
    table: PathTable<T>,
    /// Slack of every committed path, indexed like the table.
    slack: Vec<Vec<T>>,
    /// Shortest distance from each node to the virtual sink.
    potentials: Vec<T>,
    candidates: Vec<BinaryHeap<Candidate<T>>>,
    /// Nodes from which the virtual sink is reachable.
    relevant: BitVec,
    frontier: BinaryHeap<Scheduled<T>>,
    dead_end_frontier: BinaryHeap<Scheduled<T>>,
    stats: EnumerationStats,
}

impl<T: Float + Debug> Enumerator<T> {
    /// Seeds rank 1 of every reachable node from `tree` and offers the first
    /// round of candidates.
    pub fn new(graph: &WeightedDigraph<T>, tree: &DistanceTree<T>) -> Self {
        let n = graph.node_count();
        let to_sink = distance_tree_to(graph, graph.virtual_sink());
        let relevant: BitVec = (0..n).map(|node| to_sink.is_reachable(node)).collect();
        let ceiling = (0..n)
            .filter_map(|node| to_sink.distance(node))
            .fold(T::zero(), T::max);
        let potentials: Vec<T> = (0..n)
            .map(|node| to_sink.distance(node).unwrap_or(ceiling))
            .collect();
        let seed_slack = tree_slack(graph, tree, &potentials);

        let mut enumerator = Enumerator {
            table: PathTable::new(n),
            slack: vec![Vec::new(); n],
            potentials,
            candidates: vec![BinaryHeap::new(); n],
            relevant,
            frontier: BinaryHeap::new(),
            dead_end_frontier: BinaryHeap::new(),
            stats: EnumerationStats::default(),
        };

        for (node, slack) in seed_slack.into_iter().enumerate() {
            let (Some(distance), Some(slack)) = (tree.distance(node), slack) else {
                continue;
            };
            let path = match tree.predecessor(node) {
                Some(predecessor) => Path::new(predecessor, 1, distance),
                None => Path::initial(1, distance),
            };
            enumerator.table.push(node, path);
            enumerator.slack[node].push(slack);
        }
        for node in 0..n {
            if enumerator.table.len(node) > 0 {
                enumerator.offer_extensions(graph, node, 1);
            }
        }
        debug!(
            "seeded {} rank-1 paths, {} of {} nodes lead to a target, {} candidates",
            (0..n).filter(|&v| enumerator.table.len(v) > 0).count(),
            enumerator.relevant.count_ones(),
            n,
            enumerator.stats.pending
        );
        enumerator
    }

    pub fn table(&self) -> &PathTable<T> {
        &self.table
    }

    pub fn stats(&self) -> EnumerationStats {
        self.stats
    }

    /// Whether the virtual sink can be reached from `node`.
    pub fn leads_to_target(&self, node: usize) -> bool {
        self.relevant.get(node).is_some_and(|bit| *bit)
    }

    /// Returns the rank-`k` loopless path to `node`, committing as many
    /// candidates as needed. Already committed ranks are returned directly.
    ///
    /// # Errors
    /// * `InvalidRank` if `k` is 0
    /// * `UnreachableState` if no path leads from the virtual source to `node`
    /// * `RankExhausted` if fewer than `k` loopless paths lead to `node`
    pub fn path_of(
        &mut self,
        graph: &WeightedDigraph<T>,
        node: usize,
        k: usize,
    ) -> Result<Path<T>> {
        if k == 0 {
            return Err(KspError::InvalidRank);
        }
        if self.table.len(node) == 0 {
            return Err(KspError::UnreachableState(graph.node(node)));
        }
        let relevant = self.leads_to_target(node);
        while self.table.len(node) < k {
            let advanced = if relevant {
                self.advance(graph)
            } else {
                self.advance_any(graph)
            };
            if advanced.is_none() {
                break;
            }
        }
        self.table
            .get(node, k)
            .copied()
            .ok_or_else(|| KspError::RankExhausted {
                node: graph.node(node),
                rank: k,
                available: self.table.len(node),
            })
    }

    /// Commits the candidate with the least slack among the nodes that lead
    /// to a target. Returns the node that gained a rank, or `None` when none
    /// is left.
    fn advance(&mut self, graph: &WeightedDigraph<T>) -> Option<usize> {
        let Scheduled { node, .. } = self.frontier.pop()?;
        self.commit(graph, node)
    }

    /// Commits the candidate with the least slack of any node.
    fn advance_any(&mut self, graph: &WeightedDigraph<T>) -> Option<usize> {
        let take_dead_end = match (self.dead_end_frontier.peek(), self.frontier.peek()) {
            (Some(_), None) => true,
            // the main frontier wins ties so that every candidate a
            // relevant commit could still add is already offered
            (Some(dead), Some(main)) => dead.slack < main.slack,
            (None, _) => false,
        };
        if take_dead_end {
            let Scheduled { node, .. } = self.dead_end_frontier.pop()?;
            self.commit(graph, node)
        } else {
            self.advance(graph)
        }
    }

    fn commit(&mut self, graph: &WeightedDigraph<T>, node: usize) -> Option<usize> {
        let candidate = self.candidates[node].pop()?;
        self.stats.pending -= 1;
        let path = Path::new(
            candidate.predecessor,
            candidate.predecessor_rank,
            candidate.distance,
        );
        let rank = self.table.push(node, path);
        self.slack[node].push(candidate.slack);
        self.stats.committed += 1;
        trace!(
            "rank {} of node {}: {:?}, slack {:?}",
            rank,
            node,
            path,
            candidate.slack
        );
        if node == graph.virtual_sink() {
            debug!(
                "rank {} to the target set at distance {:?} ({} commits, {} rejected)",
                rank, candidate.distance, self.stats.committed, self.stats.rejected
            );
        }
        self.offer_extensions(graph, node, rank);
        Some(node)
    }

    /// Offers the rank-`rank` path of `node`, extended by each outgoing
    /// edge, to the edge's target unless the target is already on the path.
    fn offer_extensions(&mut self, graph: &WeightedDigraph<T>, node: usize, rank: usize) {
        let (Some(&path), Some(&slack)) =
            (self.table.get(node, rank), self.slack[node].get(rank - 1))
        else {
            return;
        };
        for edge in graph.edges_from(node) {
            let extension = Path::new(node, rank, path.distance + edge.weight);
            // rank 1 of the target may already be this very extension
            if rank == 1 && self.table.get(edge.to, 1) == Some(&extension) {
                continue;
            }
            if self.table.chain(node, rank).any(|v| v == edge.to) {
                self.stats.rejected += 1;
                trace!(
                    "rejected rank {} of node {} extended to node {}: loop",
                    rank,
                    node,
                    edge.to
                );
                continue;
            }
            let candidate = Candidate {
                predecessor: node,
                predecessor_rank: rank,
                distance: extension.distance,
                slack: slack + reduced_weight(&self.potentials, &edge),
            };
            self.candidates[edge.to].push(candidate);
            self.stats.pending += 1;
            let scheduled = Scheduled {
                node: edge.to,
                slack: candidate.slack,
                distance: candidate.distance,
            };
            if self.leads_to_target(edge.to) {
                self.frontier.push(scheduled);
            } else {
                self.dead_end_frontier.push(scheduled);
            }
        }
    }
}

/// Weight of `edge` reweighted by the potentials of its endpoints.
fn reduced_weight<T: Float>(potentials: &[T], edge: &Edge<T>) -> T {
    (edge.weight + potentials[edge.to] - potentials[edge.from]).max(T::zero())
}

/// Slack of the rank-1 path of every node reachable in `tree`, summed from
/// the root down so that tree edges on a shortest route to the sink add
/// exactly zero.
fn tree_slack<T: Float + Debug>(
    graph: &WeightedDigraph<T>,
    tree: &DistanceTree<T>,
    potentials: &[T],
) -> Vec<Option<T>> {
    let mut slack: Vec<Option<T>> = vec![None; graph.node_count()];
    let mut pending = Vec::new();
    for node in 0..graph.node_count() {
        let mut current = node;
        while slack[current].is_none() && tree.is_reachable(current) {
            pending.push(current);
            match tree.predecessor(current) {
                Some(predecessor) => current = predecessor,
                None => break,
            }
        }
        while let Some(v) = pending.pop() {
            let value = match tree.predecessor(v) {
                Some(predecessor) => {
                    let base = slack[predecessor].unwrap_or_else(T::zero);
                    let step = graph
                        .edges_from(predecessor)
                        .find(|edge| edge.to == v)
                        .map_or_else(T::zero, |edge| reduced_weight(potentials, &edge));
                    base + step
                }
                None => T::zero(),
            };
            slack[v] = Some(value);
        }
    }
    slack
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Node;
    use crate::graph::dijkstra::distance_tree;
    use crate::graph::{Boundary, MatrixFormat, SparseMatrix};
    use approx::assert_relative_eq;

    fn setup(
        rows: &[Vec<f64>],
        initial: &[usize],
        targets: &[usize],
    ) -> (WeightedDigraph<f64>, Enumerator<f64>) {
        let matrix = SparseMatrix::from_dense(rows).unwrap();
        let boundary = Boundary {
            initial_states: initial.to_vec(),
            targets: targets.iter().map(|&t| (t, 1.0)).collect(),
        };
        let graph =
            WeightedDigraph::new(&matrix, MatrixFormat::Straight, &boundary, &Config::default())
                .unwrap();
        let tree = distance_tree(&graph, graph.virtual_source());
        let enumerator = Enumerator::new(&graph, &tree);
        (graph, enumerator)
    }

    fn nodes_of(enumerator: &Enumerator<f64>, node: usize, rank: usize) -> Vec<usize> {
        let mut nodes: Vec<usize> = enumerator.table().chain(node, rank).collect();
        nodes.reverse();
        nodes
    }

    #[test]
    fn test_tied_paths_are_both_enumerated() {
        // A -> B 0.5, A -> C 0.5, B -> C 1.0
        let (g, mut e) = setup(
            &[
                vec![0.0, 0.5, 0.5],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 1.0],
            ],
            &[0],
            &[2],
        );
        let sink = g.virtual_sink();
        let source = g.virtual_source();

        let first = e.path_of(&g, sink, 1).unwrap();
        assert_relative_eq!(first.distance, 2f64.ln());
        assert_eq!(nodes_of(&e, sink, 1), vec![source, 0, 2, sink]);

        let second = e.path_of(&g, sink, 2).unwrap();
        assert_relative_eq!(second.distance, 2f64.ln());
        assert_eq!(nodes_of(&e, sink, 2), vec![source, 0, 1, 2, sink]);
        assert_ne!(first, second);

        assert_eq!(
            e.path_of(&g, sink, 3),
            Err(KspError::RankExhausted {
                node: Node::VirtualSink,
                rank: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_source_has_single_path() {
        let (g, mut e) = setup(&[vec![1.0]], &[0], &[0]);
        let source = g.virtual_source();
        assert_eq!(e.path_of(&g, source, 1).unwrap(), Path::initial(1, 0.0));
        assert!(matches!(
            e.path_of(&g, source, 2),
            Err(KspError::RankExhausted { .. })
        ));
        assert_eq!(e.path_of(&g, source, 0), Err(KspError::InvalidRank));
    }

    #[test]
    fn test_cycles_are_never_closed() {
        // 0 <-> 1, both lead to 2
        let (g, mut e) = setup(
            &[
                vec![0.0, 0.5, 0.5],
                vec![0.5, 0.0, 0.5],
                vec![0.0, 0.0, 1.0],
            ],
            &[0],
            &[2],
        );
        let sink = g.virtual_sink();
        assert!(e.path_of(&g, sink, 2).is_ok());
        assert!(e.path_of(&g, sink, 3).is_err());
        assert_eq!(e.path_of(&g, 1, 1).unwrap(), Path::new(0, 1, 0.0));
        assert!(e.path_of(&g, 1, 2).is_err());
        assert!(e.stats().rejected > 0);
        for rank in 1..=2 {
            let nodes = nodes_of(&e, sink, rank);
            let mut sorted = nodes.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), nodes.len());
        }
    }

    #[test]
    fn test_unreachable_node() {
        let (g, mut e) = setup(&[vec![1.0, 0.0], vec![0.0, 1.0]], &[0], &[1]);
        assert_eq!(
            e.path_of(&g, g.virtual_sink(), 1),
            Err(KspError::UnreachableState(Node::VirtualSink))
        );
        assert_eq!(
            e.path_of(&g, 1, 1),
            Err(KspError::UnreachableState(Node::State(1)))
        );
    }

    #[test]
    fn test_ranks_are_memoized() {
        let (g, mut e) = setup(
            &[
                vec![0.0, 0.3, 0.3, 0.4],
                vec![0.0, 0.0, 0.5, 0.5],
                vec![0.0, 0.5, 0.0, 0.5],
                vec![0.0, 0.0, 0.0, 1.0],
            ],
            &[0],
            &[3],
        );
        let sink = g.virtual_sink();
        let third = e.path_of(&g, sink, 3).unwrap();
        let committed = e.stats().committed;
        assert_eq!(e.path_of(&g, sink, 3).unwrap(), third);
        assert_eq!(e.path_of(&g, sink, 1).unwrap(), *e.table().get(sink, 1).unwrap());
        assert_eq!(e.stats().committed, committed);

        // ranks of every node come out sorted
        for node in 0..g.node_count() {
            let paths = e.table().paths(node);
            assert!(paths.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn test_dead_end_nodes_still_enumerate() {
        // 0 -> 1, 0 -> 2, 1 -> 2, 0 -> 3 (target); 1 and 2 cannot reach 3
        let (g, mut e) = setup(
            &[
                vec![0.0, 0.25, 0.25, 0.5],
                vec![0.0, 0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0],
                vec![0.0, 0.0, 0.0, 1.0],
            ],
            &[0],
            &[3],
        );
        assert!(e.leads_to_target(0));
        assert!(!e.leads_to_target(2));
        assert!(e.path_of(&g, g.virtual_sink(), 2).is_err());

        let first = e.path_of(&g, 2, 1).unwrap();
        let second = e.path_of(&g, 2, 2).unwrap();
        assert_eq!(first, Path::new(0, 1, 0.0));
        assert_eq!(second, Path::new(1, 1, 0.0));
        assert_relative_eq!(first.distance, 4f64.ln());
        assert_relative_eq!(second.distance, 4f64.ln());
        assert!(e.path_of(&g, 2, 3).is_err());
    }

    /// 0 -> 1 directly, or through `levels` diamonds that split evenly and
    /// rejoin before reaching 1.
    fn diamond_chain(levels: usize) -> Vec<Vec<f64>> {
        let n = 3 * levels + 3;
        let join = |level: usize| 2 + 3 * level;
        let mut rows = vec![vec![0.0; n]; n];
        rows[0][1] = 0.5;
        rows[0][join(0)] = 0.5;
        rows[1][1] = 1.0;
        for level in 0..levels {
            let (a, b, c) = (join(level), join(level) + 1, join(level) + 2);
            rows[a][b] = 0.5;
            rows[a][c] = 0.5;
            rows[b][join(level + 1)] = 1.0;
            rows[c][join(level + 1)] = 1.0;
        }
        rows[join(levels)][1] = 1.0;
        rows
    }

    #[test]
    fn test_second_path_does_not_expand_every_route() {
        for levels in [4, 8, 16] {
            let (g, mut e) = setup(&diamond_chain(levels), &[0], &[1]);
            let sink = g.virtual_sink();
            assert_relative_eq!(e.path_of(&g, sink, 1).unwrap().distance, 2f64.ln());
            let second = e.path_of(&g, sink, 2).unwrap();
            assert_relative_eq!(
                second.distance,
                (levels + 1) as f64 * 2f64.ln(),
                epsilon = 1e-9
            );
            assert!(
                e.stats().committed <= levels,
                "{} commits for {} levels",
                e.stats().committed,
                levels
            );
            assert!(e.stats().pending <= 2 * levels + 2);

            let route = nodes_of(&e, sink, 2);
            assert_eq!(route.len(), 2 * levels + 5);
            assert!(e.path_of(&g, sink, 3).is_ok());
        }
    }
}
