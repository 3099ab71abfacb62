//! Greedy spanning-tree construction with pixel-graph rewiring.
//!
//! Prim's algorithm runs over the super-node lattice. The pixel graph
//! starts as one disjoint 4-cycle per super-node; each time a super-node is
//! absorbed into the tree, the local merge surgery fuses its cycle with its
//! parent's. When the tree spans the lattice the pixel graph is a single
//! Hamiltonian cycle, which the builder walks into an ordered path.
//!
//! The priority queue uses lazy deletion: relaxing a node pushes a fresh
//! entry rather than decreasing a key, and stale entries are skipped at pop
//! via the `selected` flag. Entries carry a total order (cost, then id) so
//! equal-cost pops are deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use crate::cost::EdgeCost;
use crate::diagnostics::GraphAudit;
use crate::graph::PixelGraph;
use crate::lattice::{self, MergeRewrite, NodeId};
use crate::types::{Coord, CurveError, CurvePath};

/// A heap entry for the lazy-deletion priority queue.
///
/// Ordering is reversed so `BinaryHeap` pops the cheapest entry; ties fall
/// back to row-major node order, keeping runs deterministic.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    cost: f64,
    node: NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Runs the spanning-tree construction for one frame.
pub struct CurveBuilder {
    rows: usize,
    cols: usize,
    node_rows: usize,
    node_cols: usize,
    graph: PixelGraph,
}

impl CurveBuilder {
    /// Set up the builder and lay down the initial per-block 4-cycles.
    ///
    /// Dimensions must be even and non-zero; the dispatcher validates.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        debug!("grid dimensions: {rows} {cols}");
        Self {
            rows,
            cols,
            node_rows: rows / 2,
            node_cols: cols / 2,
            graph: PixelGraph::with_block_cycles(rows, cols),
        }
    }

    /// Run the construction against a cost oracle.
    ///
    /// Returns the ordered pixel path together with the structural audit.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvariantViolation`] if the rewired graph is
    /// not a single 2-regular cycle, or if the cycle walk does not cover
    /// every pixel. Either indicates a bug, not bad input.
    pub fn run<C: EdgeCost>(mut self, cost: &C) -> Result<(CurvePath, GraphAudit), CurveError> {
        let nodes = self.node_rows * self.node_cols;
        let mut parent: Vec<Option<NodeId>> = vec![None; nodes];
        let mut min_cost = vec![f64::INFINITY; nodes];
        let mut selected = vec![false; nodes];
        let mut selected_count = 0usize;

        let mut heap = BinaryHeap::new();
        min_cost[0] = 0.0;
        heap.push(QueueEntry {
            cost: 0.0,
            node: NodeId::new(0, 0),
        });

        while let Some(QueueEntry { node, .. }) = heap.pop() {
            let node_index = node.index(self.node_cols);
            if selected[node_index] {
                continue;
            }
            selected[node_index] = true;
            selected_count += 1;

            if let Some(par) = parent[node_index] {
                let rewrite = MergeRewrite::for_merge(par, node);
                for (u, v) in rewrite.removed() {
                    self.graph.remove_edge(u, v);
                }
                for (u, v) in rewrite.added {
                    self.graph.add_edge(u, v);
                }
            }

            for (di, dj) in lattice::NEIGHBOR_OFFSETS {
                let ni = node.i as i64 + di;
                let nj = node.j as i64 + dj;
                if ni < 0 || nj < 0 || ni >= self.node_rows as i64 || nj >= self.node_cols as i64 {
                    continue;
                }
                let neighbor = NodeId::new(ni as usize, nj as usize);
                let neighbor_index = neighbor.index(self.node_cols);
                if selected[neighbor_index] {
                    continue;
                }
                let c = cost.cost(node, neighbor);
                if c < min_cost[neighbor_index] {
                    min_cost[neighbor_index] = c;
                    parent[neighbor_index] = Some(node);
                    heap.push(QueueEntry {
                        cost: c,
                        node: neighbor,
                    });
                }
            }
        }

        let audit = self.graph.audit(selected_count);
        debug!("{audit}");
        if !audit.is_single_cycle() {
            return Err(CurveError::InvariantViolation(format!(
                "rewired graph is not a single cycle ({audit})"
            )));
        }

        let path = self.extract_path();
        if path.len() != self.rows * self.cols {
            return Err(CurveError::InvariantViolation(format!(
                "cycle walk visited {} of {} pixels",
                path.len(),
                self.rows * self.cols
            )));
        }
        Ok((path, audit))
    }

    /// Walk the finished cycle from pixel (0, 0), always stepping to the
    /// first unvisited neighbor, until the walk closes on itself.
    fn extract_path(&self) -> CurvePath {
        let mut visited = vec![false; self.rows * self.cols];
        let mut order = Vec::with_capacity(self.rows * self.cols);
        let mut cur = Coord::new(0, 0);
        loop {
            visited[cur.index(self.cols)] = true;
            order.push(cur);
            let next = self
                .graph
                .neighbors(cur)
                .find(|n| !visited[n.index(self.cols)]);
            match next {
                Some(n) => cur = n,
                None => break,
            }
        }
        CurvePath::new(order)
    }
}
