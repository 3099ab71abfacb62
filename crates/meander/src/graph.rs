//! The mutable pixel graph the spanning-tree construction rewires.
//!
//! Vertices are pixels, addressed by coordinate into a flat array; edges are
//! stored as per-vertex neighbor slots. Degree never exceeds 4 at any point
//! of the algorithm (4 during construction, settling at 2), so each vertex
//! carries a fixed 4-slot array with `None` sentinels instead of an ordered
//! set. Slot order is insertion order, which keeps the cycle walk
//! deterministic.

use petgraph::unionfind::UnionFind;

use crate::diagnostics::GraphAudit;
use crate::lattice::{self, NodeId};
use crate::types::{Coord, Dimensions};

/// Undirected pixel graph with per-vertex neighbor slots.
#[derive(Debug, Clone)]
pub struct PixelGraph {
    rows: usize,
    cols: usize,
    slots: Vec<[Option<Coord>; 4]>,
}

impl PixelGraph {
    /// Build the starting graph for an `rows x cols` pixel grid: one
    /// disjoint 4-cycle per super-node.
    ///
    /// Both dimensions must be even; the caller validates.
    #[must_use]
    pub fn with_block_cycles(rows: usize, cols: usize) -> Self {
        debug_assert!(rows % 2 == 0 && cols % 2 == 0, "dimensions must be even");
        let mut graph = Self {
            rows,
            cols,
            slots: vec![[None; 4]; rows * cols],
        };
        for i in 0..rows / 2 {
            for j in 0..cols / 2 {
                for (u, v) in lattice::cycle_edges(NodeId::new(i, j)) {
                    graph.add_edge(u, v);
                }
            }
        }
        graph
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Insert the undirected edge `(a, b)`.
    ///
    /// # Panics
    ///
    /// Debug-asserts a free slot on both endpoints; degree cannot exceed 4.
    pub fn add_edge(&mut self, a: Coord, b: Coord) {
        self.attach(a, b);
        self.attach(b, a);
    }

    /// Remove the undirected edge `(a, b)`. Missing edges are ignored,
    /// matching the idempotence of set erasure.
    pub fn remove_edge(&mut self, a: Coord, b: Coord) {
        self.detach(a, b);
        self.detach(b, a);
    }

    /// Iterate the current neighbors of `p` in slot order.
    pub fn neighbors(&self, p: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.slots[p.index(self.cols)].iter().filter_map(|slot| *slot)
    }

    /// Current degree of `p`.
    #[must_use]
    pub fn degree(&self, p: Coord) -> usize {
        self.slots[p.index(self.cols)]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    fn attach(&mut self, at: Coord, neighbor: Coord) {
        let slots = &mut self.slots[at.index(self.cols)];
        for slot in slots.iter_mut() {
            if slot.is_none() {
                *slot = Some(neighbor);
                return;
            }
        }
        debug_assert!(false, "pixel {at} already has degree 4");
    }

    fn detach(&mut self, at: Coord, neighbor: Coord) {
        let slots = &mut self.slots[at.index(self.cols)];
        for slot in slots.iter_mut() {
            if *slot == Some(neighbor) {
                *slot = None;
                return;
            }
        }
    }

    /// Number of connected components, via union-find over all edges.
    #[must_use]
    pub fn component_count(&self) -> usize {
        let n = self.rows * self.cols;
        let mut union_find = UnionFind::<usize>::new(n);
        let mut components = n;
        for r in 0..self.rows {
            for c in 0..self.cols {
                let p = Coord::new(r, c);
                for q in self.neighbors(p) {
                    if union_find.union(p.index(self.cols), q.index(self.cols)) {
                        components -= 1;
                    }
                }
            }
        }
        components
    }

    /// Audit the graph against the single-cycle post-condition: every
    /// vertex of degree exactly 2 and one connected component.
    #[must_use]
    pub fn audit(&self, selected_nodes: usize) -> GraphAudit {
        let mut degree_min = usize::MAX;
        let mut degree_max = 0;
        for r in 0..self.rows {
            for c in 0..self.cols {
                let d = self.degree(Coord::new(r, c));
                degree_min = degree_min.min(d);
                degree_max = degree_max.max(d);
            }
        }
        GraphAudit {
            dimensions: self.dimensions(),
            selected_nodes,
            degree_min,
            degree_max,
            components: self.component_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_cycles_are_two_regular_and_disjoint() {
        let graph = PixelGraph::with_block_cycles(4, 6);
        for r in 0..4 {
            for c in 0..6 {
                assert_eq!(
                    graph.degree(Coord::new(r, c)),
                    2,
                    "pixel ({r}, {c}) should sit on exactly one 4-cycle"
                );
            }
        }
        // One component per super-node.
        assert_eq!(graph.component_count(), 6);
    }

    #[test]
    fn neighbors_follow_insertion_order() {
        let graph = PixelGraph::with_block_cycles(2, 2);
        // The 4-cycle is laid down corner by corner, so (0,0) saw the edge
        // to (1,0) before the closing edge from (0,1).
        let neighbors: Vec<Coord> = graph.neighbors(Coord::new(0, 0)).collect();
        assert_eq!(neighbors, vec![Coord::new(1, 0), Coord::new(0, 1)]);
    }

    #[test]
    fn remove_then_add_reuses_the_slot() {
        let mut graph = PixelGraph::with_block_cycles(2, 2);
        let a = Coord::new(0, 0);
        let b = Coord::new(1, 0);
        graph.remove_edge(a, b);
        assert_eq!(graph.degree(a), 1);
        assert_eq!(graph.degree(b), 1);
        graph.add_edge(a, b);
        assert_eq!(graph.degree(a), 2);
        let neighbors: Vec<Coord> = graph.neighbors(a).collect();
        assert_eq!(neighbors, vec![b, Coord::new(0, 1)]);
    }

    #[test]
    fn removing_a_missing_edge_is_a_no_op() {
        let mut graph = PixelGraph::with_block_cycles(2, 2);
        graph.remove_edge(Coord::new(0, 0), Coord::new(1, 1));
        assert_eq!(graph.degree(Coord::new(0, 0)), 2);
        assert_eq!(graph.degree(Coord::new(1, 1)), 2);
    }

    #[test]
    fn audit_flags_disconnected_cycles() {
        let graph = PixelGraph::with_block_cycles(2, 4);
        let audit = graph.audit(2);
        assert_eq!(audit.degree_min, 2);
        assert_eq!(audit.degree_max, 2);
        assert_eq!(audit.components, 2);
        assert!(!audit.is_single_cycle());
    }

    #[test]
    fn audit_accepts_a_single_cycle() {
        let mut graph = PixelGraph::with_block_cycles(2, 4);
        // Merge the two blocks by hand: drop the facing column edges, add
        // the crossings.
        graph.remove_edge(Coord::new(0, 2), Coord::new(1, 2));
        graph.remove_edge(Coord::new(1, 1), Coord::new(0, 1));
        graph.add_edge(Coord::new(1, 1), Coord::new(1, 2));
        graph.add_edge(Coord::new(0, 1), Coord::new(0, 2));
        let audit = graph.audit(2);
        assert_eq!((audit.degree_min, audit.degree_max), (2, 2));
        assert_eq!(audit.components, 1);
        assert!(audit.is_single_cycle());
    }
}
