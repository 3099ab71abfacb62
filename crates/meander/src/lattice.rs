//! Super-node cycle geometry.
//!
//! Every 2x2 block of pixels is a *super-node* carrying a 4-pixel cycle;
//! super-nodes form an (R/2) x (C/2) lattice. This module answers, as pure
//! functions of super-node ids, which pixel edges a super-node's cycle is
//! made of and which edges the merge surgery removes and adds when Prim
//! absorbs a node into the spanning tree.
//!
//! The merge rewrite is what keeps the pixel graph a disjoint union of
//! simple cycles: removing one facing edge from each side and adding the
//! two crossing edges fuses two cycles into one.

use crate::types::Coord;

/// A super-node id on the (R/2) x (C/2) lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Lattice row.
    pub i: usize,
    /// Lattice column.
    pub j: usize,
}

impl NodeId {
    /// Create a new lattice id.
    #[must_use]
    pub const fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }

    /// Flat row-major index into an array of `node_cols`-wide rows.
    #[must_use]
    pub const fn index(self, node_cols: usize) -> usize {
        self.i * node_cols + self.j
    }
}

/// An undirected pixel edge, stored in the direction its cycle traverses it.
pub type PixelEdge = (Coord, Coord);

/// Lattice steps, in the order both corner walks and Prim's neighbor scans
/// use them: down, right, up, left.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// The four pixel corners of a super-node, counterclockwise from the
/// top-left pixel: `(2i, 2j)`, `(2i+1, 2j)`, `(2i+1, 2j+1)`, `(2i, 2j+1)`.
#[must_use]
pub const fn corners(node: NodeId) -> [Coord; 4] {
    let r = node.i * 2;
    let c = node.j * 2;
    [
        Coord::new(r, c),
        Coord::new(r + 1, c),
        Coord::new(r + 1, c + 1),
        Coord::new(r, c + 1),
    ]
}

/// The four directed edges of a super-node's pixel cycle, corner `k` to
/// corner `(k + 1) mod 4`.
#[must_use]
pub const fn cycle_edges(node: NodeId) -> [PixelEdge; 4] {
    let p = corners(node);
    [(p[0], p[1]), (p[1], p[2]), (p[2], p[3]), (p[3], p[0])]
}

/// 2D cross product `u.0 * v.1 - u.1 * v.0`.
#[must_use]
pub const fn cross(u: (i64, i64), v: (i64, i64)) -> i64 {
    u.0 * v.1 - u.1 * v.0
}

/// The direction of a directed pixel edge as a lattice-step vector.
const fn edge_vector(edge: PixelEdge) -> (i64, i64) {
    (
        edge.1.r as i64 - edge.0.r as i64,
        edge.1.c as i64 - edge.0.c as i64,
    )
}

/// The graph surgery performed when Prim absorbs super-node `b` into a tree
/// already containing its lattice neighbor `a`.
///
/// Both removed edges and both added edges always exist: for a unit merge
/// direction `d`, exactly one edge of each 4-cycle has cross product `+1`
/// (resp. `-1`) with `d`, and exactly two corners of `a` have their
/// `d`-shifted counterpart among the corners of `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRewrite {
    /// The facing edge removed from `b`'s cycle (cross product with the
    /// merge direction is positive).
    pub removed_from_b: PixelEdge,
    /// The facing edge removed from `a`'s side of the merged cycle (cross
    /// product with the merge direction is exactly -1).
    pub removed_from_a: PixelEdge,
    /// The two crossing edges added between facing corners of `a` and `b`.
    pub added: [PixelEdge; 2],
}

impl MergeRewrite {
    /// Compute the surgery for merging lattice-adjacent super-nodes.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `a` and `b` are lattice-adjacent; the geometry is
    /// undefined otherwise.
    #[must_use]
    pub fn for_merge(a: NodeId, b: NodeId) -> Self {
        let d = (b.i as i64 - a.i as i64, b.j as i64 - a.j as i64);
        debug_assert!(
            d.0.abs() + d.1.abs() == 1,
            "super-nodes ({}, {}) and ({}, {}) are not lattice-adjacent",
            a.i,
            a.j,
            b.i,
            b.j
        );

        let mut removed_from_b = None;
        for edge in cycle_edges(b) {
            if cross(edge_vector(edge), d) > 0 {
                removed_from_b = Some(edge);
            }
        }

        let mut removed_from_a = None;
        for edge in cycle_edges(a) {
            if cross(edge_vector(edge), d) == -1 {
                removed_from_a = Some(edge);
            }
        }

        let corners_b = corners(b);
        let mut added = [None, None];
        for u in corners(a) {
            let v = Coord::new(
                u.r.wrapping_add_signed(d.0 as isize),
                u.c.wrapping_add_signed(d.1 as isize),
            );
            if corners_b.contains(&v) {
                if added[0].is_none() {
                    added[0] = Some((u, v));
                } else {
                    added[1] = Some((u, v));
                }
            }
        }

        // Unit-direction geometry guarantees all four edges exist.
        match (removed_from_b, removed_from_a, added) {
            (Some(rb), Some(ra), [Some(a0), Some(a1)]) => Self {
                removed_from_b: rb,
                removed_from_a: ra,
                added: [a0, a1],
            },
            _ => unreachable!("merge rewrite requires lattice-adjacent super-nodes"),
        }
    }

    /// Both removed edges: the `b`-side face first, then the `a`-side face.
    #[must_use]
    pub const fn removed(&self) -> [PixelEdge; 2] {
        [self.removed_from_b, self.removed_from_a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: (usize, usize), b: (usize, usize)) -> PixelEdge {
        (Coord::new(a.0, a.1), Coord::new(b.0, b.1))
    }

    #[test]
    fn corners_are_counterclockwise_from_top_left() {
        assert_eq!(
            corners(NodeId::new(0, 0)),
            [
                Coord::new(0, 0),
                Coord::new(1, 0),
                Coord::new(1, 1),
                Coord::new(0, 1),
            ]
        );
        assert_eq!(
            corners(NodeId::new(2, 1)),
            [
                Coord::new(4, 2),
                Coord::new(5, 2),
                Coord::new(5, 3),
                Coord::new(4, 3),
            ]
        );
    }

    #[test]
    fn cross_product_signs() {
        assert_eq!(cross((1, 0), (0, 1)), 1);
        assert_eq!(cross((0, 1), (1, 0)), -1);
        assert_eq!(cross((1, 0), (1, 0)), 0);
        assert_eq!(cross((0, 1), (0, -1)), 0);
    }

    #[test]
    fn horizontal_merge_removes_facing_edges() {
        // b sits to the right of a; the faces along the shared boundary
        // columns are removed and the two boundary crossings added.
        let rewrite = MergeRewrite::for_merge(NodeId::new(0, 0), NodeId::new(0, 1));
        assert_eq!(rewrite.removed_from_b, edge((0, 2), (1, 2)));
        assert_eq!(rewrite.removed_from_a, edge((1, 1), (0, 1)));
        assert_eq!(
            rewrite.added,
            [edge((1, 1), (1, 2)), edge((0, 1), (0, 2))]
        );
    }

    #[test]
    fn vertical_merge_removes_facing_edges() {
        let rewrite = MergeRewrite::for_merge(NodeId::new(0, 0), NodeId::new(1, 0));
        assert_eq!(rewrite.removed_from_b, edge((2, 1), (2, 0)));
        assert_eq!(rewrite.removed_from_a, edge((1, 0), (1, 1)));
        assert_eq!(
            rewrite.added,
            [edge((1, 0), (2, 0)), edge((1, 1), (2, 1))]
        );
    }

    #[test]
    fn leftward_merge_mirrors_rightward() {
        let rewrite = MergeRewrite::for_merge(NodeId::new(0, 1), NodeId::new(0, 0));
        assert_eq!(rewrite.removed_from_b, edge((1, 1), (0, 1)));
        assert_eq!(rewrite.removed_from_a, edge((0, 2), (1, 2)));
        assert_eq!(
            rewrite.added,
            [edge((0, 2), (0, 1)), edge((1, 2), (1, 1))]
        );
    }

    #[test]
    fn upward_merge_mirrors_downward() {
        let rewrite = MergeRewrite::for_merge(NodeId::new(1, 0), NodeId::new(0, 0));
        assert_eq!(rewrite.removed_from_b, edge((1, 0), (1, 1)));
        assert_eq!(rewrite.removed_from_a, edge((2, 1), (2, 0)));
        assert_eq!(
            rewrite.added,
            [edge((2, 0), (1, 0)), edge((2, 1), (1, 1))]
        );
    }

    #[test]
    fn merged_pair_forms_a_single_eight_cycle() {
        // Track degrees over the two initial 4-cycles plus the rewrite; the
        // result must be 2-regular over all eight pixels.
        let a = NodeId::new(0, 0);
        let b = NodeId::new(0, 1);
        let mut degree = std::collections::HashMap::new();
        let mut bump = |e: PixelEdge, delta: i32| {
            *degree.entry(e.0).or_insert(0) += delta;
            *degree.entry(e.1).or_insert(0) += delta;
        };
        for edge in cycle_edges(a).into_iter().chain(cycle_edges(b)) {
            bump(edge, 1);
        }
        let rewrite = MergeRewrite::for_merge(a, b);
        for edge in rewrite.removed() {
            bump(edge, -1);
        }
        for edge in rewrite.added {
            bump(edge, 1);
        }
        assert_eq!(degree.len(), 8, "expected eight distinct pixels");
        for (coord, d) in degree {
            assert_eq!(d, 2, "pixel {coord} has degree {d}, expected 2");
        }
    }
}
