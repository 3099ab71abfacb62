//! Edge costs for the spanning-tree construction.
//!
//! The builder asks an [`EdgeCost`] for the price of absorbing a candidate
//! super-node into the tree next to an already-selected neighbor. The
//! data-driven cost is the exact change in "sum of pixel differences along
//! the merged cycle" caused by the absorption, blended with a geometric pull
//! toward block centers.

use crate::frame::{Channel, Frame};
use crate::lattice::{self, MergeRewrite, NodeId, PixelEdge};

/// Cost oracle consumed by the curve builder.
///
/// `a` is a super-node already in the spanning tree, `b` a lattice-adjacent
/// candidate. Lower costs are absorbed first. Implementations must be pure:
/// the builder may evaluate the same pair more than once.
pub trait EdgeCost {
    /// Cost of absorbing `b` into the tree alongside `a`.
    fn cost(&self, a: NodeId, b: NodeId) -> f64;
}

/// Pixel-difference cost with a block-centering regularizer.
///
/// `cost(a, b) = (1 - alpha) * adjacency_delta(a, b) + alpha * block_pull(b)`
///
/// `adjacency_delta` sums the pixel differences along the cycle edges the
/// merge keeps and adds, minus the face it removes from the tree side; the
/// subtraction makes partial sums negative even though the final delta is
/// not. `block_pull` is the distance from `b`'s position within its block to
/// the block center, breaking ties and encouraging locality when
/// `alpha > 0`.
#[derive(Debug)]
pub struct DataDrivenCost<'a, T> {
    frame: &'a Frame<T>,
    alpha: f64,
    block: usize,
    block_center: f64,
}

impl<'a, T: Channel> DataDrivenCost<'a, T> {
    /// Build a cost oracle over a borrowed frame.
    ///
    /// `alpha` and `block` are assumed validated (`alpha` in `[0, 1]`,
    /// `block >= 1`); see `CurveConfig::validate`.
    #[must_use]
    pub fn new(frame: &'a Frame<T>, alpha: f64, block: u32) -> Self {
        let block = block as usize;
        Self {
            frame,
            alpha,
            block,
            block_center: (block as f64 - 1.0) / 2.0,
        }
    }

    /// L1 difference over channels between two pixels.
    fn pixel_diff(&self, edge: PixelEdge) -> f64 {
        let (u, v) = edge;
        let pu = self.frame.pixel(u.r, u.c);
        let pv = self.frame.pixel(v.r, v.c);
        pu.iter()
            .zip(pv)
            .map(|(&x, &y)| (x.to_f64() - y.to_f64()).abs())
            .sum()
    }

    /// Exact change in cycle cost induced by absorbing `b` next to `a`:
    /// the kept edges of `b`'s cycle, minus the face removed from `a`'s
    /// side, plus the two crossing edges.
    fn adjacency_delta(&self, a: NodeId, b: NodeId) -> f64 {
        let rewrite = MergeRewrite::for_merge(a, b);
        let mut delta = 0.0;
        for edge in lattice::cycle_edges(b) {
            if edge != rewrite.removed_from_b {
                delta += self.pixel_diff(edge);
            }
        }
        delta -= self.pixel_diff(rewrite.removed_from_a);
        for edge in rewrite.added {
            delta += self.pixel_diff(edge);
        }
        delta
    }

    /// Distance from `b`'s position within its block to the block center.
    fn block_pull(&self, b: NodeId) -> f64 {
        let di = (b.i % self.block) as f64 - self.block_center;
        let dj = (b.j % self.block) as f64 - self.block_center;
        di.hypot(dj)
    }
}

impl<T: Channel> EdgeCost for DataDrivenCost<'_, T> {
    fn cost(&self, a: NodeId, b: NodeId) -> f64 {
        (1.0 - self.alpha) * self.adjacency_delta(a, b) + self.alpha * self.block_pull(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    /// 2x4 single-channel frame covering super-nodes (0,0) and (0,1):
    ///
    /// ```text
    ///  0  1 | 10 11
    ///  2  3 | 12 13
    /// ```
    fn two_node_frame() -> Frame<f64> {
        Frame::from_raw(
            2,
            4,
            1,
            vec![0.0, 1.0, 10.0, 11.0, 2.0, 3.0, 12.0, 13.0],
        )
        .unwrap()
    }

    #[test]
    fn pixel_diff_sums_over_channels() {
        let frame = Frame::from_raw(2, 2, 2, vec![0u8, 10, 5, 5, 9, 1, 7, 7]).unwrap();
        let cost = DataDrivenCost::new(&frame, 0.0, 1);
        // (0,0)=[0,10] vs (1,0)=[9,1]: |0-9| + |10-1| = 18.
        let diff = cost.pixel_diff((crate::types::Coord::new(0, 0), crate::types::Coord::new(1, 0)));
        assert!((diff - 18.0).abs() < EPS);
    }

    #[test]
    fn adjacency_delta_matches_hand_computation() {
        let frame = two_node_frame();
        let cost = DataDrivenCost::new(&frame, 0.0, 1);
        let a = NodeId::new(0, 0);
        let b = NodeId::new(0, 1);

        // b's cycle: (0,2)-(1,2)=2 [removed face], (1,2)-(1,3)=1,
        // (1,3)-(0,3)=2, (0,3)-(0,2)=1; kept sum = 4.
        // a's removed face (1,1)-(0,1): |3-1| = 2.
        // added: (1,1)-(1,2): |3-12| = 9, (0,1)-(0,2): |1-10| = 9.
        // delta = 4 - 2 + 9 + 9 = 20.
        assert!((cost.adjacency_delta(a, b) - 20.0).abs() < EPS);
        assert!((cost.cost(a, b) - 20.0).abs() < EPS, "alpha=0 is delta only");
    }

    #[test]
    fn leftward_merge_delta_matches_hand_computation() {
        // Step image: column 0 is dark, everything else bright.
        let frame = Frame::from_raw(
            2,
            4,
            1,
            vec![0.0, 100.0, 100.0, 100.0, 0.0, 100.0, 100.0, 100.0],
        )
        .unwrap();
        let cost = DataDrivenCost::new(&frame, 0.0, 1);
        // a = (0,1), b = (0,0): b's removed face (1,1)-(0,1) costs 0; its
        // kept edges cost 0 + 100 + 100. a's removed face (0,2)-(1,2) costs
        // 0, both added edges cost 0. delta = 200.
        let delta = cost.adjacency_delta(NodeId::new(0, 1), NodeId::new(0, 0));
        assert!((delta - 200.0).abs() < EPS);
    }

    #[test]
    fn removed_tree_face_offsets_added_edges() {
        // The face removed from the tree side is subtracted: here it costs
        // exactly as much as the added crossings, so the delta collapses to
        // the candidate's own kept edges (zero).
        let frame = Frame::from_raw(
            2,
            4,
            1,
            vec![0.0, 0.0, 0.0, 100.0, 0.0, 0.0, 100.0, 0.0],
        )
        .unwrap();
        let cost = DataDrivenCost::new(&frame, 0.0, 1);
        // a = (0,1), b = (0,0): removed a-face (0,2)-(1,2) = 100, kept b
        // edges all 0, added (0,2)-(0,1) = 0 and (1,2)-(1,1) = 100.
        let delta = cost.adjacency_delta(NodeId::new(0, 1), NodeId::new(0, 0));
        assert!(delta.abs() < EPS);
    }

    #[test]
    fn block_pull_measures_distance_to_block_center() {
        let frame = two_node_frame();
        let cost = DataDrivenCost::new(&frame, 1.0, 4);
        // block=4: center at (1.5, 1.5). Node (0,0) -> sqrt(1.5^2 + 1.5^2).
        let expected = (2.0f64 * 1.5 * 1.5).sqrt();
        assert!((cost.cost(NodeId::new(0, 0), NodeId::new(0, 1)) - 1.5_f64.hypot(0.5)).abs() < EPS);
        assert!((cost.block_pull(NodeId::new(0, 0)) - expected).abs() < EPS);
        // Center-adjacent nodes pull less than corner nodes.
        assert!(cost.block_pull(NodeId::new(1, 1)) < cost.block_pull(NodeId::new(0, 0)));
        // Positions repeat per block.
        assert!(
            (cost.block_pull(NodeId::new(5, 6)) - cost.block_pull(NodeId::new(1, 2))).abs() < EPS
        );
    }

    #[test]
    fn alpha_blends_delta_and_pull() {
        let frame = two_node_frame();
        let a = NodeId::new(0, 0);
        let b = NodeId::new(0, 1);
        let data_only = DataDrivenCost::new(&frame, 0.0, 4).cost(a, b);
        let pull_only = DataDrivenCost::new(&frame, 1.0, 4).cost(a, b);
        let blended = DataDrivenCost::new(&frame, 0.25, 4).cost(a, b);
        assert!((blended - (0.75 * data_only + 0.25 * pull_only)).abs() < EPS);
    }
}
