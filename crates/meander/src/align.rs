//! Frame-to-frame curve alignment.
//!
//! Per-frame curves are each valid Hamiltonian cycles, but nothing ties
//! their starting points or directions together across a sequence. The
//! aligner rotates (and possibly reverses) every frame's path so its
//! pixel-value sequence best matches the preceding, already-aligned frame.
//!
//! Two scoring strategies:
//!
//! - **L1**: brute-force every rotation, summing per-position L1 pixel
//!   differences; lower is better. O(N^2 * channels).
//! - **L2**: maximize circular cross-correlation. Doubling the current
//!   signal turns every cyclic shift into one window of a valid-mode linear
//!   correlation, so a single FFT pass per channel scores all N shifts.
//!
//! Tie-breaks: the first minimum (resp. maximum) wins, so the smallest
//! shift is preferred, and a reversed orientation is applied only when it
//! is strictly better than the forward one.

use crate::fft;
use crate::frame::{Channel, Frame};
use crate::types::{AlignStrategy, CurvePath};

/// A frame's pixel values in path order, widened to `f64` and flattened
/// with a channel stride.
#[derive(Debug, Clone, PartialEq)]
pub struct Linearized {
    channels: usize,
    values: Vec<f64>,
}

impl Linearized {
    /// Number of path positions.
    #[must_use]
    pub fn positions(&self) -> usize {
        self.values.len() / self.channels
    }

    /// The channel values at path position `k`.
    #[must_use]
    fn sample(&self, k: usize) -> &[f64] {
        &self.values[k * self.channels..(k + 1) * self.channels]
    }

    /// One channel as a contiguous sequence.
    fn channel(&self, ch: usize) -> Vec<f64> {
        self.values
            .iter()
            .skip(ch)
            .step_by(self.channels)
            .copied()
            .collect()
    }

    /// A copy with the position order reversed (channel order untouched).
    #[must_use]
    fn reversed(&self) -> Self {
        let mut values = Vec::with_capacity(self.values.len());
        for sample in self.values.chunks_exact(self.channels).rev() {
            values.extend_from_slice(sample);
        }
        Self {
            channels: self.channels,
            values,
        }
    }

    /// Rotate positions left by `shift`, matching `CurvePath::rotate_left`.
    fn rotate_left(&mut self, shift: usize) {
        self.values.rotate_left(shift * self.channels);
    }
}

/// Read a frame's pixels in path order.
#[must_use]
pub fn linearize<T: Channel>(frame: &Frame<T>, path: &CurvePath) -> Linearized {
    let channels = frame.channels();
    let mut values = Vec::with_capacity(path.len() * channels);
    for p in path.coords() {
        values.extend(frame.pixel(p.r, p.c).iter().map(|x| x.to_f64()));
    }
    Linearized { channels, values }
}

/// Outcome of scoring every rotation of one orientation.
#[derive(Debug, Clone, Copy)]
struct Rotation {
    score: f64,
    shift: usize,
    /// Whether larger scores win (correlation) or smaller (L1).
    maximize: bool,
}

impl Rotation {
    /// Strict comparison; equal scores are not "better".
    fn better_than(&self, other: &Self) -> bool {
        if self.maximize {
            self.score > other.score
        } else {
            self.score < other.score
        }
    }
}

/// L1 difference between two equal-length samples.
fn sample_diff(u: &[f64], v: &[f64]) -> f64 {
    u.iter().zip(v).map(|(x, y)| (x - y).abs()).sum()
}

/// Score every rotation by summed per-position L1 difference.
fn l1_rotation(cur: &Linearized, prev: &Linearized) -> Rotation {
    let n = cur.positions();
    let mut best_score = f64::INFINITY;
    let mut best_shift = 0;
    for shift in 0..n {
        let mut score = 0.0;
        for k in 0..n {
            score += sample_diff(cur.sample((k + shift) % n), prev.sample(k));
        }
        if score < best_score {
            best_score = score;
            best_shift = shift;
        }
    }
    Rotation {
        score: best_score,
        shift: best_shift,
        maximize: false,
    }
}

/// Score every rotation by circular cross-correlation, summed over
/// channels, via the doubled-signal trick.
fn l2_rotation(cur: &Linearized, prev: &Linearized) -> Rotation {
    let n = cur.positions();
    let mut total = vec![0.0; n];
    for ch in 0..cur.channels {
        let mut doubled = cur.channel(ch);
        doubled.extend_from_within(..);
        let correlation = fft::correlate_valid(&doubled, &prev.channel(ch));
        for (acc, value) in total.iter_mut().zip(&correlation) {
            *acc += value;
        }
    }
    let mut best_score = total[0];
    let mut best_shift = 0;
    for (shift, &score) in total.iter().enumerate().skip(1) {
        if score > best_score {
            best_score = score;
            best_shift = shift;
        }
    }
    Rotation {
        score: best_score,
        shift: best_shift,
        maximize: true,
    }
}

/// Align every frame's path to its predecessor, in place.
///
/// Frame 0 is left untouched; each later frame is scored forward and
/// reversed, the better orientation's best rotation is applied to its path,
/// and the aligned result becomes the reference for the next frame.
///
/// `frames` and `paths` must correspond index-wise; with
/// [`AlignStrategy::None`] or fewer than two frames this is a no-op.
pub fn align_frames<T: Channel>(
    frames: &[Frame<T>],
    paths: &mut [CurvePath],
    strategy: AlignStrategy,
) {
    debug_assert_eq!(frames.len(), paths.len(), "one path per frame");
    let scorer: fn(&Linearized, &Linearized) -> Rotation = match strategy {
        AlignStrategy::None => return,
        AlignStrategy::L1Norm => l1_rotation,
        AlignStrategy::L2Norm => l2_rotation,
    };
    if paths.len() < 2 {
        return;
    }

    let mut prev = linearize(&frames[0], &paths[0]);
    for (frame, path) in frames.iter().zip(paths.iter_mut()).skip(1) {
        let mut cur = linearize(frame, path);
        let forward = scorer(&cur, &prev);
        let flipped = cur.reversed();
        let backward = scorer(&flipped, &prev);

        if backward.better_than(&forward) {
            path.reverse();
            path.rotate_left(backward.shift);
            cur = flipped;
            cur.rotate_left(backward.shift);
        } else {
            path.rotate_left(forward.shift);
            cur.rotate_left(forward.shift);
        }
        prev = cur;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coord;

    /// A hand-built closed Hamiltonian cycle on the 4x4 grid.
    fn boustrophedon_cycle() -> CurvePath {
        let coords = [
            (0, 0),
            (0, 1),
            (0, 2),
            (0, 3),
            (1, 3),
            (1, 2),
            (1, 1),
            (2, 1),
            (2, 2),
            (2, 3),
            (3, 3),
            (3, 2),
            (3, 1),
            (3, 0),
            (2, 0),
            (1, 0),
        ];
        CurvePath::new(coords.iter().map(|&(r, c)| Coord::new(r, c)).collect())
    }

    /// Single-channel frame whose value at a pixel is its position along
    /// the reference cycle. Distinct, monotone values make every score
    /// landscape have a unique optimum.
    fn position_frame(path: &CurvePath) -> Frame<f64> {
        let mut data = vec![0.0; 16];
        for (k, p) in path.coords().iter().enumerate() {
            data[p.index(4)] = k as f64;
        }
        Frame::from_raw(4, 4, 1, data).unwrap()
    }

    fn rotated(path: &CurvePath, shift: usize) -> CurvePath {
        let mut p = path.clone();
        p.rotate_left(shift);
        p
    }

    #[test]
    fn linearize_reads_pixels_in_path_order() {
        let path = boustrophedon_cycle();
        let frame = position_frame(&path);
        let lin = linearize(&frame, &path);
        assert_eq!(lin.positions(), 16);
        let expected: Vec<f64> = (0..16).map(f64::from).collect();
        assert_eq!(lin.values, expected);
    }

    #[test]
    fn l1_alignment_undoes_a_known_rotation() {
        let reference = boustrophedon_cycle();
        let frame = position_frame(&reference);
        let frames = vec![frame.clone(), frame];
        let mut paths = vec![reference.clone(), rotated(&reference, 5)];

        align_frames(&frames, &mut paths, AlignStrategy::L1Norm);
        assert_eq!(paths[1], reference, "L1 must recover the rotation");
    }

    #[test]
    fn l2_alignment_undoes_a_known_rotation() {
        let reference = boustrophedon_cycle();
        let frame = position_frame(&reference);
        let frames = vec![frame.clone(), frame];
        let mut paths = vec![reference.clone(), rotated(&reference, 11)];

        align_frames(&frames, &mut paths, AlignStrategy::L2Norm);
        assert_eq!(paths[1], reference, "L2 must recover the rotation");
    }

    #[test]
    fn reversed_frames_are_detected_and_undone() {
        let reference = boustrophedon_cycle();
        let frame = position_frame(&reference);
        for strategy in [AlignStrategy::L1Norm, AlignStrategy::L2Norm] {
            let frames = vec![frame.clone(), frame.clone()];
            let mut reversed_path = reference.clone();
            reversed_path.reverse();
            let mut paths = vec![reference.clone(), reversed_path];

            align_frames(&frames, &mut paths, strategy);
            assert_eq!(
                paths[1], reference,
                "{strategy}: reversal must be detected and undone"
            );
        }
    }

    #[test]
    fn identical_frames_are_left_in_place() {
        let reference = boustrophedon_cycle();
        let frame = position_frame(&reference);
        for strategy in [AlignStrategy::L1Norm, AlignStrategy::L2Norm] {
            let frames = vec![frame.clone(), frame.clone()];
            let mut paths = vec![reference.clone(), reference.clone()];

            align_frames(&frames, &mut paths, strategy);
            assert_eq!(
                paths[1], reference,
                "{strategy}: an already-aligned frame must not move"
            );
        }
    }

    #[test]
    fn alignment_chains_through_the_sequence() {
        // Frame 2 aligns against the *aligned* frame 1, not its original.
        let reference = boustrophedon_cycle();
        let frame = position_frame(&reference);
        let frames = vec![frame.clone(), frame.clone(), frame];
        let mut paths = vec![
            reference.clone(),
            rotated(&reference, 3),
            rotated(&reference, 9),
        ];

        align_frames(&frames, &mut paths, AlignStrategy::L1Norm);
        assert_eq!(paths[1], reference);
        assert_eq!(paths[2], reference);
    }

    #[test]
    fn none_strategy_is_a_no_op() {
        let reference = boustrophedon_cycle();
        let frame = position_frame(&reference);
        let frames = vec![frame.clone(), frame];
        let shifted = rotated(&reference, 7);
        let mut paths = vec![reference, shifted.clone()];

        align_frames(&frames, &mut paths, AlignStrategy::None);
        assert_eq!(paths[1], shifted);
    }

    #[test]
    fn equal_scores_keep_the_forward_orientation() {
        let forward = Rotation {
            score: 10.0,
            shift: 0,
            maximize: false,
        };
        let backward = Rotation {
            score: 10.0,
            shift: 3,
            maximize: false,
        };
        assert!(!backward.better_than(&forward));

        let forward = Rotation {
            score: 10.0,
            shift: 0,
            maximize: true,
        };
        assert!(!Rotation { maximize: true, ..backward }.better_than(&forward));
    }
}
