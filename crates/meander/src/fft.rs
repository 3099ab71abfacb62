//! Radix-2 FFT and circular cross-correlation.
//!
//! The L2 alignment strategy scores every cyclic shift of a frame at once by
//! correlating the doubled current signal against the previous one. The
//! transform here is a standard iterative in-place Cooley-Tukey with a
//! bit-reversal permutation and roots of unity computed per stage; real
//! convolution packs both inputs into a single complex transform.
//!
//! Everything runs in `f64`. Input sizes are bounded by twice the pixel
//! count of a frame, for which double precision is well conditioned.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

/// A complex number, just enough surface for the transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Complex {
    /// The additive identity.
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    /// Create a complex number from parts.
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Unit-magnitude complex number at `angle` radians.
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        Self {
            re: angle.cos(),
            im: angle.sin(),
        }
    }

    /// Complex conjugate.
    #[must_use]
    pub const fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// In-place iterative radix-2 transform.
///
/// # Panics
///
/// Debug-asserts that the length is a power of two.
pub fn fft(a: &mut [Complex]) {
    let n = a.len();
    debug_assert!(n.is_power_of_two(), "transform size {n} is not a power of two");
    if n <= 1 {
        return;
    }
    let log_n = n.trailing_zeros() as usize;

    // Roots of unity, stage-indexed: rt[k + j] = e^(i*pi*j/k).
    let mut roots = vec![Complex::new(1.0, 0.0); n];
    let mut k = 2;
    while k < n {
        for j in 0..k {
            roots[k + j] = Complex::from_angle(PI * j as f64 / k as f64);
        }
        k *= 2;
    }

    // Bit-reversal permutation.
    let mut rev = vec![0usize; n];
    for i in 0..n {
        rev[i] = (rev[i / 2] | ((i & 1) << log_n)) / 2;
        if i < rev[i] {
            a.swap(i, rev[i]);
        }
    }

    // Butterflies.
    let mut k = 1;
    while k < n {
        let mut i = 0;
        while i < n {
            for j in 0..k {
                let z = roots[j + k] * a[i + j + k];
                a[i + j + k] = a[i + j] - z;
                a[i + j] = a[i + j] + z;
            }
            i += 2 * k;
        }
        k *= 2;
    }
}

/// Linear convolution of two real sequences.
///
/// Packs `a + i*b` into one forward transform of the next power-of-two
/// size, squares it, and unpacks the product from the imaginary part of a
/// second forward transform: `out[k] = y[-k mod n] - conj(y[k])`, result
/// `Im(out)/(4n)`.
#[must_use]
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let out_len = a.len() + b.len() - 1;
    let n = out_len.next_power_of_two();

    let mut packed = vec![Complex::ZERO; n];
    for (slot, &x) in packed.iter_mut().zip(a) {
        slot.re = x;
    }
    for (slot, &x) in packed.iter_mut().zip(b) {
        slot.im = x;
    }
    fft(&mut packed);
    for x in &mut packed {
        *x = *x * *x;
    }

    let mut out = vec![Complex::ZERO; n];
    for i in 0..n {
        out[i] = packed[n.wrapping_sub(i) & (n - 1)] - packed[i].conj();
    }
    fft(&mut out);

    let scale = 4.0 * n as f64;
    out.iter().take(out_len).map(|x| x.im / scale).collect()
}

/// Valid-mode cross-correlation: `out[r] = sum_j a[r + j] * b[j]` for
/// `r` in `0..=len(a) - len(b)`.
///
/// Computed as the convolution of `a` with reversed `b`, restricted to the
/// fully-overlapping indices. Requires non-empty inputs with
/// `len(a) >= len(b)`; shorter `a` yields an empty result.
#[must_use]
pub fn correlate_valid(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() || a.len() < b.len() {
        debug_assert!(
            !a.is_empty() && !b.is_empty() && a.len() >= b.len(),
            "correlate_valid needs non-empty inputs with len(a) >= len(b)"
        );
        return Vec::new();
    }
    let reversed: Vec<f64> = b.iter().rev().copied().collect();
    let full = convolve(a, &reversed);
    full[b.len() - 1..a.len()].to_vec()
}
