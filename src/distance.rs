//! Distance metrics and lane-parallel kernels for vector similarity.
//!
//! The scalar implementation is the specification: the unrolled fast path
//! must agree with it to within IEEE-754 associativity error. Mismatched
//! input lengths never fail here — callers are expected to validate
//! dimensions against an index's configured `D` before calling in; a
//! mismatch instead returns the documented neutral value.

use serde::{Deserialize, Serialize};

/// Distance metric used by an index to rank candidates.
///
/// For every metric, smaller [`DistanceMetric::distance`] means "more similar" —
/// cosine and dot similarity are negated/complemented so callers never have
/// to branch on metric direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `1 - clamp(cosine_similarity, -1, 1)`.
    Cosine,
    /// `sqrt(sum((a_i - b_i)^2))`.
    Euclidean,
    /// `-dot(a, b)`, so smaller is nearer for maximum inner product search.
    Dot,
}

impl DistanceMetric {
    /// Computes the metric-specific distance between two equal-length vectors.
    ///
    /// Mismatched lengths are a caller bug; this still returns a sane value
    /// (the metric's own neutral value) rather than panicking, per the
    /// kernel contract.
    #[must_use]
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Self::Cosine => cosine_distance(a, b),
            Self::Euclidean => euclidean_distance(a, b),
            Self::Dot => -dot(a, b),
        }
    }
}

/// Dot product of two vectors. Mismatched lengths return `0.0`.
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    dot_lanes(a, b)
}

/// Cosine similarity in `[-1, 1]`. Mismatched lengths return `0.0`.
///
/// Zero-norm inputs (either side) return `0.0` rather than propagating NaN.
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (dot, norm_a, norm_b) = dot_and_norms_lanes(a, b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Cosine distance `1 - clamp(cosine_similarity, -1, 1)`.
///
/// Both-zero-norm inputs yield distance `1.0` (maximally dissimilar), matching
/// the convention that a zero vector carries no directional information.
#[must_use]
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    let (dot, norm_a, norm_b) = dot_and_norms_lanes(a, b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Euclidean (L2) distance. Mismatched lengths return `+inf`.
#[must_use]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    squared_l2_lanes(a, b).sqrt()
}

/// L2-normalizes a vector in place semantics (returns a new `Vec`).
///
/// A zero vector is returned unchanged rather than producing NaN.
#[must_use]
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let norm = dot_lanes(v, v).sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Elementwise `a + b`, truncated to the shorter input's length.
#[must_use]
pub fn elementwise_add(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
}

/// Elementwise `a - b`, truncated to the shorter input's length.
#[must_use]
pub fn elementwise_sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(x, y)| x - y).collect()
}

/// Euclidean norm (`‖v‖`) of a vector.
#[must_use]
pub fn magnitude(v: &[f64]) -> f64 {
    dot_lanes(v, v).sqrt()
}

// ---------------------------------------------------------------------------
// Lane-parallel fast path, via the `wide` crate's portable `f64x4` (the same
// vectorization crate the native HNSW distance engine reaches for, there at
// `f32x8`/`4x f32x8`). Four lanes are accumulated per loop iteration using
// FMA where the target supports it, then reduced and the tail (length % 4)
// handled scalar. The lane count is an implementation choice; nothing public
// depends on it besides the 1e-6 relative-error agreement bar.
// ---------------------------------------------------------------------------

use wide::f64x4;

#[inline]
fn dot_lanes(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    let chunks = len / 4;
    let mut sum = f64x4::ZERO;
    for i in 0..chunks {
        let base = i * 4;
        let va = f64x4::from(&a[base..base + 4]);
        let vb = f64x4::from(&b[base..base + 4]);
        sum = va.mul_add(vb, sum);
    }
    let mut total = sum.reduce_add();
    for i in (chunks * 4)..len {
        total += a[i] * b[i];
    }
    total
}

#[inline]
fn squared_l2_lanes(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    let chunks = len / 4;
    let mut sum = f64x4::ZERO;
    for i in 0..chunks {
        let base = i * 4;
        let diff = f64x4::from(&a[base..base + 4]) - f64x4::from(&b[base..base + 4]);
        sum = diff.mul_add(diff, sum);
    }
    let mut total = sum.reduce_add();
    for i in (chunks * 4)..len {
        let d = a[i] - b[i];
        total += d * d;
    }
    total
}

#[inline]
fn dot_and_norms_lanes(a: &[f64], b: &[f64]) -> (f64, f64, f64) {
    let len = a.len().min(b.len());
    let chunks = len / 4;
    let mut dot_sum = f64x4::ZERO;
    let mut a_sum = f64x4::ZERO;
    let mut b_sum = f64x4::ZERO;
    for i in 0..chunks {
        let base = i * 4;
        let va = f64x4::from(&a[base..base + 4]);
        let vb = f64x4::from(&b[base..base + 4]);
        dot_sum = va.mul_add(vb, dot_sum);
        a_sum = va.mul_add(va, a_sum);
        b_sum = vb.mul_add(vb, b_sum);
    }
    let mut dot = dot_sum.reduce_add();
    let mut norm_a = a_sum.reduce_add();
    let mut norm_b = b_sum.reduce_add();
    for i in (chunks * 4)..len {
        let x = a[i];
        let y = b[i];
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    (dot, norm_a.sqrt(), norm_b.sqrt())
}

/// Scalar reference implementations, kept separate from the lane-parallel
/// fast path so kernel-agreement tests exercise two independent code paths.
#[cfg(test)]
pub(crate) mod scalar {
    #[must_use]
    pub fn dot(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    #[must_use]
    pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
        let d = dot(a, b);
        let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (d / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    #[must_use]
    pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}
