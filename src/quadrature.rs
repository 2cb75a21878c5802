//! Gauss quadrature rules for the unit interval and the reference hexahedron.
//!
//! The reference cell used throughout this crate is the unit cube
//! $[0, 1]^3$. Rules are constructed from univariate Gauss-Legendre rules by
//! affine transformation and tensor products, so that an $n$-point rule per
//! axis integrates polynomials of per-axis degree up to $2n - 1$ exactly.

use std::f64::consts::PI;

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional quadrature rule: weights and points.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// Value and derivative of the Legendre polynomial $P_n$ at `x`.
///
/// Uses the three-term recurrence for the value and the standard derivative
/// identity, which is only valid in the open interval (-1, 1).
fn legendre_value_and_derivative(n: usize, x: f64) -> (f64, f64) {
    // m P_m(x) = (2m - 1) x P_{m-1}(x) - (m - 1) P_{m-2}(x)
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let p3 = p2;
        p2 = p1;
        p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
    }
    // dP_n/dx(x) = n (x P_n(x) - P_{n-1}(x)) / (x^2 - 1)
    let n = n as f64;
    let dp1 = n * (x * p1 - p2) / (x * x - 1.0);
    (p1, dp1)
}

/// Gauss-Legendre quadrature for the reference interval [-1, 1].
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    // Roots of P_n via Newton iteration from a cosine initial guess; only
    // the first half is computed, the rest follows by symmetry.
    let m = (n + 1) / 2;

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let (mut p, mut dp) = legendre_value_and_derivative(n, x);

        loop {
            let dx = -p / dp;
            x += dx;
            let (p_new, dp_new) = legendre_value_and_derivative(n, x);
            p = p_new;
            dp = dp_new;
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        // Standard weight formula once the root is known
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        points.push([x]);
        weights.push(w);
    }

    for i in m..n {
        let mirror = n - i - 1;
        points.push([-points[mirror][0]]);
        weights.push(weights[mirror]);
    }

    assert_eq!(points.len(), n);
    (weights, points)
}

/// Gauss-Legendre quadrature for the unit interval [0, 1].
///
/// The affine image of [`gauss`]: points are mapped by $x \mapsto (x + 1)/2$
/// and weights are halved, so the weights sum to the interval length 1.
pub fn unit_interval_gauss(num_points: usize) -> Rule<1> {
    let (weights, points) = gauss(num_points);
    let weights = weights.into_iter().map(|w| 0.5 * w).collect();
    let points = points.into_iter().map(|[x]| [0.5 * (x + 1.0)]).collect();
    (weights, points)
}

/// A tensor-product Gauss rule for the reference hexahedron [0, 1]^3.
///
/// The point and weight ordering is row-major in the axis indices: the point
/// with per-axis indices `(i, j, k)` sits at flat index
/// `(i * n + j) * n + k`.
pub fn hexahedron_gauss(points_per_axis: usize) -> Rule<3> {
    let n = points_per_axis;
    let (weights1, points1) = unit_interval_gauss(n);

    let mut weights = Vec::with_capacity(n * n * n);
    let mut points = Vec::with_capacity(n * n * n);
    let rule1d = || weights1.iter().zip(&points1);

    for (&wx, &[x]) in rule1d() {
        for (&wy, &[y]) in rule1d() {
            for (&wz, &[z]) in rule1d() {
                weights.push(wx * wy * wz);
                points.push([x, y, z]);
            }
        }
    }

    (weights, points)
}

/// Checks that the weights of a rule sum to the measure of its reference
/// domain. A violating table is corrupted or mis-generated.
///
/// # Panics
///
/// Panics if the defect exceeds `1e-12`.
pub fn assert_weights_sum_to_volume(weights: &[f64], reference_volume: f64) {
    let sum: f64 = weights.iter().sum();
    assert!(
        (sum - reference_volume).abs() <= 1e-12,
        "quadrature weights sum to {sum}, expected the reference volume {reference_volume}"
    );
}
