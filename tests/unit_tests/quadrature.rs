use gungnir::quadrature::{assert_weights_sum_to_volume, gauss, hexahedron_gauss, unit_interval_gauss};
use matrixcompare::assert_scalar_eq;

/// Integral of x^k over [-1, 1].
fn monomial_integral_sym(k: usize) -> f64 {
    if k % 2 == 0 {
        2.0 / (k as f64 + 1.0)
    } else {
        0.0
    }
}

#[test]
fn gauss_rules_integrate_polynomials_exactly() {
    for n in 1..=5 {
        let (weights, points) = gauss(n);
        assert_eq!(weights.len(), n);

        // An n point rule is exact for polynomials up to degree 2n - 1
        for k in 0..2 * n {
            let integral: f64 = weights
                .iter()
                .zip(&points)
                .map(|(w, &[x])| w * x.powi(k as i32))
                .sum();
            assert_scalar_eq!(integral, monomial_integral_sym(k), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn unit_interval_rules_integrate_polynomials_exactly() {
    for n in 1..=5 {
        let (weights, points) = unit_interval_gauss(n);
        let sum: f64 = weights.iter().sum();
        assert_scalar_eq!(sum, 1.0, comp = abs, tol = 1e-14);

        for k in 0..2 * n {
            let integral: f64 = weights
                .iter()
                .zip(&points)
                .map(|(w, &[x])| w * x.powi(k as i32))
                .sum();
            // Integral of x^k over [0, 1]
            assert_scalar_eq!(integral, 1.0 / (k as f64 + 1.0), comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn hexahedron_rule_weights_sum_to_reference_volume() {
    for n in 1..=4 {
        let (weights, _) = hexahedron_gauss(n);
        assert_eq!(weights.len(), n * n * n);
        assert_weights_sum_to_volume(&weights, 1.0);
    }
}

#[test]
fn hexahedron_rule_integrates_separable_monomials() {
    let (weights, points) = hexahedron_gauss(3);

    let integral: f64 = weights
        .iter()
        .zip(&points)
        .map(|(w, &[x, y, z])| w * x * x * y * y * z * z)
        .sum();
    assert_scalar_eq!(integral, 1.0 / 27.0, comp = abs, tol = 1e-14);

    let integral: f64 = weights
        .iter()
        .zip(&points)
        .map(|(w, &[x, _, _])| w * x.powi(5))
        .sum();
    assert_scalar_eq!(integral, 1.0 / 6.0, comp = abs, tol = 1e-14);
}

#[test]
fn three_point_hexahedron_rule_matches_known_values() {
    // Corner, edge and central weights of the tensor rule with 3 points per
    // axis, and the known 1d abscissae (1 +- sqrt(3/5)) / 2 and 1/2
    let (weights, points) = hexahedron_gauss(3);
    assert_scalar_eq!(weights[0], 0.021433470507544583, comp = abs, tol = 1e-15);
    assert_scalar_eq!(weights[1], 0.034293552812071334, comp = abs, tol = 1e-15);
    assert_scalar_eq!(weights[13], 0.0877914951989026, comp = abs, tol = 1e-15);
    let lo = 0.5 * (1.0 - 0.6f64.sqrt());
    let hi = 0.5 * (1.0 + 0.6f64.sqrt());
    assert_scalar_eq!(points[0][0].min(points[26][0]), lo, comp = abs, tol = 1e-15);
    assert_scalar_eq!(points[0][0].max(points[26][0]), hi, comp = abs, tol = 1e-15);
    assert_scalar_eq!(points[13][0], 0.5, comp = abs, tol = 1e-15);
}
