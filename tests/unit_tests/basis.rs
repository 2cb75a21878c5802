use gungnir::basis::{
    phi_linear_1d, phi_linear_1d_grad, phi_quadratic_1d, phi_quadratic_1d_grad, tabulate_linear,
    tabulate_quadratic,
};
use gungnir::quadrature::unit_interval_gauss;
use matrixcompare::assert_scalar_eq;

const SAMPLE_POINTS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

#[test]
fn linear_basis_is_nodal() {
    let nodes = [0.0, 1.0];
    for a in 0..2 {
        for b in 0..2 {
            let expected = if a == b { 1.0 } else { 0.0 };
            assert_scalar_eq!(phi_linear_1d(a, nodes[b]), expected, comp = abs, tol = 1e-15);
        }
    }
}

#[test]
fn quadratic_basis_is_nodal() {
    // Endpoints before the midpoint
    let nodes = [0.0, 1.0, 0.5];
    for a in 0..3 {
        for b in 0..3 {
            let expected = if a == b { 1.0 } else { 0.0 };
            assert_scalar_eq!(
                phi_quadratic_1d(a, nodes[b]),
                expected,
                comp = abs,
                tol = 1e-15
            );
        }
    }
}

#[test]
fn bases_form_a_partition_of_unity() {
    for x in SAMPLE_POINTS {
        let value_sum: f64 = (0..2).map(|a| phi_linear_1d(a, x)).sum();
        let grad_sum: f64 = (0..2).map(phi_linear_1d_grad).sum();
        assert_scalar_eq!(value_sum, 1.0, comp = abs, tol = 1e-15);
        assert_scalar_eq!(grad_sum, 0.0, comp = abs, tol = 1e-15);

        let value_sum: f64 = (0..3).map(|a| phi_quadratic_1d(a, x)).sum();
        let grad_sum: f64 = (0..3).map(|a| phi_quadratic_1d_grad(a, x)).sum();
        assert_scalar_eq!(value_sum, 1.0, comp = abs, tol = 1e-14);
        assert_scalar_eq!(grad_sum, 0.0, comp = abs, tol = 1e-14);
    }
}

#[test]
fn quadratic_basis_reproduces_quadratics() {
    // A quadratic is the linear combination of basis functions with its
    // nodal values as coefficients
    let f = |x: f64| 3.0 * x * x - 2.0 * x + 0.5;
    let df = |x: f64| 6.0 * x - 2.0;
    let nodes = [0.0, 1.0, 0.5];

    for x in SAMPLE_POINTS {
        let interpolated: f64 = (0..3).map(|a| f(nodes[a]) * phi_quadratic_1d(a, x)).sum();
        let interpolated_grad: f64 = (0..3)
            .map(|a| f(nodes[a]) * phi_quadratic_1d_grad(a, x))
            .sum();
        assert_scalar_eq!(interpolated, f(x), comp = abs, tol = 1e-14);
        assert_scalar_eq!(interpolated_grad, df(x), comp = abs, tol = 1e-14);
    }
}

#[test]
fn tables_match_direct_evaluation() {
    let (_, points) = unit_interval_gauss(4);

    let linear = tabulate_linear(&points);
    let quadratic = tabulate_quadratic(&points);
    assert_eq!(linear.num_points(), 4);
    assert_eq!(quadratic.num_points(), 4);

    for (q, &[x]) in points.iter().enumerate() {
        for a in 0..2 {
            assert_scalar_eq!(linear.values(q)[a], phi_linear_1d(a, x), comp = abs, tol = 1e-15);
            assert_scalar_eq!(
                linear.derivatives(q)[a],
                phi_linear_1d_grad(a),
                comp = abs,
                tol = 1e-15
            );
        }
        for a in 0..3 {
            assert_scalar_eq!(
                quadratic.values(q)[a],
                phi_quadratic_1d(a, x),
                comp = abs,
                tol = 1e-15
            );
            assert_scalar_eq!(
                quadratic.derivatives(q)[a],
                phi_quadratic_1d_grad(a, x),
                comp = abs,
                tol = 1e-15
            );
        }
    }
}

#[test]
fn quadratic_values_at_the_four_point_gauss_abscissae() {
    // Spot check against independently computed values at the smallest
    // abscissa of the 4 point Gauss rule on [0, 1]
    let x = 0.06943184420297371;
    assert_scalar_eq!(phi_quadratic_1d(0, x), 0.8013460293699309, comp = abs, tol = 1e-13);
    assert_scalar_eq!(phi_quadratic_1d(1, x), -0.05979028222412167, comp = abs, tol = 1e-13);
    assert_scalar_eq!(phi_quadratic_1d(2, x), 0.2584442528541908, comp = abs, tol = 1e-13);
    assert_scalar_eq!(phi_quadratic_1d_grad(0, x), -2.722272623188105, comp = abs, tol = 1e-13);
}
