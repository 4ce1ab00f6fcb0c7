pub(crate) mod coeffs;
pub mod options;
pub mod problem;
pub mod solver;
mod stepper;

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::PI;

    use super::options::{IState, Itask, JacobianType, Method, SolverOptions, Tolerances};
    use super::solver::{solve, Lsoda};
    use crate::errors::LsodaError;

    fn decay(_t: f64, y: &[f64], dydt: &mut [f64]) {
        dydt[0] = -y[0];
    }

    fn robertson(_t: f64, y: &[f64], dydt: &mut [f64]) {
        dydt[0] = -0.04 * y[0] + 1.0e4 * y[1] * y[2];
        dydt[2] = 3.0e7 * y[1] * y[1];
        dydt[1] = -dydt[0] - dydt[2];
    }

    fn van_der_pol(_t: f64, y: &[f64], dydt: &mut [f64]) {
        const MU: f64 = 1000.0;
        dydt[0] = y[1];
        dydt[1] = MU * (1.0 - y[0] * y[0]) * y[1] - y[0];
    }

    fn harmonic(_t: f64, y: &[f64], dydt: &mut [f64]) {
        dydt[0] = y[1];
        dydt[1] = -y[0];
    }

    #[test]
    fn adams_handles_exponential_decay() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-8), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap();
        assert_eq!(t, 1.0);
        assert_eq!(solver.istate(), 2);
        assert_abs_diff_eq!(y[0], 0.36787944117144233, epsilon = 1e-6);
        let stats = solver.statistics();
        assert_eq!(stats.mused, Some(Method::Adams));
        assert!(stats.nst > 0);
    }

    #[test]
    fn integrates_backwards_in_time() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-8), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut decay, &mut y, &mut t, -1.0, Itask::Normal, IState::Start)
            .unwrap();
        assert_eq!(t, -1.0);
        assert_abs_diff_eq!(y[0], 1.0_f64.exp(), epsilon = 1e-6);
        assert!(solver.statistics().h < 0.0);
    }

    #[test]
    fn robertson_switches_to_bdf() {
        let tol = Tolerances::ScalarVector {
            rtol: 1e-4,
            atol: vec![1e-6, 1e-10, 1e-6],
        };
        let mut solver = Lsoda::new(tol, SolverOptions::default());
        let mut y = [1.0, 0.0, 0.0];
        let mut t = 0.0;

        solver
            .step_to(&mut robertson, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap();
        // the kinetics turn stiff well before t = 1
        assert_eq!(solver.statistics().mused, Some(Method::Bdf));

        solver
            .step_to(&mut robertson, &mut y, &mut t, 40.0, Itask::Normal, IState::Continue)
            .unwrap();
        assert_abs_diff_eq!(y[0], 0.7158, epsilon = 5e-4);
        assert_abs_diff_eq!(y[1], 9.186e-6, epsilon = 5e-4);
        assert_abs_diff_eq!(y[2], 0.2842, epsilon = 5e-4);
        assert_relative_eq!(y[1], 9.186e-6, max_relative = 0.05);
        assert!(solver.statistics().nje > 0);
    }

    #[test]
    fn van_der_pol_relaxation_oscillations() {
        let mut solver =
            Lsoda::new(Tolerances::scalar(1e-6, 1e-8), SolverOptions::default());
        let mut y = [2.0, 0.0];
        let mut t = 0.0;
        let mut istate = IState::Start;
        for tout in [500.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0] {
            solver
                .step_to(&mut van_der_pol, &mut y, &mut t, tout, Itask::Normal, istate)
                .unwrap();
            istate = IState::Continue;
            assert!(y[0].is_finite() && y[1].is_finite());
        }
        assert_eq!(t, 3000.0);
        // the limit cycle keeps the position near the [-2, 2] band
        assert!(y[0].abs() < 2.5, "y0 = {}", y[0]);
        assert_eq!(solver.statistics().mused, Some(Method::Bdf));
    }

    #[test]
    fn harmonic_oscillator_closes_its_orbit() {
        let mut solver =
            Lsoda::new(Tolerances::scalar(1e-10, 1e-12), SolverOptions::default());
        let mut y = [1.0, 0.0];
        let mut t = 0.0;
        solver
            .step_to(&mut harmonic, &mut y, &mut t, 2.0 * PI, Itask::Normal, IState::Start)
            .unwrap();
        assert_abs_diff_eq!(y[0], 1.0, epsilon = 1e-7);
        assert_abs_diff_eq!(y[1], 0.0, epsilon = 1e-7);
        assert_eq!(solver.statistics().mused, Some(Method::Adams));
    }

    #[test]
    fn constant_solution_round_trips_in_every_tolerance_shape() {
        let shapes = [
            Tolerances::ScalarScalar { rtol: 1e-6, atol: 1e-8 },
            Tolerances::ScalarVector { rtol: 1e-6, atol: vec![1e-8, 1e-8] },
            Tolerances::VectorScalar { rtol: vec![1e-6, 1e-6], atol: 1e-8 },
            Tolerances::VectorVector {
                rtol: vec![1e-6, 1e-6],
                atol: vec![1e-8, 1e-8],
            },
        ];
        for tol in shapes {
            let itol = tol.itol();
            let mut zero_rhs = |_t: f64, _y: &[f64], dydt: &mut [f64]| {
                dydt[0] = 0.0;
                dydt[1] = 0.0;
            };
            let mut solver = Lsoda::new(tol, SolverOptions::default());
            let mut y = [1.5, -0.25];
            let mut t = 0.0;
            solver
                .step_to(&mut zero_rhs, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
                .unwrap();
            assert_eq!(t, 1.0, "itol = {itol}");
            assert_abs_diff_eq!(y[0], 1.5, epsilon = 1e-12);
            assert_abs_diff_eq!(y[1], -0.25, epsilon = 1e-12);
            assert_eq!(solver.istate(), 2, "itol = {itol}");
        }
    }

    #[test]
    fn tout_equal_to_t_on_start_returns_cleanly() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.5;
        for _ in 0..4 {
            solver
                .step_to(&mut decay, &mut y, &mut t, 0.5, Itask::Normal, IState::Start)
                .unwrap();
            assert_eq!(y[0], 1.0);
            assert_eq!(t, 0.5);
        }
        let err = solver
            .step_to(&mut decay, &mut y, &mut t, 0.5, Itask::Normal, IState::Start)
            .unwrap_err();
        assert_eq!(err, LsodaError::ApparentInfiniteLoop);
    }

    #[test]
    fn tout_too_close_to_t_is_illegal() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 1.0;
        let err = solver
            .step_to(&mut decay, &mut y, &mut t, 1.0 + 5e-15, Itask::Normal, IState::Start)
            .unwrap_err();
        assert!(matches!(err, LsodaError::IllegalInput { .. }), "{err}");
        assert_eq!(solver.istate(), -3);
        assert_eq!(y[0], 1.0);
        assert_eq!(t, 1.0);
    }

    #[test]
    fn zero_equations_is_illegal_and_leaves_y_alone() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), SolverOptions::default());
        let mut y: [f64; 0] = [];
        let mut t = 0.0;
        let err = solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap_err();
        assert!(matches!(err, LsodaError::IllegalInput { .. }));
        assert_eq!(solver.istate(), -3);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn one_step_mode_returns_after_a_single_step() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-8), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::OneStep, IState::Start)
            .unwrap();
        let stats = solver.statistics();
        assert_eq!(stats.nst, 1);
        assert_eq!(t, stats.tn);
        assert!(t > 0.0 && t < 1.0);
    }

    #[test]
    fn no_interp_mode_lands_on_an_internal_mesh_point() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-8), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut decay, &mut y, &mut t, 0.5, Itask::NormalNoInterp, IState::Start)
            .unwrap();
        let stats = solver.statistics();
        assert_eq!(t, stats.tn);
        assert!(t >= 0.5);
        assert_abs_diff_eq!(y[0], (-t).exp(), epsilon = 1e-6);
    }

    #[test]
    fn tcrit_single_steps_stop_exactly_on_the_critical_time() {
        let opts = SolverOptions {
            tcrit: Some(1.0),
            ..Default::default()
        };
        let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-8), opts);
        let mut y = [1.0];
        let mut t = 0.0;
        let mut istate = IState::Start;
        let mut iters = 0;
        while t < 1.0 - 1e-12 {
            solver
                .step_to(&mut decay, &mut y, &mut t, 1.0e10, Itask::OneStepTcrit, istate)
                .unwrap();
            istate = IState::Continue;
            assert!(t <= 1.0 + 1e-12, "stepped past tcrit: t = {t}");
            iters += 1;
            assert!(iters < 1000);
        }
        assert_abs_diff_eq!(t, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[0], (-1.0_f64).exp(), epsilon = 1e-6);
    }

    #[test]
    fn tcrit_mode_rejects_tout_beyond_tcrit() {
        let opts = SolverOptions {
            tcrit: Some(1.0),
            ..Default::default()
        };
        let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-8), opts);
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut decay, &mut y, &mut t, 0.5, Itask::NormalTcrit, IState::Start)
            .unwrap();
        assert_eq!(t, 0.5);
        let err = solver
            .step_to(&mut decay, &mut y, &mut t, 2.0, Itask::NormalTcrit, IState::Continue)
            .unwrap_err();
        assert!(matches!(err, LsodaError::IllegalInput { .. }));
    }

    #[test]
    fn tolerances_can_change_between_calls() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap();
        solver.set_tolerances(Tolerances::scalar(1e-10, 1e-12));
        solver
            .step_to(&mut decay, &mut y, &mut t, 2.0, Itask::Normal, IState::ContinueChanged)
            .unwrap();
        assert_eq!(t, 2.0);
        assert_abs_diff_eq!(y[0], (-2.0_f64).exp(), epsilon = 1e-7);
    }

    #[test]
    fn unsupported_jacobian_modes_fail_fast() {
        let opts = SolverOptions {
            jt: JacobianType::UserFull,
            ..Default::default()
        };
        let mut solver = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), opts);
        let mut y = [1.0];
        let mut t = 0.0;
        let err = solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap_err();
        assert_eq!(err, LsodaError::UnsupportedJacobianMode { jt: 1 });
        assert_eq!(solver.istate(), -3);
    }

    #[test]
    fn step_budget_failure_reports_partial_progress() {
        let opts = SolverOptions {
            mxstep: 1,
            ..Default::default()
        };
        let mut solver = Lsoda::new(Tolerances::scalar(1e-10, 1e-12), opts);
        let mut y = [1.0];
        let mut t = 0.0;
        let err = solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap_err();
        assert!(matches!(err, LsodaError::ExcessWork { .. }));
        assert_eq!(solver.istate(), -1);
        let stats = solver.statistics();
        assert_eq!(t, stats.tn);
        assert!(t > 0.0 && t < 1.0);
        assert_abs_diff_eq!(y[0], (-t).exp(), epsilon = 1e-8);
    }

    #[test]
    fn impossible_accuracy_is_rejected_with_a_scaling_factor() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-20, 1e-20), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.0;
        let err = solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap_err();
        match err {
            LsodaError::ExcessAccuracy { tolsf, .. } => assert!(tolsf > 1.0),
            other => panic!("expected ExcessAccuracy, got {other:?}"),
        }
        assert_eq!(solver.istate(), -2);
    }

    #[test]
    fn zero_weight_at_start_is_illegal() {
        // y0 = 0 with atol = 0 gives a zero error weight
        let mut solver = Lsoda::new(Tolerances::scalar(1e-6, 0.0), SolverOptions::default());
        let mut y = [0.0];
        let mut t = 0.0;
        let err = solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap_err();
        assert!(matches!(err, LsodaError::IllegalInput { .. }));
        assert_eq!(solver.istate(), -3);
    }

    #[test]
    fn hmax_bounds_the_step_size() {
        let opts = SolverOptions {
            hmax: 0.1,
            ..Default::default()
        };
        let mut zero_rhs = |_t: f64, _y: &[f64], dydt: &mut [f64]| dydt[0] = 0.0;
        let mut solver = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), opts);
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut zero_rhs, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap();
        assert!(solver.statistics().h.abs() <= 0.1 * (1.0 + 1e-10));
    }

    #[test]
    fn solve_builds_a_dense_table() {
        let grid = [0.0, 0.5, 1.0];
        let table = solve(
            &mut decay,
            &[1.0],
            &grid,
            Tolerances::scalar(1e-8, 1e-8),
            SolverOptions::default(),
        )
        .unwrap();
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.ncols(), 2);
        for (row, &tg) in grid.iter().enumerate() {
            assert_eq!(table[(row, 0)], tg);
            assert_abs_diff_eq!(table[(row, 1)], (-tg).exp(), epsilon = 1e-6);
        }
    }

    #[test]
    fn interpolation_tracks_the_solution_and_its_derivative() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-10), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut decay, &mut y, &mut t, 2.0, Itask::Normal, IState::Start)
            .unwrap();
        let stats = solver.statistics();
        let tq = stats.tn - 0.5 * stats.hu;

        let y_mid = solver.interpolate(tq, 0).unwrap();
        assert_abs_diff_eq!(y_mid[0], (-tq).exp(), epsilon = 1e-6);
        let dy_mid = solver.interpolate(tq, 1).unwrap();
        assert_abs_diff_eq!(dy_mid[0], -(-tq).exp(), epsilon = 1e-5);

        assert!(matches!(
            solver.interpolate(tq, stats.nq + 1),
            Err(LsodaError::InvalidInterpolationOrder { .. })
        ));
        assert!(matches!(
            solver.interpolate(stats.tn - stats.hu.abs() - 1.0, 0),
            Err(LsodaError::InterpolationOutsideRange { .. })
        ));
        assert!(matches!(
            solver.interpolate(stats.tn + 1.0, 0),
            Err(LsodaError::InterpolationOutsideRange { .. })
        ));
    }

    #[test]
    fn statistics_reflect_the_integration() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-8), SolverOptions::default());
        let mut y = [1.0];
        let mut t = 0.0;
        solver
            .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
            .unwrap();
        let stats = solver.statistics();
        assert!(stats.nst >= 1);
        assert!(stats.nfe >= stats.nst);
        assert!(stats.nqu >= 1);
        assert!(stats.hu != 0.0);
        assert_eq!(stats.imxer, None);
    }
}
