//! A pure-Rust port of LSODA, the Livermore solver for ordinary
//! differential equations with automatic method switching.
//!
//! The integrator solves initial value problems dy/dt = f(t, y), starting
//! with an Adams-Moulton predictor-corrector and switching to the backward
//! differentiation formulas (and back) as the problem turns stiff (or
//! stops being stiff), so the caller never has to classify the problem up
//! front. Step size and order are chosen adaptively against a mixed
//! relative/absolute error tolerance.
//!
//! The lowest-friction entry point is [`solve`], which fills a dense table
//! over a time grid. [`Lsoda`] is the underlying context for callers that
//! need task modes, critical times, one-step operation or interpolation:
//!
//! ```
//! use lsoda::{IState, Itask, Lsoda, SolverOptions, Tolerances};
//!
//! let mut decay = |_t: f64, y: &[f64], dydt: &mut [f64]| dydt[0] = -y[0];
//! let mut solver = Lsoda::new(Tolerances::scalar(1e-8, 1e-8), SolverOptions::default());
//! let mut y = [1.0];
//! let mut t = 0.0;
//! solver
//!     .step_to(&mut decay, &mut y, &mut t, 1.0, Itask::Normal, IState::Start)
//!     .unwrap();
//! assert!((y[0] - (-1.0_f64).exp()).abs() < 1e-6);
//! ```
//!
//! Diagnostics (step-size warnings, method-switch reports when
//! [`SolverOptions::ixpr`] is set) are emitted through the [`log`] facade;
//! install any logger to capture them. The crate never prints or aborts on
//! its own.

pub mod errors;
mod linear_solver;
pub mod ode_solver;

pub use errors::LsodaError;
pub use ode_solver::options::{
    Corrector, IState, Itask, JacobianType, Method, SolverOptions, Tolerances,
};
pub use ode_solver::problem::OdeSystem;
pub use ode_solver::solver::{solve, Lsoda, Statistics};
