//! The vector-field seam between the integrator and user code.

use nalgebra::DVector;

/// A system of first-order ODEs dy/dt = f(t, y).
///
/// Slices are 0-indexed and of length neq at this boundary; the core
/// re-bases to its internal 1-indexed storage. The `&mut self` receiver is
/// the owner-controlled payload: implementations are free to mutate their
/// own captured state (counters, caches, external buffers) but must not
/// touch solver state.
pub trait OdeSystem {
    fn rhs(&mut self, t: f64, y: &[f64], dydt: &mut [f64]);
}

impl<F> OdeSystem for F
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    fn rhs(&mut self, t: f64, y: &[f64], dydt: &mut [f64]) {
        self(t, y, dydt)
    }
}

/// Evaluate f at the 1-based vector `y`, writing the 1-based `dydt`.
/// Callers count the evaluation.
pub(crate) fn call_rhs<S: OdeSystem + ?Sized>(
    system: &mut S,
    t: f64,
    y: &DVector<f64>,
    dydt: &mut DVector<f64>,
) {
    let n = y.len() - 1;
    system.rhs(t, &y.as_slice()[1..=n], &mut dydt.as_mut_slice()[1..=n]);
}
