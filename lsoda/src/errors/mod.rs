use thiserror::Error;

/// Errors surfaced by the integration driver and the interpolation surface.
///
/// The negative `istate` encoding of the classic interface is preserved
/// through [`LsodaError::istate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LsodaError {
    #[error("at t = {t}, mxstep = {mxstep} steps taken on this call before reaching tout")]
    ExcessWork { t: f64, mxstep: usize },
    #[error("at t = {t}, too much accuracy requested for machine precision; suggested scaling factor = {tolsf}")]
    ExcessAccuracy { t: f64, tolsf: f64 },
    #[error("illegal input: {msg}")]
    IllegalInput { msg: String },
    #[error("at t = {t} and step size h = {h}, the error test failed repeatedly or with |h| = hmin")]
    RepeatedErrorTestFailures { t: f64, h: f64 },
    #[error("at t = {t} and step size h = {h}, the corrector convergence failed repeatedly or with |h| = hmin")]
    RepeatedConvergenceFailures { t: f64, h: f64 },
    #[error("error weight {value} <= 0 for component {index} at t = {t}")]
    NonPositiveErrorWeight { index: usize, value: f64, t: f64 },
    #[error("jacobian mode jt = {jt} is not supported; only the internally generated full jacobian (jt = 2) is available")]
    UnsupportedJacobianMode { jt: i32 },
    #[error("repeated occurrence of illegal input; run aborted; apparent infinite loop")]
    ApparentInfiniteLoop,
    #[error("interpolation time t = {t} is not in the interval [tcur - hu, tcur] = [{tmin}, {tmax}]")]
    InterpolationOutsideRange { t: f64, tmin: f64, tmax: f64 },
    #[error("derivative order k = {k} exceeds the current method order {nq}")]
    InvalidInterpolationOrder { k: usize, nq: usize },
    #[error("solver not initialized; make an initial call before continuing")]
    NotInitialized,
}

impl LsodaError {
    /// Integer `istate` encoding of this failure at the external interface.
    pub fn istate(&self) -> i32 {
        match self {
            LsodaError::ExcessWork { .. } => -1,
            LsodaError::ExcessAccuracy { .. } => -2,
            LsodaError::RepeatedErrorTestFailures { .. } => -4,
            LsodaError::RepeatedConvergenceFailures { .. } => -5,
            LsodaError::NonPositiveErrorWeight { .. } => -6,
            _ => -3,
        }
    }
}
