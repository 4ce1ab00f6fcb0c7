//! Solver configuration: method/iteration variants, task modes, tolerance
//! shapes and the tunable option block.

use serde::{Deserialize, Serialize};

use crate::errors::LsodaError;

/// Integration method family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// Adams-Moulton predictor-corrector, for non-stiff stretches.
    Adams,
    /// Backward differentiation formulas, for stiff stretches.
    Bdf,
}

impl Method {
    /// Integer encoding at the external interface (1 = Adams, 2 = BDF).
    pub fn as_int(self) -> i32 {
        match self {
            Method::Adams => 1,
            Method::Bdf => 2,
        }
    }
}

/// Corrector iteration variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corrector {
    /// Functional (fixed-point) iteration; no iteration matrix.
    Functional,
    /// Modified Newton (chord) iteration against a finite-difference
    /// Jacobian.
    Chord,
}

/// Jacobian mode (`jt` in the classic interface).
///
/// Only [`JacobianType::InternalFull`] is implemented; the remaining modes
/// are accepted by the option surface and rejected with a distinct error at
/// the first call rather than silently mis-iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JacobianType {
    /// jt = 1: full Jacobian supplied by the caller (unsupported).
    UserFull,
    /// jt = 2: full Jacobian generated internally by finite differences.
    InternalFull,
    /// jt = 4: banded Jacobian supplied by the caller (unsupported).
    UserBanded,
    /// jt = 5: banded Jacobian generated internally (unsupported).
    InternalBanded,
}

impl JacobianType {
    pub fn as_int(self) -> i32 {
        match self {
            JacobianType::UserFull => 1,
            JacobianType::InternalFull => 2,
            JacobianType::UserBanded => 4,
            JacobianType::InternalBanded => 5,
        }
    }

    /// Decode the classic integer encoding; jt = 3 has no meaning and is
    /// rejected outright.
    pub fn from_int(jt: i32) -> Result<Self, LsodaError> {
        match jt {
            1 => Ok(JacobianType::UserFull),
            2 => Ok(JacobianType::InternalFull),
            4 => Ok(JacobianType::UserBanded),
            5 => Ok(JacobianType::InternalBanded),
            _ => Err(LsodaError::IllegalInput {
                msg: format!("jt = {jt} illegal"),
            }),
        }
    }
}

/// Task mode (`itask` in the classic interface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Itask {
    /// 1: integrate to tout, interpolating back if an internal step passed
    /// it.
    Normal,
    /// 2: take a single internal step and return.
    OneStep,
    /// 3: integrate to the first internal mesh point at or past tout and
    /// return without interpolation.
    NormalNoInterp,
    /// 4: as Normal, but never step past tcrit.
    NormalTcrit,
    /// 5: take a single internal step without passing tcrit and return.
    OneStepTcrit,
}

impl Itask {
    pub fn as_int(self) -> i32 {
        match self {
            Itask::Normal => 1,
            Itask::OneStep => 2,
            Itask::NormalNoInterp => 3,
            Itask::NormalTcrit => 4,
            Itask::OneStepTcrit => 5,
        }
    }

    pub(crate) fn uses_tcrit(self) -> bool {
        matches!(self, Itask::NormalTcrit | Itask::OneStepTcrit)
    }
}

/// Continuation mode for a call (`istate` on input in the classic
/// interface). The output side is the `Result` of the call plus
/// [`crate::Lsoda::istate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IState {
    /// 1: first call for the problem; sizes and initializes everything.
    Start,
    /// 2: continue, nothing changed since the last call.
    Continue,
    /// 3: continue, but tolerances or options were changed; they are
    /// re-read and re-validated. The number of equations must not grow.
    ContinueChanged,
}

impl IState {
    pub fn as_int(self) -> i32 {
        match self {
            IState::Start => 1,
            IState::Continue => 2,
            IState::ContinueChanged => 3,
        }
    }
}

/// Relative/absolute tolerance pair in its four shape modes (`itol`).
///
/// The weight of component i is `rtol_i * |y_i| + atol_i`; scalar variants
/// broadcast over all components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tolerances {
    /// itol = 1
    ScalarScalar { rtol: f64, atol: f64 },
    /// itol = 2
    ScalarVector { rtol: f64, atol: Vec<f64> },
    /// itol = 3
    VectorScalar { rtol: Vec<f64>, atol: f64 },
    /// itol = 4
    VectorVector { rtol: Vec<f64>, atol: Vec<f64> },
}

impl Tolerances {
    /// Scalar rtol/atol applied to every component.
    pub fn scalar(rtol: f64, atol: f64) -> Self {
        Tolerances::ScalarScalar { rtol, atol }
    }

    /// The classic `itol` encoding of this shape.
    pub fn itol(&self) -> i32 {
        match self {
            Tolerances::ScalarScalar { .. } => 1,
            Tolerances::ScalarVector { .. } => 2,
            Tolerances::VectorScalar { .. } => 3,
            Tolerances::VectorVector { .. } => 4,
        }
    }

    /// Relative tolerance for the 1-based component `i`.
    pub(crate) fn rtol(&self, i: usize) -> f64 {
        match self {
            Tolerances::ScalarScalar { rtol, .. } | Tolerances::ScalarVector { rtol, .. } => *rtol,
            Tolerances::VectorScalar { rtol, .. } | Tolerances::VectorVector { rtol, .. } => {
                rtol[i - 1]
            }
        }
    }

    /// Absolute tolerance for the 1-based component `i`.
    pub(crate) fn atol(&self, i: usize) -> f64 {
        match self {
            Tolerances::ScalarScalar { atol, .. } | Tolerances::VectorScalar { atol, .. } => *atol,
            Tolerances::ScalarVector { atol, .. } | Tolerances::VectorVector { atol, .. } => {
                atol[i - 1]
            }
        }
    }

    pub(crate) fn max_rtol(&self) -> f64 {
        match self {
            Tolerances::ScalarScalar { rtol, .. } | Tolerances::ScalarVector { rtol, .. } => *rtol,
            Tolerances::VectorScalar { rtol, .. } | Tolerances::VectorVector { rtol, .. } => {
                rtol.iter().cloned().fold(0.0, f64::max)
            }
        }
    }

    pub(crate) fn validate(&self, n: usize) -> Result<(), LsodaError> {
        let illegal = |msg: String| Err(LsodaError::IllegalInput { msg });
        let check_len = |name: &str, len: usize| {
            if len == n {
                Ok(())
            } else {
                Err(LsodaError::IllegalInput {
                    msg: format!("{name} has length {len}, expected neq = {n}"),
                })
            }
        };
        match self {
            Tolerances::ScalarVector { atol, .. } => check_len("atol", atol.len())?,
            Tolerances::VectorScalar { rtol, .. } => check_len("rtol", rtol.len())?,
            Tolerances::VectorVector { rtol, atol } => {
                check_len("rtol", rtol.len())?;
                check_len("atol", atol.len())?;
            }
            Tolerances::ScalarScalar { .. } => {}
        }
        for i in 1..=n {
            if self.rtol(i) < 0.0 {
                return illegal(format!("rtol[{i}] = {} < 0", self.rtol(i)));
            }
            if self.atol(i) < 0.0 {
                return illegal(format!("atol[{i}] = {} < 0", self.atol(i)));
            }
        }
        Ok(())
    }
}

/// The optional input block.
///
/// Defaults match the classic interface with all options at their unset
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Report method switches through the log channel.
    pub ixpr: bool,
    /// Maximum internal steps per call before giving up.
    pub mxstep: usize,
    /// Maximum number of t + h = t warnings printed per problem.
    pub mxhnil: u32,
    /// Step size to attempt on the first step; 0 means compute one.
    pub h0: f64,
    /// Maximum Adams order, in [1, 12].
    pub mxordn: usize,
    /// Maximum BDF order, in [1, 5].
    pub mxords: usize,
    /// Maximum |h|; 0 means unbounded.
    pub hmax: f64,
    /// Minimum |h|.
    pub hmin: f64,
    /// Critical time the integration must not step past (tasks 4 and 5).
    pub tcrit: Option<f64>,
    /// Lower bandwidth, meaningful only for the banded Jacobian modes.
    pub ml: Option<usize>,
    /// Upper bandwidth, meaningful only for the banded Jacobian modes.
    pub mu: Option<usize>,
    /// Jacobian mode used by the stiff corrector.
    pub jt: JacobianType,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            ixpr: false,
            mxstep: 5000,
            mxhnil: 10,
            h0: 0.0,
            mxordn: 12,
            mxords: 5,
            hmax: 0.0,
            hmin: 0.0,
            tcrit: None,
            ml: None,
            mu: None,
            jt: JacobianType::InternalFull,
        }
    }
}

impl SolverOptions {
    pub(crate) fn validate(&self) -> Result<(), LsodaError> {
        let illegal = |msg: String| Err(LsodaError::IllegalInput { msg });
        if self.mxstep == 0 {
            return illegal("mxstep = 0".into());
        }
        if !(1..=12).contains(&self.mxordn) {
            return illegal(format!("mxordn = {} not in [1, 12]", self.mxordn));
        }
        if !(1..=5).contains(&self.mxords) {
            return illegal(format!("mxords = {} not in [1, 5]", self.mxords));
        }
        if self.hmax < 0.0 {
            return illegal(format!("hmax = {} < 0", self.hmax));
        }
        if self.hmin < 0.0 {
            return illegal(format!("hmin = {} < 0", self.hmin));
        }
        match self.jt {
            JacobianType::InternalFull => Ok(()),
            other => Err(LsodaError::UnsupportedJacobianMode {
                jt: other.as_int(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_interface() {
        let opts = SolverOptions::default();
        assert_eq!(opts.mxstep, 5000);
        assert_eq!(opts.mxhnil, 10);
        assert_eq!(opts.mxordn, 12);
        assert_eq!(opts.mxords, 5);
        assert_eq!(opts.jt, JacobianType::InternalFull);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn itol_encoding_covers_all_shapes() {
        assert_eq!(Tolerances::scalar(1e-6, 1e-8).itol(), 1);
        assert_eq!(
            Tolerances::ScalarVector { rtol: 1e-6, atol: vec![1e-8] }.itol(),
            2
        );
        assert_eq!(
            Tolerances::VectorScalar { rtol: vec![1e-6], atol: 1e-8 }.itol(),
            3
        );
        assert_eq!(
            Tolerances::VectorVector { rtol: vec![1e-6], atol: vec![1e-8] }.itol(),
            4
        );
    }

    #[test]
    fn tolerance_validation() {
        assert!(Tolerances::scalar(1e-6, 1e-8).validate(3).is_ok());
        assert!(Tolerances::scalar(-1e-6, 1e-8).validate(3).is_err());
        assert!(Tolerances::ScalarVector { rtol: 1e-6, atol: vec![1e-8, 1e-8] }
            .validate(3)
            .is_err());
    }

    #[test]
    fn jt_three_is_illegal() {
        assert!(matches!(
            JacobianType::from_int(3),
            Err(LsodaError::IllegalInput { .. })
        ));
        assert_eq!(JacobianType::from_int(2).unwrap(), JacobianType::InternalFull);
    }

    #[test]
    fn unsupported_jacobian_modes_are_reported() {
        let opts = SolverOptions {
            jt: JacobianType::UserBanded,
            ..Default::default()
        };
        assert_eq!(
            opts.validate(),
            Err(LsodaError::UnsupportedJacobianMode { jt: 4 })
        );
    }

    #[test]
    fn order_caps_are_range_checked() {
        let opts = SolverOptions { mxordn: 13, ..Default::default() };
        assert!(opts.validate().is_err());
        let opts = SolverOptions { mxords: 0, ..Default::default() };
        assert!(opts.validate().is_err());
    }
}
