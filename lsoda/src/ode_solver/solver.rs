//! The integration context and the top-level driver.
//!
//! [`Lsoda`] owns every array and scalar of the integration state; two
//! concurrent integrations need two contexts. The driver validates inputs,
//! sizes the first step, runs the step loop and applies the task-mode
//! return logic; the per-step state machine lives in the stepper module.

use log::{info, warn};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::errors::LsodaError;
use crate::linear_solver::weighted_norm;
use crate::ode_solver::coeffs::{Elco, Tesco};
use crate::ode_solver::options::{
    Corrector, IState, Itask, Method, SolverOptions, Tolerances,
};
use crate::ode_solver::problem::{call_rhs, OdeSystem};

/// Machine epsilon, the unit roundoff of the arithmetic.
pub(crate) const ETA: f64 = f64::EPSILON;

/// How the stepper should treat its state on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Jstart {
    /// First step of the problem: initialize everything.
    First,
    /// Plain continuation.
    Continue,
    /// Tolerances, options or method limits changed since the last step.
    Changed,
    /// Only h was changed by the driver (critical-time clamp).
    NewStep,
}

/// Counters and step diagnostics, mirroring the classic IWORK/RWORK
/// outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    /// Accepted steps so far.
    pub nst: usize,
    /// Vector-field evaluations.
    pub nfe: usize,
    /// Jacobian evaluations (and LU factorizations).
    pub nje: usize,
    /// Order used on the last accepted step.
    pub nqu: usize,
    /// Order tentatively planned for the next step.
    pub nq: usize,
    /// Step size of the last accepted step.
    pub hu: f64,
    /// Step size tentatively planned for the next step.
    pub h: f64,
    /// Internal time reached.
    pub tn: f64,
    /// Method of the last accepted step; `None` before the first step.
    pub mused: Option<Method>,
    /// Method currently selected.
    pub method: Method,
    /// On a -4/-5 return, the 0-based component with the largest weighted
    /// local error.
    pub imxer: Option<usize>,
}

/// A stiff/non-stiff integration context with automatic method switching.
#[derive(Debug, Clone)]
pub struct Lsoda {
    pub(crate) tol: Tolerances,
    pub(crate) opts: SolverOptions,

    // problem shape; 0 until the initial call sizes the arrays
    pub(crate) n: usize,

    // Nordsieck history: yh[j][i] = (h^(j-1)/(j-1)!) * d^(j-1)y_i/dt^(j-1),
    // rows and components 1-based with slot 0 unused
    pub(crate) yh: Vec<DVector<f64>>,
    pub(crate) tn: f64,
    pub(crate) h: f64,
    pub(crate) hu: f64,
    pub(crate) hold: f64,
    pub(crate) nq: usize,
    pub(crate) l: usize,
    pub(crate) lmax: usize,
    pub(crate) meth: Method,
    pub(crate) mused: Option<Method>,
    pub(crate) miter: Corrector,

    // iteration workspace
    pub(crate) y: DVector<f64>,
    pub(crate) ewt: DVector<f64>,
    pub(crate) savf: DVector<f64>,
    pub(crate) acor: DVector<f64>,
    pub(crate) wm: DMatrix<f64>,
    pub(crate) ipvt: Vec<usize>,

    // coefficient tables for the active method
    pub(crate) elco: Elco,
    pub(crate) tesco: Tesco,
    pub(crate) el: [f64; 14],
    pub(crate) el0: f64,
    pub(crate) conit: f64,
    pub(crate) cm1: [f64; 13],
    pub(crate) cm2: [f64; 6],

    // adaptation state
    pub(crate) rc: f64,
    pub(crate) conv_rate: f64,
    pub(crate) rmax: f64,
    pub(crate) pdnorm: f64,
    pub(crate) pdest: f64,
    pub(crate) pdlast: f64,
    pub(crate) ialth: i32,
    pub(crate) ipup: bool,
    pub(crate) jcur: bool,
    pub(crate) icount: i32,
    pub(crate) irflag: bool,
    pub(crate) kflag: i32,
    pub(crate) jstart: Jstart,

    // counters
    pub(crate) nst: usize,
    pub(crate) nfe: usize,
    pub(crate) nje: usize,
    pub(crate) nqu: usize,
    pub(crate) nslast: usize,
    pub(crate) nslp: usize,
    pub(crate) nhnil: u32,
    pub(crate) illin: u32,
    pub(crate) ntrep: u32,
    pub(crate) imxer: Option<usize>,

    pub(crate) hmxi: f64,
    pub(crate) init: bool,
    pub(crate) istate: i32,
}

impl Lsoda {
    /// Create a fresh context. Arrays are sized on the first
    /// [`step_to`](Lsoda::step_to) call with [`IState::Start`].
    pub fn new(tol: Tolerances, opts: SolverOptions) -> Self {
        Lsoda {
            tol,
            opts,
            n: 0,
            yh: Vec::new(),
            tn: 0.0,
            h: 0.0,
            hu: 0.0,
            hold: 0.0,
            nq: 0,
            l: 0,
            lmax: 0,
            meth: Method::Adams,
            mused: None,
            miter: Corrector::Functional,
            y: DVector::zeros(0),
            ewt: DVector::zeros(0),
            savf: DVector::zeros(0),
            acor: DVector::zeros(0),
            wm: DMatrix::zeros(0, 0),
            ipvt: Vec::new(),
            elco: [[0.0; 14]; 13],
            tesco: [[0.0; 4]; 13],
            el: [0.0; 14],
            el0: 1.0,
            conit: 0.0,
            cm1: [0.0; 13],
            cm2: [0.0; 6],
            rc: 0.0,
            conv_rate: 0.7,
            rmax: 10000.0,
            pdnorm: 0.0,
            pdest: 0.0,
            pdlast: 0.0,
            ialth: 0,
            ipup: false,
            jcur: false,
            icount: 0,
            irflag: false,
            kflag: 0,
            jstart: Jstart::First,
            nst: 0,
            nfe: 0,
            nje: 0,
            nqu: 0,
            nslast: 0,
            nslp: 0,
            nhnil: 0,
            illin: 0,
            ntrep: 0,
            imxer: None,
            hmxi: 0.0,
            init: false,
            istate: 1,
        }
    }

    /// Replace the tolerances; take effect on the next call made with
    /// [`IState::ContinueChanged`].
    pub fn set_tolerances(&mut self, tol: Tolerances) {
        self.tol = tol;
    }

    /// Replace the option block; take effect on the next call made with
    /// [`IState::ContinueChanged`].
    pub fn set_options(&mut self, opts: SolverOptions) {
        self.opts = opts;
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tol
    }

    pub fn options(&self) -> &SolverOptions {
        &self.opts
    }

    /// Integer `istate` encoding of the last call's outcome (1 before any
    /// call, 2 after success, negative after a failure).
    pub fn istate(&self) -> i32 {
        self.istate
    }

    /// Counters and step diagnostics.
    pub fn statistics(&self) -> Statistics {
        Statistics {
            nst: self.nst,
            nfe: self.nfe,
            nje: self.nje,
            nqu: self.nqu,
            nq: self.nq,
            hu: self.hu,
            h: self.h,
            tn: self.tn,
            mused: self.mused,
            method: self.meth,
            imxer: self.imxer,
        }
    }

    pub(crate) fn max_order(&self) -> usize {
        match self.meth {
            Method::Adams => self.opts.mxordn,
            Method::Bdf => self.opts.mxords,
        }
    }

    pub(crate) fn alloc(&mut self, n: usize) {
        let rows = self.opts.mxordn.max(self.opts.mxords) + 3;
        self.yh = (0..rows).map(|_| DVector::zeros(n + 1)).collect();
        self.y = DVector::zeros(n + 1);
        self.ewt = DVector::zeros(n + 1);
        self.savf = DVector::zeros(n + 1);
        self.acor = DVector::zeros(n + 1);
        self.wm = DMatrix::zeros(n + 1, n + 1);
        self.ipvt = vec![0; n + 1];
        self.n = n;
    }

    /// Recompute the reciprocal error weights from the current `yh[1]`.
    /// A non-positive weight is reported with its 1-based index.
    fn set_error_weights(&mut self) -> Result<(), (usize, f64)> {
        for i in 1..=self.n {
            let w = self.tol.rtol(i) * self.yh[1][i].abs() + self.tol.atol(i);
            if w <= 0.0 {
                return Err((i, w));
            }
            self.ewt[i] = 1.0 / w;
        }
        Ok(())
    }

    /// Record an illegal-input failure, applying the per-context
    /// five-strikes rule.
    fn illegal(&mut self, e: LsodaError) -> LsodaError {
        if self.illin == 5 {
            warn!("lsoda -- repeated occurrence of illegal input; run aborted; apparent infinite loop");
            return LsodaError::ApparentInfiniteLoop;
        }
        self.illin += 1;
        self.istate = e.istate();
        e
    }

    /// Fatal exit after work has been done: copy the last good state back
    /// to the caller and report `e`.
    fn fail(&mut self, y: &mut [f64], t: &mut f64, e: LsodaError) -> LsodaError {
        for i in 1..=self.n {
            y[i - 1] = self.yh[1][i];
        }
        *t = self.tn;
        self.illin = 0;
        self.istate = e.istate();
        e
    }

    fn success_return(
        &mut self,
        y: &mut [f64],
        t: &mut f64,
        itask: Itask,
        ihit: bool,
        tcrit: f64,
    ) {
        for i in 1..=self.n {
            y[i - 1] = self.yh[1][i];
        }
        *t = self.tn;
        if itask.uses_tcrit() && ihit {
            *t = tcrit;
        }
        self.istate = 2;
        self.illin = 0;
    }

    /// Index (0-based) of the component with the largest weighted local
    /// error, recorded on repeated-failure exits.
    fn record_error_index(&mut self) {
        let mut big = 0.0;
        let mut imxer = 1;
        for i in 1..=self.n {
            let size = (self.acor[i] * self.ewt[i]).abs();
            if big < size {
                big = size;
                imxer = i;
            }
        }
        self.imxer = Some(imxer - 1);
    }

    /// Evaluate the solution polynomial (or its k-th derivative, k <= nq)
    /// at `t`, which must lie in `[tn - hu, tn]` up to roundoff slack.
    ///
    /// Returns a 0-based vector of length neq.
    pub fn interpolate(&self, t: f64, k: usize) -> Result<DVector<f64>, LsodaError> {
        if !self.init {
            return Err(LsodaError::NotInitialized);
        }
        if k > self.nq {
            return Err(LsodaError::InvalidInterpolationOrder { k, nq: self.nq });
        }
        let tp = self.tn - self.hu - 100.0 * ETA * (self.tn.abs() + self.hu.abs());
        if (t - tp) * (t - self.tn) > 0.0 {
            return Err(LsodaError::InterpolationOutsideRange {
                t,
                tmin: tp,
                tmax: self.tn,
            });
        }

        let s = (t - self.tn) / self.h;
        let mut dky = DVector::zeros(self.n + 1);
        let mut c = 1.0;
        for jj in (self.l - k)..=self.nq {
            c *= jj as f64;
        }
        for i in 1..=self.n {
            dky[i] = c * self.yh[self.l][i];
        }
        for j in (k..self.nq).rev() {
            let jp1 = j + 1;
            let mut c = 1.0;
            for jj in (jp1 - k)..=j {
                c *= jj as f64;
            }
            for i in 1..=self.n {
                dky[i] = c * self.yh[jp1][i] + s * dky[i];
            }
        }
        if k > 0 {
            let r = self.h.powi(-(k as i32));
            for i in 1..=self.n {
                dky[i] *= r;
            }
        }
        Ok(DVector::from_fn(self.n, |i, _| dky[i + 1]))
    }

    /// Advance the solution from `*t` toward `tout` under the given task
    /// mode, updating `y` and `*t` in place.
    ///
    /// `istate` selects first-call, plain continuation or
    /// changed-parameters continuation, mirroring the classic bidirectional
    /// flag on its input side; the outcome is the returned `Result` plus
    /// [`istate`](Lsoda::istate) for the integer encoding.
    pub fn step_to<S: OdeSystem + ?Sized>(
        &mut self,
        system: &mut S,
        y: &mut [f64],
        t: &mut f64,
        tout: f64,
        itask: Itask,
        istate: IState,
    ) -> Result<(), LsodaError> {
        if istate != IState::Start && !self.init {
            return Err(self.illegal(LsodaError::IllegalInput {
                msg: format!(
                    "istate = {} but the initial call has not been made",
                    istate.as_int()
                ),
            }));
        }
        if istate == IState::Start {
            self.init = false;
            if tout == *t {
                self.ntrep += 1;
                if self.ntrep < 5 {
                    return Ok(());
                }
                warn!("lsoda -- repeated calls with istate = 1 and tout = t; apparent infinite loop");
                return Err(LsodaError::ApparentInfiniteLoop);
            }
            self.ntrep = 0;
        }

        // validate everything the caller may have changed
        let mut tcrit = 0.0;
        if istate != IState::Continue {
            let n = y.len();
            if istate == IState::Start {
                if n == 0 {
                    return Err(self.illegal(LsodaError::IllegalInput {
                        msg: "neq = 0".into(),
                    }));
                }
            } else if n > self.n {
                return Err(self.illegal(LsodaError::IllegalInput {
                    msg: format!("neq increased from {} to {}", self.n, n),
                }));
            } else if n == 0 {
                return Err(self.illegal(LsodaError::IllegalInput {
                    msg: "neq = 0".into(),
                }));
            } else {
                // dropping trailing components mid-problem is allowed; the
                // oversized arrays are simply used up to the new n
                self.n = n;
            }
            if let Err(e) = self.tol.validate(n).and_then(|()| self.opts.validate()) {
                return Err(self.illegal(e));
            }
            if self.opts.h0 != 0.0 && (tout - *t) * self.opts.h0 < 0.0 {
                return Err(self.illegal(LsodaError::IllegalInput {
                    msg: format!("h0 = {} has the opposite sign to tout - t", self.opts.h0),
                }));
            }
            self.hmxi = if self.opts.hmax > 0.0 {
                1.0 / self.opts.hmax
            } else {
                0.0
            };
            if istate == IState::ContinueChanged {
                self.jstart = Jstart::Changed;
            }
        }
        if itask.uses_tcrit() {
            tcrit = match self.opts.tcrit {
                Some(tc) => tc,
                None => {
                    return Err(self.illegal(LsodaError::IllegalInput {
                        msg: format!("itask = {} requires tcrit", itask.as_int()),
                    }))
                }
            };
        }

        // first call: size the arrays, evaluate f once and pick h0
        if istate == IState::Start {
            self.alloc(y.len());
            let n = self.n;
            self.tn = *t;
            self.jstart = Jstart::First;
            self.nhnil = 0;
            self.nst = 0;
            self.nfe = 0;
            self.nje = 0;
            self.nslast = 0;
            self.hu = 0.0;
            self.nqu = 0;
            self.mused = None;
            self.imxer = None;
            self.meth = Method::Adams;
            self.miter = Corrector::Functional;
            // a degree-one history is valid for interpolation even before
            // the first step; the stepper resets this on entry anyway
            self.nq = 1;
            self.l = 2;

            let mut h0 = self.opts.h0;
            if itask.uses_tcrit() {
                if (tcrit - tout) * (tout - *t) < 0.0 {
                    return Err(self.illegal(LsodaError::IllegalInput {
                        msg: format!("itask = {} and tcrit behind tout", itask.as_int()),
                    }));
                }
                if h0 != 0.0 && (*t + h0 - tcrit) * h0 > 0.0 {
                    h0 = tcrit - *t;
                }
            }

            for i in 1..=n {
                self.yh[1][i] = y[i - 1];
                self.y[i] = y[i - 1];
            }
            let (yv, f0) = (&self.y, &mut self.yh[2]);
            call_rhs(system, *t, yv, f0);
            self.nfe = 1;

            if let Err((i, w)) = self.set_error_weights() {
                return Err(self.illegal(LsodaError::IllegalInput {
                    msg: format!("error weight {w} <= 0 for component {i}"),
                }));
            }

            if h0 == 0.0 {
                let tdist = (tout - *t).abs();
                let w0 = t.abs().max(tout.abs());
                if tdist < 100.0 * ETA * w0 {
                    return Err(self.illegal(LsodaError::IllegalInput {
                        msg: "tout too close to t to start integration".into(),
                    }));
                }
                let mut tol = self.tol.max_rtol();
                if tol <= 0.0 {
                    for i in 1..=n {
                        let ayi = y[i - 1].abs();
                        if ayi != 0.0 {
                            tol = tol.max(self.tol.atol(i) / ayi);
                        }
                    }
                }
                tol = tol.max(100.0 * ETA).min(0.001);
                let fn0 = weighted_norm(n, &self.yh[2], &self.ewt);
                let sum = 1.0 / (tol * w0 * w0) + tol * fn0 * fn0;
                h0 = (1.0 / sum.sqrt()).min(tdist).copysign(tout - *t);
            }
            let rh = h0.abs() * self.hmxi;
            if rh > 1.0 {
                h0 /= rh;
            }
            self.h = h0;
            for i in 1..=n {
                self.yh[2][i] *= h0;
            }
            self.init = true;
        }

        // continuation entry: handle targets already reached and the
        // critical-time clamp
        let mut ihit = false;
        if istate != IState::Start {
            self.nslast = self.nst;
            match itask {
                Itask::Normal => {
                    if (self.tn - tout) * self.h >= 0.0 {
                        return self.return_interpolated(y, t, tout, itask);
                    }
                }
                Itask::OneStep => {}
                Itask::NormalNoInterp => {
                    let tp = self.tn - self.hu * (1.0 + 100.0 * ETA);
                    if (tp - tout) * self.h > 0.0 {
                        return Err(self.illegal(LsodaError::IllegalInput {
                            msg: format!(
                                "itask = {} and tout behind tcur - hu",
                                itask.as_int()
                            ),
                        }));
                    }
                    if (self.tn - tout) * self.h >= 0.0 {
                        self.success_return(y, t, itask, ihit, tcrit);
                        return Ok(());
                    }
                }
                Itask::NormalTcrit | Itask::OneStepTcrit => {
                    if (self.tn - tcrit) * self.h > 0.0 {
                        return Err(self.illegal(LsodaError::IllegalInput {
                            msg: "itask = 4 or 5 and tcrit behind tcur".into(),
                        }));
                    }
                    if itask == Itask::NormalTcrit {
                        if (tcrit - tout) * self.h < 0.0 {
                            return Err(self.illegal(LsodaError::IllegalInput {
                                msg: "itask = 4 and tcrit behind tout".into(),
                            }));
                        }
                        if (self.tn - tout) * self.h >= 0.0 {
                            return self.return_interpolated(y, t, tout, itask);
                        }
                    }
                    let hmx = self.tn.abs() + self.h.abs();
                    ihit = (self.tn - tcrit).abs() <= 100.0 * ETA * hmx;
                    if ihit {
                        self.success_return(y, t, itask, ihit, tcrit);
                        return Ok(());
                    }
                    let tnext = self.tn + self.h * (1.0 + 4.0 * ETA);
                    if (tnext - tcrit) * self.h > 0.0 {
                        self.h = (tcrit - self.tn) * (1.0 - 4.0 * ETA);
                        if istate == IState::Continue {
                            self.jstart = Jstart::NewStep;
                        }
                    }
                }
            }
        }

        // main integration loop
        loop {
            if !(istate == IState::Start && self.nst == 0) {
                if self.nst - self.nslast >= self.opts.mxstep {
                    warn!(
                        "lsoda -- at t = {:e}, mxstep = {} steps taken on this call before reaching tout",
                        self.tn, self.opts.mxstep
                    );
                    return Err(self.fail(
                        y,
                        t,
                        LsodaError::ExcessWork {
                            t: self.tn,
                            mxstep: self.opts.mxstep,
                        },
                    ));
                }
                if let Err((i, w)) = self.set_error_weights() {
                    warn!("lsoda -- at t = {:e}, ewt[{i}] = {w:e} <= 0", self.tn);
                    return Err(self.fail(
                        y,
                        t,
                        LsodaError::NonPositiveErrorWeight {
                            index: i - 1,
                            value: w,
                            t: self.tn,
                        },
                    ));
                }
            }
            let tolsf = ETA * weighted_norm(self.n, &self.yh[1], &self.ewt);
            if tolsf > 1.0 {
                let tolsf = tolsf * 2.0;
                if self.nst == 0 {
                    warn!(
                        "lsoda -- at the start of the problem, too much accuracy requested \
                         for machine precision; suggested scaling factor = {tolsf:e}"
                    );
                } else {
                    warn!(
                        "lsoda -- at t = {:e}, too much accuracy requested for machine \
                         precision; suggested scaling factor = {tolsf:e}",
                        self.tn
                    );
                }
                return Err(self.fail(
                    y,
                    t,
                    LsodaError::ExcessAccuracy { t: self.tn, tolsf },
                ));
            }
            if self.tn + self.h == self.tn {
                self.nhnil += 1;
                if self.nhnil <= self.opts.mxhnil {
                    warn!(
                        "lsoda -- warning: internal t = {:e} and h = {:e} are such that \
                         in the machine, t + h = t on the next step; solver will continue anyway",
                        self.tn, self.h
                    );
                    if self.nhnil == self.opts.mxhnil {
                        warn!(
                            "lsoda -- above warning has been issued {} times; \
                             it will not be issued again for this problem",
                            self.nhnil
                        );
                    }
                }
            }

            self.stoda(system);
            self.jstart = Jstart::Continue;

            match self.kflag {
                0 => {
                    if self.opts.ixpr && Some(self.meth) != self.mused {
                        match self.meth {
                            Method::Bdf => {
                                info!("lsoda -- a switch to the bdf (stiff) method has occurred")
                            }
                            Method::Adams => info!(
                                "lsoda -- a switch to the adams (nonstiff) method has occurred"
                            ),
                        }
                        info!(
                            "lsoda -- at t = {:e}, tentative step size h = {:e}, step nst = {}",
                            self.tn, self.h, self.nst
                        );
                    }
                    match itask {
                        Itask::Normal => {
                            if (self.tn - tout) * self.h < 0.0 {
                                continue;
                            }
                            return self.return_interpolated(y, t, tout, itask);
                        }
                        Itask::OneStep => {
                            self.success_return(y, t, itask, ihit, tcrit);
                            return Ok(());
                        }
                        Itask::NormalNoInterp => {
                            if (self.tn - tout) * self.h >= 0.0 {
                                self.success_return(y, t, itask, ihit, tcrit);
                                return Ok(());
                            }
                            continue;
                        }
                        Itask::NormalTcrit => {
                            if (self.tn - tout) * self.h >= 0.0 {
                                return self.return_interpolated(y, t, tout, itask);
                            }
                            let hmx = self.tn.abs() + self.h.abs();
                            ihit = (self.tn - tcrit).abs() <= 100.0 * ETA * hmx;
                            if ihit {
                                self.success_return(y, t, itask, ihit, tcrit);
                                return Ok(());
                            }
                            let tnext = self.tn + self.h * (1.0 + 4.0 * ETA);
                            if (tnext - tcrit) * self.h > 0.0 {
                                self.h = (tcrit - self.tn) * (1.0 - 4.0 * ETA);
                                self.jstart = Jstart::NewStep;
                            }
                            continue;
                        }
                        Itask::OneStepTcrit => {
                            let hmx = self.tn.abs() + self.h.abs();
                            ihit = (self.tn - tcrit).abs() <= 100.0 * ETA * hmx;
                            self.success_return(y, t, itask, ihit, tcrit);
                            return Ok(());
                        }
                    }
                }
                -1 => {
                    warn!(
                        "lsoda -- at t = {:e} and step size h = {:e}, the error test \
                         failed repeatedly or with |h| = hmin",
                        self.tn, self.h
                    );
                    self.record_error_index();
                    return Err(self.fail(
                        y,
                        t,
                        LsodaError::RepeatedErrorTestFailures {
                            t: self.tn,
                            h: self.h,
                        },
                    ));
                }
                _ => {
                    warn!(
                        "lsoda -- at t = {:e} and step size h = {:e}, the corrector \
                         convergence failed repeatedly or with |h| = hmin",
                        self.tn, self.h
                    );
                    self.record_error_index();
                    return Err(self.fail(
                        y,
                        t,
                        LsodaError::RepeatedConvergenceFailures {
                            t: self.tn,
                            h: self.h,
                        },
                    ));
                }
            }
        }
    }

    fn return_interpolated(
        &mut self,
        y: &mut [f64],
        t: &mut f64,
        tout: f64,
        itask: Itask,
    ) -> Result<(), LsodaError> {
        match self.interpolate(tout, 0) {
            Ok(dky) => {
                y.copy_from_slice(dky.as_slice());
                *t = tout;
                self.istate = 2;
                self.illin = 0;
                Ok(())
            }
            Err(e) => Err(self.illegal(LsodaError::IllegalInput {
                msg: format!(
                    "trouble interpolating for itask = {}, tout = {tout:e}: {e}",
                    itask.as_int()
                ),
            })),
        }
    }
}

/// Integrate over a time grid and return a dense table: column 0 is time,
/// columns 1..=neq are the state at each requested time. `tgrid[0]` is the
/// initial time and its row is `y0` itself.
///
/// The context is created once and continued across output times with
/// itask = 1.
pub fn solve<S: OdeSystem + ?Sized>(
    system: &mut S,
    y0: &[f64],
    tgrid: &[f64],
    tol: Tolerances,
    opts: SolverOptions,
) -> Result<DMatrix<f64>, LsodaError> {
    if tgrid.is_empty() {
        return Err(LsodaError::IllegalInput {
            msg: "empty time grid".into(),
        });
    }
    let n = y0.len();
    let mut table = DMatrix::zeros(tgrid.len(), n + 1);
    let mut y = y0.to_vec();
    let mut t = tgrid[0];
    table[(0, 0)] = t;
    for j in 1..=n {
        table[(0, j)] = y[j - 1];
    }

    let mut solver = Lsoda::new(tol, opts);
    let mut istate = IState::Start;
    for (row, &tout) in tgrid.iter().enumerate().skip(1) {
        solver.step_to(system, &mut y, &mut t, tout, Itask::Normal, istate)?;
        istate = IState::Continue;
        table[(row, 0)] = t;
        for j in 1..=n {
            table[(row, j)] = y[j - 1];
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate_requires_initialization() {
        let solver = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), SolverOptions::default());
        assert_eq!(solver.interpolate(0.0, 0), Err(LsodaError::NotInitialized));
    }

    #[test]
    fn continuation_requires_initialization() {
        let mut solver = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), SolverOptions::default());
        let mut f = |_t: f64, _y: &[f64], dydt: &mut [f64]| dydt[0] = 0.0;
        let mut y = [1.0];
        let mut t = 0.0;
        let err = solver
            .step_to(&mut f, &mut y, &mut t, 1.0, Itask::Normal, IState::Continue)
            .unwrap_err();
        assert!(matches!(err, LsodaError::IllegalInput { .. }));
        assert_eq!(solver.istate(), -3);
    }
}
