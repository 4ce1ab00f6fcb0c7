//! One integration step and its retry policy.
//!
//! Per attempt: advance tn and apply the Pascal predictor to the Nordsieck
//! array, run the corrector (functional for Adams, chord against an LU'd
//! iteration matrix for BDF), test the local error, then pick the step
//! size, order and method for the next step. Every failure path rewinds tn
//! and undoes the predictor exactly before retrying with a smaller step or
//! lower order.

use crate::linear_solver::lu::{lu_factorize, lu_solve};
use crate::linear_solver::{weighted_matrix_norm, weighted_norm};
use crate::ode_solver::coeffs::{compute_coeffs, MAX_ADAMS_ORDER, MAX_BDF_ORDER, SM1};
use crate::ode_solver::options::{Corrector, Method};
use crate::ode_solver::problem::{call_rhs, OdeSystem};
use crate::ode_solver::solver::{Jstart, Lsoda, ETA};

/// Jacobian is considered stale once h*el0 has drifted this far from its
/// value at the last update.
const CCMAX: f64 = 0.3;
/// Corrector iteration cap.
const MAXCOR: usize = 3;
/// Steps between forced iteration-matrix updates.
const MSBP: usize = 20;
/// Convergence failures tolerated within one step attempt.
const MXNCF: usize = 10;
/// Step-size advantage required before switching methods.
const RATIO: f64 = 5.0;

enum Corrected {
    /// Converged after m iterations with final increment norm `del`.
    Converged { m: usize, del: f64 },
    /// Not converged; shrink h by `rh` and retry the step.
    Retry { rh: f64 },
    /// Out of retries at this step size.
    GiveUp,
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum OrderFlag {
    NoChange,
    StepChange,
    OrderChange,
}

impl Lsoda {
    /// Take one internal step, setting `kflag` to 0 on success, -1 after
    /// unrecoverable error-test failures, -2 after unrecoverable corrector
    /// failures.
    pub(crate) fn stoda<S: OdeSystem + ?Sized>(&mut self, system: &mut S) {
        self.kflag = 0;
        let told = self.tn;
        let mut ncf = 0usize;
        self.jcur = false;

        match self.jstart {
            Jstart::First => {
                self.lmax = self.max_order() + 1;
                self.nq = 1;
                self.l = 2;
                self.ialth = 2;
                self.rmax = 10000.0;
                self.rc = 0.0;
                self.el0 = 1.0;
                self.conv_rate = 0.7;
                self.hold = self.h;
                self.nslp = 0;
                self.ipup = self.miter == Corrector::Chord;
                // stiffness-switching state; integration begins with Adams
                self.icount = 20;
                self.irflag = false;
                self.pdest = 0.0;
                self.pdlast = 0.0;
                compute_coeffs(Method::Bdf, &mut self.elco, &mut self.tesco);
                for i in 1..=MAX_BDF_ORDER {
                    self.cm2[i] = self.tesco[i][2] * self.elco[i][i + 1];
                }
                compute_coeffs(Method::Adams, &mut self.elco, &mut self.tesco);
                for i in 1..=MAX_ADAMS_ORDER {
                    self.cm1[i] = self.tesco[i][2] * self.elco[i][i + 1];
                }
                self.reset_coeffs();
            }
            Jstart::Changed => {
                self.ipup = self.miter == Corrector::Chord;
                self.lmax = self.max_order() + 1;
                if self.nq > self.max_order() {
                    self.nq = self.max_order();
                    self.l = self.nq + 1;
                    self.reset_coeffs();
                }
                if self.ialth == 1 {
                    self.ialth = 2;
                }
                if Some(self.meth) != self.mused {
                    compute_coeffs(self.meth, &mut self.elco, &mut self.tesco);
                    self.ialth = self.l as i32;
                    self.reset_coeffs();
                }
            }
            Jstart::Continue | Jstart::NewStep => {}
        }
        if matches!(self.jstart, Jstart::Changed | Jstart::NewStep) && self.h != self.hold {
            let rh = self.h / self.hold;
            self.h = self.hold;
            self.rescale_h(rh);
        }

        loop {
            if (self.rc - 1.0).abs() > CCMAX {
                self.ipup = self.miter == Corrector::Chord;
            }
            if self.nst >= self.nslp + MSBP {
                self.ipup = self.miter == Corrector::Chord;
            }
            self.tn += self.h;
            self.predict();
            let pnorm = weighted_norm(self.n, &self.yh[1], &self.ewt);

            let (m, del) = match self.run_corrector(system, pnorm, told, &mut ncf) {
                Corrected::Converged { m, del } => (m, del),
                Corrected::Retry { rh } => {
                    let rh = rh.max(self.opts.hmin / self.h.abs());
                    self.rescale_h(rh);
                    continue;
                }
                Corrected::GiveUp => {
                    self.kflag = -2;
                    self.hold = self.h;
                    return;
                }
            };

            // the corrector converged; jcur now marks the Jacobian stale
            // for subsequent steps
            self.jcur = false;
            let dsm = if m == 0 {
                del / self.tesco[self.nq][2]
            } else {
                weighted_norm(self.n, &self.acor, &self.ewt) / self.tesco[self.nq][2]
            };

            if dsm <= 1.0 {
                self.accept_step(dsm, pnorm);
                return;
            }

            // error test failed: rewind and retry at reduced h and
            // possibly reduced order
            self.kflag -= 1;
            self.tn = told;
            self.undo_prediction();
            self.rmax = 2.0;
            if self.h.abs() <= self.opts.hmin * 1.00001 {
                self.kflag = -1;
                self.hold = self.h;
                return;
            }
            if self.kflag > -3 {
                let (flag, rh) = self.select_order(0.0, dsm);
                let mut rh = rh;
                if flag == OrderFlag::OrderChange {
                    self.reset_coeffs();
                }
                if flag == OrderFlag::NoChange {
                    rh = rh.min(0.2);
                }
                let rh = rh.max(self.opts.hmin / self.h.abs());
                self.rescale_h(rh);
                continue;
            }
            // three or more failures: the derivatives in yh are suspect;
            // restart from first order with f re-evaluated
            if self.kflag == -10 {
                self.kflag = -1;
                self.hold = self.h;
                return;
            }
            let rh = 0.1_f64.max(self.opts.hmin / self.h.abs());
            self.h *= rh;
            for i in 1..=self.n {
                self.y[i] = self.yh[1][i];
            }
            call_rhs(system, self.tn, &self.y, &mut self.savf);
            self.nfe += 1;
            for i in 1..=self.n {
                self.yh[2][i] = self.h * self.savf[i];
            }
            self.ipup = self.miter == Corrector::Chord;
            self.ialth = 5;
            if self.nq != 1 {
                self.nq = 1;
                self.l = 2;
                self.reset_coeffs();
            }
        }
    }

    /// Bookkeeping for an accepted step: commit the correction into the
    /// Nordsieck array, then consider a method switch and an order/step
    /// change for the next step.
    fn accept_step(&mut self, dsm: f64, pnorm: f64) {
        self.kflag = 0;
        self.nst += 1;
        self.hu = self.h;
        self.nqu = self.nq;
        self.mused = Some(self.meth);
        for j in 1..=self.l {
            let r = self.el[j];
            for i in 1..=self.n {
                self.yh[j][i] += r * self.acor[i];
            }
        }

        self.icount -= 1;
        if self.icount < 0 {
            if let Some(rh) = self.consider_method_switch(dsm, pnorm) {
                // forced order/step change into the other family
                compute_coeffs(self.meth, &mut self.elco, &mut self.tesco);
                self.lmax = self.max_order() + 1;
                self.ialth = self.l as i32;
                self.reset_coeffs();
                let rh = rh.max(self.opts.hmin / self.h.abs());
                self.rescale_h(rh);
                self.rmax = 10.0;
                self.finalize_step();
                return;
            }
        }

        self.ialth -= 1;
        if self.ialth == 0 {
            let mut rhup = 0.0;
            if self.l != self.lmax {
                for i in 1..=self.n {
                    self.savf[i] = self.acor[i] - self.yh[self.lmax][i];
                }
                let dup =
                    weighted_norm(self.n, &self.savf, &self.ewt) / self.tesco[self.nq][3];
                let exup = 1.0 / (self.l as f64 + 1.0);
                rhup = 1.0 / (1.4 * dup.powf(exup) + 0.0000014);
            }
            let (flag, rh) = self.select_order(rhup, dsm);
            match flag {
                OrderFlag::NoChange => {}
                OrderFlag::StepChange => {
                    let rh = rh.max(self.opts.hmin / self.h.abs());
                    self.rescale_h(rh);
                    self.rmax = 10.0;
                }
                OrderFlag::OrderChange => {
                    self.reset_coeffs();
                    let rh = rh.max(self.opts.hmin / self.h.abs());
                    self.rescale_h(rh);
                    self.rmax = 10.0;
                }
            }
            self.finalize_step();
            return;
        }
        if self.ialth <= 1 && self.l != self.lmax {
            // stash the correction for a possible order increase next step
            for i in 1..=self.n {
                self.yh[self.lmax][i] = self.acor[i];
            }
        }
        self.finalize_step();
    }

    /// Pascal-matrix predictor: in place, yh[1] becomes the predicted
    /// y(tn) and the higher rows the predicted scaled derivatives.
    pub(crate) fn predict(&mut self) {
        for jb in 1..=self.nq {
            let i1 = self.l - jb;
            for i in i1..=self.nq {
                let (lo, hi) = self.yh.split_at_mut(i + 1);
                lo[i] += &hi[0];
            }
        }
    }

    /// Exact mirror of [`predict`](Lsoda::predict); applying it directly
    /// after the predictor restores yh bit for bit.
    pub(crate) fn undo_prediction(&mut self) {
        for jb in 1..=self.nq {
            let i1 = self.l - jb;
            for i in i1..=self.nq {
                let (lo, hi) = self.yh.split_at_mut(i + 1);
                lo[i] -= &hi[0];
            }
        }
    }

    /// Resolve the implicit formula at the predicted point.
    fn run_corrector<S: OdeSystem + ?Sized>(
        &mut self,
        system: &mut S,
        pnorm: f64,
        told: f64,
        ncf: &mut usize,
    ) -> Corrected {
        let n = self.n;
        let mut m = 0usize;
        let mut rate = 0.0_f64;
        let mut del = 0.0_f64;
        let mut delp = 0.0_f64;
        for i in 1..=n {
            self.y[i] = self.yh[1][i];
        }
        call_rhs(system, self.tn, &self.y, &mut self.savf);
        self.nfe += 1;

        loop {
            if m == 0 {
                if self.ipup {
                    if self.form_jacobian(system).is_err() {
                        return self.corrector_failure(told, ncf);
                    }
                    self.ipup = false;
                    self.rc = 1.0;
                    self.nslp = self.nst;
                    self.conv_rate = 0.7;
                }
                for i in 1..=n {
                    self.acor[i] = 0.0;
                }
            }
            if self.miter == Corrector::Functional {
                for i in 1..=n {
                    self.savf[i] = self.h * self.savf[i] - self.yh[2][i];
                    self.y[i] = self.savf[i] - self.acor[i];
                }
                del = weighted_norm(n, &self.y, &self.ewt);
                for i in 1..=n {
                    self.y[i] = self.yh[1][i] + self.el[1] * self.savf[i];
                    self.acor[i] = self.savf[i];
                }
            } else {
                for i in 1..=n {
                    self.y[i] = self.h * self.savf[i] - (self.yh[2][i] + self.acor[i]);
                }
                lu_solve(&self.wm, n, &self.ipvt, &mut self.y);
                del = weighted_norm(n, &self.y, &self.ewt);
                for i in 1..=n {
                    self.acor[i] += self.y[i];
                    self.y[i] = self.yh[1][i] + self.el[1] * self.acor[i];
                }
            }

            if del <= 100.0 * pnorm * ETA {
                break;
            }
            if m != 0 || self.meth == Method::Bdf {
                if m != 0 {
                    let rm = if del <= 1024.0 * delp { del / delp } else { 1024.0 };
                    rate = rate.max(rm);
                    self.conv_rate = (0.2 * self.conv_rate).max(rm);
                }
                let dcon = del * 1.0_f64.min(1.5 * self.conv_rate)
                    / (self.tesco[self.nq][2] * self.conit);
                if dcon <= 1.0 {
                    self.pdest = self.pdest.max(rate / (self.h * self.el[1]).abs());
                    if self.pdest != 0.0 {
                        self.pdlast = self.pdest;
                    }
                    break;
                }
            }

            m += 1;
            if m == MAXCOR || (m >= 2 && del > 2.0 * delp) {
                if self.miter == Corrector::Functional || self.jcur {
                    return self.corrector_failure(told, ncf);
                }
                // the Jacobian was stale; refresh it and restart the
                // iteration from the prediction
                self.ipup = true;
                m = 0;
                rate = 0.0;
                for i in 1..=n {
                    self.y[i] = self.yh[1][i];
                }
                call_rhs(system, self.tn, &self.y, &mut self.savf);
                self.nfe += 1;
            } else {
                delp = del;
                call_rhs(system, self.tn, &self.y, &mut self.savf);
                self.nfe += 1;
            }
        }
        Corrected::Converged { m, del }
    }

    fn corrector_failure(&mut self, told: f64, ncf: &mut usize) -> Corrected {
        *ncf += 1;
        self.rmax = 2.0;
        self.tn = told;
        self.undo_prediction();
        if self.h.abs() <= self.opts.hmin * 1.00001 || *ncf == MXNCF {
            return Corrected::GiveUp;
        }
        self.ipup = self.miter == Corrector::Chord;
        Corrected::Retry { rh: 0.25 }
    }

    /// Build and factor the iteration matrix P = I - h*el0*J with a
    /// forward-difference Jacobian. Errors when the factorization hits a
    /// zero pivot.
    fn form_jacobian<S: OdeSystem + ?Sized>(&mut self, system: &mut S) -> Result<(), ()> {
        let n = self.n;
        self.nje += 1;
        self.jcur = true;
        let hl0 = self.h * self.el0;
        let fac = weighted_norm(n, &self.savf, &self.ewt);
        let mut r0 = 1000.0 * self.h.abs() * ETA * n as f64 * fac;
        if r0 == 0.0 {
            r0 = 1.0;
        }
        let sqrteta = ETA.sqrt();
        for j in 1..=n {
            let yj = self.y[j];
            let r = (sqrteta * yj.abs()).max(r0 / self.ewt[j]);
            self.y[j] += r;
            let fac = -hl0 / r;
            call_rhs(system, self.tn, &self.y, &mut self.acor);
            for i in 1..=n {
                self.wm[(i, j)] = (self.acor[i] - self.savf[i]) * fac;
            }
            self.y[j] = yj;
        }
        self.nfe += n;
        // norm of the scaled Jacobian, used by the stiffness detector
        self.pdnorm = weighted_matrix_norm(n, &self.wm, &self.ewt) / hl0.abs();
        for i in 1..=n {
            self.wm[(i, i)] += 1.0;
        }
        match lu_factorize(&mut self.wm, n, &mut self.ipvt) {
            None => Ok(()),
            Some(_) => Err(()),
        }
    }

    /// Candidate step ratios at orders nq-1, nq and nq+1; pick the largest
    /// and commit an order change when it wins. `rhup` is zero on failure
    /// paths so the order can only hold or drop.
    fn select_order(&mut self, rhup: f64, dsm: f64) -> (OrderFlag, f64) {
        let mut rhup = rhup;
        let exsm = 1.0 / self.l as f64;
        let mut rhsm = 1.0 / (1.2 * dsm.powf(exsm) + 0.0000012);
        let mut rhdn = 0.0;
        if self.nq != 1 {
            let ddn =
                weighted_norm(self.n, &self.yh[self.l], &self.ewt) / self.tesco[self.nq][1];
            let exdn = 1.0 / self.nq as f64;
            rhdn = 1.0 / (1.3 * ddn.powf(exdn) + 0.0000013);
        }
        // Adams candidates are limited by the stability region as well
        if self.meth == Method::Adams {
            let pdh = (self.h.abs() * self.pdlast).max(0.000001);
            if self.l < self.lmax {
                rhup = rhup.min(SM1[self.l] / pdh);
            }
            rhsm = rhsm.min(SM1[self.nq] / pdh);
            if self.nq > 1 {
                rhdn = rhdn.min(SM1[self.nq - 1] / pdh);
            }
            self.pdest = 0.0;
        }

        let newq;
        let mut rh;
        if rhsm >= rhup {
            if rhsm >= rhdn {
                newq = self.nq;
                rh = rhsm;
            } else {
                newq = self.nq - 1;
                rh = rhdn;
                if self.kflag < 0 && rh > 1.0 {
                    rh = 1.0;
                }
            }
        } else if rhup <= rhdn {
            newq = self.nq - 1;
            rh = rhdn;
            if self.kflag < 0 && rh > 1.0 {
                rh = 1.0;
            }
        } else {
            rh = rhup;
            if rh >= 1.1 {
                let r = self.el[self.l] / self.l as f64;
                self.nq = self.l;
                self.l = self.nq + 1;
                for i in 1..=self.n {
                    self.yh[self.l][i] = self.acor[i] * r;
                }
                return (OrderFlag::OrderChange, rh);
            }
            self.ialth = 3;
            return (OrderFlag::NoChange, rh);
        }

        if self.kflag == 0 && rh < 1.1 {
            self.ialth = 3;
            return (OrderFlag::NoChange, rh);
        }
        if self.kflag <= -2 {
            rh = rh.min(0.2);
        }
        if newq == self.nq {
            return (OrderFlag::StepChange, rh);
        }
        self.nq = newq;
        self.l = self.nq + 1;
        (OrderFlag::OrderChange, rh)
    }

    /// Decide every 20 accepted steps whether the other method family
    /// would allow a decisively larger step; switch when it would.
    /// Returns the step ratio to apply after the switch.
    fn consider_method_switch(&mut self, dsm: f64, pnorm: f64) -> Option<f64> {
        match self.meth {
            Method::Adams => {
                // above order 5 the problem is assumed non-stiff
                if self.nq > 5 {
                    return None;
                }
                let (rh2, nqm2) = if dsm <= 100.0 * pnorm * ETA || self.pdest == 0.0 {
                    // error estimate polluted by roundoff: switch only if
                    // the last step was stability-restricted, and double h
                    if !self.irflag {
                        return None;
                    }
                    (2.0, self.nq.min(self.opts.mxords))
                } else {
                    let exsm = 1.0 / self.l as f64;
                    let mut rh1 = 1.0 / (1.2 * dsm.powf(exsm) + 0.0000012);
                    let mut rh1it = 2.0 * rh1;
                    let pdh = self.pdlast * self.h.abs();
                    if pdh * rh1 > 0.00001 {
                        rh1it = SM1[self.nq] / pdh;
                    }
                    rh1 = rh1.min(rh1it);
                    let (rh2, nqm2) = if self.nq > self.opts.mxords {
                        let nqm2 = self.opts.mxords;
                        let lm2 = nqm2 + 1;
                        let exm2 = 1.0 / lm2 as f64;
                        let dm2 = weighted_norm(self.n, &self.yh[lm2 + 1], &self.ewt)
                            / self.cm2[nqm2];
                        (1.0 / (1.2 * dm2.powf(exm2) + 0.0000012), nqm2)
                    } else {
                        let dm2 = dsm * (self.cm1[self.nq] / self.cm2[self.nq]);
                        (1.0 / (1.2 * dm2.powf(exsm) + 0.0000012), self.nq)
                    };
                    if rh2 < RATIO * rh1 {
                        return None;
                    }
                    (rh2, nqm2)
                };
                self.icount = 20;
                self.meth = Method::Bdf;
                self.miter = Corrector::Chord;
                self.pdlast = 0.0;
                self.nq = nqm2;
                self.l = self.nq + 1;
                Some(rh2)
            }
            Method::Bdf => {
                let exsm = 1.0 / self.l as f64;
                let (mut rh1, dm1, nqm1, exm1) = if self.opts.mxordn < self.nq {
                    let nqm1 = self.opts.mxordn;
                    let lm1 = nqm1 + 1;
                    let exm1 = 1.0 / lm1 as f64;
                    let dm1 = weighted_norm(self.n, &self.yh[lm1 + 1], &self.ewt)
                        / self.cm1[nqm1];
                    (1.0 / (1.2 * dm1.powf(exm1) + 0.0000012), dm1, nqm1, exm1)
                } else {
                    let dm1 = dsm * (self.cm2[self.nq] / self.cm1[self.nq]);
                    (1.0 / (1.2 * dm1.powf(exsm) + 0.0000012), dm1, self.nq, exsm)
                };
                let mut rh1it = 2.0 * rh1;
                let pdh = self.pdnorm * self.h.abs();
                if pdh * rh1 > 0.00001 {
                    rh1it = SM1[nqm1] / pdh;
                }
                rh1 = rh1.min(rh1it);
                let rh2 = 1.0 / (1.2 * dsm.powf(exsm) + 0.0000012);
                if rh1 * RATIO < 5.0 * rh2 {
                    return None;
                }
                // stay with bdf when the Adams step would be small enough
                // for roundoff to pollute the error estimate
                let alpha = rh1.max(0.001);
                if dm1 * alpha.powf(exm1) <= 1000.0 * ETA * pnorm {
                    return None;
                }
                self.icount = 20;
                self.meth = Method::Adams;
                self.miter = Corrector::Functional;
                self.pdlast = 0.0;
                self.nq = nqm1;
                self.l = self.nq + 1;
                Some(rh1)
            }
        }
    }

    /// Apply a step-ratio change: clamp against rmax, hmax and the Adams
    /// stability region, rescale the Nordsieck rows by powers of the
    /// ratio, and hold h for the next l steps.
    pub(crate) fn rescale_h(&mut self, rh: f64) {
        let mut rh = rh.min(self.rmax);
        rh /= 1.0_f64.max(self.h.abs() * self.hmxi * rh);
        if self.meth == Method::Adams {
            self.irflag = false;
            let pdh = (self.h.abs() * self.pdlast).max(0.000001);
            if rh * pdh * 1.00001 >= SM1[self.nq] {
                rh = SM1[self.nq] / pdh;
                self.irflag = true;
            }
        }
        let mut r = 1.0;
        for j in 2..=self.l {
            r *= rh;
            self.yh[j] *= r;
        }
        self.h *= rh;
        self.rc *= rh;
        self.ialth = self.l as i32;
    }

    /// Reload the compact el vector after any order or method change.
    pub(crate) fn reset_coeffs(&mut self) {
        for i in 1..=self.l {
            self.el[i] = self.elco[self.nq][i];
        }
        self.rc = self.rc * self.el[1] / self.el0;
        self.el0 = self.el[1];
        self.conit = 0.5 / (self.nq as f64 + 2.0);
    }

    /// Scale the accumulated correction into the local error estimate and
    /// remember the step size actually used.
    fn finalize_step(&mut self) {
        let r = 1.0 / self.tesco[self.nqu][2];
        for i in 1..=self.n {
            self.acor[i] *= r;
        }
        self.hold = self.h;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode_solver::options::{SolverOptions, Tolerances};
    use nalgebra::DVector;

    fn context(n: usize, nq: usize) -> Lsoda {
        let mut s = Lsoda::new(Tolerances::scalar(1e-6, 1e-8), SolverOptions::default());
        s.alloc(n);
        s.nq = nq;
        s.l = nq + 1;
        s.lmax = 13;
        for (j, row) in s.yh.iter_mut().enumerate() {
            for i in 1..=n {
                row[i] = (j * 10 + i) as f64 * 0.37 + 0.11;
            }
        }
        s
    }

    #[test]
    fn predictor_undo_is_bit_exact() {
        let mut s = context(3, 4);
        let before: Vec<DVector<f64>> = s.yh.clone();
        s.predict();
        assert_ne!(before[1], s.yh[1]);
        s.undo_prediction();
        for (orig, now) in before.iter().zip(&s.yh) {
            assert_eq!(orig, now);
        }
    }

    #[test]
    fn predictor_realises_pascal_matrix() {
        let mut s = context(1, 2);
        let (r1, r2, r3) = (s.yh[1][1], s.yh[2][1], s.yh[3][1]);
        s.predict();
        // order 2 Pascal update: rows gain binomial combinations of the
        // higher rows
        assert_eq!(s.yh[1][1], r1 + r2 + r3);
        assert_eq!(s.yh[2][1], r2 + 2.0 * r3);
        assert_eq!(s.yh[3][1], r3);
    }

    #[test]
    fn rescale_scales_rows_geometrically() {
        let mut s = context(2, 2);
        s.meth = Method::Bdf;
        s.h = 1.0;
        s.hold = 1.0;
        s.rmax = 10.0;
        let r2 = s.yh[2].clone();
        let r3 = s.yh[3].clone();
        s.rescale_h(0.5);
        assert_eq!(s.h, 0.5);
        for i in 1..=2 {
            assert_eq!(s.yh[2][i], r2[i] * 0.5);
            assert_eq!(s.yh[3][i], r3[i] * 0.25);
        }
        assert_eq!(s.ialth, 3);
    }

    #[test]
    fn reset_coeffs_tracks_order() {
        let mut s = context(1, 2);
        compute_coeffs(Method::Bdf, &mut s.elco, &mut s.tesco);
        s.el0 = 1.0;
        s.rc = 1.0;
        s.reset_coeffs();
        assert_eq!(s.el[1], 2.0 / 3.0);
        assert_eq!(s.el0, 2.0 / 3.0);
        assert_eq!(s.conit, 0.5 / 4.0);
    }
}
