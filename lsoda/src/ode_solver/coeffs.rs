//! Method coefficient tables.
//!
//! `elco[nq][1..=nq+1]` holds the corrector polynomial coefficients at order
//! nq and `tesco[nq][1..=3]` the error-test constants used at trial orders
//! nq-1, nq and nq+1. Both are generated from the method's generating
//! polynomial: for the Adams methods p(x) = (x+1)(x+2)...(x+nq-1) integrated
//! over [-1, 0], for the BDF methods p(x) = (x+1)(x+2)...(x+nq) normalised
//! by its linear coefficient. Regenerated whenever the method changes.

use super::options::Method;

/// Highest Adams-Moulton order.
pub(crate) const MAX_ADAMS_ORDER: usize = 12;
/// Highest BDF order.
pub(crate) const MAX_BDF_ORDER: usize = 5;

pub(crate) type Elco = [[f64; 14]; 13];
pub(crate) type Tesco = [[f64; 4]; 13];

/// Adams stability-region bounds, indexed by order. `sm1[nq]` bounds
/// |h| * (spectral radius estimate) for absolute stability at order nq.
pub(crate) const SM1: [f64; 13] = [
    0.0, 0.5, 0.575, 0.55, 0.45, 0.35, 0.25, 0.2, 0.15, 0.1, 0.075, 0.05, 0.025,
];

/// Fill `elco` and `tesco` for the given method family.
pub(crate) fn compute_coeffs(meth: Method, elco: &mut Elco, tesco: &mut Tesco) {
    let mut pc = [0.0_f64; 14];
    match meth {
        Method::Adams => {
            elco[1][1] = 1.0;
            elco[1][2] = 1.0;
            tesco[1][1] = 0.0;
            tesco[1][2] = 2.0;
            tesco[2][1] = 1.0;
            tesco[12][3] = 0.0;
            let mut rqfac = 1.0;
            pc[1] = 1.0;
            for nq in 2..=MAX_ADAMS_ORDER {
                // pc holds the coefficients of p(x) = (x+1)(x+2)...(x+nq-1),
                // with pc[i] the coefficient of x^(i-1)
                let rq1fac = rqfac;
                rqfac /= nq as f64;
                let nqm1 = nq - 1;
                let fnqm1 = nqm1 as f64;
                let nqp1 = nq + 1;
                // form coefficients of p(x) * (x + nq - 1)
                pc[nq] = 0.0;
                for ib in 1..=nqm1 {
                    let i = nqp1 - ib;
                    pc[i] = pc[i - 1] + fnqm1 * pc[i];
                }
                pc[1] *= fnqm1;
                // integrate p(x) and x*p(x) over [-1, 0]
                let mut pint = pc[1];
                let mut xpin = pc[1] / 2.0;
                let mut tsign = 1.0;
                for i in 2..=nq {
                    tsign = -tsign;
                    pint += tsign * pc[i] / i as f64;
                    xpin += tsign * pc[i] / (i + 1) as f64;
                }
                elco[nq][1] = pint * rq1fac;
                elco[nq][2] = 1.0;
                for i in 2..=nq {
                    elco[nq][i + 1] = rq1fac * pc[i] / i as f64;
                }
                let agamq = rqfac * xpin;
                let ragq = 1.0 / agamq;
                tesco[nq][2] = ragq;
                if nq < MAX_ADAMS_ORDER {
                    tesco[nqp1][1] = ragq * rqfac / nqp1 as f64;
                }
                tesco[nqm1][3] = ragq;
            }
        }
        Method::Bdf => {
            pc[1] = 1.0;
            let mut rq1fac = 1.0;
            for nq in 1..=MAX_BDF_ORDER {
                let fnq = nq as f64;
                let nqp1 = nq + 1;
                // form coefficients of p(x) * (x + nq)
                pc[nqp1] = 0.0;
                for ib in 1..=nq {
                    let i = nq + 2 - ib;
                    pc[i] = pc[i - 1] + fnq * pc[i];
                }
                pc[1] *= fnq;
                for i in 1..=nqp1 {
                    elco[nq][i] = pc[i] / pc[2];
                }
                elco[nq][2] = 1.0;
                tesco[nq][1] = rq1fac;
                tesco[nq][2] = nqp1 as f64 / elco[nq][1];
                tesco[nq][3] = (nq + 2) as f64 / elco[nq][1];
                rq1fac /= fnq;
            }
        }
    }
}
