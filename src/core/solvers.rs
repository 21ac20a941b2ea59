use argmin::core::{CostFunction, Executor, State};
use argmin::solver::brent::BrentOpt;
use roots::{find_root_brent, SimpleConvergency};

/// Brent root search on a bracket known (or hoped) to contain a sign change.
pub(crate) fn root_bracketed(
    func: impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    xtol: f64,
    max_iter: usize,
) -> anyhow::Result<f64> {
    let mut convergency = SimpleConvergency { eps: xtol, max_iter };

    find_root_brent::<f64, _>(a, b, func, &mut convergency).map_err(|e| anyhow::anyhow!(e))
}

/// Root search seeded from a previous solution.
///
/// A narrow bracket around `x0` is tried first; when it does not contain a sign change the
/// search falls back to the full interval `bounds`, which the caller guarantees to bracket
/// the root.
pub(crate) fn root_seeded(
    func: impl Fn(f64) -> f64,
    x0: Option<f64>,
    bounds: (f64, f64),
    xtol: f64,
    max_iter: usize,
) -> anyhow::Result<f64> {
    let guess_interval = 5.; // initial guess for guess interval
    let (lower, upper) = if bounds.0 <= bounds.1 {
        bounds
    } else {
        (bounds.1, bounds.0)
    };

    if let Some(x0) = x0.filter(|x| x.is_finite()) {
        let a = (x0 - guess_interval).max(lower);
        let b = (x0 + guess_interval).min(upper);
        if a < b && func(a) * func(b) <= 0. {
            return root_bracketed(&func, a, b, xtol, max_iter);
        }
    }

    root_bracketed(func, lower, upper, xtol, max_iter)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Minimum {
    pub(crate) x: f64,
    pub(crate) cost: f64,
}

struct ScalarCost<F: Fn(f64) -> f64>(F);

impl<F: Fn(f64) -> f64> CostFunction for ScalarCost<F> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok((self.0)(*param))
    }
}

/// Derivative-free bounded minimisation of a scalar function (Brent's method).
///
/// Returns the best point found; reaching `max_iter` is not an error, the caller decides
/// whether the cost at the returned point is acceptable.
pub(crate) fn minimize_bounded(
    func: impl Fn(f64) -> f64,
    lower: f64,
    upper: f64,
    xtol: f64,
    max_iter: u64,
) -> anyhow::Result<Minimum> {
    let solver = BrentOpt::new(lower, upper).set_tolerance(xtol, xtol);

    let result = Executor::new(ScalarCost(&func), solver)
        .configure(|state| state.max_iters(max_iter))
        .run()?;

    let x = result
        .state()
        .get_best_param()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("bounded minimisation returned no parameter"))?;

    Ok(Minimum { x, cost: func(x) })
}
