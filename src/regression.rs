//! Per-trial multi-linear regression and noise extraction.
//!
//! For every trial independently:
//!
//! ```text
//! fit     target_bg[t] ≈ b0 + Σ_k b_k · x_bg[k, t]         (ordinary least squares,
//!                                                           one observation per sample)
//! apply   estimate[t]  = b0 + Σ_k b_k · x_sig[k, t]
//!         residual[t]  = target_sig[t] − estimate[t]
//! ```
//!
//! The fit centres the design matrix and the target, solves the centred
//! problem with an SVD (minimum-norm solution, singular values below
//! `ε · max(n_obs, n_feat) · σ_max` treated as zero) and recovers the
//! intercept from the means.  Collinear or constant predictors therefore
//! get a well-defined coefficient instead of an error.
//!
//! Axis conventions: predictors are [features, trials, T], targets are
//! [trials, T].  Any inconsistency is reported as
//! [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) before any work is
//! done; nothing is broadcast.
use nalgebra::{DMatrix, DVector, SVD};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::error::{check_non_empty, check_shape, Result};

/// Iteration cap for the SVD; non-convergence yields NaN coefficients.
const MAX_SVD_ITERATIONS: usize = 10_000;

/// Intercept and coefficients of one trial's fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    /// One coefficient per feature, in feature order.
    pub coef: Array1<f64>,
}

impl LinearFit {
    /// Apply the model to `x` ([features, T]), returning [T].
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.t().dot(&self.coef) + self.intercept
    }
}

/// Output of [`extract`]: both [trials, T_signal].
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// `eval_target − estimate`: the extracted waveform.
    pub residual: Array2<f64>,
    /// The model's noise estimate.
    pub estimate: Array2<f64>,
}

/// Fit `y` ([T]) from `x` ([features, T]) by ordinary least squares with an
/// intercept.
///
/// Non-finite input, or an SVD that fails to converge, produces NaN
/// coefficients rather than an error.
pub fn fit_trial(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> LinearFit {
    let (n_feat, n_obs) = x.dim();
    let nan_fit = || LinearFit {
        intercept: f64::NAN,
        coef: Array1::from_elem(n_feat, f64::NAN),
    };
    let (Some(x_mean), Some(y_mean)) = (x.mean_axis(Axis(1)), y.mean()) else {
        return nan_fit();
    };

    let design = DMatrix::from_fn(n_obs, n_feat, |i, j| x[[j, i]] - x_mean[j]);
    let rhs = DVector::from_fn(n_obs, |i, _| y[i] - y_mean);

    match solve_min_norm(design, &rhs) {
        Some(b) => {
            let coef = Array1::from_iter(b.iter().copied());
            let intercept = y_mean - coef.dot(&x_mean);
            LinearFit { intercept, coef }
        }
        None => {
            tracing::debug!(n_feat, n_obs, "least-squares solve degenerate, propagating NaN");
            nan_fit()
        }
    }
}

fn solve_min_norm(design: DMatrix<f64>, rhs: &DVector<f64>) -> Option<DVector<f64>> {
    // SVD sorting rejects NaN singular values, so screen the inputs first.
    if design.iter().chain(rhs.iter()).any(|v| !v.is_finite()) {
        return None;
    }
    let scale = design.nrows().max(design.ncols()) as f64;
    let svd = SVD::try_new(design, true, true, f64::EPSILON, MAX_SVD_ITERATIONS)?;
    if svd.singular_values.iter().any(|s| !s.is_finite()) {
        return None;
    }
    let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = (sigma_max * f64::EPSILON * scale).max(f64::MIN_POSITIVE);
    svd.solve(rhs, cutoff).ok()
}

/// Fit on the background window and extract from the signal window.
///
/// * `predictors`       – [features, trials, T_bg]
/// * `predictor_target` – [trials, T_bg]
/// * `eval_predictors`  – [features, trials, T_sig]
/// * `eval_target`      – [trials, T_sig]
///
/// `estimate + residual == eval_target` up to rounding.
pub fn extract(
    predictors: ArrayView3<'_, f64>,
    predictor_target: ArrayView2<'_, f64>,
    eval_predictors: ArrayView3<'_, f64>,
    eval_target: ArrayView2<'_, f64>,
) -> Result<Extraction> {
    let (n_feat, n_trials, n_bg) = predictors.dim();
    let n_sig = eval_target.ncols();
    check_non_empty("predictor features", n_feat)?;
    check_non_empty("trials", n_trials)?;
    check_non_empty("background samples", n_bg)?;
    check_shape("predictor_target", &[n_trials, n_bg], predictor_target.shape())?;
    check_shape("eval_predictors", &[n_feat, n_trials, n_sig], eval_predictors.shape())?;
    check_shape("eval_target", &[n_trials, n_sig], eval_target.shape())?;

    let mut estimate = Array2::<f64>::zeros((n_trials, n_sig));
    for (trial, mut row) in estimate.rows_mut().into_iter().enumerate() {
        let fit = fit_trial(
            predictors.index_axis(Axis(1), trial),
            predictor_target.row(trial),
        );
        row.assign(&fit.predict(eval_predictors.index_axis(Axis(1), trial)));
    }

    let residual = &eval_target - &estimate;
    Ok(Extraction { residual, estimate })
}

/// [`extract`] for a single predictor channel given as [trials, T] arrays.
///
/// The channel is promoted to a one-row feature stack.
pub fn extract_single(
    predictor: ArrayView2<'_, f64>,
    predictor_target: ArrayView2<'_, f64>,
    eval_predictor: ArrayView2<'_, f64>,
    eval_target: ArrayView2<'_, f64>,
) -> Result<Extraction> {
    extract(
        predictor.insert_axis(Axis(0)),
        predictor_target,
        eval_predictor.insert_axis(Axis(0)),
        eval_target,
    )
}
