//! Time-domain SNR across trials.
//!
//! `data`: [trials, T]
//!
//! ```text
//! μ[t]       = mean over trials of data[:, t]
//! signal[t]  = μ[t]²
//! noise[t]   = mean over trials of (data[:, t] − μ[t])²      (ddof = 0)
//! snr[t]     = signal[t] / noise[t]
//! ```
//!
//! Zero noise power is not special-cased: identical trials give `+inf`
//! (or `NaN` when the mean is also zero).  Callers compare scores with
//! NaN-aware rules instead of filtering here.
use ndarray::{Array1, ArrayView2, Axis};

/// Per-sample SNR curve, shape [T].
///
/// Deviations are taken from the first trial before averaging, so a batch of
/// identical trials has exactly zero noise power.
pub fn snr_time(data: ArrayView2<'_, f64>) -> Array1<f64> {
    let n_trials = data.nrows();
    if n_trials == 0 {
        return Array1::from_elem(data.ncols(), f64::NAN);
    }
    let pivot = data.row(0);
    let shifted = &data - &pivot;
    let offset = shifted.sum_axis(Axis(0)) / n_trials as f64;
    let noise = (&shifted - &offset).mapv(|v| v * v).sum_axis(Axis(0)) / n_trials as f64;
    let signal = (&pivot + &offset).mapv(|m| m * m);
    signal / noise
}

/// Mean of [`snr_time`] over time.  The scalar every search comparison uses.
///
/// `NaN` if `data` has no time samples.
pub fn mean_snr(data: ArrayView2<'_, f64>) -> f64 {
    snr_time(data).mean().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn two_trial_hand_computed() {
        let data = array![[1.0, 2.0], [3.0, 4.0]];
        let snr = snr_time(data.view());
        approx::assert_abs_diff_eq!(snr[0], 4.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(snr[1], 9.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(mean_snr(data.view()), 6.5, epsilon = 1e-12);
    }

    #[test]
    fn identical_trials_give_infinity() {
        let data = Array2::from_shape_fn((8, 20), |(_, t)| (t as f64 * 0.3).sin() + 2.0);
        for &v in snr_time(data.view()).iter() {
            assert!(v.is_infinite() && v > 0.0, "expected +inf, got {v}");
        }
    }

    #[test]
    fn all_zero_gives_nan() {
        let data = Array2::<f64>::zeros((4, 5));
        assert!(snr_time(data.view()).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn no_samples_gives_nan_mean() {
        let data = Array2::<f64>::zeros((4, 0));
        assert!(mean_snr(data.view()).is_nan());
    }
}
