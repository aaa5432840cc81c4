//! Template detection by Pearson correlation.
//!
//! Every trial of every event class is correlated with one template per
//! class; the class whose template correlates best is the prediction.  This
//! is how extracted waveforms are scored for single-trial classification.
use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::error::{check_non_empty, check_shape, Result};
use crate::search::best_position;

#[derive(Debug, Clone)]
pub struct Detection {
    /// Correlation of trial `j` of event `i` with template `k`:
    /// [events, trials, templates].
    pub correlation: Array3<f64>,
    /// Predicted template per trial: [events, trials].
    pub predictions: Array2<usize>,
    /// Number of trials predicted as their own event.
    pub correct: usize,
}

impl Detection {
    /// Fraction of trials predicted correctly.
    pub fn accuracy(&self) -> f64 {
        self.correct as f64 / self.predictions.len() as f64
    }
}

/// Pearson correlation coefficient of two equal-length series.
///
/// NaN when either series has zero variance.
pub fn pearson(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let n = a.len() as f64;
    let ma = a.sum() / n;
    let mb = b.sum() / n;
    let (mut sab, mut saa, mut sbb) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x - ma, y - mb);
        sab += dx * dy;
        saa += dx * dx;
        sbb += dy * dy;
    }
    sab / (saa * sbb).sqrt()
}

/// Classify every trial of `test_data` [events, trials, T] against
/// `templates` [events, T].
pub fn corr_detect(test_data: ArrayView3<'_, f64>, templates: ArrayView2<'_, f64>) -> Result<Detection> {
    let (n_events, n_trials, n_times) = test_data.dim();
    check_non_empty("events", n_events)?;
    check_non_empty("trials", n_trials)?;
    check_non_empty("samples", n_times)?;
    check_shape("templates", &[n_events, n_times], templates.shape())?;

    let mut correlation = Array3::<f64>::zeros((n_events, n_trials, n_events));
    for ((event, trial, template), r) in correlation.indexed_iter_mut() {
        *r = pearson(
            test_data.slice(s![event, trial, ..]),
            templates.index_axis(Axis(0), template),
        );
    }

    let mut predictions = Array2::<usize>::zeros((n_events, n_trials));
    let mut correct = 0;
    for ((event, trial), p) in predictions.indexed_iter_mut() {
        let row = correlation.slice(s![event, trial, ..]).to_vec();
        *p = best_position(&row).unwrap_or(0);
        if *p == event {
            correct += 1;
        }
    }
    tracing::debug!(n_events, n_trials, correct, "template detection");

    Ok(Detection { correlation, predictions, correct })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    #[test]
    fn pearson_basics() {
        let a = array![1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(pearson(a.view(), a.mapv(|v| 2.0 * v + 1.0).view()), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pearson(a.view(), a.mapv(|v| -v).view()), -1.0, epsilon = 1e-12);
        assert!(pearson(a.view(), Array1::from_elem(4, 3.0).view()).is_nan());
    }

    #[test]
    fn trials_match_their_own_template() {
        let templates = Array2::from_shape_fn((3, 40), |(e, t)| ((e + 1) as f64 * t as f64 * 0.2).sin());
        let test = Array3::from_shape_fn((3, 5, 40), |(e, tr, t)| {
            templates[[e, t]] + 0.05 * ((tr * 31 + t * 7) as f64).cos()
        });
        let det = corr_detect(test.view(), templates.view()).unwrap();
        assert_eq!(det.correlation.dim(), (3, 5, 3));
        assert_eq!(det.correct, 15);
        assert_eq!(det.accuracy(), 1.0);
        assert_eq!(det.predictions.row(2).to_vec(), vec![2; 5]);
    }

    #[test]
    fn template_length_must_match() {
        let test = Array3::<f64>::zeros((2, 3, 10));
        let templates = Array2::<f64>::zeros((2, 9));
        assert!(corr_detect(test.view(), templates.view()).is_err());
    }
}
