/// Integration tests for the time-domain SNR scorer.
mod common;

use approx::assert_abs_diff_eq;
use common::random;
use mcee::{mean_snr, snr_time};
use ndarray::{Array1, Array2, Axis};

#[test]
fn identical_trials_are_infinite() {
    let row = Array1::from_shape_fn(64, |t| (t as f64 * 0.3).sin() + 0.1);
    let data = Array2::from_shape_fn((20, 64), |(_, t)| row[t]);
    let snr = snr_time(data.view());
    assert!(snr.iter().all(|v| *v == f64::INFINITY), "{snr:?}");
    assert_eq!(mean_snr(data.view()), f64::INFINITY);
}

#[test]
fn identical_zero_trials_are_nan() {
    let data = Array2::<f64>::zeros((5, 8));
    assert!(snr_time(data.view()).iter().all(|v| v.is_nan()));
}

#[test]
fn matches_textbook_formula() {
    let sc = random(5, 1, 25, 1, 80);
    let data = sc.signal_target.view();
    let mean = data.mean_axis(Axis(0)).unwrap();
    let var = data.var_axis(Axis(0), 0.0);
    let expected = mean.mapv(|m| m * m) / var;
    let got = snr_time(data);
    for (g, e) in got.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*g, *e, epsilon = 1e-9 * e.abs().max(1.0));
    }
    assert_abs_diff_eq!(mean_snr(data), expected.mean().unwrap(), epsilon = 1e-9);
}

#[test]
fn averaging_more_signal_raises_snr() {
    let noise = random(9, 1, 30, 1, 50).signal;
    let evoked = |gain: f64| {
        Array2::from_shape_fn((30, 50), |(tr, t)| gain * (t as f64 * 0.25).sin() + noise[[tr, 0, t]])
    };
    assert!(mean_snr(evoked(3.0).view()) > mean_snr(evoked(1.0).view()));
}
