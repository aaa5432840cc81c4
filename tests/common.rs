/// Shared synthetic scenarios for the integration tests.
use mcee::{mean_snr, SearchInput};
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Owned arrays for one search, in the caller's [trials, channels, T] layout.
pub struct Scenario {
    pub channels: Vec<String>,
    pub msnr: f64,
    pub background: Array3<f64>,
    pub background_target: Array2<f64>,
    pub signal: Array3<f64>,
    pub signal_target: Array2<f64>,
}

#[allow(unused)]
impl Scenario {
    pub fn input(&self) -> SearchInput<'_, String> {
        SearchInput {
            channels: &self.channels,
            msnr: self.msnr,
            background: self.background.view(),
            background_target: self.background_target.view(),
            signal: self.signal.view(),
            signal_target: self.signal_target.view(),
        }
    }
}

#[allow(unused)]
pub fn labels(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("ch{i}")).collect()
}

pub const TRIALS: usize = 10;
pub const SAMPLES: usize = 50;

/// Four channels, 10 trials, 50 background and 50 signal samples.
///
/// Channels 1–3 are independent sources `z_k` plus a little sensor noise; the
/// target is `1.0·z_1 + 0.8·z_2 + 0.6·z_3`, plus an evoked sine in the signal
/// window.  Channel 0 is unrelated noise that is much louder in the signal
/// window, so any model using it damages the extraction.
#[allow(unused)]
pub fn four_channel(seed: u64) -> Scenario {
    let mut rng = StdRng::seed_from_u64(seed);
    let unit = Normal::new(0.0, 1.0).unwrap();
    let sensor = Normal::new(0.0, 0.05).unwrap();
    let weights = [1.0, 0.8, 0.6];

    let mut window = |evoked: bool| {
        let mut chans = Array3::<f64>::zeros((TRIALS, 4, SAMPLES));
        let mut target = Array2::<f64>::zeros((TRIALS, SAMPLES));
        for trial in 0..TRIALS {
            for t in 0..SAMPLES {
                let z: Vec<f64> = (0..3).map(|_| unit.sample(&mut rng)).collect();
                let gain = if evoked { 50.0 } else { 1.0 };
                chans[[trial, 0, t]] = unit.sample(&mut rng) * gain;
                for k in 0..3 {
                    chans[[trial, k + 1, t]] = z[k] + sensor.sample(&mut rng);
                }
                let erp = if evoked {
                    2.0 * (2.0 * std::f64::consts::PI * t as f64 / 25.0).sin()
                } else {
                    0.0
                };
                target[[trial, t]] = (0..3).map(|k| weights[k] * z[k]).sum::<f64>() + erp;
            }
        }
        (chans, target)
    };
    let (background, background_target) = window(false);
    let (signal, signal_target) = window(true);
    let msnr = mean_snr(signal_target.view());
    Scenario { channels: labels(4), msnr, background, background_target, signal, signal_target }
}

/// Gaussian noise everywhere; the target mixes the first `min(3, n)` channels.
#[allow(unused)]
pub fn random(seed: u64, n_channels: usize, n_trials: usize, n_bg: usize, n_sig: usize) -> Scenario {
    let mut rng = StdRng::seed_from_u64(seed);
    let unit = Normal::new(0.0, 1.0).unwrap();
    let background = Array3::from_shape_simple_fn((n_trials, n_channels, n_bg), || unit.sample(&mut rng));
    let signal = Array3::from_shape_simple_fn((n_trials, n_channels, n_sig), || unit.sample(&mut rng));
    let mix = |data: &Array3<f64>, tr: usize, t: usize| -> f64 {
        (0..n_channels.min(3)).map(|c| data[[tr, c, t]] / (c + 1) as f64).sum()
    };
    let background_target =
        Array2::from_shape_fn((n_trials, n_bg), |(tr, t)| mix(&background, tr, t) + 0.3 * (t as f64).cos());
    let signal_target =
        Array2::from_shape_fn((n_trials, n_sig), |(tr, t)| mix(&signal, tr, t) + (t as f64 * 0.4).sin());
    let msnr = mean_snr(signal_target.view());
    Scenario {
        channels: labels(n_channels),
        msnr,
        background,
        background_target,
        signal,
        signal_target,
    }
}

/// True when `selected` is non-empty, duplicate-free and drawn from `all`.
#[allow(unused)]
pub fn is_valid_subset(selected: &[String], all: &[String]) -> bool {
    let mut seen = std::collections::HashSet::new();
    !selected.is_empty()
        && selected.len() <= all.len()
        && selected.iter().all(|c| all.contains(c) && seen.insert(c))
}
