use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

use super::Scorer;
use crate::error::{check_non_empty, check_shape, Error, Result};
use crate::regression::{extract, Extraction};
use crate::snr::mean_snr;
use crate::stack::FeatureStack;

/// Arrays and labels for one search run, in the caller's layout.
///
/// * `channels`          – one label per channel, in channel-axis order.
/// * `msnr`              – baseline mean SNR of the unprocessed target.
/// * `background`        – [trials, channels, T_bg]
/// * `background_target` – [trials, T_bg]
/// * `signal`            – [trials, channels, T_sig]
/// * `signal_target`     – [trials, T_sig]
#[derive(Debug, Clone)]
pub struct SearchInput<'a, L> {
    pub channels: &'a [L],
    pub msnr: f64,
    pub background: ArrayView3<'a, f64>,
    pub background_target: ArrayView2<'a, f64>,
    pub signal: ArrayView3<'a, f64>,
    pub signal_target: ArrayView2<'a, f64>,
}

impl<'a, L: PartialEq> SearchInput<'a, L> {
    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// Check that every array agrees on trials, channels and samples, and
    /// that no label repeats.
    pub fn validate(&self) -> Result<()> {
        let (n_trials, n_ch, n_bg) = self.background.dim();
        let n_sig = self.signal.len_of(Axis(2));
        check_non_empty("trials", n_trials)?;
        check_non_empty("channels", n_ch)?;
        check_non_empty("background samples", n_bg)?;
        check_non_empty("signal samples", n_sig)?;
        check_shape("channel labels", &[n_ch], &[self.channels.len()])?;
        check_shape("background_target", &[n_trials, n_bg], self.background_target.shape())?;
        check_shape("signal", &[n_trials, n_ch, n_sig], self.signal.shape())?;
        check_shape("signal_target", &[n_trials, n_sig], self.signal_target.shape())?;

        for (first, label) in self.channels.iter().enumerate() {
            if let Some(offset) = self.channels[first + 1..].iter().position(|l| l == label) {
                return Err(Error::DuplicateChannel { first, second: first + 1 + offset });
            }
        }
        Ok(())
    }

    /// Regression-backed scorer over this input.
    pub fn scorer(&self) -> Result<ExtractionScorer<'a>> {
        ExtractionScorer::new(self)
    }

    /// Fit and apply the model built from `subset` (channel indices, in
    /// model order).  Use this to obtain the extracted waveform once a
    /// search has settled on its channels.
    pub fn extract_subset(&self, subset: &[usize]) -> Result<Extraction> {
        self.validate()?;
        check_subset(subset, self.n_channels(), self.n_channels())?;
        let bg = self.background.select(Axis(1), subset).permuted_axes([1, 0, 2]);
        let sig = self.signal.select(Axis(1), subset).permuted_axes([1, 0, 2]);
        extract(bg.view(), self.background_target, sig.view(), self.signal_target)
    }
}

fn check_subset(subset: &[usize], n_channels: usize, capacity: usize) -> Result<()> {
    check_non_empty("channel subset", subset.len())?;
    if subset.len() > capacity {
        return Err(Error::SubsetTooLarge { len: subset.len(), capacity });
    }
    if let Some(&index) = subset.iter().find(|&&c| c >= n_channels) {
        return Err(Error::ChannelOutOfRange { index, n_channels });
    }
    Ok(())
}

/// [`Scorer`] that runs the per-trial regression and the SNR reduction.
///
/// Channel data is copied once into [channels, trials, T] layout; subsets
/// are assembled in a [`FeatureStack`] that reuses the prefix shared with the
/// previous subset.
#[derive(Debug, Clone)]
pub struct ExtractionScorer<'a> {
    background: Array3<f64>,
    signal: Array3<f64>,
    background_target: ArrayView2<'a, f64>,
    signal_target: ArrayView2<'a, f64>,
    msnr: f64,
    stack: FeatureStack,
    evaluations: usize,
}

impl<'a> ExtractionScorer<'a> {
    pub fn new<L: PartialEq>(input: &SearchInput<'a, L>) -> Result<Self> {
        input.validate()?;
        let background = channel_major(input.background);
        let signal = channel_major(input.signal);
        let (n_ch, n_trials, n_bg) = background.dim();
        let n_sig = signal.len_of(Axis(2));
        Ok(Self {
            background,
            signal,
            background_target: input.background_target,
            signal_target: input.signal_target,
            msnr: input.msnr,
            stack: FeatureStack::new(n_ch, n_trials, n_bg, n_sig),
            evaluations: 0,
        })
    }

    /// Number of regressions run so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

impl Scorer for ExtractionScorer<'_> {
    fn score(&mut self, subset: &[usize]) -> Result<f64> {
        check_subset(subset, self.background.len_of(Axis(0)), self.stack.capacity())?;
        self.stack.load(subset, self.background.view(), self.signal.view());
        let (bg, sig) = self.stack.views();
        let extraction = extract(bg, self.background_target, sig, self.signal_target)?;
        self.evaluations += 1;
        Ok(mean_snr(extraction.residual.view()) - self.msnr)
    }
}

/// [trials, channels, T] → contiguous [channels, trials, T].
fn channel_major(data: ArrayView3<'_, f64>) -> Array3<f64> {
    data.permuted_axes([1, 0, 2]).as_standard_layout().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    struct Arrays {
        bg: Array3<f64>,
        bg_t: Array2<f64>,
        sig: Array3<f64>,
        sig_t: Array2<f64>,
    }

    fn arrays(n_ch: usize) -> Arrays {
        let wave = |tr: usize, c: usize, t: usize| {
            ((tr * 7 + c * 13 + t * 3) as f64 * 0.41).sin()
                + 0.5 * ((c + 1) as f64 * 0.23 * t as f64 + tr as f64).cos()
        };
        let bg = Array3::from_shape_fn((6, n_ch, 20), |(tr, c, t)| wave(tr, c, t));
        let sig = Array3::from_shape_fn((6, n_ch, 15), |(tr, c, t)| wave(tr, c, t + 20));
        // Part of the target is not explained by any channel, so residuals
        // stay well above rounding noise.
        let unexplained = |tr: usize, t: usize| ((tr * 3 + t * 17) as f64 * 0.13).cos() * 0.3;
        let bg_t = Array2::from_shape_fn((6, 20), |(tr, t)| {
            bg[[tr, 0, t]] - 0.5 * bg[[tr, 1, t]] + unexplained(tr, t)
        });
        let sig_t = Array2::from_shape_fn((6, 15), |(tr, t)| {
            sig[[tr, 0, t]] - 0.5 * sig[[tr, 1, t]] + (t as f64 * 0.7).sin() + unexplained(tr, t + 20)
        });
        Arrays { bg, bg_t, sig, sig_t }
    }

    fn input<'a>(a: &'a Arrays, labels: &'a [&'a str]) -> SearchInput<'a, &'a str> {
        SearchInput {
            channels: labels,
            msnr: 0.0,
            background: a.bg.view(),
            background_target: a.bg_t.view(),
            signal: a.sig.view(),
            signal_target: a.sig_t.view(),
        }
    }

    #[test]
    fn label_count_must_match_channel_axis() {
        let a = arrays(3);
        let err = input(&a, &["a", "b"]).validate().unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch { what: "channel labels", expected: vec![3], got: vec![2] }
        );
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let a = arrays(3);
        let err = input(&a, &["a", "b", "a"]).validate().unwrap_err();
        assert_eq!(err, Error::DuplicateChannel { first: 0, second: 2 });
    }

    #[test]
    fn stacked_score_matches_direct_extraction() {
        let a = arrays(3);
        let inp = input(&a, &["a", "b", "c"]);
        let mut scorer = inp.scorer().unwrap();
        for subset in [vec![0], vec![0, 1], vec![0, 2], vec![2, 1, 0], vec![1]] {
            let direct = inp.extract_subset(&subset).unwrap();
            let expected = mean_snr(direct.residual.view());
            let got = scorer.score(&subset).unwrap();
            approx::assert_abs_diff_eq!(got, expected, epsilon = 1e-9 * expected.abs().max(1.0));
        }
        assert_eq!(scorer.evaluations(), 5);
    }

    #[test]
    fn bad_subsets_are_rejected() {
        let a = arrays(3);
        let inp = input(&a, &["a", "b", "c"]);
        let mut scorer = inp.scorer().unwrap();
        assert_eq!(
            scorer.score(&[0, 3]).unwrap_err(),
            Error::ChannelOutOfRange { index: 3, n_channels: 3 }
        );
        assert_eq!(
            scorer.score(&[0, 1, 2, 0]).unwrap_err(),
            Error::SubsetTooLarge { len: 4, capacity: 3 }
        );
        assert_eq!(scorer.score(&[]).unwrap_err(), Error::Empty { what: "channel subset" });
    }
}
