//! Pre-sized stack of channel waveforms fed to the regression.
//!
//! The search engine scores long runs of subsets that share a prefix with
//! the previous one (the accepted set plus one candidate, or the accepted set
//! minus one channel).  [`FeatureStack`] keeps the rows of the last subset it
//! was loaded with and only rewrites the slots after the first difference,
//! so the buffers are allocated once per search.
//!
//! Layout: slot `k` of `background` / `signal` holds channel `rows[k]`,
//! shape [capacity, trials, T].
use ndarray::{s, Array3, ArrayView3, Axis};

#[derive(Debug, Clone)]
pub struct FeatureStack {
    background: Array3<f64>,
    signal: Array3<f64>,
    rows: Vec<usize>,
}

impl FeatureStack {
    /// Empty stack able to hold `capacity` channels.
    pub fn new(capacity: usize, n_trials: usize, n_background: usize, n_signal: usize) -> Self {
        Self {
            background: Array3::zeros((capacity, n_trials, n_background)),
            signal: Array3::zeros((capacity, n_trials, n_signal)),
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.background.len_of(Axis(0))
    }

    /// Source channels currently stacked, in slot order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Make the stack hold exactly `subset`, copying channel data from
    /// `background` / `signal` ([channels, trials, T]).
    ///
    /// Returns the number of slots that had to be rewritten.
    ///
    /// # Panics
    /// If `subset` is longer than [`capacity`](Self::capacity) or names a
    /// channel outside the source arrays.
    pub fn load(
        &mut self,
        subset: &[usize],
        background: ArrayView3<'_, f64>,
        signal: ArrayView3<'_, f64>,
    ) -> usize {
        let keep = self
            .rows
            .iter()
            .zip(subset)
            .take_while(|(held, wanted)| held == wanted)
            .count();
        self.rows.truncate(keep);
        for &channel in &subset[keep..] {
            let slot = self.rows.len();
            self.background
                .index_axis_mut(Axis(0), slot)
                .assign(&background.index_axis(Axis(0), channel));
            self.signal
                .index_axis_mut(Axis(0), slot)
                .assign(&signal.index_axis(Axis(0), channel));
            self.rows.push(channel);
        }
        subset.len() - keep
    }

    /// Views of the filled slots: ([n, trials, T_bg], [n, trials, T_sig]).
    pub fn views(&self) -> (ArrayView3<'_, f64>, ArrayView3<'_, f64>) {
        let n = self.rows.len();
        (
            self.background.slice(s![..n, .., ..]),
            self.signal.slice(s![..n, .., ..]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> (Array3<f64>, Array3<f64>) {
        let bg = Array3::from_shape_fn((5, 2, 3), |(c, tr, t)| (c * 100 + tr * 10 + t) as f64);
        let sig = bg.mapv(|v| -v);
        (bg, sig)
    }

    #[test]
    fn shared_prefix_is_not_rewritten() {
        let (bg, sig) = source();
        let mut stack = FeatureStack::new(5, 2, 3, 3);
        assert_eq!(stack.load(&[0, 1, 2], bg.view(), sig.view()), 3);
        assert_eq!(stack.load(&[0, 1, 4], bg.view(), sig.view()), 1);
        assert_eq!(stack.load(&[0, 1], bg.view(), sig.view()), 0);
        assert_eq!(stack.load(&[1, 4], bg.view(), sig.view()), 2);
        assert_eq!(stack.rows(), &[1, 4]);
    }

    #[test]
    fn views_match_source_channels() {
        let (bg, sig) = source();
        let mut stack = FeatureStack::new(5, 2, 3, 3);
        stack.load(&[3, 0, 1], bg.view(), sig.view());
        stack.load(&[3, 4], bg.view(), sig.view());
        let (vb, vs) = stack.views();
        assert_eq!(vb.shape(), &[2, 2, 3]);
        assert_eq!(vb.index_axis(Axis(0), 0), bg.index_axis(Axis(0), 3));
        assert_eq!(vb.index_axis(Axis(0), 1), bg.index_axis(Axis(0), 4));
        assert_eq!(vs.index_axis(Axis(0), 1), sig.index_axis(Axis(0), 4));
    }
}
