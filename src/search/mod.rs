//! Greedy channel-subset search.
//!
//! Three strategies pick the channels whose regression model best extracts
//! the signal, measured as
//!
//! ```text
//! delta(subset) = mean_t snr_time(residual(subset)) − msnr
//! ```
//!
//! - [`backward`]: start from every channel, drop the least useful one per
//!   round until one is left, then add back the last few removed.
//! - [`forward`]: start empty, add the most useful channel per round, stop
//!   when a round's delta falls below the best seen so far.
//! - [`stepwise`]: forward addition plus a remove-one/add-one swap attempt
//!   after every accepted round.
//!
//! Strategies work on channel *indices* and talk to the data only through
//! the [`Scorer`] trait; [`ExtractionScorer`] is the regression-backed
//! implementation.  Labels are attached at the end by [`Selection::label`].
//!
//! # Tie-break
//! Every choice takes the maximum score, preferring the **largest position**
//! among equal scores.  NaN never beats a number.  Published channel sets
//! depend on this rule; do not change it to first-of-maximum.
pub mod backward;
pub mod forward;
mod input;
mod observe;
pub mod stepwise;

pub use input::{ExtractionScorer, SearchInput};
pub use observe::{Action, CancelFlag, NoopObserver, RoundEvent, SearchObserver};

pub(crate) use observe::{check_cancel, report};

use serde::{Deserialize, Serialize};

use crate::config::{SearchConfig, Strategy};
use crate::error::{Error, Result};

/// Scores an ordered channel subset.
///
/// The value is the SNR gain over the baseline; larger is better.  Any
/// `FnMut(&[usize]) -> Result<f64>` is a scorer, which is handy for driving
/// the strategies from precomputed tables.
pub trait Scorer {
    fn score(&mut self, subset: &[usize]) -> Result<f64>;
}

impl<F> Scorer for F
where
    F: FnMut(&[usize]) -> Result<f64>,
{
    fn score(&mut self, subset: &[usize]) -> Result<f64> {
        self(subset)
    }
}

/// Index-level result of one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub strategy: Strategy,
    /// Selected channel indices, in the order the search settled on them.
    pub indices: Vec<usize>,
    /// Delta recorded at every accepted step (removal, addition or swap),
    /// including a final regressing addition that is not part of `indices`.
    pub snr_change: Vec<f64>,
    /// Rounds run.
    pub rounds: usize,
}

impl Selection {
    /// Attach channel labels.
    pub fn label<L: Clone>(self, channels: &[L]) -> SearchOutcome<L> {
        SearchOutcome {
            strategy: self.strategy,
            channels: self.indices.iter().map(|&i| channels[i].clone()).collect(),
            indices: self.indices,
            snr_change: self.snr_change,
            rounds: self.rounds,
        }
    }
}

/// Labelled result of one search, as handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome<L> {
    pub strategy: Strategy,
    pub channels: Vec<L>,
    pub indices: Vec<usize>,
    pub snr_change: Vec<f64>,
    pub rounds: usize,
}

/// Run the strategy named in `cfg` on `input`.
pub fn run<L: Clone + PartialEq>(
    input: &SearchInput<'_, L>,
    cfg: &SearchConfig,
    observer: &mut dyn SearchObserver,
) -> Result<SearchOutcome<L>> {
    let mut scorer = ExtractionScorer::new(input)?;
    let n = input.n_channels();
    let selection = match cfg.strategy {
        Strategy::Backward => backward::search(n, cfg.retained_margin, &mut scorer, observer)?,
        Strategy::Forward => forward::search(n, &mut scorer, observer)?,
        Strategy::Stepwise => stepwise::search(n, &mut scorer, observer)?,
    };
    tracing::info!(
        strategy = %cfg.strategy,
        rounds = selection.rounds,
        evaluations = scorer.evaluations(),
        "search finished"
    );
    Ok(selection.label(input.channels))
}

/// Position of the maximum score, preferring the last position among ties.
///
/// NaN loses to every number; if every score is NaN the last position wins.
/// `None` only for an empty slice.
///
/// ```
/// use mcee::search::best_position;
/// assert_eq!(best_position(&[1.0, 3.0, 2.0, 3.0]), Some(3));
/// assert_eq!(best_position(&[f64::NAN, 0.5, f64::NAN]), Some(1));
/// assert_eq!(best_position(&[]), None);
/// ```
pub fn best_position(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &s) in scores.iter().enumerate() {
        best = match best {
            Some(b) if !(s >= scores[b] || scores[b].is_nan()) => Some(b),
            _ => Some(i),
        };
    }
    best
}

/// Largest delta in `trace`, ignoring NaN; `-inf` when there is none.
pub(crate) fn best_so_far(trace: &[f64]) -> f64 {
    trace.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// True when `delta` failed to reach `best_prior` (a NaN delta always fails).
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub(crate) fn regressed(delta: f64, best_prior: f64) -> bool {
    !(delta >= best_prior)
}

pub(crate) fn check_channel_count(strategy: Strategy, n_channels: usize) -> Result<()> {
    let need = strategy.min_channels();
    if n_channels < need {
        return Err(Error::TooFewChannels { strategy, need, got: n_channels });
    }
    Ok(())
}

/// Score `base + [candidate]` for every candidate.
///
/// Returns the winning position in `candidates` and its delta, or `None` when
/// there are no candidates.
pub(crate) fn best_addition(
    scorer: &mut dyn Scorer,
    base: &[usize],
    candidates: &[usize],
) -> Result<Option<(usize, f64)>> {
    let mut subset = Vec::with_capacity(base.len() + 1);
    subset.extend_from_slice(base);
    subset.push(0);
    let last = base.len();

    let mut scores = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        subset[last] = candidate;
        scores.push(scorer.score(&subset)?);
    }
    Ok(best_position(&scores).map(|p| (p, scores[p])))
}

/// `channels` without the element at `skip`, written into `out`.
pub(crate) fn without(channels: &[usize], skip: usize, out: &mut Vec<usize>) {
    out.clear();
    out.extend(
        channels
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip)
            .map(|(_, &c)| c),
    );
}
