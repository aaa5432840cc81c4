//! Backward elimination.
//!
//! ```text
//! remaining = all channels
//! while |remaining| > 1:
//!     for each i in remaining: score(remaining \ {i})
//!     remove the i with the best score (last position on ties)
//! result = remaining ++ last `retained_margin` removed channels
//! ```
//!
//! Always runs exactly `N − 1` rounds.
use super::{best_position, check_cancel, check_channel_count, report, without};
use super::{Action, RoundEvent, Scorer, SearchObserver, Selection};
use crate::config::Strategy;
use crate::error::Result;

pub fn search(
    n_channels: usize,
    retained_margin: usize,
    scorer: &mut dyn Scorer,
    observer: &mut dyn SearchObserver,
) -> Result<Selection> {
    check_channel_count(Strategy::Backward, n_channels)?;
    tracing::info!(strategy = "backward", n_channels, "search started");

    let mut remaining: Vec<usize> = (0..n_channels).collect();
    let mut removed = Vec::with_capacity(n_channels - 1);
    let mut snr_change = Vec::with_capacity(n_channels - 1);
    let mut subset = Vec::with_capacity(n_channels);
    let mut rounds = 0;

    while remaining.len() > 1 {
        check_cancel(observer, rounds)?;
        rounds += 1;

        let mut scores = Vec::with_capacity(remaining.len());
        for skip in 0..remaining.len() {
            without(&remaining, skip, &mut subset);
            scores.push(scorer.score(&subset)?);
        }
        let Some(pos) = best_position(&scores) else { break };

        let channel = remaining.remove(pos);
        removed.push(channel);
        snr_change.push(scores[pos]);
        report(
            observer,
            RoundEvent {
                strategy: Strategy::Backward,
                round: rounds,
                action: Action::Removed { channel },
                delta: scores[pos],
                selected: remaining.len(),
            },
        );
    }

    let mut indices = remaining;
    indices.extend_from_slice(&removed[removed.len().saturating_sub(retained_margin)..]);
    tracing::info!(strategy = "backward", rounds, selected = indices.len(), "search converged");

    Ok(Selection {
        strategy: Strategy::Backward,
        indices,
        snr_change,
        rounds,
    })
}
