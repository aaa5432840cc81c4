//! Forward selection.
//!
//! ```text
//! accepted = [], candidates = all channels
//! while candidates:
//!     for each c in candidates: score(accepted ++ [c])
//!     move the best c (last position on ties) to accepted
//!     from round 2 on: if its delta < best delta so far,
//!         drop it again and stop
//! ```
use super::{best_addition, best_so_far, check_cancel, check_channel_count, regressed, report};
use super::{Action, RoundEvent, Scorer, SearchObserver, Selection};
use crate::config::Strategy;
use crate::error::Result;

pub fn search(
    n_channels: usize,
    scorer: &mut dyn Scorer,
    observer: &mut dyn SearchObserver,
) -> Result<Selection> {
    check_channel_count(Strategy::Forward, n_channels)?;
    tracing::info!(strategy = "forward", n_channels, "search started");

    let mut candidates: Vec<usize> = (0..n_channels).collect();
    let mut accepted = Vec::with_capacity(n_channels);
    let mut snr_change = Vec::with_capacity(n_channels);
    let mut rounds = 0;

    while !candidates.is_empty() {
        check_cancel(observer, rounds)?;
        rounds += 1;

        let Some((pos, delta)) = best_addition(scorer, &accepted, &candidates)? else {
            break;
        };
        let prior = best_so_far(&snr_change);
        let channel = candidates.remove(pos);
        accepted.push(channel);
        snr_change.push(delta);

        let stop = rounds > 1 && regressed(delta, prior);
        let action = if stop {
            accepted.pop();
            Action::Rejected { channel }
        } else {
            Action::Added { channel }
        };
        report(
            observer,
            RoundEvent {
                strategy: Strategy::Forward,
                round: rounds,
                action,
                delta,
                selected: accepted.len(),
            },
        );
        if stop {
            break;
        }
    }

    tracing::info!(strategy = "forward", rounds, selected = accepted.len(), "search converged");
    Ok(Selection {
        strategy: Strategy::Forward,
        indices: accepted,
        snr_change,
        rounds,
    })
}
