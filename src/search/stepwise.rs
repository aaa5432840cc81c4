//! Stepwise selection: forward addition with a swap attempt after each
//! accepted round.
//!
//! ```text
//! accepted = [], candidates = all channels
//! while candidates:
//!     add the best candidate (as in forward); from round 2 on stop and
//!         drop it if its delta < best delta so far
//!     from round 2 on, if candidates remain:
//!         for each accepted channel a except the one just added:
//!             best c for (accepted \ {a}) ++ [c]
//!         if the best such swap beats every delta so far:
//!             a goes back to candidates, c joins accepted
//! ```
//!
//! The accepted set grows by one every round that does not stop, so the loop
//! runs at most `N` rounds.
use super::{best_addition, best_position, best_so_far, check_cancel, check_channel_count};
use super::{regressed, report, without};
use super::{Action, RoundEvent, Scorer, SearchObserver, Selection};
use crate::config::Strategy;
use crate::error::Result;

/// Best remove-one/add-one move found for the current accepted set.
#[derive(Debug, Clone, Copy)]
struct Swap {
    /// Position in `accepted` of the channel leaving the model.
    drop: usize,
    /// Position in `candidates` of the channel replacing it.
    take: usize,
    delta: f64,
}

fn best_swap(
    scorer: &mut dyn Scorer,
    accepted: &[usize],
    candidates: &[usize],
) -> Result<Option<Swap>> {
    // The channel added this round is never swapped out.
    let droppable = accepted.len().saturating_sub(1);
    let mut base = Vec::with_capacity(accepted.len());
    let mut moves = Vec::with_capacity(droppable);
    for drop in 0..droppable {
        without(accepted, drop, &mut base);
        if let Some((take, delta)) = best_addition(scorer, &base, candidates)? {
            moves.push(Swap { drop, take, delta });
        }
    }
    let deltas: Vec<f64> = moves.iter().map(|m| m.delta).collect();
    Ok(best_position(&deltas).map(|p| moves[p]))
}

pub fn search(
    n_channels: usize,
    scorer: &mut dyn Scorer,
    observer: &mut dyn SearchObserver,
) -> Result<Selection> {
    check_channel_count(Strategy::Stepwise, n_channels)?;
    tracing::info!(strategy = "stepwise", n_channels, "search started");

    let mut candidates: Vec<usize> = (0..n_channels).collect();
    let mut accepted = Vec::with_capacity(n_channels);
    let mut snr_change = Vec::with_capacity(2 * n_channels);
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

        if rounds > 1 && regressed(delta, prior) {
            accepted.pop();
            report(
                observer,
                RoundEvent {
                    strategy: Strategy::Stepwise,
                    round: rounds,
                    action: Action::Rejected { channel },
                    delta,
                    selected: accepted.len(),
                },
            );
            break;
        }
        report(
            observer,
            RoundEvent {
                strategy: Strategy::Stepwise,
                round: rounds,
                action: Action::Added { channel },
                delta,
                selected: accepted.len(),
            },
        );

        if rounds < 2 || candidates.is_empty() {
            continue;
        }
        let Some(swap) = best_swap(scorer, &accepted, &candidates)? else {
            continue;
        };
        if swap.delta > best_so_far(&snr_change) {
            let removed = accepted.remove(swap.drop);
            let added = candidates.remove(swap.take);
            accepted.push(added);
            let slot = candidates.partition_point(|&c| c < removed);
            candidates.insert(slot, removed);
            snr_change.push(swap.delta);
            report(
                observer,
                RoundEvent {
                    strategy: Strategy::Stepwise,
                    round: rounds,
                    action: Action::Swapped { removed, added },
                    delta: swap.delta,
                    selected: accepted.len(),
                },
            );
        }
    }

    tracing::info!(strategy = "stepwise", rounds, selected = accepted.len(), "search converged");
    Ok(Selection {
        strategy: Strategy::Stepwise,
        indices: accepted,
        snr_change,
        rounds,
    })
}
