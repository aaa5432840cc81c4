//! Progress events and cooperative cancellation.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Strategy;
use crate::error::{Error, Result};

/// What a round did to the selected set.  Channels are indices into the
/// original channel list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Removed { channel: usize },
    Added { channel: usize },
    /// Stepwise only: `removed` left the model and `added` took its place.
    Swapped { removed: usize, added: usize },
    /// A tentatively added channel that made the delta regress; the search
    /// ends without it.
    Rejected { channel: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundEvent {
    pub strategy: Strategy,
    /// 1-based round number.
    pub round: usize,
    pub action: Action,
    pub delta: f64,
    /// Size of the selected set after the action.
    pub selected: usize,
}

/// Hook called by the strategies at round boundaries.
pub trait SearchObserver {
    fn on_round(&mut self, _event: &RoundEvent) {}

    /// Polled before every round; returning `true` aborts the search with
    /// [`Error::Cancelled`].
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// Records every event.
impl SearchObserver for Vec<RoundEvent> {
    fn on_round(&mut self, event: &RoundEvent) {
        self.push(event.clone());
    }
}

/// Shareable cancellation switch.
///
/// Clone it, hand the clone to another thread, and call
/// [`cancel`](Self::cancel) there; the search stops before its next round.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl SearchObserver for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.is_set()
    }
}

pub(crate) fn report(observer: &mut dyn SearchObserver, event: RoundEvent) {
    tracing::debug!(
        strategy = %event.strategy,
        round = event.round,
        action = ?event.action,
        delta = event.delta,
        selected = event.selected,
        "search round"
    );
    observer.on_round(&event);
}

pub(crate) fn check_cancel(observer: &dyn SearchObserver, rounds: usize) -> Result<()> {
    if observer.is_cancelled() {
        tracing::info!(rounds, "search cancelled");
        return Err(Error::Cancelled { rounds });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let remote = flag.clone();
        assert!(check_cancel(&flag, 0).is_ok());
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert_eq!(check_cancel(&flag, 4).unwrap_err(), Error::Cancelled { rounds: 4 });
    }

    #[test]
    fn vec_observer_records_events() {
        let mut events: Vec<RoundEvent> = Vec::new();
        let event = RoundEvent {
            strategy: Strategy::Forward,
            round: 1,
            action: Action::Added { channel: 2 },
            delta: 0.5,
            selected: 1,
        };
        report(&mut events, event.clone());
        assert_eq!(events, vec![event]);
    }
}
