//! Error type shared by the regression primitive and the search engine.
//!
//! Shape problems and too-small channel sets fail fast.  Numerical
//! degeneracy (zero noise power, a least-squares solve that meets non-finite
//! data) is *not* an error: it shows up as `inf`/`NaN` scores, which lose
//! every comparison in the search.
use thiserror::Error;

use crate::config::Strategy;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Two arrays that must agree on an axis do not.
    #[error("shape mismatch for {what}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Which argument was inconsistent.
        what: &'static str,
        /// Shape implied by the other arguments.
        expected: Vec<usize>,
        /// Shape actually supplied.
        got: Vec<usize>,
    },

    /// An axis that must be non-empty has length zero.
    #[error("{what} is empty")]
    Empty {
        /// Which axis or argument was empty.
        what: &'static str,
    },

    /// Fewer channels than the strategy needs to make a decision.
    #[error("{strategy} search needs at least {need} channels, got {got}")]
    TooFewChannels {
        strategy: Strategy,
        need: usize,
        got: usize,
    },

    /// The channel list contains the same label twice.
    #[error("channel labels at positions {first} and {second} are identical")]
    DuplicateChannel { first: usize, second: usize },

    /// A scorer was asked for a channel that does not exist.
    #[error("channel index {index} out of range for {n_channels} channels")]
    ChannelOutOfRange { index: usize, n_channels: usize },

    /// A scorer was asked for more rows than it can stack.
    #[error("subset of {len} channels exceeds the {capacity} available")]
    SubsetTooLarge { len: usize, capacity: usize },

    /// The observer requested cancellation at a round boundary.
    #[error("search cancelled after {rounds} rounds")]
    Cancelled { rounds: usize },
}

/// Fail with [`Error::ShapeMismatch`] unless `got == expected`.
pub(crate) fn check_shape(what: &'static str, expected: &[usize], got: &[usize]) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            got: got.to_vec(),
        })
    }
}

/// Fail with [`Error::Empty`] if `len == 0`.
pub(crate) fn check_non_empty(what: &'static str, len: usize) -> Result<()> {
    if len == 0 {
        Err(Error::Empty { what })
    } else {
        Ok(())
    }
}
