//! Search configuration.
//!
//! [`SearchConfig`] holds every tunable parameter of a channel-selection run.
//! Every field has a default; an empty JSON object is a valid config.
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which greedy search drives the channel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Start from every channel and drop one per round until one is left.
    Backward,
    /// Start from nothing and add one channel per round until the SNR
    /// gain stops growing.
    Forward,
    /// Forward addition followed by a remove-one/add-one swap attempt every
    /// round.
    #[default]
    Stepwise,
}

impl Strategy {
    /// All strategies, in the order the `compare` driver reports them.
    pub const ALL: [Strategy; 3] = [Strategy::Backward, Strategy::Forward, Strategy::Stepwise];

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Backward => "backward",
            Strategy::Forward => "forward",
            Strategy::Stepwise => "stepwise",
        }
    }

    /// Smallest channel count the strategy can make a decision on.
    ///
    /// Backward and forward need two channels to compare against each other;
    /// stepwise needs a third so its swap phase has something to swap in.
    pub fn min_channels(self) -> usize {
        match self {
            Strategy::Backward | Strategy::Forward => 2,
            Strategy::Stepwise => 3,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backward" => Ok(Strategy::Backward),
            "forward" => Ok(Strategy::Forward),
            "stepwise" => Ok(Strategy::Stepwise),
            other => Err(format!(
                "unknown strategy '{other}' (expected backward, forward or stepwise)"
            )),
        }
    }
}

/// Configuration for one channel-selection run.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use mcee::{SearchConfig, Strategy};
///
/// let cfg = SearchConfig {
///     strategy: Strategy::Backward,
///     retained_margin: 1,
///     ..SearchConfig::default()
/// };
/// assert_eq!(cfg.retained_margin, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search strategy to run.
    ///
    /// Default: [`Strategy::Stepwise`].
    pub strategy: Strategy,

    /// Number of most recently removed channels the backward search adds
    /// back to its final survivor.
    ///
    /// The backward search always eliminates down to a single channel; the
    /// reported set is that channel plus the last `retained_margin` channels
    /// it removed (in removal order).  Ignored by forward and stepwise.
    ///
    /// Default: `2`.
    pub retained_margin: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Stepwise,
            retained_margin: 2,
        }
    }
}

impl SearchConfig {
    /// Parse a JSON document.  Missing fields take their defaults.
    ///
    /// ```
    /// use mcee::{SearchConfig, Strategy};
    /// let cfg = SearchConfig::from_json_str(r#"{ "strategy": "forward" }"#).unwrap();
    /// assert_eq!(cfg.strategy, Strategy::Forward);
    /// assert_eq!(cfg.retained_margin, 2);
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse search config")
    }

    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_round_trips_through_str() {
        for s in Strategy::ALL {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
        assert_eq!(" Forward ".parse::<Strategy>().unwrap(), Strategy::Forward);
        assert!("sideways".parse::<Strategy>().is_err());
    }

    #[test]
    fn defaults() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.strategy, Strategy::Stepwise);
        assert_eq!(cfg.retained_margin, 2);
    }

    #[test]
    fn json_uses_kebab_case_and_defaults() {
        let cfg = SearchConfig::from_json_str(r#"{ "strategy": "backward", "retained_margin": 0 }"#)
            .unwrap();
        assert_eq!(cfg.strategy, Strategy::Backward);
        assert_eq!(cfg.retained_margin, 0);

        let cfg = SearchConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, SearchConfig::default());

        assert!(SearchConfig::from_json_str(r#"{ "strategy": "Sideways" }"#).is_err());
    }

    #[test]
    fn stepwise_needs_three_channels() {
        assert_eq!(Strategy::Backward.min_channels(), 2);
        assert_eq!(Strategy::Forward.min_channels(), 2);
        assert_eq!(Strategy::Stepwise.min_channels(), 3);
    }
}
