//! # mcee — multi-channel estimation extraction
//!
//! `mcee` finds the subset of recording channels whose per-trial linear
//! model best removes background activity from a target channel, so that an
//! event-locked signal (an evoked potential) stands out against trial-to-trial
//! noise.
//!
//! ## Method overview
//!
//! ```text
//! background window  [trials, channels, T_bg]  + target [trials, T_bg]
//!   │
//!   ├─ regression::extract   per trial: fit target ≈ b₀ + Σ bₖ·channelₖ (OLS)
//!   │                        on the background window, apply the fit to the
//!   │                        signal window, keep the residual
//!   ├─ snr::snr_time         per sample: mean² / var across trials
//!   ├─ delta                 mean_t SNR(residual) − msnr
//!   └─ search                backward / forward / stepwise greedy choice of
//!        │                   the channel subset maximising delta
//!        └─→ SearchOutcome { channels, indices, snr_change, rounds }
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use mcee::{select_channels, SearchConfig, Strategy};
//! use mcee::io::Dataset;
//! use std::path::Path;
//!
//! let data = Dataset::load(Path::new("data/subject01.safetensors")).unwrap();
//! let cfg = SearchConfig { strategy: Strategy::Forward, ..SearchConfig::default() };
//! let outcome = select_channels(&data.input(), &cfg).unwrap();
//! println!("{:?} → {:?}", outcome.channels, outcome.snr_change);
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use mcee::regression::extract;
//! use mcee::snr::{mean_snr, snr_time};
//! use ndarray::{Array2, Array3};
//!
//! let bg = Array3::<f64>::zeros((3, 40, 500));      // [channels, trials, T_bg]
//! let bg_target = Array2::<f64>::zeros((40, 500));  // [trials, T_bg]
//! let sig = Array3::<f64>::zeros((3, 40, 250));     // [channels, trials, T_sig]
//! let sig_target = Array2::<f64>::zeros((40, 250));
//!
//! let ex = extract(bg.view(), bg_target.view(), sig.view(), sig_target.view()).unwrap();
//! let curve = snr_time(ex.residual.view());
//! let gain = mean_snr(ex.residual.view()) - mean_snr(sig_target.view());
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod io;
pub mod regression;
pub mod search;
pub mod snr;
pub mod stack;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::{SearchConfig, Strategy};
pub use detect::{corr_detect, Detection};
pub use error::{Error, Result};
pub use regression::{extract, extract_single, fit_trial, Extraction, LinearFit};
pub use search::{
    Action, CancelFlag, ExtractionScorer, NoopObserver, RoundEvent, Scorer, SearchInput,
    SearchObserver, SearchOutcome, Selection,
};
pub use snr::{mean_snr, snr_time};

/// Run the channel search named in `cfg` on `input`.
///
/// This is the main entry point of the library.  The input is validated
/// first (matching trial, channel and sample counts; distinct labels), then
/// the strategy runs to convergence.
///
/// # Errors
///
/// * [`Error::ShapeMismatch`] / [`Error::Empty`] for inconsistent arrays.
/// * [`Error::DuplicateChannel`] when a label repeats.
/// * [`Error::TooFewChannels`] below [`Strategy::min_channels`].
///
/// # Examples
///
/// ```no_run
/// use mcee::{select_channels, SearchConfig, SearchInput};
/// use ndarray::{Array2, Array3};
///
/// let labels = ["Fz", "Cz", "Pz", "Oz"];
/// let bg = Array3::<f64>::zeros((40, 4, 500));
/// let bg_t = Array2::<f64>::zeros((40, 500));
/// let sig = Array3::<f64>::zeros((40, 4, 250));
/// let sig_t = Array2::<f64>::zeros((40, 250));
/// let input = SearchInput {
///     channels: &labels,
///     msnr: 0.0,
///     background: bg.view(),
///     background_target: bg_t.view(),
///     signal: sig.view(),
///     signal_target: sig_t.view(),
/// };
/// let outcome = select_channels(&input, &SearchConfig::default()).unwrap();
/// ```
pub fn select_channels<L: Clone + PartialEq>(
    input: &SearchInput<'_, L>,
    cfg: &SearchConfig,
) -> Result<SearchOutcome<L>> {
    search::run(input, cfg, &mut NoopObserver)
}

/// [`select_channels`] with a progress/cancellation hook.
pub fn select_channels_observed<L: Clone + PartialEq>(
    input: &SearchInput<'_, L>,
    cfg: &SearchConfig,
    observer: &mut dyn SearchObserver,
) -> Result<SearchOutcome<L>> {
    search::run(input, cfg, observer)
}
