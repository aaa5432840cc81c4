/// select: load a dataset, run one channel search, write the outcome.
///
/// Outputs:
///   --output      JSON  { strategy, channels, indices, snr_change, rounds }
///   --extracted   safetensors with the model built from the selected channels:
///     residual    [trials, T_sig]  f64  extracted signal
///     estimate    [trials, T_sig]  f64  fitted background
///     snr         [T_sig]          f64  snr_time(residual)
///     indices     [n_selected]     i32
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

use mcee::{
    io::{write_outcome_json, Dataset, StWriter},
    select_channels_observed, snr_time, Action, RoundEvent, SearchConfig, SearchObserver,
    Strategy,
};

#[derive(Parser, Debug)]
#[command(name = "select", about = "Multi-channel estimation extraction: channel selection")]
struct Args {
    /// Dataset safetensors (background, background_target, signal, signal_target).
    #[arg(long)]
    input: PathBuf,

    /// JSON config file; command-line flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// backward | forward | stepwise
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Removed channels the backward search adds back to its survivor.
    #[arg(long)]
    margin: Option<usize>,

    /// Override the baseline mean SNR stored in (or computed from) the dataset.
    #[arg(long)]
    msnr: Option<f64>,

    /// Where to write the JSON outcome.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Where to write the extracted waveforms.
    #[arg(long)]
    extracted: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: Level,
}

/// Prints one line per round to stderr.
struct Progress;

impl SearchObserver for Progress {
    fn on_round(&mut self, e: &RoundEvent) {
        let what = match e.action {
            Action::Removed { channel } => format!("removed  {channel}"),
            Action::Added { channel } => format!("added    {channel}"),
            Action::Swapped { removed, added } => format!("swapped  {removed} → {added}"),
            Action::Rejected { channel } => format!("rejected {channel}"),
        };
        eprintln!(
            "  [{}] round {:>3}  {what:<20} delta={:+.4}  |S|={}",
            e.strategy, e.round, e.delta, e.selected
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = match &args.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    if let Some(s) = args.strategy {
        cfg.strategy = s;
    }
    if let Some(m) = args.margin {
        cfg.retained_margin = m;
    }

    let t_load = now();
    let mut data = Dataset::load(&args.input)?;
    if let Some(msnr) = args.msnr {
        data.msnr = msnr;
    }
    let ms_load = t_load.elapsed().as_secs_f64() * 1000.0;
    let (n_trials, n_ch, n_bg) = data.background.dim();
    eprintln!(
        "Loaded {n_ch} ch × {n_trials} trials  (T_bg={n_bg}, T_sig={})  msnr={:.4}",
        data.signal.dim().2,
        data.msnr
    );

    let t_search = now();
    let input = data.input();
    let outcome = select_channels_observed(&input, &cfg, &mut Progress)
        .with_context(|| format!("{} search failed", cfg.strategy))?;
    let ms_search = t_search.elapsed().as_secs_f64() * 1000.0;

    eprintln!("TIMING load={ms_load:.4}ms search={ms_search:.4}ms");
    println!("{}: {:?}", outcome.strategy, outcome.channels);

    if let Some(path) = &args.output {
        write_outcome_json(&outcome, path)?;
        eprintln!("Written → {}", path.display());
    }

    if let Some(path) = &args.extracted {
        let ex = input.extract_subset(&outcome.indices)?;
        let snr = snr_time(ex.residual.view());
        let indices: Vec<i32> = outcome.indices.iter().map(|&i| i as i32).collect();

        let mut w = StWriter::new();
        w.add_f64_array("residual", ex.residual.view());
        w.add_f64_array("estimate", ex.estimate.view());
        w.add_f64("snr", &snr.to_vec(), &[snr.len()]);
        w.add_i32("indices", &indices, &[indices.len()]);
        w.write(path)?;
        eprintln!("Written → {}", path.display());
    }

    Ok(())
}

#[inline(always)]
fn now() -> std::time::Instant {
    std::time::Instant::now()
}
