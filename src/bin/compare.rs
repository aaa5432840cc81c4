/// compare: run all three channel searches on one dataset and report them
/// side by side.
///
/// For every strategy the selected channels, the final delta, the number of
/// rounds and the wall time are printed; with `--output` the three outcomes
/// are written as a JSON array.
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

use mcee::{io::Dataset, select_channels, SearchConfig, SearchOutcome, Strategy};

#[derive(Parser, Debug)]
#[command(name = "compare", about = "Compare backward, forward and stepwise channel selection")]
struct Args {
    /// Dataset safetensors.
    #[arg(long)]
    input: PathBuf,

    /// Removed channels the backward search adds back to its survivor.
    #[arg(long, default_value_t = 2)]
    margin: usize,

    /// JSON output with one outcome per strategy.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: Level,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let data = Dataset::load(&args.input)?;
    let input = data.input();

    println!("{:<10} {:>7} {:>12} {:>10}  channels", "strategy", "rounds", "final delta", "ms");
    let mut outcomes: Vec<SearchOutcome<String>> = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let cfg = SearchConfig { strategy, retained_margin: args.margin };
        let t = std::time::Instant::now();
        let outcome = select_channels(&input, &cfg)?;
        let ms = t.elapsed().as_secs_f64() * 1000.0;
        let last = outcome.snr_change.last().copied().unwrap_or(f64::NAN);
        println!(
            "{:<10} {:>7} {:>12.4} {:>10.2}  {}",
            strategy.name(),
            outcome.rounds,
            last,
            ms,
            outcome.channels.join(",")
        );
        outcomes.push(outcome);
    }

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&outcomes)?)?;
        eprintln!("Written → {}", path.display());
    }
    Ok(())
}
