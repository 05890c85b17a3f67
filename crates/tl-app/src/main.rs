use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tl_core::config::AnalyzerConfig;

pub mod batch;
pub mod cli;
pub mod generative;

fn main() -> Result<()> {
    // 1. Parse CLI
    let cli = cli::Cli::parse();

    // 2. Logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Validate arguments
    cli.validate()?;

    // 4. Load config
    let config = resolve_config(&cli)?;

    // 5. Synthesize, analyse, report
    let options = batch::RunOptions {
        bpm: cli.bpm,
        swing_ms: cli.swing_ms,
        seconds: cli.seconds,
        fps: cli.fps,
        sample_rate: cli.sample_rate,
        json: cli.json,
    };
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let summary = batch::run_analysis(&options, config, &mut out)?;
    out.flush()?;

    log::info!(
        "Done: {} ticks, {} beats, {} bpm",
        summary.ticks,
        summary.beats,
        summary.last.tempo.bpm
    );
    Ok(())
}

/// Load `--config` if it exists, otherwise fall back to the defaults.
fn resolve_config(cli: &cli::Cli) -> Result<AnalyzerConfig> {
    if cli.config.exists() {
        tl_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config not found: {}. Using defaults.",
            cli.config.display()
        );
        Ok(AnalyzerConfig::default())
    }
}
