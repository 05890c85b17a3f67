use std::io::Write;

use anyhow::{Context, Result};
use tl_audio::batch_analyzer::BatchAnalyzer;
use tl_core::config::AnalyzerConfig;
use tl_core::frame::TickReport;

use crate::generative::ClickTrack;

/// What one run should synthesize and how to report it.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Click-track tempo.
    pub bpm: f64,
    /// Delay applied to every odd click (ms).
    pub swing_ms: f64,
    /// Track length in seconds.
    pub seconds: f64,
    /// Analysis ticks per second.
    pub fps: u32,
    /// Sample rate of the synthesized audio.
    pub sample_rate: u32,
    /// One JSON object per tick instead of beat lines.
    pub json: bool,
}

/// Totals printed after the run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Ticks analysed.
    pub ticks: usize,
    /// Ticks flagged as beats.
    pub beats: usize,
    /// Report of the final tick, carrying the last tempo estimate.
    pub last: TickReport,
}

/// Synthesize the click track, analyse it and write the result to `out`:
/// one line per beat plus a summary, or one JSON object per tick.
///
/// # Errors
/// Returns an error if the analyzer rejects the configuration or writing
/// to `out` fails.
pub fn run_analysis<W: Write>(
    options: &RunOptions,
    config: AnalyzerConfig,
    out: &mut W,
) -> Result<RunSummary> {
    let track = ClickTrack::new(options.bpm, options.sample_rate).with_swing(options.swing_ms);
    let samples = track.render(options.seconds);

    let mut analyzer =
        BatchAnalyzer::new(config, options.fps).context("Cannot build the analyzer")?;
    let timeline = analyzer
        .analyze_all(&samples, options.sample_rate)
        .context("Analysis failed")?;

    let mut summary = RunSummary::default();
    for report in &timeline.ticks {
        summary.ticks += 1;
        if report.is_beat {
            summary.beats += 1;
        }
        summary.last = *report;
        if options.json {
            write_json_line(out, report)?;
        } else if report.is_beat {
            write_beat_line(out, report)?;
        }
    }

    if !options.json {
        write_summary(out, options, &summary)?;
    }
    Ok(summary)
}

fn write_beat_line<W: Write>(out: &mut W, report: &TickReport) -> Result<()> {
    let tempo = if report.tempo.is_reliable() {
        format!(
            "{} bpm ({:.0}%)",
            report.tempo.bpm,
            report.tempo.confidence * 100.0
        )
    } else {
        "-- bpm".to_string()
    };
    writeln!(
        out,
        "beat {:>9.1} ms  {tempo:<14} low {:.2} mid {:.2} high {:.2}",
        report.timestamp_ms, report.bands.low, report.bands.mid, report.bands.high
    )?;
    Ok(())
}

fn write_json_line<W: Write>(out: &mut W, report: &TickReport) -> Result<()> {
    serde_json::to_writer(&mut *out, report).context("Cannot serialize tick")?;
    writeln!(out)?;
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, options: &RunOptions, summary: &RunSummary) -> Result<()> {
    let tempo = summary.last.tempo;
    writeln!(
        out,
        "{} ticks, {} beats; click track {:.1} bpm, detected {} bpm (confidence {:.2}{})",
        summary.ticks,
        summary.beats,
        options.bpm,
        tempo.bpm,
        tempo.confidence,
        if tempo.is_reliable() { "" } else { ", unreliable" }
    )?;
    Ok(())
}
