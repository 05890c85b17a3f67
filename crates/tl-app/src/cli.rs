use std::path::PathBuf;

use clap::Parser;

/// tempolens: beat and tempo tracking over a synthesized click track.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Analyzer TOML config. Defaults apply if the file is missing.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Tempo of the synthesized click track. Beats closer than the beat
    /// hold (60 ticks) are only caught on every other or third click.
    #[arg(long, default_value_t = 50.0)]
    pub bpm: f64,

    /// Push every other click late by this many ms.
    #[arg(long, default_value_t = 0.0)]
    pub swing_ms: f64,

    /// Length of the click track in seconds.
    #[arg(long, default_value_t = 12.0)]
    pub seconds: f64,

    /// Analysis ticks per second.
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Sample rate of the synthesized audio.
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Emit one JSON object per tick instead of beat lines.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Reject argument combinations the click synthesizer cannot honour.
    ///
    /// # Errors
    /// Returns an error if bpm or duration is not positive, or if the swing
    /// offset does not fit inside one beat.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            anyhow::bail!("--bpm must be positive, got {}", self.bpm);
        }
        if !(self.seconds.is_finite() && self.seconds > 0.0) {
            anyhow::bail!("--seconds must be positive, got {}", self.seconds);
        }
        let beat_ms = 60_000.0 / self.bpm;
        if !self.swing_ms.is_finite() || self.swing_ms.abs() >= beat_ms {
            anyhow::bail!(
                "--swing-ms {} does not fit in a {beat_ms:.1} ms beat",
                self.swing_ms
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["tempolens"])?;
        assert_eq!(cli.bpm, 50.0);
        assert_eq!(cli.fps, 60);
        assert_eq!(cli.sample_rate, 44100);
        assert!(!cli.json);
        cli.validate()
    }

    #[test]
    fn swing_must_fit_in_a_beat() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["tempolens", "--bpm", "120", "--swing-ms", "600"])?;
        assert!(cli.validate().is_err());
        let cli = Cli::try_parse_from(["tempolens", "--swing-ms", "80"])?;
        cli.validate()
    }

    #[test]
    fn rejects_zero_bpm() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["tempolens", "--bpm", "0"])?;
        assert!(cli.validate().is_err());
        Ok(())
    }
}
