use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Smallest accepted FFT window (16 bins).
pub const MIN_FFT_SIZE: usize = 32;

/// Complete analyzer configuration.
///
/// Serializable to TOML. Every field has a sane default matching the
/// reference heuristic, so an empty file yields the stock behaviour.
///
/// # Example
/// ```
/// use tl_core::config::AnalyzerConfig;
/// let config = AnalyzerConfig::default();
/// assert_eq!(config.spectrum.fft_size, 2048);
/// assert_eq!(config.bin_count(), 1024);
/// assert_eq!(config.beat.history_len, 60);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// PCM → byte spectrum conversion.
    pub spectrum: SpectrumConfig,
    /// Adaptive-threshold beat detector.
    pub beat: BeatConfig,
    /// Interval-based tempo estimator.
    pub tempo: TempoConfig,
}

/// Byte spectrum front end parameters.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpectrumConfig {
    /// FFT window in samples. Power of two; bin count is half of it.
    pub fft_size: usize,
    /// Temporal smoothing of magnitudes between ticks [0.0, 1.0].
    pub smoothing: f32,
    /// Magnitude (dB) mapped to byte 0.
    pub min_db: f32,
    /// Magnitude (dB) mapped to byte 255.
    pub max_db: f32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

/// Beat detector tuning. Counts are in ticks, not milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BeatConfig {
    /// Number of per-tick loudness samples in the rolling history.
    pub history_len: usize,
    /// A beat needs loudness above `history average * trigger_ratio`.
    pub trigger_ratio: f64,
    /// Cutoff becomes `loudness * ratchet` on a beat.
    pub ratchet: f64,
    /// Ticks after a beat during which the cutoff does not decay.
    pub hold_ticks: u32,
    /// Per-tick multiplicative cutoff decay after the hold period.
    pub decay: f64,
    /// Cutoff never decays below `history average * floor_ratio`.
    pub floor_ratio: f64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            history_len: 60,
            trigger_ratio: 1.5,
            ratchet: 1.1,
            hold_ticks: 60,
            decay: 0.98,
            floor_ratio: 0.5,
        }
    }
}

/// Tempo estimator tuning.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TempoConfig {
    /// Trailing window of beat timestamps (ms).
    pub window_ms: f64,
    /// Minimum timestamps in the window before an estimate is produced.
    pub min_beats: usize,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            window_ms: 10_000.0,
            min_beats: 6,
        }
    }
}

impl AnalyzerConfig {
    /// Number of frequency bins produced by the configured FFT size.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.spectrum.fft_size / 2
    }

    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.spectrum.fft_size = self
            .spectrum
            .fft_size
            .clamp(MIN_FFT_SIZE, 32768)
            .next_power_of_two();
        self.spectrum.smoothing = self.spectrum.smoothing.clamp(0.0, 1.0);
        self.spectrum.min_db = self.spectrum.min_db.clamp(-200.0, 0.0);
        self.spectrum.max_db = self.spectrum.max_db.clamp(-200.0, 0.0);

        self.beat.history_len = self.beat.history_len.clamp(1, 1024);
        self.beat.trigger_ratio = self.beat.trigger_ratio.clamp(0.01, 10.0);
        self.beat.ratchet = self.beat.ratchet.clamp(1.0, 4.0);
        self.beat.hold_ticks = self.beat.hold_ticks.min(10_000);
        self.beat.decay = self.beat.decay.clamp(0.0, 1.0);
        self.beat.floor_ratio = self.beat.floor_ratio.clamp(0.0, 1.0);

        self.tempo.window_ms = self.tempo.window_ms.clamp(100.0, 600_000.0);
        self.tempo.min_beats = self.tempo.min_beats.clamp(2, 1000);
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Configuration`] describing the first bad field.
    ///
    /// # Example
    /// ```
    /// use tl_core::config::AnalyzerConfig;
    /// let mut config = AnalyzerConfig::default();
    /// assert!(config.validate().is_ok());
    /// config.tempo.min_beats = 1;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> crate::error::Result<()> {
        let s = &self.spectrum;
        let floats = [
            ("spectrum.smoothing", f64::from(s.smoothing)),
            ("spectrum.min_db", f64::from(s.min_db)),
            ("spectrum.max_db", f64::from(s.max_db)),
            ("beat.trigger_ratio", self.beat.trigger_ratio),
            ("beat.ratchet", self.beat.ratchet),
            ("beat.decay", self.beat.decay),
            ("beat.floor_ratio", self.beat.floor_ratio),
            ("tempo.window_ms", self.tempo.window_ms),
        ];
        if let Some((name, value)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::config(format!("{name} must be finite, got {value}")));
        }
        if s.fft_size < MIN_FFT_SIZE || !s.fft_size.is_power_of_two() {
            return Err(AnalysisError::config(format!(
                "fft_size must be a power of two >= {MIN_FFT_SIZE}, got {}",
                s.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&s.smoothing) {
            return Err(AnalysisError::config("spectrum.smoothing must be in [0, 1]"));
        }
        if s.min_db >= s.max_db {
            return Err(AnalysisError::config(format!(
                "spectrum.min_db ({}) must be below max_db ({})",
                s.min_db, s.max_db
            )));
        }
        if self.beat.history_len == 0 {
            return Err(AnalysisError::config("beat.history_len must be positive"));
        }
        if self.beat.trigger_ratio <= 0.0 {
            return Err(AnalysisError::config("beat.trigger_ratio must be positive"));
        }
        if !(0.0..=1.0).contains(&self.beat.floor_ratio) {
            return Err(AnalysisError::config("beat.floor_ratio must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.beat.decay) {
            return Err(AnalysisError::config("beat.decay must be in [0, 1]"));
        }
        if self.beat.ratchet < 1.0 {
            return Err(AnalysisError::config("beat.ratchet must be >= 1"));
        }
        if self.tempo.window_ms <= 0.0 {
            return Err(AnalysisError::config("tempo.window_ms must be positive"));
        }
        if self.tempo.min_beats < 2 {
            return Err(AnalysisError::config(
                "tempo.min_beats must be at least 2 (one interval)",
            ));
        }
        Ok(())
    }
}

/// Intermediate TOML structure, every field optional.
#[derive(Deserialize)]
struct ConfigFile {
    spectrum: Option<SpectrumSection>,
    beat: Option<BeatSection>,
    tempo: Option<TempoSection>,
}

#[derive(Deserialize)]
struct SpectrumSection {
    fft_size: Option<usize>,
    smoothing: Option<f32>,
    min_db: Option<f32>,
    max_db: Option<f32>,
}

#[derive(Deserialize)]
struct BeatSection {
    history_len: Option<usize>,
    trigger_ratio: Option<f64>,
    ratchet: Option<f64>,
    hold_ticks: Option<u32>,
    decay: Option<f64>,
    floor_ratio: Option<f64>,
}

#[derive(Deserialize)]
struct TempoSection {
    window_ms: Option<f64>,
    min_beats: Option<usize>,
}

/// Parse a TOML string and merge it over the defaults.
///
/// # Errors
/// Returns an error if the TOML is malformed or the merged values are invalid.
///
/// # Example
/// ```
/// use tl_core::config::parse_config;
/// let config = parse_config("[tempo]\nmin_beats = 8\n").unwrap();
/// assert_eq!(config.tempo.min_beats, 8);
/// assert_eq!(config.beat.hold_ticks, 60);
/// ```
pub fn parse_config(content: &str) -> Result<AnalyzerConfig> {
    let file: ConfigFile = toml::from_str(content).context("TOML parse error")?;
    let mut config = AnalyzerConfig::default();

    if let Some(s) = file.spectrum {
        if let Some(v) = s.fft_size {
            config.spectrum.fft_size = v;
        }
        if let Some(v) = s.smoothing {
            config.spectrum.smoothing = v;
        }
        if let Some(v) = s.min_db {
            config.spectrum.min_db = v;
        }
        if let Some(v) = s.max_db {
            config.spectrum.max_db = v;
        }
    }

    if let Some(b) = file.beat {
        if let Some(v) = b.history_len {
            config.beat.history_len = v;
        }
        if let Some(v) = b.trigger_ratio {
            config.beat.trigger_ratio = v;
        }
        if let Some(v) = b.ratchet {
            config.beat.ratchet = v;
        }
        if let Some(v) = b.hold_ticks {
            config.beat.hold_ticks = v;
        }
        if let Some(v) = b.decay {
            config.beat.decay = v;
        }
        if let Some(v) = b.floor_ratio {
            config.beat.floor_ratio = v;
        }
    }

    if let Some(t) = file.tempo {
        if let Some(v) = t.window_ms {
            config.tempo.window_ms = v;
        }
        if let Some(v) = t.min_beats {
            config.tempo.min_beats = v;
        }
    }

    config.clamp_all();
    config.validate()?;
    Ok(config)
}

/// Load a TOML file and merge it over the defaults.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or validated.
///
/// # Example
/// ```no_run
/// use tl_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AnalyzerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let config =
        parse_config(&content).with_context(|| format!("Invalid config in {}", path.display()))?;
    log::debug!("Loaded analyzer config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() -> Result<()> {
        let config = parse_config("")?;
        assert_eq!(config, AnalyzerConfig::default());
        Ok(())
    }

    #[test]
    fn shipped_default_file_matches_defaults() -> Result<()> {
        let config = parse_config(include_str!("../../../config/default.toml"))?;
        assert_eq!(config, AnalyzerConfig::default());
        Ok(())
    }

    #[test]
    fn partial_sections_merge_over_defaults() -> Result<()> {
        let config = parse_config(
            "[spectrum]\nfft_size = 1024\n\n[beat]\ndecay = 0.95\nhold_ticks = 30\n",
        )?;
        assert_eq!(config.bin_count(), 512);
        assert_eq!(config.beat.decay, 0.95);
        assert_eq!(config.beat.hold_ticks, 30);
        assert_eq!(config.beat.trigger_ratio, 1.5);
        assert_eq!(config.tempo.window_ms, 10_000.0);
        Ok(())
    }

    #[test]
    fn out_of_range_values_are_clamped() -> Result<()> {
        let config = parse_config("[spectrum]\nfft_size = 3000\nsmoothing = 4.0\n")?;
        assert_eq!(config.spectrum.fft_size, 4096);
        assert_eq!(config.spectrum.smoothing, 1.0);
        Ok(())
    }

    #[test]
    fn inverted_db_range_is_rejected() {
        let err = parse_config("[spectrum]\nmin_db = -20.0\nmax_db = -80.0\n");
        assert!(err.is_err());
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(parse_config("[beat\ndecay = ").is_err());
    }

    #[test]
    fn load_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[tempo]\nwindow_ms = 8000.0\nmin_beats = 4")?;
        let config = load_config(file.path())?;
        assert_eq!(config.tempo.window_ms, 8000.0);
        assert_eq!(config.tempo.min_beats, 4);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/tempolens.toml")).is_err());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(parse_config("[tempo]\nwindow_ms = nan\n").is_err());
        assert!(parse_config("[beat]\ntrigger_ratio = nan\nfloor_ratio = nan\n").is_err());
        assert!(parse_config("[spectrum]\nmax_db = nan\n").is_err());

        let mut config = AnalyzerConfig::default();
        config.beat.decay = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_checks_trigger_and_floor_ratios() {
        let mut config = AnalyzerConfig::default();
        config.beat.trigger_ratio = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.beat.floor_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn fft_size_below_minimum_is_rejected() -> Result<()> {
        let mut config = AnalyzerConfig::default();
        config.spectrum.fft_size = 16;
        assert!(config.validate().is_err());

        let clamped = parse_config("[spectrum]\nfft_size = 8\n")?;
        assert_eq!(clamped.spectrum.fft_size, MIN_FFT_SIZE);
        Ok(())
    }

    #[test]
    fn validate_rejects_zero_history() {
        let mut config = AnalyzerConfig::default();
        config.beat.history_len = 0;
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::Configuration(_))
        ));
    }
}
