use tl_core::config::AnalyzerConfig;
use tl_core::error::{AnalysisError, Result};
use tl_core::frame::{AnalysisFrame, AnalysisResult, Band, check_shape};

use crate::beat::BeatDetector;
use crate::sampler::SpectralSampler;
use crate::tempo::TempoEstimator;

/// Per-stream analysis engine: band energies, beat decision, tempo.
///
/// One instance per audio stream, one `analyze` call per tick. The engine
/// owns the frame buffers; the returned [`AnalysisResult`] borrows them and
/// is valid until the next call.
///
/// # Example
/// ```
/// use tl_audio::engine::AnalysisEngine;
/// let mut engine = AnalysisEngine::new();
/// engine.configure(1024, 44100).unwrap();
/// let freq = [0u8; 1024];
/// let time = [128u8; 1024];
/// let result = engine.analyze(&freq, &time, 0.0).unwrap();
/// assert!(!result.is_beat);
/// assert_eq!(result.tempo.bpm, 0);
/// ```
pub struct AnalysisEngine {
    config: AnalyzerConfig,
    /// `None` until `configure` succeeds.
    sampler: Option<SpectralSampler>,
    frequency: Vec<u8>,
    time: Vec<u8>,
    beat: BeatDetector,
    tempo: TempoEstimator,
    ticks: u64,
}

impl AnalysisEngine {
    /// Create an unconfigured engine with the stock tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::build(AnalyzerConfig::default())
    }

    /// Create an unconfigured engine with custom tuning.
    ///
    /// # Errors
    /// Returns a configuration error if `config` does not validate.
    pub fn with_config(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: AnalyzerConfig) -> Self {
        Self {
            beat: BeatDetector::with_config(&config.beat),
            tempo: TempoEstimator::with_config(&config.tempo),
            config,
            sampler: None,
            frequency: Vec::new(),
            time: Vec::new(),
            ticks: 0,
        }
    }

    /// Set the bin layout. Must be called before the first `analyze`.
    ///
    /// Re-entrant: a new call starts a fresh stream, resetting beat and
    /// tempo state. On error the previous layout is kept.
    ///
    /// # Errors
    /// Returns a configuration error if `bin_count` or `sample_rate` is zero.
    pub fn configure(&mut self, bin_count: usize, sample_rate: u32) -> Result<()> {
        let sampler = SpectralSampler::new(bin_count, sample_rate)?;
        self.frequency.clear();
        self.frequency.resize(bin_count, 0);
        self.time.clear();
        self.time.resize(bin_count, 128);
        self.sampler = Some(sampler);
        self.reset();
        log::debug!("Engine configured: {bin_count} bins @ {sample_rate} Hz");
        Ok(())
    }

    /// Analyse one tick. Copies the arrays into the engine's buffers.
    ///
    /// # Errors
    /// - configuration error if `configure` was never called;
    /// - [`AnalysisError::InputShape`] if the arrays do not both match the
    ///   configured bin count. Engine state is left untouched.
    pub fn analyze(
        &mut self,
        frequency: &[u8],
        time: &[u8],
        timestamp_ms: f64,
    ) -> Result<AnalysisResult<'_>> {
        let expected = self.layout()?.bin_count();
        check_shape(frequency, time, expected)?;
        self.frequency.copy_from_slice(frequency);
        self.time.copy_from_slice(time);
        self.run_tick(timestamp_ms)
    }

    /// Analyse a host frame, checking its sample rate against the layout.
    ///
    /// # Errors
    /// As [`AnalysisEngine::analyze`], plus a configuration error if the
    /// frame's sample rate differs from the configured one.
    pub fn analyze_frame(&mut self, frame: &AnalysisFrame<'_>) -> Result<AnalysisResult<'_>> {
        let configured = self.layout()?.sample_rate();
        if frame.sample_rate != configured {
            return Err(AnalysisError::config(format!(
                "frame sample rate {} Hz differs from configured {configured} Hz",
                frame.sample_rate
            )));
        }
        self.analyze(frame.frequency, frame.time, frame.timestamp_ms)
    }

    /// Mutable access to the engine's frame buffers, for hosts that write
    /// the next frame in place and then call [`AnalysisEngine::analyze_buffered`].
    ///
    /// # Errors
    /// Returns a configuration error if `configure` was never called.
    pub fn frame_buffers_mut(&mut self) -> Result<(&mut [u8], &mut [u8])> {
        self.layout()?;
        Ok((self.frequency.as_mut_slice(), self.time.as_mut_slice()))
    }

    /// Analyse whatever is currently in the engine's buffers.
    ///
    /// # Errors
    /// Returns a configuration error if `configure` was never called.
    pub fn analyze_buffered(&mut self, timestamp_ms: f64) -> Result<AnalysisResult<'_>> {
        self.layout()?;
        self.run_tick(timestamp_ms)
    }

    /// Sampler → beat detector → tempo estimator, strictly in that order.
    fn run_tick(&mut self, timestamp_ms: f64) -> Result<AnalysisResult<'_>> {
        let bands = self.layout()?.levels(&self.frequency);
        let is_beat = self.beat.process(&self.frequency);
        let tempo = if is_beat {
            log::debug!(
                "Beat at {timestamp_ms:.1} ms (tick {}, cutoff {:.1})",
                self.ticks,
                self.beat.cutoff()
            );
            self.tempo.observe(timestamp_ms)
        } else {
            self.tempo.estimate()
        };
        log::trace!(
            "tick {}: low {:.3} mid {:.3} high {:.3}",
            self.ticks,
            bands.low,
            bands.mid,
            bands.high
        );
        self.ticks += 1;

        Ok(AnalysisResult {
            frequency: &self.frequency,
            time: &self.time,
            timestamp_ms,
            is_beat,
            tempo,
            bands,
        })
    }

    fn layout(&self) -> Result<&SpectralSampler> {
        self.sampler
            .as_ref()
            .ok_or_else(|| AnalysisError::config("analyze called before configure"))
    }

    /// Energy of `band` in the last analysed frame.
    #[must_use]
    pub fn band_energy(&self, band: Band) -> f32 {
        self.sampler
            .as_ref()
            .map_or(0.0, |s| s.energy(band, &self.frequency))
    }

    /// Forget beat and tempo history, keeping the layout.
    pub fn reset(&mut self) {
        self.beat.reset();
        self.tempo.reset();
        self.ticks = 0;
    }

    /// `true` once `configure` succeeded.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.sampler.is_some()
    }

    /// Configured bin count, 0 if unconfigured.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.sampler.as_ref().map_or(0, SpectralSampler::bin_count)
    }

    /// Ticks analysed since the last configure/reset.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Read-only view of the beat detector state.
    #[must_use]
    pub fn beat_detector(&self) -> &BeatDetector {
        &self.beat
    }

    /// Read-only view of the tempo estimator state.
    #[must_use]
    pub fn tempo_estimator(&self) -> &TempoEstimator {
        &self.tempo
    }

    /// Active tuning.
    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINS: usize = 1024;

    fn configured() -> Result<AnalysisEngine> {
        let mut engine = AnalysisEngine::new();
        engine.configure(BINS, 44100)?;
        Ok(engine)
    }

    /// Quiet bed with a loud hit every `period` ticks.
    fn loudness_at(tick: u32, period: u32) -> u8 {
        if tick % period == 0 { 220 } else { 10 }
    }

    #[test]
    fn analyze_before_configure_fails() {
        let mut engine = AnalysisEngine::new();
        let err = engine.analyze(&[0; 8], &[128; 8], 0.0);
        assert!(matches!(err, Err(AnalysisError::Configuration(_))));
        assert!(engine.frame_buffers_mut().is_err());
    }

    #[test]
    fn zero_layout_is_rejected_and_previous_kept() -> Result<()> {
        let mut engine = configured()?;
        assert!(engine.configure(0, 44100).is_err());
        assert!(engine.configure(BINS, 0).is_err());
        assert_eq!(engine.bin_count(), BINS);
        Ok(())
    }

    #[test]
    fn shape_errors_leave_state_untouched() -> Result<()> {
        let mut engine = configured()?;
        engine.analyze(&[0; BINS], &[128; BINS], 0.0)?;

        let mismatch = engine.analyze(&[200; BINS], &[128; 512], 16.0);
        assert!(matches!(
            mismatch,
            Err(AnalysisError::InputShape {
                frequency: BINS,
                time: 512,
                expected: BINS
            })
        ));
        let wrong_len = engine.analyze(&[200; 512], &[128; 512], 16.0);
        assert!(wrong_len.is_err());

        assert_eq!(engine.ticks(), 1);
        assert_eq!(engine.beat_detector().cutoff(), 0.0);
        assert_eq!(engine.band_energy(Band::Full), 0.0);
        Ok(())
    }

    #[test]
    fn result_exposes_arrays_unmodified() -> Result<()> {
        let mut engine = configured()?;
        let freq: Vec<u8> = (0..BINS).map(|i| (i % 256) as u8).collect();
        let time: Vec<u8> = (0..BINS).map(|i| (255 - i % 256) as u8).collect();
        let result = engine.analyze(&freq, &time, 5.0)?;
        assert_eq!(result.frequency, freq.as_slice());
        assert_eq!(result.time, time.as_slice());
        assert_eq!(result.timestamp_ms, 5.0);
        Ok(())
    }

    #[test]
    fn bands_are_reported_each_tick() -> Result<()> {
        let mut engine = configured()?;
        let mut freq = [0u8; BINS];
        freq[..12].fill(255);
        let result = engine.analyze(&freq, &[128; BINS], 0.0)?;
        assert_eq!(result.bands.low, 1.0);
        assert_eq!(result.bands.high, 0.0);
        assert_eq!(engine.band_energy(Band::Low), 1.0);
        Ok(())
    }

    #[test]
    fn periodic_hits_yield_tempo() -> Result<()> {
        // A hit every 75 ticks at 60 ticks/s: one beat per 1250 ms = 48 bpm.
        let mut engine = configured()?;
        let time = [128u8; BINS];
        let mut beats = Vec::new();
        for tick in 0..1200u32 {
            let level = loudness_at(tick, 75);
            let freq = [level; BINS];
            let ts = f64::from(tick) * 1000.0 / 60.0;
            let result = engine.analyze(&freq, &time, ts)?;
            if result.is_beat {
                beats.push(tick);
            }
        }
        assert_eq!(beats.len(), 16, "beats: {beats:?}");
        assert!(beats.windows(2).all(|pair| pair[1] - pair[0] == 75));
        let tempo = engine.tempo_estimator().estimate();
        assert_eq!(tempo.bpm, 48);
        assert!(tempo.is_reliable());
        Ok(())
    }

    #[test]
    fn hits_inside_the_hold_are_skipped() -> Result<()> {
        // Hits every 30 ticks: the ratcheted cutoff is still held on the
        // next two, so only every third hit is a beat.
        let mut engine = configured()?;
        let time = [128u8; BINS];
        let mut beats = Vec::new();
        for tick in 0..400u32 {
            let freq = [loudness_at(tick, 30); BINS];
            if engine.analyze(&freq, &time, f64::from(tick) * 16.0)?.is_beat {
                beats.push(tick);
            }
        }
        assert_eq!(beats, vec![0, 90, 180, 270, 360]);
        Ok(())
    }

    #[test]
    fn reconfigure_resets_stream_state() -> Result<()> {
        let mut engine = configured()?;
        engine.analyze(&[0; BINS], &[128; BINS], 0.0)?;
        engine.analyze(&[200; BINS], &[128; BINS], 16.0)?;
        assert!(engine.beat_detector().cutoff() > 0.0);

        engine.configure(512, 48000)?;
        assert_eq!(engine.ticks(), 0);
        assert_eq!(engine.beat_detector().cutoff(), 0.0);
        assert_eq!(engine.tempo_estimator().window_len(), 0);
        assert!(engine.analyze(&[0; 512], &[128; 512], 0.0).is_ok());
        Ok(())
    }

    #[test]
    fn buffered_path_matches_copy_path() -> Result<()> {
        let mut copied = configured()?;
        let mut buffered = configured()?;
        for tick in 0..200u32 {
            let level = loudness_at(tick, 70);
            let ts = f64::from(tick) * 16.0;
            let a = copied.analyze(&[level; BINS], &[128; BINS], ts)?.report();

            let (freq, time) = buffered.frame_buffers_mut()?;
            freq.fill(level);
            time.fill(128);
            let b = buffered.analyze_buffered(ts)?.report();
            assert_eq!(a, b);
        }
        Ok(())
    }

    #[test]
    fn frame_sample_rate_must_match() -> Result<()> {
        let mut engine = configured()?;
        let freq = [0u8; BINS];
        let time = [128u8; BINS];
        let frame = AnalysisFrame {
            frequency: &freq,
            time: &time,
            sample_rate: 48000,
            timestamp_ms: 0.0,
        };
        assert!(engine.analyze_frame(&frame).is_err());
        let frame = AnalysisFrame {
            sample_rate: 44100,
            ..frame
        };
        assert!(engine.analyze_frame(&frame).is_ok());
        Ok(())
    }

    #[test]
    fn custom_config_is_validated() {
        let mut config = AnalyzerConfig::default();
        config.tempo.min_beats = 0;
        assert!(AnalysisEngine::with_config(config).is_err());
    }
}
