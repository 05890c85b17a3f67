use tl_core::config::AnalyzerConfig;
use tl_core::error::{AnalysisError, Result};
use tl_core::frame::TickReport;
use tl_core::timeline::AnalysisTimeline;
use tl_core::traits::TickSource;

use crate::engine::AnalysisEngine;
use crate::source::PcmTickSource;

/// Offline driver: runs a whole buffer or [`TickSource`] through one
/// [`AnalysisEngine`] and collects an [`AnalysisTimeline`].
pub struct BatchAnalyzer {
    engine: AnalysisEngine,
    target_fps: u32,
}

impl BatchAnalyzer {
    /// Create a batch analyzer ticking `target_fps` times per second.
    ///
    /// # Errors
    /// Returns a configuration error if `config` does not validate or
    /// `target_fps` is zero.
    ///
    /// # Example
    /// ```
    /// use tl_audio::batch_analyzer::BatchAnalyzer;
    /// use tl_core::config::AnalyzerConfig;
    /// let analyzer = BatchAnalyzer::new(AnalyzerConfig::default(), 60).unwrap();
    /// assert_eq!(analyzer.target_fps(), 60);
    /// ```
    pub fn new(config: AnalyzerConfig, target_fps: u32) -> Result<Self> {
        if target_fps == 0 {
            return Err(AnalysisError::config("target fps must be positive"));
        }
        Ok(Self {
            engine: AnalysisEngine::with_config(config)?,
            target_fps,
        })
    }

    /// Analyse a mono buffer end to end.
    ///
    /// # Errors
    /// Returns a configuration error if the buffer cannot be ticked at the
    /// target rate (zero sample rate, fps above the sample rate).
    ///
    /// # Example
    /// ```
    /// use tl_audio::batch_analyzer::BatchAnalyzer;
    /// use tl_core::config::AnalyzerConfig;
    /// let mut analyzer = BatchAnalyzer::new(AnalyzerConfig::default(), 60).unwrap();
    /// let samples = vec![0.0; 44100]; // 1 s of silence
    /// let timeline = analyzer.analyze_all(&samples, 44100).unwrap();
    /// assert_eq!(timeline.total_ticks(), 60);
    /// assert_eq!(timeline.beat_count(), 0);
    /// ```
    pub fn analyze_all(&mut self, samples: &[f32], sample_rate: u32) -> Result<AnalysisTimeline> {
        let mut source = PcmTickSource::new(
            samples,
            sample_rate,
            self.target_fps,
            &self.engine.config().spectrum,
        )?;
        log::info!(
            "Analysing {:.2} s of audio: {} ticks at {} fps",
            samples.len() as f64 / f64::from(sample_rate),
            source.total_ticks(),
            self.target_fps
        );
        self.analyze_source(&mut source)
    }

    /// Drain `source`, collecting every tick report.
    ///
    /// # Errors
    /// Returns a configuration error if the source's layout is rejected.
    pub fn analyze_source(&mut self, source: &mut dyn TickSource) -> Result<AnalysisTimeline> {
        let mut ticks = Vec::new();
        self.analyze_source_with(source, |report| ticks.push(*report))?;
        Ok(AnalysisTimeline {
            ticks,
            tick_duration_ms: 1000.0 / f64::from(self.target_fps),
            sample_rate: source.sample_rate(),
        })
    }

    /// Drain `source`, handing each tick report to `on_tick` as it is produced.
    /// Returns the number of ticks analysed.
    ///
    /// The engine is reconfigured for the source's layout first, so every
    /// call starts a fresh stream.
    ///
    /// # Errors
    /// Returns a configuration error if the source's layout is rejected.
    pub fn analyze_source_with<F>(&mut self, source: &mut dyn TickSource, mut on_tick: F) -> Result<usize>
    where
        F: FnMut(&TickReport),
    {
        self.engine.configure(source.bin_count(), source.sample_rate())?;

        let mut count = 0;
        loop {
            let (frequency, time) = self.engine.frame_buffers_mut()?;
            let Some(timestamp_ms) = source.next_tick(frequency, time) else {
                break;
            };
            let report = self.engine.analyze_buffered(timestamp_ms)?.report();
            on_tick(&report);
            count += 1;
        }

        log::debug!(
            "Batch run finished: {count} ticks, tempo {} bpm",
            self.engine.tempo_estimator().estimate().bpm
        );
        Ok(count)
    }

    /// Target tick rate.
    #[must_use]
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Engine state after the last run.
    #[must_use]
    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }
}
