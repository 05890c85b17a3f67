use std::collections::VecDeque;

use tl_core::config::TempoConfig;
use tl_core::frame::TempoEstimate;

/// Mean intervals at or below this (ms) are treated as simultaneous beats.
const MIN_MEAN_INTERVAL_MS: f64 = 1e-3;

/// Interval-based tempo estimator over a trailing window of beat timestamps.
///
/// Fed only on beat ticks. The window is pruned whenever a beat arrives (a
/// beat exactly `window_ms` old is dropped), and the estimate is recomputed
/// once the window holds `min_beats` timestamps; below that the previous
/// estimate is kept to avoid flicker.
///
/// # Example
/// ```
/// use tl_audio::tempo::TempoEstimator;
/// let mut tempo = TempoEstimator::new();
/// for i in 0..6 {
///     tempo.observe(f64::from(i) * 500.0);
/// }
/// assert_eq!(tempo.estimate().bpm, 120);
/// ```
#[derive(Clone, Debug)]
pub struct TempoEstimator {
    window_ms: f64,
    min_beats: usize,
    /// Beat timestamps (ms), oldest first, non-decreasing.
    timestamps: VecDeque<f64>,
    estimate: TempoEstimate,
}

impl TempoEstimator {
    /// Create an estimator with the stock tuning (10 s window, 6 beats).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&TempoConfig::default())
    }

    /// Create an estimator with custom tuning. `min_beats` is raised to 2.
    #[must_use]
    pub fn with_config(config: &TempoConfig) -> Self {
        Self {
            window_ms: config.window_ms,
            min_beats: config.min_beats.max(2),
            timestamps: VecDeque::with_capacity(64),
            estimate: TempoEstimate::default(),
        }
    }

    /// Record a beat at `timestamp_ms` and return the (possibly stale) estimate.
    ///
    /// A timestamp earlier than the newest recorded one means the host clock
    /// jumped back (seek, restart): the window is restarted from this beat.
    /// Non-finite timestamps are ignored.
    pub fn observe(&mut self, timestamp_ms: f64) -> TempoEstimate {
        if !timestamp_ms.is_finite() {
            log::warn!("Ignoring beat with non-finite timestamp {timestamp_ms}");
            return self.estimate;
        }
        if self.timestamps.back().is_some_and(|&last| timestamp_ms < last) {
            log::warn!(
                "Beat clock went backwards ({timestamp_ms:.1} ms), restarting tempo window"
            );
            self.timestamps.clear();
        }

        self.timestamps.push_back(timestamp_ms);
        let oldest_kept = timestamp_ms - self.window_ms;
        while self.timestamps.front().is_some_and(|&t| t <= oldest_kept) {
            self.timestamps.pop_front();
        }

        if self.timestamps.len() >= self.min_beats {
            self.recompute();
        }
        self.estimate
    }

    /// Mean interval → BPM, mean absolute deviation → confidence.
    fn recompute(&mut self) {
        let count = self.timestamps.len() - 1;
        let intervals = || {
            self.timestamps
                .iter()
                .zip(self.timestamps.iter().skip(1))
                .map(|(a, b)| b - a)
        };

        let mean = intervals().sum::<f64>() / count as f64;
        if mean <= MIN_MEAN_INTERVAL_MS {
            log::debug!("Mean beat interval {mean} ms too small, confidence forced to 0");
            self.estimate.confidence = 0.0;
            return;
        }

        let deviation = intervals().map(|i| (i - mean).abs()).sum::<f64>() / count as f64;
        self.estimate = TempoEstimate {
            bpm: (60_000.0 / mean).round() as u32,
            confidence: (1.0 - deviation / mean).max(0.0) as f32,
        };
        log::debug!(
            "tempo: {} bpm, confidence {:.2} over {} beats",
            self.estimate.bpm,
            self.estimate.confidence,
            self.timestamps.len()
        );
    }

    /// Last computed estimate.
    #[must_use]
    pub fn estimate(&self) -> TempoEstimate {
        self.estimate
    }

    /// Beat timestamps currently in the window, oldest first.
    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.timestamps.iter().copied()
    }

    /// Number of timestamps in the window.
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.timestamps.len()
    }

    /// Forget every beat and the estimate.
    pub fn reset(&mut self) {
        self.timestamps.clear();
        self.estimate = TempoEstimate::default();
    }
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self::new()
    }
}
