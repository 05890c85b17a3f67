use tl_core::config::BeatConfig;

use crate::sampler::mean_level;

/// Adaptive-threshold beat detector with hold and decay.
///
/// Each tick the mean magnitude is compared against a ratcheting cutoff and
/// against the rolling average of the last `history_len` ticks. A beat
/// raises the cutoff; after a hold period counted in ticks the cutoff
/// decays multiplicatively, floored at a fraction of the rolling average.
///
/// # Example
/// ```
/// use tl_audio::beat::BeatDetector;
/// let mut detector = BeatDetector::new();
/// assert!(!detector.process(&[0u8; 64]));
/// assert!(detector.process(&[200u8; 64]));
/// ```
#[derive(Clone, Debug)]
pub struct BeatDetector {
    config: BeatConfig,
    /// Loudness above which a beat may be declared (0–255 scale).
    cutoff: f64,
    /// Ticks since the last beat, saturates at `hold_ticks + 1`.
    hold_counter: u32,
    /// Ring of per-tick loudness, always `history_len` long.
    history: Vec<f64>,
    /// Index of the oldest entry in `history`.
    head: usize,
    /// Last decision.
    is_beat: bool,
}

impl BeatDetector {
    /// Create a detector with the stock tuning (60-tick history and hold).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&BeatConfig::default())
    }

    /// Create a detector with custom tuning. A zero `history_len` is raised to 1.
    #[must_use]
    pub fn with_config(config: &BeatConfig) -> Self {
        let len = config.history_len.max(1);
        Self {
            config: config.clone(),
            cutoff: 0.0,
            hold_counter: 0,
            history: vec![0.0; len],
            head: 0,
            is_beat: false,
        }
    }

    /// Process one magnitude frame. Returns `true` on a beat.
    pub fn process(&mut self, magnitudes: &[u8]) -> bool {
        self.process_level(mean_level(magnitudes))
    }

    /// Process one tick given its mean loudness (0–255 scale).
    pub fn process_level(&mut self, average: f64) -> bool {
        self.push_level(average);
        let level_average = self.level_average();

        if average > self.cutoff && average > level_average * self.config.trigger_ratio {
            self.is_beat = true;
            self.cutoff = average * self.config.ratchet;
            self.hold_counter = 0;
            log::trace!("beat: level {average:.2}, cutoff -> {:.2}", self.cutoff);
        } else {
            self.is_beat = false;
            if self.hold_counter <= self.config.hold_ticks {
                self.hold_counter += 1;
            } else {
                let floor = level_average * self.config.floor_ratio;
                self.cutoff = (self.cutoff * self.config.decay).max(floor);
            }
        }

        self.is_beat
    }

    /// FIFO push: overwrite the oldest slot.
    #[inline]
    fn push_level(&mut self, level: f64) {
        self.history[self.head] = level;
        self.head = (self.head + 1) % self.history.len();
    }

    /// Mean of the loudness history.
    #[must_use]
    pub fn level_average(&self) -> f64 {
        let sum: f64 = self.history.iter().sum();
        sum / self.history.len() as f64
    }

    /// Loudness history, oldest first.
    pub fn level_history(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.history.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }

    /// Number of history slots.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Current adaptive cutoff.
    #[must_use]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Ticks since the last beat (saturating at `hold_ticks + 1`).
    #[must_use]
    pub fn hold_counter(&self) -> u32 {
        self.hold_counter
    }

    /// Last decision.
    #[must_use]
    pub fn is_beat(&self) -> bool {
        self.is_beat
    }

    /// Back to the initial state: zero cutoff, zero-filled history.
    pub fn reset(&mut self) {
        self.cutoff = 0.0;
        self.hold_counter = 0;
        self.history.fill(0.0);
        self.head = 0;
        self.is_beat = false;
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new()
    }
}
