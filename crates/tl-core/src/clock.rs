/// Monotonic stream clock derived from the number of samples consumed.
///
/// The audio position is the master: a host advances the clock by the
/// samples it has fed, and reads tick timestamps from it. Offline runs get
/// reproducible timestamps instead of wall-clock jitter.
///
/// # Example
/// ```
/// use tl_core::clock::StreamClock;
/// let mut clock = StreamClock::new(48000);
/// clock.advance(24000);
/// assert!((clock.now_ms() - 500.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct StreamClock {
    /// Position in samples (mono, source rate).
    sample_pos: u64,
    /// Source sample rate.
    sample_rate: u32,
}

impl StreamClock {
    /// Create a clock at position zero.
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_pos: 0,
            sample_rate,
        }
    }

    /// Current position in milliseconds. Zero if the sample rate is unknown.
    #[inline]
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_pos as f64 * 1000.0 / f64::from(self.sample_rate)
    }

    /// Move forward by `samples`.
    #[inline]
    pub fn advance(&mut self, samples: usize) {
        self.sample_pos = self.sample_pos.saturating_add(samples as u64);
    }

    /// Current position in samples.
    #[inline]
    #[must_use]
    pub fn sample_pos(&self) -> u64 {
        self.sample_pos
    }

    /// Jump to an absolute sample position (seek).
    #[inline]
    pub fn seek(&mut self, sample_pos: u64) {
        self.sample_pos = sample_pos;
    }

    /// Source sample rate.
    #[inline]
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
