use std::f32::consts::PI;

/// Deterministic click-track synthesizer feeding the analyzer.
///
/// Each click is a sine burst with a linear decay. With swing, every odd
/// click is pushed late by `swing_ms`.
#[derive(Clone, Debug)]
pub struct ClickTrack {
    bpm: f64,
    swing_ms: f64,
    sample_rate: u32,
    click_hz: f32,
    click_ms: f64,
    amplitude: f32,
}

impl ClickTrack {
    /// Straight 1 kHz clicks of 45 ms at `bpm`, rendered at `sample_rate`.
    #[must_use]
    pub fn new(bpm: f64, sample_rate: u32) -> Self {
        Self {
            bpm,
            swing_ms: 0.0,
            sample_rate,
            click_hz: 1000.0,
            click_ms: 45.0,
            amplitude: 0.9,
        }
    }

    /// Builder: delay every odd click by `swing_ms`.
    #[must_use]
    pub fn with_swing(mut self, swing_ms: f64) -> Self {
        self.swing_ms = swing_ms;
        self
    }

    /// Nominal beat period (ms).
    #[must_use]
    pub fn beat_ms(&self) -> f64 {
        60_000.0 / self.bpm
    }

    /// Onset time (ms) of every click starting before `seconds`.
    #[must_use]
    pub fn click_times_ms(&self, seconds: f64) -> Vec<f64> {
        let end_ms = seconds * 1000.0;
        let beat = self.beat_ms();
        if !(beat.is_finite() && beat > 0.0) {
            return Vec::new();
        }
        (0u32..)
            .map(|k| {
                let swing = if k % 2 == 1 { self.swing_ms } else { 0.0 };
                (f64::from(k) * beat + swing).max(0.0)
            })
            .take_while(|&t| t < end_ms)
            .collect()
    }

    /// Render `seconds` of mono audio.
    #[must_use]
    pub fn render(&self, seconds: f64) -> Vec<f32> {
        let sr = f64::from(self.sample_rate);
        let len = (seconds.max(0.0) * sr) as usize;
        let mut samples = vec![0.0f32; len];
        let click_len = (self.click_ms / 1000.0 * sr) as usize;

        for onset_ms in self.click_times_ms(seconds) {
            let start = (onset_ms / 1000.0 * sr) as usize;
            let end = (start + click_len).min(len);
            for (n, slot) in samples[start.min(end)..end].iter_mut().enumerate() {
                let t = n as f32 / self.sample_rate as f32;
                let envelope = 1.0 - n as f32 / click_len as f32;
                *slot = self.amplitude * envelope * (2.0 * PI * self.click_hz * t).sin();
            }
        }

        log::debug!(
            "Synthesized {seconds:.1} s click track at {:.1} bpm (swing {:.0} ms)",
            self.bpm,
            self.swing_ms
        );
        samples
    }
}
