use serde::{Deserialize, Serialize};

use crate::frame::{TempoEstimate, TickReport};

/// All tick reports of an offline run, in tick order.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AnalysisTimeline {
    /// One report per tick.
    pub ticks: Vec<TickReport>,
    /// Nominal duration of one tick (ms), typically `1000 / fps`.
    pub tick_duration_ms: f64,
    /// Sample rate of the analysed audio.
    pub sample_rate: u32,
}

impl AnalysisTimeline {
    /// Report at time `ms`, clamped to the last tick.
    ///
    /// # Example
    /// ```
    /// use tl_core::timeline::AnalysisTimeline;
    /// let timeline = AnalysisTimeline { ticks: vec![], tick_duration_ms: 16.6, sample_rate: 44100 };
    /// assert!(timeline.get_at_time(1000.0).is_none());
    /// ```
    #[must_use]
    pub fn get_at_time(&self, ms: f64) -> Option<&TickReport> {
        if self.ticks.is_empty() || self.tick_duration_ms <= 0.0 {
            return None;
        }
        let index = (ms.max(0.0) / self.tick_duration_ms) as usize;
        self.ticks.get(index.min(self.ticks.len() - 1))
    }

    /// Number of ticks analysed.
    #[must_use]
    pub fn total_ticks(&self) -> usize {
        self.ticks.len()
    }

    /// Timestamps (ms) of every beat tick.
    pub fn beat_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.ticks
            .iter()
            .filter(|t| t.is_beat)
            .map(|t| t.timestamp_ms)
    }

    /// Number of beat ticks.
    #[must_use]
    pub fn beat_count(&self) -> usize {
        self.ticks.iter().filter(|t| t.is_beat).count()
    }

    /// Tempo estimate after the last tick.
    #[must_use]
    pub fn final_tempo(&self) -> TempoEstimate {
        self.ticks.last().map(|t| t.tempo).unwrap_or_default()
    }
}
