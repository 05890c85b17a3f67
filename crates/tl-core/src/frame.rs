use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Confidence above which a tempo estimate is worth displaying.
pub const RELIABLE_CONFIDENCE: f32 = 0.5;

/// Convert one byte time-domain sample (centered at 128) to a signed sample.
///
/// # Example
/// ```
/// use tl_core::frame::waveform_value;
/// assert_eq!(waveform_value(128), 0.0);
/// assert_eq!(waveform_value(0), -1.0);
/// assert!(waveform_value(255) < 1.0);
/// ```
#[inline(always)]
#[must_use]
pub fn waveform_value(byte: u8) -> f32 {
    f32::from(byte) / 128.0 - 1.0
}

/// One tick of input, produced by the host. Transient, never retained.
///
/// # Example
/// ```
/// use tl_core::frame::AnalysisFrame;
/// let freq = [0u8; 8];
/// let time = [128u8; 8];
/// let frame = AnalysisFrame { frequency: &freq, time: &time, sample_rate: 44100, timestamp_ms: 0.0 };
/// assert!(frame.check_shape(8).is_ok());
/// assert!(frame.check_shape(16).is_err());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct AnalysisFrame<'a> {
    /// Byte frequency magnitudes, index 0 = lowest bin.
    pub frequency: &'a [u8],
    /// Byte time-domain samples, centered at 128.
    pub time: &'a [u8],
    /// Sample rate (Hz) used to map bins to frequencies.
    pub sample_rate: u32,
    /// Monotonic capture time (ms).
    pub timestamp_ms: f64,
}

impl AnalysisFrame<'_> {
    /// Number of frequency bins.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.frequency.len()
    }

    /// Check both arrays against the expected bin count.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InputShape`] on any length mismatch.
    pub fn check_shape(&self, expected: usize) -> Result<()> {
        check_shape(self.frequency, self.time, expected)
    }
}

/// Check a pair of frame arrays against the expected bin count.
///
/// # Errors
/// Returns [`AnalysisError::InputShape`] on any length mismatch.
pub fn check_shape(frequency: &[u8], time: &[u8], expected: usize) -> Result<()> {
    if frequency.len() != expected || time.len() != expected {
        return Err(AnalysisError::InputShape {
            frequency: frequency.len(),
            time: time.len(),
            expected,
        });
    }
    Ok(())
}

/// Named frequency range used for coarse energy summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Bass: 20–250 Hz.
    Low,
    /// Vocals and instruments: 250–4000 Hz.
    Mid,
    /// Cymbals and hats: 4000–20000 Hz.
    High,
    /// The whole spectrum.
    Full,
}

impl Band {
    /// Every band, in display order.
    pub const ALL: [Band; 4] = [Band::Low, Band::Mid, Band::High, Band::Full];

    /// Hz range of the band, `None` for [`Band::Full`].
    ///
    /// # Example
    /// ```
    /// use tl_core::frame::Band;
    /// assert_eq!(Band::Low.range_hz(), Some((20.0, 250.0)));
    /// assert_eq!(Band::Full.range_hz(), None);
    /// ```
    #[must_use]
    pub fn range_hz(self) -> Option<(f32, f32)> {
        match self {
            Band::Low => Some((20.0, 250.0)),
            Band::Mid => Some((250.0, 4000.0)),
            Band::High => Some((4000.0, 20000.0)),
            Band::Full => None,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Band::Low => "low",
            Band::Mid => "mid",
            Band::High => "high",
            Band::Full => "full",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized energy [0.0, 1.0] of each band for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BandLevels {
    /// 20–250 Hz.
    pub low: f32,
    /// 250–4000 Hz.
    pub mid: f32,
    /// 4000–20000 Hz.
    pub high: f32,
    /// Whole spectrum.
    pub full: f32,
}

impl BandLevels {
    /// Level of a single band.
    #[must_use]
    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::Low => self.low,
            Band::Mid => self.mid,
            Band::High => self.high,
            Band::Full => self.full,
        }
    }

    /// Set the level of a single band.
    pub fn set(&mut self, band: Band, value: f32) {
        match band {
            Band::Low => self.low = value,
            Band::Mid => self.mid = value,
            Band::High => self.high = value,
            Band::Full => self.full = value,
        }
    }
}

/// Tempo estimate from recent beat intervals.
///
/// # Example
/// ```
/// use tl_core::frame::TempoEstimate;
/// let t = TempoEstimate::default();
/// assert_eq!(t.bpm, 0);
/// assert!(!t.is_reliable());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TempoEstimate {
    /// Beats per minute, 0 until enough beats were seen.
    pub bpm: u32,
    /// Regularity of recent intervals [0.0, 1.0]. Not a probability.
    pub confidence: f32,
}

impl TempoEstimate {
    /// `true` once a BPM exists and its intervals are regular enough to show.
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        self.bpm > 0 && self.confidence > RELIABLE_CONFIDENCE
    }
}

/// Per-tick summary without the raw arrays. `Copy`, cheap to keep around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TickReport {
    /// Capture time of the tick (ms, host monotonic clock).
    pub timestamp_ms: f64,
    /// True if this tick crossed the adaptive beat threshold.
    pub is_beat: bool,
    /// Tempo estimate after this tick.
    pub tempo: TempoEstimate,
    /// Band energies of this tick.
    pub bands: BandLevels,
}

/// Output of one `analyze` call.
///
/// Borrows the engine's frame buffers: it is valid until the next call,
/// which the borrow checker enforces. Use [`AnalysisResult::to_snapshot`]
/// to keep a tick around.
#[derive(Clone, Copy, Debug)]
pub struct AnalysisResult<'a> {
    /// Byte frequency magnitudes, index 0 = lowest bin.
    pub frequency: &'a [u8],
    /// Byte time-domain samples, centered at 128.
    pub time: &'a [u8],
    /// Capture time of the tick (ms).
    pub timestamp_ms: f64,
    /// Beat decision for this tick.
    pub is_beat: bool,
    /// Tempo estimate after this tick.
    pub tempo: TempoEstimate,
    /// Band energies of this tick.
    pub bands: BandLevels,
}

impl AnalysisResult<'_> {
    /// Signed waveform samples in [-1.0, 1.0).
    pub fn waveform(&self) -> impl Iterator<Item = f32> + '_ {
        self.time.iter().map(|&b| waveform_value(b))
    }

    /// Summary of the tick without the arrays.
    #[must_use]
    pub fn report(&self) -> TickReport {
        TickReport {
            timestamp_ms: self.timestamp_ms,
            is_beat: self.is_beat,
            tempo: self.tempo,
            bands: self.bands,
        }
    }

    /// Owned copy of the whole tick, arrays included.
    #[must_use]
    pub fn to_snapshot(&self) -> AnalysisSnapshot {
        AnalysisSnapshot {
            report: self.report(),
            frequency: self.frequency.to_vec(),
            time: self.time.to_vec(),
        }
    }
}

/// Owned copy of an [`AnalysisResult`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisSnapshot {
    /// Tick summary.
    pub report: TickReport,
    /// Byte frequency magnitudes.
    pub frequency: Vec<u8>,
    /// Byte time-domain samples.
    pub time: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result<'a>(frequency: &'a [u8], time: &'a [u8]) -> AnalysisResult<'a> {
        AnalysisResult {
            frequency,
            time,
            timestamp_ms: 1500.0,
            is_beat: true,
            tempo: TempoEstimate {
                bpm: 120,
                confidence: 0.9,
            },
            bands: BandLevels {
                low: 0.5,
                mid: 0.25,
                high: 0.0,
                full: 0.2,
            },
        }
    }

    #[test]
    fn waveform_is_centered_on_128() {
        let freq = [0u8; 4];
        let time = [0u8, 64, 128, 192];
        let r = result(&freq, &time);
        let wave: Vec<f32> = r.waveform().collect();
        assert_eq!(wave, vec![-1.0, -0.5, 0.0, 0.5]);
    }

    #[test]
    fn snapshot_copies_arrays() {
        let freq = [10u8, 20, 30];
        let time = [128u8, 129, 127];
        let snap = result(&freq, &time).to_snapshot();
        assert_eq!(snap.frequency, freq.to_vec());
        assert_eq!(snap.time, time.to_vec());
        assert!(snap.report.is_beat);
        assert_eq!(snap.report.tempo.bpm, 120);
    }

    #[test]
    fn snapshot_serializes() -> std::result::Result<(), serde_json::Error> {
        let freq = [1u8, 2];
        let time = [128u8, 128];
        let snap = result(&freq, &time).to_snapshot();
        let json = serde_json::to_string(&snap)?;
        assert!(json.contains("\"is_beat\":true"));
        let back: AnalysisSnapshot = serde_json::from_str(&json)?;
        assert_eq!(back, snap);
        Ok(())
    }

    #[test]
    fn band_levels_get_set() {
        let mut levels = BandLevels::default();
        for (i, band) in Band::ALL.iter().enumerate() {
            levels.set(*band, i as f32 * 0.1);
        }
        assert_eq!(levels.get(Band::Low), 0.0);
        assert!((levels.get(Band::Full) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn reliability_threshold() {
        let shaky = TempoEstimate {
            bpm: 128,
            confidence: 0.5,
        };
        assert!(!shaky.is_reliable());
        let steady = TempoEstimate {
            bpm: 128,
            confidence: 0.51,
        };
        assert!(steady.is_reliable());
    }
}
