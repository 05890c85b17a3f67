use tl_core::error::{AnalysisError, Result};
use tl_core::frame::{AnalysisFrame, Band, BandLevels};

/// Width of one frequency bin in Hz.
///
/// # Example
/// ```
/// use tl_audio::sampler::bin_hz;
/// assert!((bin_hz(44100, 1024) - 21.533).abs() < 1e-3);
/// ```
#[inline]
#[must_use]
pub fn bin_hz(sample_rate: u32, bin_count: usize) -> f64 {
    f64::from(sample_rate) / (2 * bin_count) as f64
}

/// Inclusive bin range `(start, end)` covered by `band`.
///
/// Both ends are floor-divided by the bin width and clamped to
/// `[0, bin_count - 1]`. A degenerate range collapses to the single bin
/// `start`. `bin_count` must be non-zero.
///
/// # Example
/// ```
/// use tl_audio::sampler::band_bins;
/// use tl_core::frame::Band;
/// assert_eq!(band_bins(Band::Low, 1024, 44100), (0, 11));
/// assert_eq!(band_bins(Band::Full, 1024, 44100), (0, 1023));
/// ```
#[must_use]
pub fn band_bins(band: Band, bin_count: usize, sample_rate: u32) -> (usize, usize) {
    let last = bin_count.saturating_sub(1);
    let Some((low_hz, high_hz)) = band.range_hz() else {
        return (0, last);
    };
    let width = bin_hz(sample_rate, bin_count);
    let start = ((f64::from(low_hz) / width).floor() as usize).min(last);
    let end = ((f64::from(high_hz) / width).floor() as usize).min(last);
    if start > end { (start, start) } else { (start, end) }
}

/// Mean of `magnitudes[start..=end]` normalized to [0.0, 1.0].
#[inline]
fn mean_normalized(magnitudes: &[u8], start: usize, end: usize) -> f32 {
    let Some(slice) = magnitudes.get(start..=end) else {
        return 0.0;
    };
    let sum: u64 = slice.iter().map(|&m| u64::from(m)).sum();
    (sum as f64 / slice.len() as f64 / 255.0) as f32
}

/// Mean loudness of a magnitude array on the 0–255 scale. Zero when empty.
///
/// # Example
/// ```
/// use tl_audio::sampler::mean_level;
/// assert_eq!(mean_level(&[0, 100, 200]), 100.0);
/// assert_eq!(mean_level(&[]), 0.0);
/// ```
#[inline]
#[must_use]
pub fn mean_level(magnitudes: &[u8]) -> f64 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let sum: u64 = magnitudes.iter().map(|&m| u64::from(m)).sum();
    sum as f64 / magnitudes.len() as f64
}

/// Normalized energy of `band` in a frame. Pure, no hidden state.
///
/// Returns 0.0 for an empty frame.
///
/// # Example
/// ```
/// use tl_audio::sampler::band_energy;
/// use tl_core::frame::{AnalysisFrame, Band};
/// let freq = [255u8; 1024];
/// let time = [128u8; 1024];
/// let frame = AnalysisFrame { frequency: &freq, time: &time, sample_rate: 44100, timestamp_ms: 0.0 };
/// assert_eq!(band_energy(Band::Low, &frame), 1.0);
/// ```
#[must_use]
pub fn band_energy(band: Band, frame: &AnalysisFrame<'_>) -> f32 {
    band_energy_of(band, frame.frequency, frame.sample_rate)
}

/// [`band_energy`] over a bare magnitude array.
#[must_use]
pub fn band_energy_of(band: Band, magnitudes: &[u8], sample_rate: u32) -> f32 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let (start, end) = band_bins(band, magnitudes.len(), sample_rate);
    mean_normalized(magnitudes, start, end)
}

/// Band-energy extractor bound to one bin layout.
///
/// Bin ranges are resolved once at construction so the per-tick cost is
/// four slice means.
///
/// # Example
/// ```
/// use tl_audio::sampler::SpectralSampler;
/// use tl_core::frame::Band;
/// let sampler = SpectralSampler::new(1024, 44100).unwrap();
/// assert_eq!(sampler.bins(Band::Mid), (11, 185));
/// ```
#[derive(Clone, Debug)]
pub struct SpectralSampler {
    bin_count: usize,
    sample_rate: u32,
    /// Inclusive ranges in `Band::ALL` order.
    ranges: [(usize, usize); 4],
}

impl SpectralSampler {
    /// Resolve band ranges for `bin_count` bins at `sample_rate`.
    ///
    /// # Errors
    /// Returns a configuration error if either value is zero.
    pub fn new(bin_count: usize, sample_rate: u32) -> Result<Self> {
        if bin_count == 0 {
            return Err(AnalysisError::config("bin count must be positive"));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::config("sample rate must be positive"));
        }
        let ranges = Band::ALL.map(|band| band_bins(band, bin_count, sample_rate));
        Ok(Self {
            bin_count,
            sample_rate,
            ranges,
        })
    }

    /// Inclusive bin range of `band`.
    #[must_use]
    pub fn bins(&self, band: Band) -> (usize, usize) {
        self.ranges[band as usize]
    }

    /// Normalized energy of one band.
    #[must_use]
    pub fn energy(&self, band: Band, magnitudes: &[u8]) -> f32 {
        let (start, end) = self.bins(band);
        mean_normalized(magnitudes, start, end)
    }

    /// Energy of every band.
    #[must_use]
    pub fn levels(&self, magnitudes: &[u8]) -> BandLevels {
        let mut levels = BandLevels::default();
        for band in Band::ALL {
            levels.set(band, self.energy(band, magnitudes));
        }
        levels
    }

    /// Configured bin count.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Configured sample rate.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
