use tl_core::clock::StreamClock;
use tl_core::config::SpectrumConfig;
use tl_core::error::{AnalysisError, Result};
use tl_core::traits::TickSource;

use crate::fft::ByteSpectrum;

/// Walks a decoded mono buffer at a fixed tick rate, as a playback host
/// would, producing one byte frame per tick.
///
/// Tick `i` sits at sample `i * samples_per_tick` and sees the `fft_size`
/// samples that precede it, so the first tick is silent.
///
/// # Example
/// ```
/// use tl_audio::source::PcmTickSource;
/// use tl_core::config::SpectrumConfig;
/// use tl_core::traits::TickSource;
///
/// let samples = vec![0.0f32; 44100];
/// let mut source = PcmTickSource::new(&samples, 44100, 60, &SpectrumConfig::default()).unwrap();
/// assert_eq!(source.total_ticks(), 60);
/// let mut freq = vec![0u8; source.bin_count()];
/// let mut time = vec![0u8; source.bin_count()];
/// assert_eq!(source.next_tick(&mut freq, &mut time), Some(0.0));
/// ```
pub struct PcmTickSource<'a> {
    samples: &'a [f32],
    spectrum: ByteSpectrum,
    clock: StreamClock,
    samples_per_tick: usize,
    next_tick: usize,
    total_ticks: usize,
}

impl<'a> PcmTickSource<'a> {
    /// Create a source over `samples` ticking `fps` times per second.
    ///
    /// # Errors
    /// Returns a configuration error for a zero sample rate or fps, a tick
    /// shorter than one sample, or an invalid spectrum configuration.
    pub fn new(
        samples: &'a [f32],
        sample_rate: u32,
        fps: u32,
        spectrum: &SpectrumConfig,
    ) -> Result<Self> {
        if sample_rate == 0 || fps == 0 {
            return Err(AnalysisError::config("sample rate and fps must be positive"));
        }
        let samples_per_tick = (sample_rate / fps) as usize;
        if samples_per_tick == 0 {
            return Err(AnalysisError::config(format!(
                "{fps} ticks/s is faster than the {sample_rate} Hz sample rate"
            )));
        }
        Ok(Self {
            samples,
            spectrum: ByteSpectrum::new(spectrum)?,
            clock: StreamClock::new(sample_rate),
            samples_per_tick,
            next_tick: 0,
            total_ticks: samples.len().div_ceil(samples_per_tick),
        })
    }

    /// Number of ticks this source will yield.
    #[must_use]
    pub fn total_ticks(&self) -> usize {
        self.total_ticks
    }

    /// Samples between two ticks.
    #[must_use]
    pub fn samples_per_tick(&self) -> usize {
        self.samples_per_tick
    }
}

impl TickSource for PcmTickSource<'_> {
    fn bin_count(&self) -> usize {
        self.spectrum.bin_count()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    fn next_tick(&mut self, frequency: &mut [u8], time: &mut [u8]) -> Option<f64> {
        if self.next_tick >= self.total_ticks {
            return None;
        }
        let pos = self.next_tick * self.samples_per_tick;
        self.clock.seek(pos as u64);
        let window = &self.samples[pos.saturating_sub(self.spectrum.fft_size())..pos];

        if let Err(e) = self.spectrum.process(window, frequency, time) {
            log::warn!("Tick {} skipped: {e}", self.next_tick);
            frequency.fill(0);
            time.fill(128);
        }

        self.next_tick += 1;
        Some(self.clock.now_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_count_and_timestamps() -> Result<()> {
        let samples = vec![0.0f32; 48000];
        let mut source = PcmTickSource::new(&samples, 48000, 50, &SpectrumConfig::default())?;
        assert_eq!(source.samples_per_tick(), 960);
        assert_eq!(source.total_ticks(), 50);

        let mut freq = vec![0u8; source.bin_count()];
        let mut time = vec![0u8; source.bin_count()];
        let mut stamps = Vec::new();
        while let Some(ts) = source.next_tick(&mut freq, &mut time) {
            stamps.push(ts);
        }
        assert_eq!(stamps.len(), 50);
        assert_eq!(stamps[0], 0.0);
        assert!((stamps[1] - 20.0).abs() < 1e-9);
        assert!((stamps[49] - 980.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn first_tick_is_silent() -> Result<()> {
        let samples = vec![0.8f32; 8192];
        let mut source = PcmTickSource::new(&samples, 8192, 8, &SpectrumConfig::default())?;
        let mut freq = vec![7u8; 1024];
        let mut time = vec![7u8; 1024];
        source.next_tick(&mut freq, &mut time);
        assert!(freq.iter().all(|&b| b == 0));
        assert!(time.iter().all(|&b| b == 128));

        source.next_tick(&mut freq, &mut time);
        assert!(time.iter().all(|&b| b == 230));
        Ok(())
    }

    #[test]
    fn rejects_degenerate_rates() {
        let samples = [0.0f32; 16];
        let config = SpectrumConfig::default();
        assert!(PcmTickSource::new(&samples, 0, 60, &config).is_err());
        assert!(PcmTickSource::new(&samples, 44100, 0, &config).is_err());
        assert!(PcmTickSource::new(&samples, 30, 60, &config).is_err());
    }

    #[test]
    fn empty_buffer_yields_nothing() -> Result<()> {
        let mut source = PcmTickSource::new(&[], 44100, 60, &SpectrumConfig::default())?;
        let mut freq = vec![0u8; 1024];
        let mut time = vec![0u8; 1024];
        assert_eq!(source.next_tick(&mut freq, &mut time), None);
        Ok(())
    }
}
