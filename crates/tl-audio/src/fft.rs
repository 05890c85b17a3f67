use realfft::RealFftPlanner;
use tl_core::config::{MIN_FFT_SIZE, SpectrumConfig};
use tl_core::error::{AnalysisError, Result};
use tl_core::frame::check_shape;

/// PCM → byte spectrum front end.
///
/// Produces the two byte arrays the engine consumes: Blackman-windowed FFT
/// magnitudes, smoothed over time and mapped from a dB range onto 0–255,
/// and the time-domain samples recentered on 128.
///
/// Pre-allocates the FFT plan and scratch buffers for zero-allocation hot path.
///
/// # Example
/// ```
/// use tl_audio::fft::ByteSpectrum;
/// use tl_core::config::{MIN_FFT_SIZE, SpectrumConfig};
/// let spectrum = ByteSpectrum::new(&SpectrumConfig::default()).unwrap();
/// assert_eq!(spectrum.bin_count(), 1024);
/// ```
pub struct ByteSpectrum {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<realfft::num_complex::Complex<f32>>,
    scratch: Vec<realfft::num_complex::Complex<f32>>,
    plan: std::sync::Arc<dyn realfft::RealToComplex<f32>>,
    /// Blackman window coefficients.
    window: Vec<f32>,
    /// Smoothed magnitudes carried between ticks, one per bin.
    smoothed: Vec<f32>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
}

impl ByteSpectrum {
    /// Create a front end for the configured FFT size.
    ///
    /// # Errors
    /// Returns a configuration error if `fft_size` is not a power of two of
    /// at least [`MIN_FFT_SIZE`], or if the dB range is empty.
    pub fn new(config: &SpectrumConfig) -> Result<Self> {
        let size = config.fft_size;
        if size < MIN_FFT_SIZE || !size.is_power_of_two() {
            return Err(AnalysisError::config(format!(
                "fft_size must be a power of two >= {MIN_FFT_SIZE}, got {size}"
            )));
        }
        if config.min_db >= config.max_db {
            return Err(AnalysisError::config("min_db must be below max_db"));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        // Blackman, alpha = 0.16
        let window: Vec<f32> = (0..size)
            .map(|i| {
                let x = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect();

        Ok(Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            window,
            smoothed: vec![0.0; size / 2],
            smoothing: config.smoothing.clamp(0.0, 1.0),
            min_db: config.min_db,
            max_db: config.max_db,
        })
    }

    /// Analyse the most recent `fft_size` samples of `samples` into the
    /// caller's byte buffers.
    ///
    /// Shorter input is left-padded with silence so the newest sample always
    /// sits at the end of the window. `time` receives the newest `bin_count`
    /// samples.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InputShape`] if either buffer is not exactly
    /// `bin_count` long.
    ///
    /// # Example
    /// ```
    /// use tl_audio::fft::ByteSpectrum;
    /// use tl_core::config::{MIN_FFT_SIZE, SpectrumConfig};
    /// let config = SpectrumConfig { fft_size: 256, ..SpectrumConfig::default() };
    /// let mut spectrum = ByteSpectrum::new(&config).unwrap();
    /// let mut freq = vec![0u8; 128];
    /// let mut time = vec![0u8; 128];
    /// spectrum.process(&[0.0; 256], &mut freq, &mut time).unwrap();
    /// assert!(freq.iter().all(|&b| b == 0));
    /// assert!(time.iter().all(|&b| b == 128));
    /// ```
    pub fn process(&mut self, samples: &[f32], frequency: &mut [u8], time: &mut [u8]) -> Result<()> {
        let bins = self.bin_count();
        check_shape(frequency, time, bins)?;

        let recent = &samples[samples.len().saturating_sub(self.fft_size)..];
        let pad = self.fft_size - recent.len();

        for (dst, &s) in time.iter_mut().rev().zip(recent.iter().rev()) {
            *dst = Self::time_byte(s);
        }
        if recent.len() < bins {
            time[..bins - recent.len()].fill(128);
        }

        self.input_buf[..pad].fill(0.0);
        for ((slot, &s), &w) in self.input_buf[pad..]
            .iter_mut()
            .zip(recent)
            .zip(&self.window[pad..])
        {
            *slot = s * w;
        }

        if self
            .plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .is_err()
        {
            log::warn!("FFT failed, emitting a silent frame");
            frequency.fill(0);
            return Ok(());
        }

        let norm = 1.0 / self.fft_size as f32;
        let tau = self.smoothing;
        let scale = 255.0 / (self.max_db - self.min_db);
        for ((out, prev), c) in frequency
            .iter_mut()
            .zip(self.smoothed.iter_mut())
            .zip(&self.spectrum_buf)
        {
            let magnitude = (c.re * c.re + c.im * c.im).sqrt() * norm;
            *prev = tau * *prev + (1.0 - tau) * magnitude;
            let db = 20.0 * prev.log10();
            // -inf for silent bins clamps to 0
            *out = ((db - self.min_db) * scale).clamp(0.0, 255.0) as u8;
        }

        Ok(())
    }

    /// Byte encoding of one signed sample, centered at 128.
    #[inline(always)]
    fn time_byte(sample: f32) -> u8 {
        (128.0 * (1.0 + sample)).clamp(0.0, 255.0) as u8
    }

    /// Forget the smoothing history (after a seek or stream change).
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// FFT window size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bins written per tick (`fft_size / 2`).
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}
