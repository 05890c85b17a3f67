/// Supplies one byte frame per tick to the analysis engine.
///
/// Implemented by the PCM front end (`tl_audio::source::PcmTickSource`);
/// tests script their own sources.
///
/// # Example
/// ```
/// use tl_core::traits::TickSource;
///
/// struct Silence { ticks: u32 }
/// impl TickSource for Silence {
///     fn bin_count(&self) -> usize { 4 }
///     fn sample_rate(&self) -> u32 { 8000 }
///     fn next_tick(&mut self, frequency: &mut [u8], time: &mut [u8]) -> Option<f64> {
///         if self.ticks == 0 { return None; }
///         self.ticks -= 1;
///         frequency.fill(0);
///         time.fill(128);
///         Some(f64::from(self.ticks))
///     }
/// }
/// ```
pub trait TickSource {
    /// Length of both arrays written by [`TickSource::next_tick`].
    fn bin_count(&self) -> usize;

    /// Sample rate used to map bins to Hz.
    fn sample_rate(&self) -> u32;

    /// Write the next frame into the caller's buffers and return its
    /// timestamp in ms, or `None` once the source is exhausted.
    ///
    /// CONTRACT: both buffers are exactly [`TickSource::bin_count`] long.
    /// Must not allocate.
    fn next_tick(&mut self, frequency: &mut [u8], time: &mut [u8]) -> Option<f64>;
}
