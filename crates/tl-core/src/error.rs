use thiserror::Error;

/// Errors surfaced by the analysis engine.
///
/// Numeric corner cases (near-zero beat intervals, degenerate band ranges)
/// are not errors: the engine clamps or defaults them internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Invalid or missing configuration. Must be fixed before any `analyze` call.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Frame arrays do not match each other or the configured bin count.
    ///
    /// No partial result is produced; the caller should skip the tick.
    #[error("Input shape mismatch: {frequency} frequency bins, {time} time samples, expected {expected}")]
    InputShape {
        /// Length of the frequency magnitude array.
        frequency: usize,
        /// Length of the time-domain array.
        time: usize,
        /// Configured bin count.
        expected: usize,
    },
}

impl AnalysisError {
    /// Shorthand for a configuration error.
    pub fn config<S: Into<String>>(reason: S) -> Self {
        Self::Configuration(reason.into())
    }

    /// Whether skipping the current tick and supplying a corrected frame next
    /// time is enough to recover.
    ///
    /// # Example
    /// ```
    /// use tl_core::error::AnalysisError;
    /// let err = AnalysisError::InputShape { frequency: 10, time: 12, expected: 10 };
    /// assert!(err.is_per_tick());
    /// assert!(!AnalysisError::config("bin count is zero").is_per_tick());
    /// ```
    #[must_use]
    pub fn is_per_tick(&self) -> bool {
        matches!(self, Self::InputShape { .. })
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
