/// Shared types, configuration, and errors for tempolens.
///
/// This crate holds everything the engine and its hosts exchange: frame and
/// result types, the analyzer configuration, the error enum, and the
/// `TickSource` seam.

pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod timeline;
pub mod traits;

pub use config::AnalyzerConfig;
pub use error::{AnalysisError, Result};
pub use frame::{
    AnalysisFrame, AnalysisResult, AnalysisSnapshot, Band, BandLevels, TempoEstimate, TickReport,
};
pub use timeline::AnalysisTimeline;
