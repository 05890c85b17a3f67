// Beat detection, tempo estimation and spectral band sampling for tempolens.

pub mod batch_analyzer;
pub mod beat;
pub mod engine;
pub mod fft;
pub mod sampler;
pub mod source;
pub mod tempo;
