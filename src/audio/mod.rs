//! Decoding and resampling that run before the scoring engine sees a buffer.

pub mod decoder;
pub mod resample;
