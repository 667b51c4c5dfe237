//! Pronunciation scoring: compares a learner recording against a native
//! reference and produces a calibrated score with aspect-level feedback.

pub mod audio;
pub mod config;
pub mod pronunciation;
pub mod types;
