//! Audio analysis
//!
//! Offline heuristics run once over decoded source material.

pub mod tempo;

pub use tempo::{envelope, estimate_bpm, TempoEstimator};
