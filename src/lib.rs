//! Loopcutter - loop slicing and sampler patch export
//!
//! Loopcutter turns a decoded recording into loops a hardware sampler can
//! load:
//! 1. Tempo estimation from the recording's energy envelope
//! 2. Slice extraction of fractional regions into independent buffers
//! 3. Export, either one plain WAV per slice or every slice packed into a
//!    single device patch with cue-point metadata
//!
//! All core operations are pure functions over in-memory buffers. Session
//! state (the loop collection, the chosen device and tempo) is owned by the
//! caller.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;

pub use error::{LoopError, Result};
