//! Audio Engine Module
//!
//! Sample data handling shared by analysis and export:
//! - Sample buffer model
//! - Slice extraction and the loop collection
//! - File I/O at the edges

pub mod buffer;
pub mod collection;
pub mod io;
pub mod slice;

pub use buffer::{ChannelLayout, SampleBuffer};
pub use collection::{Loop, LoopCollection};
pub use io::{generate_click_track, generate_test_tone, import_audio, write_blob};
pub use slice::{slice, Selection};
