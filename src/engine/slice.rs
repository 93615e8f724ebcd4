//! Slice extraction
//!
//! Cuts a fractional [start, end) region out of a SampleBuffer into a new,
//! independently owned buffer. No fades or interpolation are applied at the
//! cut points.

use crate::engine::buffer::SampleBuffer;
use crate::error::{LoopError, Result};

/// A fractional region of a buffer's duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Start position in [0, 1]
    pub start: f64,
    /// End position in [0, 1], after `start`
    pub end: f64,
}

impl Selection {
    /// Create a validated selection
    ///
    /// # Errors
    /// * `InvalidSelection` - if either bound is non-finite or outside [0, 1],
    ///   or if `end <= start`
    pub fn new(start: f64, end: f64) -> Result<Self> {
        let invalid = |reason: &str| LoopError::InvalidSelection {
            start,
            end,
            reason: reason.to_string(),
        };

        if !start.is_finite() || !end.is_finite() {
            return Err(invalid("bounds must be finite"));
        }
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) {
            return Err(invalid("bounds must lie within [0, 1]"));
        }
        if end <= start {
            return Err(invalid("end must be after start"));
        }

        Ok(Self { start, end })
    }

    /// The whole buffer
    pub fn full() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
        }
    }

    /// Selection spanning a whole number of bars from `start`
    ///
    /// A bar is four beats at `bpm`. The end is clipped to the end of the
    /// buffer.
    ///
    /// # Errors
    /// * `InvalidSelection` - if the tempo, bar count or duration are not
    ///   positive, or the clipped region is empty
    pub fn from_bars(start: f64, bars: u32, bpm: f64, duration_secs: f64) -> Result<Self> {
        if bars == 0 || !(bpm > 0.0) || !(duration_secs > 0.0) {
            return Err(LoopError::InvalidSelection {
                start,
                end: start,
                reason: format!(
                    "bars ({}), bpm ({}) and duration ({}) must be positive",
                    bars, bpm, duration_secs
                ),
            });
        }

        let secs_per_bar = 60.0 / bpm * 4.0;
        let normalized = secs_per_bar * bars as f64 / duration_secs;
        Self::new(start, (start + normalized).min(1.0))
    }

    /// First frame covered by this selection in a buffer of `frames` frames
    #[inline]
    pub fn start_frame(&self, frames: usize) -> usize {
        (self.start * frames as f64).floor() as usize
    }

    /// One past the last frame covered by this selection
    #[inline]
    pub fn end_frame(&self, frames: usize) -> usize {
        (self.end * frames as f64).floor() as usize
    }
}

/// Copy the selected region of `buffer` into a new buffer
///
/// Every channel is copied over the exact frame range
/// `[floor(start * N), floor(end * N))`.
///
/// # Errors
/// * `MalformedSourceBuffer` - if the source buffer is structurally invalid
/// * `InvalidSelection` - if the region rounds down to zero frames
pub fn slice(buffer: &SampleBuffer, selection: &Selection) -> Result<SampleBuffer> {
    buffer.validate()?;

    let frames = buffer.len();
    let start_frame = selection.start_frame(frames);
    let end_frame = selection.end_frame(frames).min(frames);

    if end_frame <= start_frame {
        return Err(LoopError::InvalidSelection {
            start: selection.start,
            end: selection.end,
            reason: format!(
                "selection covers no frames of a {}-frame buffer",
                frames
            ),
        });
    }

    let samples = buffer
        .samples
        .iter()
        .map(|channel| channel[start_frame..end_frame].to_vec())
        .collect();

    log::debug!(
        "Sliced frames {}..{} ({} channels) from {}-frame buffer",
        start_frame,
        end_frame,
        buffer.channels(),
        frames
    );

    Ok(SampleBuffer {
        samples,
        sample_rate: buffer.sample_rate,
    })
}
