//! Sample Buffer Management
//!
//! Decoded audio held as non-interleaved 32-bit float channels plus the
//! sample rate it was decoded at. Buffers are never resampled here.

use crate::error::{LoopError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Peak absolute sample value across all channels (linear, not dB)
///
/// Returns 0.0 for empty buffers.
pub fn calculate_peak(buffer: &SampleBuffer) -> f32 {
    buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

/// Root-mean-square level of a slice of samples (linear)
///
/// Returns 0.0 for an empty slice.
#[inline]
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Sample Buffer
// ============================================================================

/// In-memory decoded audio
///
/// Stores audio as non-interleaved 32-bit floating point samples, nominally
/// in [-1, 1]. Every channel has the same length.
///
/// # Example
/// ```
/// use loopcutter::engine::buffer::{ChannelLayout, SampleBuffer};
///
/// // One second of stereo silence at 44.1kHz
/// let buffer = SampleBuffer::new(44100, ChannelLayout::Stereo, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Sample data: outer Vec is channels, inner Vec is frames
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl SampleBuffer {
    /// Create a zeroed buffer with the given frame count and layout
    pub fn new(num_frames: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_frames]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Build a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// * `MalformedSourceBuffer` - if there are no channels, a channel is
    ///   empty, channel lengths differ, or the sample rate is zero
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let buffer = Self {
            samples,
            sample_rate,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Create a buffer from interleaved sample data
    ///
    /// # Errors
    /// * `MalformedSourceBuffer` - if the channel count is zero or the data
    ///   length is not a multiple of it
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(LoopError::MalformedSourceBuffer {
                reason: "channel count is zero".to_string(),
            });
        }

        if interleaved.len() % channels != 0 {
            return Err(LoopError::MalformedSourceBuffer {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
            });
        }

        let num_frames = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(num_frames); channels];

        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of frames (samples per channel)
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get the channel layout, if it is mono or stereo
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Left/right view used by the stereo encoders
    ///
    /// Mono buffers duplicate channel 0 into the right side. Channels beyond
    /// the second are ignored.
    ///
    /// # Errors
    /// * `MalformedSourceBuffer` - if the buffer has no channel data
    pub fn stereo_pair(&self) -> Result<(&[f32], &[f32])> {
        let left = self
            .samples
            .first()
            .filter(|ch| !ch.is_empty())
            .ok_or_else(|| LoopError::MalformedSourceBuffer {
                reason: "buffer has no channel data".to_string(),
            })?;
        let right = self.samples.get(1).unwrap_or(left);
        Ok((left.as_slice(), right.as_slice()))
    }

    /// Peak absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        calculate_peak(self)
    }

    /// Check the structural invariants of the buffer
    ///
    /// # Errors
    /// * `MalformedSourceBuffer` describing the first violated invariant
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(LoopError::MalformedSourceBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }

        let Some(first) = self.samples.first() else {
            return Err(LoopError::MalformedSourceBuffer {
                reason: "buffer has no channels".to_string(),
            });
        };

        if first.is_empty() {
            return Err(LoopError::MalformedSourceBuffer {
                reason: "buffer has no samples".to_string(),
            });
        }

        if let Some((index, channel)) = self
            .samples
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != first.len())
        {
            return Err(LoopError::MalformedSourceBuffer {
                reason: format!(
                    "channel {} has {} frames, expected {}",
                    index,
                    channel.len(),
                    first.len()
                ),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
