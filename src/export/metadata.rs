//! Patch metadata
//!
//! The JSON document carried in the application chunk of a packed patch.
//! Cue points are expressed in the sampler's fixed internal timebase of
//! 44100 Hz x 4096 units per sample, whatever rate the audio is written at.

use serde::{Deserialize, Serialize};

use crate::engine::buffer::SampleBuffer;
use crate::export::profile::{FormatProfile, TargetDevice};

/// Cue-point units per second
pub const CUE_UNITS_PER_SECOND: f64 = 44100.0 * 4096.0;

/// Patch type tag
pub const PATCH_TYPE: &str = "drum";

/// Kit identifier emitted for RIFF patches
pub const KIT_NAME: &str = "envy";

/// Metadata document, serialized in field order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    #[serde(rename = "type")]
    pub patch_type: String,
    #[serde(rename = "dev")]
    pub device: String,
    /// Tempo x 100
    pub bpm: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kit: Option<String>,
    pub start: Vec<u64>,
    pub end: Vec<u64>,
}

impl ExportMetadata {
    /// Build the metadata for `loops` packed back to back
    pub fn new(
        device: TargetDevice,
        profile: &FormatProfile,
        bpm: f64,
        loops: &[&SampleBuffer],
    ) -> Self {
        let (start, end) = cue_points(loops);
        Self {
            patch_type: PATCH_TYPE.to_string(),
            device: device.name().to_string(),
            bpm: encode_bpm(bpm),
            kit: profile.include_kit.then(|| KIT_NAME.to_string()),
            start,
            end,
        }
    }

    /// Compact UTF-8 JSON
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Fixed-point tempo: round(bpm x 100), negative and NaN map to 0
pub fn encode_bpm(bpm: f64) -> u32 {
    (bpm * 100.0).round() as u32
}

/// Start/end cue units for each loop, accumulated in collection order
///
/// Frame offsets are converted to seconds at each loop's own sample rate.
/// The end of loop `i` is always the start of loop `i + 1`.
pub fn cue_points(loops: &[&SampleBuffer]) -> (Vec<u64>, Vec<u64>) {
    let mut start = Vec::with_capacity(loops.len());
    let mut end = Vec::with_capacity(loops.len());

    // Whole frames since the last rate change keep the common single-rate
    // case at exactly frames / rate.
    let mut settled_secs = 0.0f64;
    let mut run_frames = 0u64;
    let mut run_rate: Option<u32> = None;

    let mut boundary = 0u64;
    for buffer in loops {
        if run_rate != Some(buffer.sample_rate) {
            if let Some(rate) = run_rate {
                settled_secs += run_frames as f64 / rate as f64;
            }
            run_frames = 0;
            run_rate = Some(buffer.sample_rate);
        }

        start.push(boundary);
        run_frames += buffer.len() as u64;
        let secs = settled_secs + run_frames as f64 / buffer.sample_rate as f64;
        boundary = (secs * CUE_UNITS_PER_SECOND).floor() as u64;
        end.push(boundary);
    }

    (start, end)
}
