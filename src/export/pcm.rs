//! Float to 16-bit PCM conversion

/// Target peak level for normalized exports
pub const NORMALIZE_TARGET: f32 = 0.95;

/// Clamp a sample to [-1, 1]
#[inline]
pub fn clamp_sample(sample: f32) -> f32 {
    sample.clamp(-1.0, 1.0)
}

/// Quantize a float sample to signed 16-bit
///
/// The sample is clamped first; positive values scale by 32767, negative by
/// 32768, and the result is truncated toward zero. NaN maps to 0.
#[inline]
pub fn quantize_i16(sample: f32) -> i16 {
    let clamped = clamp_sample(sample);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Gain that brings `peak` to `NORMALIZE_TARGET`, or unity for silence
#[inline]
pub fn normalization_scalar(peak: f32) -> f32 {
    if peak > 0.0 {
        NORMALIZE_TARGET / peak
    } else {
        1.0
    }
}
