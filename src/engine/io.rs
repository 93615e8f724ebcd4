//! Audio file I/O for Loopcutter
//!
//! Decodes WAV source material into SampleBuffers at the file's native rate
//! and writes encoded patches back to disk. Decoding is the only place file
//! formats are sniffed; everything downstream works on in-memory buffers.

use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::engine::buffer::{ChannelLayout, SampleBuffer};
use crate::error::{LoopError, Result};

/// Import a WAV file as a SampleBuffer
///
/// Integer samples are scaled to [-1, 1); float samples are taken as-is.
/// No resampling is performed.
///
/// # Errors
/// * `FileNotFound` - if the file does not exist
/// * `InvalidAudio` - if the file is not a readable WAV file
/// * `UnsupportedFormat` - for more than two channels or an odd bit depth
/// * `MalformedSourceBuffer` - if the file decodes to zero frames
pub fn import_audio(path: &Path) -> Result<SampleBuffer> {
    if !path.exists() {
        return Err(LoopError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| LoopError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    if ChannelLayout::from_count(channels).is_none() {
        return Err(LoopError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    let buffer = SampleBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)?;
    buffer.validate()?;

    log::info!(
        "Imported {} ({} ch, {} Hz, {:.2}s)",
        path.display(),
        channels,
        spec.sample_rate,
        buffer.duration_secs()
    );

    Ok(buffer)
}

/// Write an encoded blob to disk, creating parent directories as needed
pub fn write_blob(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Generate a mono sine wave
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> SampleBuffer {
    let num_frames = (duration_secs * sample_rate as f32) as usize;
    let mut buffer = SampleBuffer::new(num_frames, ChannelLayout::Mono, sample_rate);

    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    for (i, sample) in buffer.samples[0].iter_mut().enumerate() {
        *sample = (angular_freq * i as f32).sin();
    }

    buffer
}

/// Generate a mono click track: 32-sample full-scale bursts on every beat
pub fn generate_click_track(bpm: f64, duration_secs: f64, sample_rate: u32) -> SampleBuffer {
    const CLICK_LEN: usize = 32;

    let num_frames = (duration_secs * sample_rate as f64) as usize;
    let mut buffer = SampleBuffer::new(num_frames, ChannelLayout::Mono, sample_rate);
    if bpm <= 0.0 {
        return buffer;
    }

    let frames_per_beat = 60.0 / bpm * sample_rate as f64;
    let channel = &mut buffer.samples[0];
    let mut beat = 0usize;
    loop {
        let onset = (beat as f64 * frames_per_beat).round() as usize;
        if onset >= num_frames {
            break;
        }
        let end = (onset + CLICK_LEN).min(num_frames);
        channel[onset..end].fill(1.0);
        beat += 1;
    }

    buffer
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let decode_error = |e: hound::Error| LoopError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(Box::new(e)),
    };

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_error),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_error),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_error),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_error),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_error),
        (format, bits) => Err(LoopError::UnsupportedFormat {
            format: format!("{}-bit {:?} audio", bits, format),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::tempdir;

    fn write_wav_i16(path: &Path, channels: u16, sample_rate: u32, frames: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_generate_test_tone() {
        let buffer = generate_test_tone(440.0, 1.0, 44100);
        assert_eq!(buffer.len(), 44100);
        assert_eq!(buffer.channels(), 1);
        assert!(buffer.peak() > 0.99);
    }

    #[test]
    fn test_generate_click_track() {
        let buffer = generate_click_track(120.0, 2.0, 44100);
        assert_eq!(buffer.len(), 88200);
        let channel = buffer.channel(0);
        assert_eq!(channel[0], 1.0);
        assert_eq!(channel[22050], 1.0);
        assert_eq!(channel[22050 + 32], 0.0);
        assert_eq!(channel[11025], 0.0);
    }

    #[test]
    fn test_import_stereo_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav_i16(&path, 2, 48000, &[16384, -16384, 0, 32767]);

        let buffer = import_audio(&path).unwrap();
        assert_eq!(buffer.sample_rate, 48000);
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.channel(0), &[0.5, 0.0]);
        assert_eq!(buffer.channel(1)[0], -0.5);
    }

    #[test]
    fn test_import_missing_file() {
        let result = import_audio(Path::new("/nonexistent/loop.wav"));
        assert!(matches!(result, Err(LoopError::FileNotFound { .. })));
    }

    #[test]
    fn test_import_rejects_non_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.wav");
        fs::write(&path, b"definitely not a riff file").unwrap();
        assert!(matches!(
            import_audio(&path),
            Err(LoopError::InvalidAudio { .. })
        ));
    }

    #[test]
    fn test_import_rejects_empty_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav_i16(&path, 1, 44100, &[]);
        assert!(matches!(
            import_audio(&path),
            Err(LoopError::MalformedSourceBuffer { .. })
        ));
    }

    #[test]
    fn test_write_blob_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("patch.wav");
        write_blob(&path, b"RIFF").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"RIFF");
    }
}
