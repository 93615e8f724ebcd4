//! Patch and slice encoders
//!
//! One encoder serves both patch containers; a `FormatProfile` decides byte
//! order, chunk tags, the `kit` field and normalization. Cue-point math and
//! quantization are shared, so the two variants cannot drift apart.
//!
//! Patch layout (RIFF):
//! ```text
//! RIFF <size> WAVE
//! fmt  16 | PCM, 2 ch, 44100 Hz, byte rate, block align 4, 16 bit
//! data <n> | interleaved i16 LE frames of every loop, in order
//! appl <4 + json> | "op-1" json [pad]
//! ```
//!
//! Patch layout (AIFF):
//! ```text
//! FORM <size> AIFF
//! COMM 18 | 2 ch, frames, 16 bit, 80-bit extended sample rate
//! SSND <8 + n> | offset 0, block size 0, interleaved i16 BE frames
//! APPL <4 + json> | "op-1" json [pad]
//! ```

use sha2::{Digest, Sha256};

use crate::engine::buffer::SampleBuffer;
use crate::error::{LoopError, Result};
use crate::export::metadata::ExportMetadata;
use crate::export::pcm::{normalization_scalar, quantize_i16};
use crate::export::profile::{ContainerKind, FormatProfile, TargetDevice};
use crate::export::writer::{ByteOrder, ChunkWriter};

/// Sample rate written into every packed patch
pub const PATCH_SAMPLE_RATE: u32 = 44100;

/// Application signature preceding the metadata JSON
pub const APPLICATION_SIGNATURE: &[u8; 4] = b"op-1";

/// Size of the canonical RIFF header up to the first data byte
pub const WAV_HEADER_SIZE: usize = 44;

const CHANNELS: u16 = 2;
const BIT_DEPTH: u16 = 16;
const BYTES_PER_FRAME: usize = 4;
const AIFF_COMM_SIZE: u32 = 18;
const AIFF_SSND_HEADER_SIZE: usize = 8;

/// An encoded file, ready to be written or handed to a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedBlob {
    pub bytes: Vec<u8>,
    /// Recommended extension without the dot: "wav" or "aif"
    pub extension: &'static str,
    pub mime_type: &'static str,
}

impl ExportedBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex SHA-256 of the encoded bytes
    pub fn sha256_hex(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }
}

/// Pack `loops` into a single patch for `device`
///
/// `bpm` is stored as round(bpm x 100).
///
/// # Errors
/// * `EmptyCollection` - if `loops` is empty
/// * `MalformedSourceBuffer` - if any loop has absent or empty channel data
pub fn encode_patch(loops: &[&SampleBuffer], device: TargetDevice, bpm: f64) -> Result<ExportedBlob> {
    encode_with_profile(loops, device, &device.profile(), bpm)
}

/// Pack `loops` using an explicit container profile
pub fn encode_with_profile(
    loops: &[&SampleBuffer],
    device: TargetDevice,
    profile: &FormatProfile,
    bpm: f64,
) -> Result<ExportedBlob> {
    if loops.is_empty() {
        return Err(LoopError::EmptyCollection);
    }
    for buffer in loops {
        buffer.validate()?;
    }

    let metadata = ExportMetadata::new(device, profile, bpm, loops);
    let json = metadata.to_json_bytes()?;

    let total_frames: usize = loops.iter().map(|b| b.len()).sum();
    let data_size = total_frames * BYTES_PER_FRAME;
    let appl_size = APPLICATION_SIGNATURE.len() + json.len();
    let pad = json.len() % 2;

    let file_size = match profile.kind {
        ContainerKind::Riff => WAV_HEADER_SIZE + data_size + 8 + appl_size + pad,
        ContainerKind::Aiff => {
            12 + (8 + AIFF_COMM_SIZE as usize)
                + (8 + AIFF_SSND_HEADER_SIZE + data_size)
                + (8 + appl_size + pad)
        }
    };
    let riff_size = container_field(file_size - 8)?;
    let total_frames_field = container_field(total_frames)?;
    let data_size_field = container_field(data_size)?;

    let mut w = ChunkWriter::with_capacity(profile.byte_order, file_size);
    match profile.kind {
        ContainerKind::Riff => {
            write_wav_header(&mut w, riff_size, PATCH_SAMPLE_RATE, data_size_field);
        }
        ContainerKind::Aiff => {
            w.tag(b"FORM");
            w.u32(riff_size);
            w.tag(b"AIFF");

            w.tag(b"COMM");
            w.u32(AIFF_COMM_SIZE);
            w.u16(CHANNELS);
            w.u32(total_frames_field);
            w.u16(BIT_DEPTH);
            w.raw(&extended_sample_rate(PATCH_SAMPLE_RATE));

            w.tag(b"SSND");
            w.u32(AIFF_SSND_HEADER_SIZE as u32 + data_size_field);
            w.u32(0); // offset
            w.u32(0); // block size
        }
    }

    for buffer in loops {
        let scalar = if profile.normalize {
            normalization_scalar(stereo_peak(buffer)?)
        } else {
            1.0
        };
        write_frames(&mut w, buffer, scalar)?;
    }

    w.tag(profile.application_tag());
    w.u32(appl_size as u32);
    w.raw(APPLICATION_SIGNATURE);
    w.raw(&json);
    w.pad_to_even(json.len());

    debug_assert_eq!(w.len(), file_size);

    log::info!(
        "Encoded {} loop(s), {} frames for {} as .{} ({} bytes)",
        loops.len(),
        total_frames,
        device,
        profile.extension,
        file_size
    );

    Ok(ExportedBlob {
        bytes: w.into_bytes(),
        extension: profile.extension,
        mime_type: profile.mime_type,
    })
}

/// Encode one slice as a plain 16-bit stereo WAV without patch metadata
///
/// The buffer's own sample rate is kept. Mono input is duplicated to both
/// channels; samples are clamped but not normalized.
///
/// # Errors
/// * `MalformedSourceBuffer` - if the buffer has absent or empty channel data
pub fn encode_plain_wav(buffer: &SampleBuffer) -> Result<ExportedBlob> {
    buffer.validate()?;

    let data_size = buffer.len() * BYTES_PER_FRAME;
    let file_size = WAV_HEADER_SIZE + data_size;

    let mut w = ChunkWriter::with_capacity(ByteOrder::Little, file_size);
    write_wav_header(
        &mut w,
        container_field(file_size - 8)?,
        buffer.sample_rate,
        container_field(data_size)?,
    );
    write_frames(&mut w, buffer, 1.0)?;

    log::debug!(
        "Encoded plain WAV: {} frames at {} Hz ({} bytes)",
        buffer.len(),
        buffer.sample_rate,
        file_size
    );

    Ok(ExportedBlob {
        bytes: w.into_bytes(),
        extension: FormatProfile::RIFF.extension,
        mime_type: FormatProfile::RIFF.mime_type,
    })
}

/// Download name for a patch: `ENVY_PATCH_<ms>.wav` or `TE_PATCH_<ms>.<ext>`
pub fn patch_file_name(device: TargetDevice, timestamp_ms: i64) -> String {
    let prefix = if device.name().contains("ENVY") {
        "ENVY"
    } else {
        "TE"
    };
    format!(
        "{}_PATCH_{}.{}",
        prefix,
        timestamp_ms,
        device.profile().extension
    )
}

/// Encode an integral sample rate as an IEEE 754 80-bit extended float
pub fn extended_sample_rate(rate: u32) -> [u8; 10] {
    let mut out = [0u8; 10];
    if rate == 0 {
        return out;
    }

    let bits = 32 - rate.leading_zeros();
    let exponent = 16383 + bits as u16 - 1;
    // Explicit integer bit lands in the top bit of the mantissa
    let mantissa = (rate as u64) << (64 - bits);

    out[..2].copy_from_slice(&exponent.to_be_bytes());
    out[2..].copy_from_slice(&mantissa.to_be_bytes());
    out
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn write_wav_header(w: &mut ChunkWriter, riff_size: u32, sample_rate: u32, data_size: u32) {
    let block_align = CHANNELS * BIT_DEPTH / 8;

    w.tag(b"RIFF");
    w.u32(riff_size);
    w.tag(b"WAVE");

    w.tag(b"fmt ");
    w.u32(16); // PCM format size
    w.u16(1); // PCM format code
    w.u16(CHANNELS);
    w.u32(sample_rate);
    w.u32(sample_rate.saturating_mul(block_align as u32));
    w.u16(block_align);
    w.u16(BIT_DEPTH);

    w.tag(b"data");
    w.u32(data_size);
}

/// Interleave, scale, clamp and quantize one loop as stereo frames
fn write_frames(w: &mut ChunkWriter, buffer: &SampleBuffer, scalar: f32) -> Result<()> {
    let (left, right) = buffer.stereo_pair()?;
    for (&l, &r) in left.iter().zip(right) {
        w.i16(quantize_i16(l * scalar));
        w.i16(quantize_i16(r * scalar));
    }
    Ok(())
}

/// Peak over the two channels that end up in the file
fn stereo_peak(buffer: &SampleBuffer) -> Result<f32> {
    let (left, right) = buffer.stereo_pair()?;
    Ok(left
        .iter()
        .chain(right)
        .map(|s| s.abs())
        .fold(0.0_f32, f32::max))
}

fn container_field(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| LoopError::UnsupportedFormat {
        format: format!("{} bytes exceeds the 32-bit container size limit", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::ChannelLayout;

    fn le_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn le_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap())
    }

    fn be_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn mono(samples: Vec<f32>) -> SampleBuffer {
        SampleBuffer::from_channels(vec![samples], 44100).unwrap()
    }

    #[test]
    fn test_plain_wav_silent_second() {
        let buffer = SampleBuffer::new(44100, ChannelLayout::Mono, 44100);
        let blob = encode_plain_wav(&buffer).unwrap();
        let b = &blob.bytes;

        assert_eq!(blob.len(), 44 + 44100 * 2 * 2);
        assert_eq!(blob.extension, "wav");
        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(le_u32(b, 4) as usize, b.len() - 8);
        assert_eq!(&b[8..16], b"WAVEfmt ");
        assert_eq!(le_u16(b, 20), 1);
        assert_eq!(le_u16(b, 22), 2);
        assert_eq!(le_u32(b, 24), 44100);
        assert_eq!(le_u32(b, 28), 44100 * 4);
        assert_eq!(le_u16(b, 32), 4);
        assert_eq!(le_u16(b, 34), 16);
        assert_eq!(&b[36..40], b"data");
        assert_eq!(le_u32(b, 40), 44100 * 4);
        assert!(b[44..].iter().all(|&x| x == 0));
    }

    #[test]
    fn test_plain_wav_keeps_native_rate_and_does_not_normalize() {
        let buffer = SampleBuffer::from_channels(vec![vec![0.25, -0.5]], 48000).unwrap();
        let blob = encode_plain_wav(&buffer).unwrap();
        let b = &blob.bytes;
        assert_eq!(le_u32(b, 24), 48000);
        let first = i16::from_le_bytes([b[44], b[45]]);
        assert_eq!(first, (0.25f32 * 32767.0) as i16);
        let second = i16::from_le_bytes([b[48], b[49]]);
        assert_eq!(second, -16384);
    }

    #[test]
    fn test_riff_patch_layout() {
        let a = mono(vec![0.5; 100]);
        let blob = encode_patch(&[&a], TargetDevice::OpXyEnvy, 120.0).unwrap();
        let b = &blob.bytes;

        assert_eq!(blob.extension, "wav");
        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(le_u32(b, 4) as usize, b.len() - 8);
        assert_eq!(le_u32(b, 40), 400);

        let appl = 44 + 400;
        assert_eq!(&b[appl..appl + 4], b"appl");
        let appl_size = le_u32(b, appl + 4) as usize;
        assert_eq!(&b[appl + 8..appl + 12], b"op-1");
        let json = &b[appl + 12..appl + 8 + appl_size];
        let meta: ExportMetadata = serde_json::from_slice(json).unwrap();
        assert_eq!(meta.kit.as_deref(), Some("envy"));
        assert_eq!(meta.bpm, 12000);
        assert_eq!(b.len(), appl + 8 + appl_size + appl_size % 2);
    }

    #[test]
    fn test_riff_patch_normalizes_each_loop() {
        let quiet = mono(vec![0.1, -0.05]);
        let loud = mono(vec![2.0, -1.0]);
        let blob = encode_patch(&[&quiet, &loud], TargetDevice::Ep133, 100.0).unwrap();
        let b = &blob.bytes;

        let sample = |frame: usize| i16::from_le_bytes([b[44 + frame * 4], b[45 + frame * 4]]);
        assert_eq!(sample(0), quantize_i16(0.1 * (0.95 / 0.1)));
        assert_eq!(sample(1), quantize_i16(-0.05 * (0.95 / 0.1)));
        assert_eq!(sample(2), quantize_i16(2.0 * (0.95 / 2.0)));
        assert_eq!(sample(3), quantize_i16(-1.0 * (0.95 / 2.0)));
    }

    #[test]
    fn test_aiff_patch_layout() {
        let a = mono(vec![0.5; 10]);
        let b_loop = SampleBuffer::from_channels(vec![vec![0.25; 6], vec![-0.25; 6]], 44100).unwrap();
        let blob = encode_patch(&[&a, &b_loop], TargetDevice::Op1Og, 90.0).unwrap();
        let b = &blob.bytes;

        assert_eq!(blob.extension, "aif");
        assert_eq!(&b[0..4], b"FORM");
        assert_eq!(be_u32(b, 4) as usize, b.len() - 8);
        assert_eq!(&b[8..16], b"AIFFCOMM");
        assert_eq!(be_u32(b, 16), 18);
        assert_eq!(u16::from_be_bytes([b[20], b[21]]), 2);
        assert_eq!(be_u32(b, 22), 16);
        assert_eq!(u16::from_be_bytes([b[26], b[27]]), 16);
        assert_eq!(&b[28..38], &[0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&b[38..42], b"SSND");
        assert_eq!(be_u32(b, 42), 8 + 16 * 4);
        assert_eq!(be_u32(b, 46), 0);
        assert_eq!(be_u32(b, 50), 0);

        // Not normalized, big-endian
        let first = i16::from_be_bytes([b[54], b[55]]);
        assert_eq!(first, 16383);
        let right_of_second_loop = i16::from_be_bytes([b[54 + 10 * 4 + 2], b[54 + 10 * 4 + 3]]);
        assert_eq!(right_of_second_loop, -8192);

        let appl = 54 + 16 * 4;
        assert_eq!(&b[appl..appl + 4], b"APPL");
        let appl_size = be_u32(b, appl + 4) as usize;
        let meta: ExportMetadata =
            serde_json::from_slice(&b[appl + 12..appl + 8 + appl_size]).unwrap();
        assert_eq!(meta.kit, None);
        assert_eq!(meta.device, "OP-1 (OG)");
        assert_eq!(meta.start, vec![0, meta.end[0]]);
    }

    /// Encode `frames` of silence for `device`, picking a tempo whose
    /// metadata JSON has odd length. Returns the blob and the JSON length.
    fn odd_metadata_patch(device: TargetDevice, frames: usize, header: usize) -> (Vec<u8>, usize) {
        let read_u32 = |b: &[u8], at: usize| match device.profile().byte_order {
            ByteOrder::Little => le_u32(b, at),
            ByteOrder::Big => be_u32(b, at),
        };
        // 12000 and 9900 differ by one digit, so one of them is odd
        for bpm in [120.0, 99.0] {
            let a = mono(vec![0.0; frames]);
            let blob = encode_patch(&[&a], device, bpm).unwrap();
            let appl = header + frames * 4;
            let json_len = read_u32(&blob.bytes, appl + 4) as usize - 4;
            if json_len % 2 == 1 {
                return (blob.bytes, json_len);
            }
        }
        unreachable!("one of the tempos yields odd-length metadata");
    }

    #[test]
    fn test_riff_odd_metadata_is_padded() {
        let frames = 100;
        let (b, json_len) = odd_metadata_patch(TargetDevice::OpXyEnvy, frames, 44);
        let appl = 44 + frames * 4;

        assert_eq!(&b[appl..appl + 4], b"appl");
        assert_eq!(le_u32(&b, appl + 4) as usize, 4 + json_len);
        let json_end = appl + 12 + json_len;
        assert_eq!(b[json_end - 1], b'}');
        assert_eq!(&b[json_end..], &[0u8]);
        assert_eq!(le_u32(&b, 4) as usize, b.len() - 8);
        assert_eq!(b.len() % 2, 0);
    }

    #[test]
    fn test_aiff_odd_metadata_is_padded() {
        let frames = 10;
        let (b, json_len) = odd_metadata_patch(TargetDevice::OpZ, frames, 54);
        let appl = 54 + frames * 4;

        assert_eq!(&b[appl..appl + 4], b"APPL");
        assert_eq!(be_u32(&b, appl + 4) as usize, 4 + json_len);
        let json_end = appl + 12 + json_len;
        assert_eq!(b[json_end - 1], b'}');
        assert_eq!(&b[json_end..], &[0u8]);
        assert_eq!(be_u32(&b, 4) as usize, b.len() - 8);
        assert_eq!(b.len() % 2, 0);
    }

    #[test]
    fn test_empty_collection_rejected() {
        assert!(matches!(
            encode_patch(&[], TargetDevice::OpZ, 120.0),
            Err(LoopError::EmptyCollection)
        ));
    }

    #[test]
    fn test_malformed_loop_rejected() {
        let good = mono(vec![0.1; 4]);
        let bad = SampleBuffer {
            samples: vec![vec![]],
            sample_rate: 44100,
        };
        assert!(matches!(
            encode_patch(&[&good, &bad], TargetDevice::OpXyEnvy, 120.0),
            Err(LoopError::MalformedSourceBuffer { .. })
        ));
        assert!(encode_plain_wav(&bad).is_err());
    }

    #[test]
    fn test_extended_sample_rate() {
        assert_eq!(
            extended_sample_rate(44100),
            [0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            extended_sample_rate(48000),
            [0x40, 0x0E, 0xBB, 0x80, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(extended_sample_rate(1), [0x3F, 0xFF, 0x80, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_patch_file_name() {
        assert_eq!(
            patch_file_name(TargetDevice::OpXyEnvy, 1700000000000),
            "ENVY_PATCH_1700000000000.wav"
        );
        assert_eq!(patch_file_name(TargetDevice::OpZ, 42), "TE_PATCH_42.aif");
        assert_eq!(patch_file_name(TargetDevice::Ep133, 7), "TE_PATCH_7.wav");
    }

    #[test]
    fn test_sha256_hex() {
        let blob = encode_plain_wav(&mono(vec![0.0; 8])).unwrap();
        let digest = blob.sha256_hex();
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, blob.clone().sha256_hex());
    }
}
