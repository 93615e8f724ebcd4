//! CLI Command Implementations
//!
//! Each command owns its session state explicitly: the decoded source, the
//! loop collection, the device and tempo are built here and passed into the
//! core.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use walkdir::WalkDir;

use crate::analysis::TempoEstimator;
use crate::config::Config;
use crate::engine::{
    generate_click_track, import_audio, write_blob, Loop, LoopCollection, SampleBuffer, Selection,
};
use crate::error::{LoopError, Result};
use crate::export::{
    encode_patch, encode_plain_wav, patch_file_name, ByteOrder, TargetDevice, PATCH_SAMPLE_RATE,
};

/// Print the estimated tempo of `input`.
pub fn bpm(config: &Config, input: &Path) -> Result<u32> {
    let source = import_audio(input)?;
    let bpm = estimate(config, &source);
    println!("{}", bpm);
    Ok(bpm)
}

/// Export one region of `input` as a plain WAV.
pub fn slice(
    config: &Config,
    input: &Path,
    start: f64,
    end: f64,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let source = import_audio(input)?;
    let selection = Selection::new(start, end)?;

    let mut loops = LoopCollection::new();
    let item = loops.collect(&source, &selection)?;
    let blob = encode_plain_wav(item.buffer())?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => config
            .export
            .output_dir
            .join(format!("{}.{}", item.name(), blob.extension)),
    };
    write_blob(&path, &blob.bytes)?;

    println!("Slice written: {} ({:.2}s)", path.display(), item.duration_secs());
    Ok(path)
}

/// Pack loops from `inputs` into one device patch.
///
/// With `slices`, exactly one input file is cut into one loop per region.
/// Otherwise every WAV file found in `inputs` becomes one loop.
pub fn pack(
    config: &Config,
    inputs: &[PathBuf],
    device: Option<&str>,
    mut bpm: Option<f64>,
    slices: &[String],
    output_dir: Option<&Path>,
) -> Result<PathBuf> {
    let device: TargetDevice = match device {
        Some(name) => name.parse()?,
        None => config.export.device()?,
    };

    let files = collect_inputs(inputs)?;
    let mut loops = LoopCollection::new();

    if slices.is_empty() {
        for file in &files {
            let source = import_audio(file)?;
            let name = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("LOOP_{}", loops.len() + 1));
            loops.push(Loop::new(name, source));
        }
    } else {
        let [file] = files.as_slice() else {
            return Err(LoopError::InvalidSelection {
                start: 0.0,
                end: 0.0,
                reason: format!("--slice needs exactly one input file, got {}", files.len()),
            });
        };
        let source = import_audio(file)?;
        for region in slices {
            loops.collect(&source, &parse_slice(region)?)?;
        }
        if bpm.is_none() {
            bpm = Some(estimate(config, &source) as f64);
        }
    }

    // Without a manual tempo, the first loop decides it
    let bpm = match (bpm, loops.iter().next()) {
        (Some(bpm), _) => bpm,
        (None, Some(first)) => estimate(config, first.buffer()) as f64,
        (None, None) => return Err(LoopError::EmptyCollection),
    };

    let blob = encode_patch(&loops.buffers(), device, bpm)?;
    let dir = output_dir.unwrap_or(config.export.output_dir.as_path());
    let path = dir.join(patch_file_name(device, Utc::now().timestamp_millis()));
    write_blob(&path, &blob.bytes)?;

    info!("Packed {} loop(s) at {} BPM for {}", loops.len(), bpm, device);
    println!("Patch written: {}", path.display());
    println!("SHA-256: {}", blob.sha256_hex());
    Ok(path)
}

/// Export each region of `input` as its own `LOOP_<n>.wav`.
pub fn batch(
    config: &Config,
    input: &Path,
    slices: &[String],
    output_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let source = import_audio(input)?;
    let mut loops = LoopCollection::new();
    for region in slices {
        loops.collect(&source, &parse_slice(region)?)?;
    }

    let dir = output_dir.unwrap_or(config.export.output_dir.as_path());
    let delay = Duration::from_millis(config.export.batch_delay_ms);
    let mut written = Vec::with_capacity(loops.len());

    for (index, item) in loops.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        let blob = encode_plain_wav(item.buffer())?;
        let path = dir.join(format!("{}.{}", item.name(), blob.extension));
        write_blob(&path, &blob.bytes)?;
        println!("Slice written: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// List target devices and the container each one receives.
pub fn devices() -> Result<()> {
    for device in TargetDevice::ALL {
        println!(
            "{:<14} {:<12} .{}",
            device.name(),
            device.slug(),
            device.profile().extension
        );
    }
    Ok(())
}

/// Self-check: estimate, slice and pack a generated 120 BPM click track.
///
/// Returns `true` when the tempo is recovered and every device produces a
/// well-formed container.
pub fn check(config: &Config) -> Result<bool> {
    const CHECK_BPM: u32 = 120;

    let clicks = generate_click_track(CHECK_BPM as f64, 16.0, PATCH_SAMPLE_RATE);
    let estimated = estimate(config, &clicks);
    let mut passed = estimated.abs_diff(CHECK_BPM) <= 1;
    println!(
        "tempo        {:>4} BPM  {}",
        estimated,
        if passed { "ok" } else { "FAIL" }
    );

    let mut loops = LoopCollection::new();
    for bar in 0..4 {
        let selection = Selection::from_bars(
            bar as f64 / 4.0,
            1,
            CHECK_BPM as f64,
            clicks.duration_secs(),
        )?;
        loops.collect(&clicks, &selection)?;
    }

    for device in TargetDevice::ALL {
        let blob = encode_patch(&loops.buffers(), device, estimated as f64)?;
        let ok = blob.extension == device.profile().extension
            && container_is_consistent(&blob.bytes, device);
        if !ok {
            warn!("Self-check produced a malformed {} patch", device);
        }
        passed &= ok;
        println!(
            "{:<12} {:>7} bytes  {}",
            device.name(),
            blob.len(),
            if ok { "ok" } else { "FAIL" }
        );
    }

    Ok(passed)
}

/// Outer container size matches the blob and the blob has even length
fn container_is_consistent(bytes: &[u8], device: TargetDevice) -> bool {
    let Some(field) = bytes.get(4..8).and_then(|b| <[u8; 4]>::try_from(b).ok()) else {
        return false;
    };
    let size = match device.profile().byte_order {
        ByteOrder::Little => u32::from_le_bytes(field),
        ByteOrder::Big => u32::from_be_bytes(field),
    };
    size as usize + 8 == bytes.len() && bytes.len() % 2 == 0
}

/// Parse a `START:END` region
pub fn parse_slice(text: &str) -> Result<Selection> {
    let invalid = || LoopError::InvalidSelection {
        start: f64::NAN,
        end: f64::NAN,
        reason: format!("expected START:END fractions, got '{}'", text),
    };

    let (start, end) = text.split_once(':').ok_or_else(invalid)?;
    let start: f64 = start.trim().parse().map_err(|_| invalid())?;
    let end: f64 = end.trim().parse().map_err(|_| invalid())?;
    Selection::new(start, end)
}

/// Expand directories into the WAV files they contain, sorted by path
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() {
            return Err(LoopError::FileNotFound {
                path: input.display().to_string(),
            });
        }

        if input.is_dir() {
            let mut found: Vec<PathBuf> = Vec::new();
            for entry in WalkDir::new(input) {
                let entry = entry.map_err(|e| LoopError::Io(e.into()))?;
                if entry.file_type().is_file() && is_wav(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            if found.is_empty() {
                warn!("No WAV files found in {}", input.display());
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

fn estimate(config: &Config, source: &SampleBuffer) -> u32 {
    TempoEstimator::new(config.tempo.clone()).estimate(source.channel(0), source.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelLayout;
    use crate::export::ExportMetadata;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_slice() {
        let selection = parse_slice("0.25:0.5").unwrap();
        assert_eq!(selection.start, 0.25);
        assert_eq!(selection.end, 0.5);
        assert!(parse_slice(" 0 : 1 ").is_ok());
        assert!(parse_slice("0.5").is_err());
        assert!(parse_slice("a:b").is_err());
        assert!(parse_slice("0.7:0.2").is_err());
    }

    #[test]
    fn test_collect_inputs_walks_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("kit");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("b.wav"), b"").unwrap();
        fs::write(nested.join("a.WAV"), b"").unwrap();
        fs::write(nested.join("notes.txt"), b"").unwrap();

        let files = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.WAV", "b.wav"]);
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let result = collect_inputs(&[PathBuf::from("/nonexistent/loops")]);
        assert!(matches!(result, Err(LoopError::FileNotFound { .. })));
    }

    fn write_wav(path: &Path, buffer: &SampleBuffer) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: buffer.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in buffer.channel(0) {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn read_patch_metadata(path: &Path) -> ExportMetadata {
        let bytes = fs::read(path).unwrap();
        let at = bytes.windows(4).position(|w| w == b"op-1").unwrap() + 4;
        let end = bytes.iter().rposition(|&b| b == b'}').unwrap() + 1;
        serde_json::from_slice(&bytes[at..end]).unwrap()
    }

    #[test]
    fn test_pack_estimates_tempo_from_first_loop() {
        let dir = tempdir().unwrap();
        let inputs = dir.path().join("loops");
        fs::create_dir_all(&inputs).unwrap();
        write_wav(&inputs.join("a.wav"), &generate_click_track(90.0, 16.0, 44100));
        write_wav(&inputs.join("b.wav"), &SampleBuffer::new(44100, ChannelLayout::Mono, 44100));

        let path = pack(
            &Config::default(),
            &[inputs],
            Some("op-xy"),
            None,
            &[],
            Some(dir.path()),
        )
        .unwrap();

        let meta = read_patch_metadata(&path);
        assert_eq!(meta.start.len(), 2);
        assert!((8900..=9100).contains(&meta.bpm), "stored {}", meta.bpm);
    }

    #[test]
    fn test_self_check_passes() {
        assert!(check(&Config::default()).unwrap());
    }

    #[test]
    fn test_container_consistency() {
        assert!(!container_is_consistent(b"RIFF", TargetDevice::OpXyEnvy));
        let mut bytes = b"FORM".to_vec();
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(b"AIFF");
        assert!(container_is_consistent(&bytes, TargetDevice::Op1Og));
        assert!(!container_is_consistent(&bytes, TargetDevice::OpXyEnvy));
    }

    #[test]
    fn test_pack_rejects_unknown_device() {
        let dir = tempdir().unwrap();
        let result = pack(
            &Config::default(),
            &[dir.path().to_path_buf()],
            Some("TX-6"),
            Some(120.0),
            &[],
            Some(dir.path()),
        );
        assert!(matches!(result, Err(LoopError::UnknownDevice { .. })));
    }

    #[test]
    fn test_pack_empty_directory_is_empty_collection() {
        let dir = tempdir().unwrap();
        let result = pack(
            &Config::default(),
            &[dir.path().to_path_buf()],
            None,
            Some(120.0),
            &[],
            Some(dir.path()),
        );
        assert!(matches!(result, Err(LoopError::EmptyCollection)));
    }
}
