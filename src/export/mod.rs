//! Export Module
//!
//! Byte-exact container encoding for sampler patches and single slices:
//! - Chunk writer (byte order aware)
//! - PCM quantization and normalization
//! - Device routing and container profiles
//! - Patch metadata and cue points

pub mod encoder;
pub mod metadata;
pub mod pcm;
pub mod profile;
pub mod writer;

pub use encoder::{
    encode_patch, encode_plain_wav, encode_with_profile, patch_file_name, ExportedBlob,
    PATCH_SAMPLE_RATE,
};
pub use metadata::{cue_points, ExportMetadata};
pub use profile::{ContainerKind, FormatProfile, TargetDevice};
pub use writer::ByteOrder;
