//! CLI Module
//!
//! Command-line front end: decodes source files, drives the core and writes
//! the exported files.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Loopcutter - cut loops and build sampler patches
#[derive(Parser, Debug)]
#[command(name = "loopcutter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate the tempo of a recording
    #[command(name = "bpm")]
    Bpm {
        /// Source WAV file
        input: PathBuf,
    },

    /// Export one region of a recording as a plain WAV
    #[command(name = "slice")]
    Slice {
        /// Source WAV file
        input: PathBuf,

        /// Region start as a fraction of the duration
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Region end as a fraction of the duration
        #[arg(long, default_value_t = 1.0)]
        end: f64,

        /// Output file (defaults to LOOP_1.wav in the output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pack loops into a single device patch
    #[command(name = "pack")]
    Pack {
        /// WAV files or directories of WAV files, one loop per file
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Target device name or slug (see `devices`)
        #[arg(short, long)]
        device: Option<String>,

        /// Tempo to store in the patch (estimated from the first input if omitted)
        #[arg(short, long)]
        bpm: Option<f64>,

        /// Regions START:END cut from a single input, one loop each
        #[arg(short, long = "slice")]
        slices: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export several regions of a recording as individual WAV files
    #[command(name = "batch")]
    Batch {
        /// Source WAV file
        input: PathBuf,

        /// Regions START:END, one file each
        #[arg(short, long = "slice", required = true)]
        slices: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported target devices
    #[command(name = "devices")]
    Devices,

    /// Run the pipeline on a generated click track and verify the output
    #[command(name = "check")]
    Check,
}
