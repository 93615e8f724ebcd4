//! Tempo estimation
//!
//! Autocorrelation of a downsampled RMS envelope. The envelope keeps the
//! rhythmic energy peaks while discarding waveform detail; the lag with the
//! strongest self-similarity inside the musical tempo range is reported as
//! the beat period.
//!
//! The result is a heuristic. Callers should let the user override it.

use crate::config::TempoConfig;
use crate::engine::buffer::calculate_rms;

/// Downsample `channel` into an RMS envelope, one point per `factor` samples
///
/// A trailing partial window is dropped.
pub fn envelope(channel: &[f32], factor: usize) -> Vec<f32> {
    if factor == 0 {
        return Vec::new();
    }
    channel.chunks_exact(factor).map(calculate_rms).collect()
}

/// Estimate the tempo of one channel with the default parameters
pub fn estimate_bpm(channel: &[f32], sample_rate: u32) -> u32 {
    TempoEstimator::default().estimate(channel, sample_rate)
}

/// Envelope autocorrelation tempo estimator
#[derive(Debug, Clone, Default)]
pub struct TempoEstimator {
    config: TempoConfig,
}

impl TempoEstimator {
    pub fn new(config: TempoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TempoConfig {
        &self.config
    }

    /// Estimate the tempo of `channel` in whole BPM
    ///
    /// Deterministic for identical input. Falls back to the configured
    /// default when no candidate lag correlates positively (silence, input
    /// shorter than one beat period, zero sample rate).
    pub fn estimate(&self, channel: &[f32], sample_rate: u32) -> u32 {
        let factor = self.config.downsample_factor;
        if factor == 0 || sample_rate == 0 {
            return self.fallback("degenerate analysis parameters");
        }

        let env = envelope(channel, factor);
        let envelope_rate = sample_rate as f64 / factor as f64;

        // Faster tempo -> shorter lag
        let min_lag = (60.0 / self.config.max_bpm * envelope_rate).floor() as usize;
        let max_lag = (60.0 / self.config.min_bpm * envelope_rate).floor() as usize;
        let check_len = env
            .len()
            .min((self.config.analysis_seconds * envelope_rate).floor() as usize);

        let mut best_lag = 0usize;
        let mut best_correlation = 0.0f64;

        for lag in min_lag.max(1)..max_lag {
            if lag >= check_len {
                break;
            }

            let mut correlation = 0.0f64;
            let mut count = 0usize;
            for i in (0..check_len - lag).step_by(2) {
                correlation += env[i] as f64 * env[i + lag] as f64;
                count += 1;
            }

            let normalized = correlation / count as f64;
            if normalized > best_correlation {
                best_correlation = normalized;
                best_lag = lag;
            }
        }

        if best_lag == 0 {
            return self.fallback("no positively correlated lag");
        }

        let period_secs = best_lag as f64 * factor as f64 / sample_rate as f64;
        let bpm = (60.0 / period_secs).round() as u32;
        log::debug!(
            "Tempo estimate: lag {} ({:.4}s), correlation {:.6}, {} BPM",
            best_lag,
            period_secs,
            best_correlation,
            bpm
        );
        bpm
    }

    fn fallback(&self, reason: &str) -> u32 {
        log::warn!(
            "Tempo estimation fell back to {} BPM: {}",
            self.config.default_bpm,
            reason
        );
        self.config.default_bpm
    }
}
