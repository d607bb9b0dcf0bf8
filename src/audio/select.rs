use tracing::debug;

use super::LoudnessProfile;
use crate::clip::TimeInterval;

/// Derive the drop threshold for a profile.
///
/// `threshold = max_volume * (volume_percentage / 10)`: a multiplicative
/// scaling of the loudest chunk, not an offset below it. The sign behavior
/// matters: with a negative `max_volume` a larger percentage produces a
/// higher (stricter) threshold. Silent-sentinel chunks are ignored when
/// taking the max; returns `None` when every chunk is silent or the profile
/// is empty, since the formula has no finite value to scale.
pub fn drop_threshold(profile: &LoudnessProfile, volume_percentage: f64) -> Option<f64> {
    let max_volume = profile
        .chunks
        .iter()
        .map(|c| c.loudness_db)
        .filter(|db| *db != f64::NEG_INFINITY)
        .fold(f64::NEG_INFINITY, f64::max);

    if max_volume == f64::NEG_INFINITY {
        return None;
    }

    Some(max_volume * (volume_percentage / 10.0))
}

/// Select the time intervals to remove from the original clip.
///
/// Each chunk strictly below the threshold contributes its own interval
/// `[start, start + chunk_size / sample_rate)`, in chunk order. Adjacent
/// candidates are not merged; the keep-interval computation treats abutting
/// drops transparently. An empty result means the file needs no trimming.
pub fn select_drop_intervals(
    profile: &LoudnessProfile,
    volume_percentage: f64,
) -> Vec<TimeInterval> {
    if profile.is_empty() {
        return Vec::new();
    }

    // An interval's end is computed exactly like the next chunk's start, so
    // abutting drops share a bit-identical boundary and the keep walk never
    // sees a rounding sliver between them.
    let chunk_interval = |index: usize, start: f64| {
        let end = ((index + 1) * profile.chunk_size) as f64 / profile.sample_rate as f64;
        TimeInterval::new(start, end)
    };

    let Some(threshold) = drop_threshold(profile, volume_percentage) else {
        // Whole file is digital silence. The formula degenerates here
        // (-inf scaled by zero is NaN), so branch instead: any positive
        // percentage drops everything, zero drops nothing.
        if volume_percentage > 0.0 {
            return profile
                .chunks
                .iter()
                .map(|c| chunk_interval(c.index, c.start_secs))
                .collect();
        }
        return Vec::new();
    };

    let drops: Vec<TimeInterval> = profile
        .chunks
        .iter()
        .filter(|c| c.loudness_db < threshold)
        .map(|c| chunk_interval(c.index, c.start_secs))
        .collect();

    debug!(
        threshold,
        dropped = drops.len(),
        total = profile.len(),
        "Selected drop intervals"
    );

    drops
}
