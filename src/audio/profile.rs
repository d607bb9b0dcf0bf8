use tracing::debug;

use super::{ChunkLoudness, LoudnessProfile, PcmBuffer};

/// Compute a chunked loudness profile over a PCM buffer.
///
/// The sample sequence is split into consecutive non-overlapping chunks of
/// `chunk_size` samples (the final chunk may be shorter). Each chunk gets a
/// dB value from the RMS of its raw sample values, not normalized to full
/// scale, so a typical signal measures positive. The multiplicative
/// threshold in the selector depends on that scale.
pub fn compute_loudness_profile(pcm: &PcmBuffer, chunk_size: usize) -> LoudnessProfile {
    assert!(chunk_size > 0, "chunk_size must be non-zero");

    let chunks: Vec<ChunkLoudness> = pcm
        .samples
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| ChunkLoudness {
            index,
            start_secs: (index * chunk_size) as f64 / pcm.sample_rate as f64,
            loudness_db: chunk_loudness_db(chunk),
        })
        .collect();

    debug!(
        chunks = chunks.len(),
        chunk_size,
        sample_rate = pcm.sample_rate,
        "Computed loudness profile"
    );

    LoudnessProfile {
        chunks,
        chunk_size,
        sample_rate: pcm.sample_rate,
    }
}

/// Loudness of one chunk: `20 * log10(rms)` over the raw sample values.
///
/// A chunk whose sum of squares is zero has no defined logarithm; it maps to
/// `f64::NEG_INFINITY`, which orders below every finite threshold.
fn chunk_loudness_db(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();

    if sum_squares == 0.0 {
        return f64::NEG_INFINITY;
    }

    let rms = (sum_squares / samples.len() as f64).sqrt();
    20.0 * rms.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(samples: Vec<i16>) -> PcmBuffer {
        PcmBuffer::new(samples, 44_100)
    }

    #[test]
    fn test_silence_maps_to_sentinel() {
        let pcm = buffer(vec![0i16; 10_000]);
        let profile = compute_loudness_profile(&pcm, 4_410);

        assert_eq!(profile.len(), 3);
        for chunk in &profile.chunks {
            assert_eq!(chunk.loudness_db, f64::NEG_INFINITY);
            assert!(chunk.is_silent());
        }
    }

    #[test]
    fn test_uniform_amplitude_is_constant() {
        let pcm = buffer(vec![1000i16; 44_100]);
        let profile = compute_loudness_profile(&pcm, 4_410);

        assert_eq!(profile.len(), 10);
        let expected = 20.0 * 1000f64.log10();
        for chunk in &profile.chunks {
            assert!((chunk.loudness_db - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_final_partial_chunk() {
        // 2.5 chunks of samples -> 3 profile entries
        let pcm = buffer(vec![500i16; 11_025]);
        let profile = compute_loudness_profile(&pcm, 4_410);

        assert_eq!(profile.len(), 3);
        // uniform amplitude, so the short tail measures the same
        assert!((profile.chunks[2].loudness_db - profile.chunks[0].loudness_db).abs() < 1e-9);
    }

    #[test]
    fn test_chunk_start_times() {
        let pcm = buffer(vec![100i16; 13_230]);
        let profile = compute_loudness_profile(&pcm, 4_410);

        assert_eq!(profile.chunks[0].start_secs, 0.0);
        assert!((profile.chunks[1].start_secs - 0.1).abs() < 1e-9);
        assert!((profile.chunks[2].start_secs - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_empty_buffer() {
        let pcm = buffer(Vec::new());
        let profile = compute_loudness_profile(&pcm, 4_410);
        assert!(profile.is_empty());
    }

    #[test]
    fn test_negative_samples_contribute() {
        let alternating: Vec<i16> = (0..4_410)
            .map(|i| if i % 2 == 0 { 1000 } else { -1000 })
            .collect();
        let profile = compute_loudness_profile(&buffer(alternating), 4_410);

        let expected = 20.0 * 1000f64.log10();
        assert!((profile.chunks[0].loudness_db - expected).abs() < 1e-9);
    }
}
