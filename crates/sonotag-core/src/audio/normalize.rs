//! Waveform normalization into the encoder's input shape.
//!
//! Steps, in order: resample to the target rate, zero-pad the tail up to the
//! minimum duration, downmix to mono. No gain change and no filtering.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::config::AudioConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::AudioClip;

const SINC_LEN: usize = 128;

/// Resamples, pads and downmixes raw clips.
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    target_sample_rate: u32,
    min_duration_seconds: f64,
}

impl AudioNormalizer {
    pub fn new(target_sample_rate: u32, min_duration_seconds: f64) -> Self {
        Self {
            target_sample_rate,
            min_duration_seconds,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(config.target_sample_rate, config.min_duration_seconds)
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Minimum output length in frames.
    pub fn min_frames(&self) -> usize {
        (self.min_duration_seconds * self.target_sample_rate as f64).ceil() as usize
    }

    /// Produce a mono clip at the target rate, at least the minimum duration long.
    ///
    /// A clip that is already mono, at the target rate and long enough comes
    /// back unchanged.
    pub fn normalize(&self, clip: &AudioClip) -> PipelineResult<AudioClip> {
        if clip.channels() == 0 {
            return Err(normalize_err(clip, "clip has no channels"));
        }
        if clip.sample_rate == 0 || self.target_sample_rate == 0 {
            return Err(normalize_err(clip, "sample rate must be > 0"));
        }

        let resampled = if clip.sample_rate == self.target_sample_rate {
            clip.samples.clone()
        } else {
            tracing::trace!(
                "Resampling {:?} {} Hz -> {} Hz",
                clip.path,
                clip.sample_rate,
                self.target_sample_rate
            );
            resample(&clip.samples, clip.sample_rate, self.target_sample_rate)
                .map_err(|message| normalize_err(clip, &message))?
        };

        let padded = pad_tail(resampled, self.min_frames());
        let mono = downmix_mono(&padded);

        Ok(AudioClip::mono(&clip.path, mono, self.target_sample_rate))
    }
}

impl Default for AudioNormalizer {
    fn default() -> Self {
        Self::from_config(&AudioConfig::default())
    }
}

fn normalize_err(clip: &AudioClip, message: &str) -> PipelineError {
    PipelineError::Normalize {
        path: clip.path.clone(),
        message: message.to_string(),
    }
}

/// Number of frames `frames` input frames map to at the new rate.
pub fn resampled_len(frames: usize, source_rate: u32, target_rate: u32) -> usize {
    (frames as f64 * target_rate as f64 / source_rate as f64).round() as usize
}

/// Band-limited resampling of planar audio.
///
/// The output of every channel is exactly
/// `round(frames * target_rate / source_rate)` frames long.
pub fn resample(
    planar: &[Vec<f32>],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<Vec<f32>>, String> {
    let frames = planar.first().map_or(0, Vec::len);
    if source_rate == target_rate || frames == 0 {
        return Ok(planar.to_vec());
    }
    let expected = resampled_len(frames, source_rate, target_rate);
    let ratio = target_rate as f64 / source_rate as f64;

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    // Trailing silence flushes the filter so the last input frames reach the output.
    let chunk = frames + SINC_LEN;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, chunk, planar.len())
        .map_err(|e| format!("Failed to create resampler: {e}"))?;
    let delay = resampler.output_delay();

    let input: Vec<Vec<f32>> = planar
        .iter()
        .map(|channel| {
            let mut padded = Vec::with_capacity(chunk);
            padded.extend_from_slice(channel);
            padded.resize(chunk, 0.0);
            padded
        })
        .collect();

    let output = resampler
        .process(&input, None)
        .map_err(|e| format!("Resampling failed: {e}"))?;

    Ok(output
        .into_iter()
        .map(|channel| {
            let mut fitted: Vec<f32> = channel.into_iter().skip(delay).take(expected).collect();
            fitted.resize(expected, 0.0);
            fitted
        })
        .collect())
}

/// Zero-pad every channel at the end up to `min_frames`.
pub fn pad_tail(mut planar: Vec<Vec<f32>>, min_frames: usize) -> Vec<Vec<f32>> {
    for channel in planar.iter_mut() {
        if channel.len() < min_frames {
            channel.resize(min_frames, 0.0);
        }
    }
    planar
}

/// Average all channels into one.
pub fn downmix_mono(planar: &[Vec<f32>]) -> Vec<f32> {
    match planar {
        [] => Vec::new(),
        [only] => only.clone(),
        channels => {
            let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
            let scale = 1.0 / channels.len() as f32;
            (0..frames)
                .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
                .collect()
        }
    }
}
