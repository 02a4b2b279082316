//! Audio decoding via symphonia.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{PipelineError, PipelineResult};
use crate::types::AudioClip;

/// Decodes audio files into planar f32 clips at their native rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioDecoder;

impl AudioDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode the first audio track of a file.
    ///
    /// Corrupt packets are skipped; a file that cannot be probed or has no
    /// audio track is a [`PipelineError::Decode`].
    pub fn decode(&self, path: &Path) -> PipelineResult<AudioClip> {
        let decode_err = |message: String| PipelineError::Decode {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| decode_err(format!("Cannot open file: {e}")))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| decode_err(format!("Unrecognized audio format: {e}")))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| decode_err("No audio track found".to_string()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels: Vec<Vec<f32>> =
            vec![Vec::new(); track.codec_params.channels.map_or(0, |c| c.count())];

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| decode_err(format!("Unsupported codec: {e}")))?;

        let mut skipped_packets = 0usize;
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(decode_err(format!("Failed to read packet: {e}"))),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(_)) => {
                    skipped_packets += 1;
                    continue;
                }
                Err(e) => return Err(decode_err(format!("Failed to decode packet: {e}"))),
            };

            let spec = *decoded.spec();
            let count = spec.channels.count();
            if count == 0 || decoded.frames() == 0 {
                continue;
            }
            sample_rate = spec.rate;
            if channels.len() != count {
                if channels.iter().any(|c| !c.is_empty()) {
                    return Err(decode_err(format!(
                        "Channel count changed mid-stream ({} -> {})",
                        channels.len(),
                        count
                    )));
                }
                channels = vec![Vec::new(); count];
            }

            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            for frame in buf.samples().chunks_exact(count) {
                for (channel, &sample) in channels.iter_mut().zip(frame) {
                    channel.push(sample);
                }
            }
        }

        if skipped_packets > 0 {
            tracing::debug!("Skipped {} corrupt packets in {:?}", skipped_packets, path);
        }
        if sample_rate == 0 {
            return Err(decode_err("Sample rate not specified".to_string()));
        }

        let clip = AudioClip::new(path, channels, sample_rate);
        tracing::trace!(
            "Decoded {:?}: {} ch, {} frames @ {} Hz",
            path,
            clip.channels(),
            clip.frames(),
            clip.sample_rate
        );
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let v = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
            for ch in 0..channels {
                let sample = if ch == 0 { v } else { -v };
                writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2, 44_100, 4_410);

        let clip = AudioDecoder::new().decode(&path).unwrap();
        assert_eq!(clip.sample_rate, 44_100);
        assert_eq!(clip.channels(), 2);
        assert_eq!(clip.frames(), 4_410);
        assert!(clip.samples[0]
            .iter()
            .zip(&clip.samples[1])
            .all(|(l, r)| (l + r).abs() < 1e-3));
    }

    #[test]
    fn test_decode_mono_wav_samples_in_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, 48_000, 960);

        let clip = AudioDecoder::new().decode(&path).unwrap();
        assert_eq!(clip.channels(), 1);
        assert!(clip.first_channel().iter().all(|s| s.abs() <= 1.0));
        let peak = clip
            .first_channel()
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"this is not audio at all, just text").unwrap();

        let err = AudioDecoder::new().decode(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_decode_missing_file_is_decode_error() {
        let err = AudioDecoder::new()
            .decode(Path::new("/nonexistent/clip.wav"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
