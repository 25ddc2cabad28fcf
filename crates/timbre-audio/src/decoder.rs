use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{AudioError, AudioResult};

/// Decoded audio as mono PCM samples at a specific sample rate.
#[derive(Debug)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

/// Decode in-memory audio to mono PCM at `target_sample_rate`.
///
/// `extension` is a format hint (`"mp3"`, `"flac"`, ...); probing still
/// works without it. Stereo is folded to mono by averaging channels.
pub fn decode_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
    target_sample_rate: u32,
) -> AudioResult<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("unrecognised audio format: {e}")))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::Decode("no default audio track".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("unsupported codec: {e}")))?;

    let mut sample_buf = None;
    let mut all_samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(AudioError::Decode(format!("failed to read packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                if sample_buf.is_none() {
                    let spec = *audio_buf.spec();
                    let duration = audio_buf.capacity() as u64;
                    sample_buf = Some(SampleBuffer::<f32>::new(duration, spec));
                }

                if let Some(ref mut buf) = sample_buf {
                    buf.copy_interleaved_ref(audio_buf);
                    all_samples.extend_from_slice(buf.samples());
                }
            }
            // Corrupt packets are skipped; the stream may still be usable.
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
            }
            Err(e) => return Err(AudioError::Decode(format!("failed to decode packet: {e}"))),
        }
    }

    if all_samples.is_empty() {
        return Err(AudioError::Decode("stream contains no audio samples".to_string()));
    }

    let channels = codec_params.channels.map_or(1, |c| c.count());
    let mono_samples = downmix(all_samples, channels);

    let source_rate = codec_params.sample_rate.unwrap_or(44_100);
    let resampled = resample_linear(&mono_samples, source_rate, target_sample_rate);

    #[allow(clippy::cast_precision_loss)]
    let duration = resampled.len() as f64 / f64::from(target_sample_rate);

    log::debug!(
        "Decoded {:.2}s of audio ({} Hz, {} ch -> {} Hz mono)",
        duration,
        source_rate,
        channels,
        target_sample_rate
    );

    Ok(DecodedAudio {
        samples: resampled,
        sample_rate: target_sample_rate,
        duration_secs: duration,
    })
}

#[allow(clippy::cast_precision_loss)]
fn downmix(interleaved: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved;
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resampler.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let output_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        if idx + 1 < samples.len() {
            let frac = (pos - idx as f64) as f32;
            output.push(samples[idx].mul_add(1.0 - frac, samples[idx + 1] * frac));
        } else if idx < samples.len() {
            output.push(samples[idx]);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(resample_linear(&samples, 44_100, 44_100), samples);
    }

    #[test]
    fn test_resample_downsample() {
        let samples = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(resample_linear(&samples, 44_100, 22_050).len(), 2);
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        let samples = vec![0.0, 1.0];
        let resampled = resample_linear(&samples, 22_050, 44_100);
        assert_eq!(resampled.len(), 4);
        assert!((resampled[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_downmix_averages_channels() {
        let stereo = vec![1.0, 0.0, 0.5, 0.5];
        assert_eq!(downmix(stereo, 2), vec![0.5, 0.5]);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = decode_bytes(b"definitely not audio".to_vec(), Some("mp3"), 16_000).unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)));
    }
}
