use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::AudioResult;

/// Write mono samples as a 16-bit PCM WAV file.
///
/// Samples are clamped to `[-1.0, 1.0]` before quantisation.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_wav(path: &Path, samples: &[f32], sample_rate: u32) -> AudioResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let quantised = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(quantised)?;
    }
    writer.finalize()?;

    log::debug!(
        "Wrote {} samples at {} Hz to {}",
        samples.len(),
        sample_rate,
        path.display()
    );
    Ok(())
}
