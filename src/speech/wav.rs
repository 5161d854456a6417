//! WAV output for generated speech.
//!
//! The TTS models return raw 16-bit little-endian PCM. Samples are rescaled when the
//! configured sample width is 1 or 3 bytes.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::warn;

use super::AudioFormat;
use crate::error::Result;

/// Decode 16-bit little-endian PCM into `[-1.0, 1.0)` floats. A trailing odd byte is dropped.
pub fn pcm16_to_f32(pcm: &[u8]) -> Vec<f32> {
    pcm.chunks_exact(2)
        .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0)
        .collect()
}

/// Write 16-bit PCM to `path` using the channel count, rate and width of `format`.
///
/// The last frame is padded with silence when the sample count is not a multiple of
/// the channel count. Nothing is left at `path` when writing fails.
pub fn write_wav(path: &Path, format: &AudioFormat, pcm16: &[u8]) -> Result<()> {
    let result = write_samples(path, format, pcm16);
    if result.is_err()
        && path.exists()
        && let Err(e) = std::fs::remove_file(path)
    {
        warn!(path = %path.display(), error = %e, "Could not remove incomplete WAV file");
    }
    result
}

fn write_samples(path: &Path, format: &AudioFormat, pcm16: &[u8]) -> Result<()> {
    let spec = WavSpec {
        channels: format.channels(),
        sample_rate: format.sample_rate(),
        bits_per_sample: format.sample_width() * 8,
        sample_format: SampleFormat::Int,
    };
    let mut samples: Vec<i16> = pcm16
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();
    let channels = usize::from(format.channels().max(1));
    samples.resize(samples.len().div_ceil(channels) * channels, 0);

    let mut writer = WavWriter::create(path, spec)?;
    for sample in samples {
        match format.sample_width() {
            1 => writer.write_sample((sample >> 8) as i8)?,
            2 => writer.write_sample(sample)?,
            _ => writer.write_sample(i32::from(sample) << 8)?,
        }
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn converts_to_float() {
        let samples = pcm16_to_f32(&pcm(&[0, i16::MIN, 16384]));
        assert_eq!(samples, vec![0.0, -1.0, 0.5]);
        assert_eq!(pcm16_to_f32(&[1, 2, 3]).len(), 1);
    }

    #[test]
    fn writes_16_bit_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out0.wav");
        write_wav(&path, &AudioFormat::default(), &pcm(&[1, -1, 300])).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, -1, 300]);
    }

    #[test]
    fn rescales_to_other_widths() {
        let tmp = tempfile::tempdir().unwrap();

        let mut format = AudioFormat::default();
        format.set_sample_width(1).unwrap();
        let narrow = tmp.path().join("narrow.wav");
        write_wav(&narrow, &format, &pcm(&[i16::MAX, i16::MIN])).unwrap();
        let samples: Vec<i8> = hound::WavReader::open(&narrow)
            .unwrap()
            .into_samples()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples, vec![127, -128]);

        format.set_sample_width(3).unwrap();
        let wide = tmp.path().join("wide.wav");
        write_wav(&wide, &format, &pcm(&[2])).unwrap();
        let reader = hound::WavReader::open(&wide).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 24);
        let samples: Vec<i32> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![512]);
    }

    #[test]
    fn pads_last_frame_for_stereo() {
        let tmp = tempfile::tempdir().unwrap();
        let mut format = AudioFormat::default();
        format.set_channels(2).unwrap();
        let path = tmp.path().join("stereo.wav");
        write_wav(&path, &format, &pcm(&[1, 2, 3])).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, 3, 0]);
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("out0.wav");
        assert!(write_wav(&path, &AudioFormat::default(), &pcm(&[1])).is_err());
        assert!(!path.exists());
    }
}
