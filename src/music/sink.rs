//! Destinations for streamed music.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::{GeminiError, Result};

/// Interleaved `f32` samples decoded from one audio chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioFrame {
    /// Duration of the frame in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.channels == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.channels) / f64::from(self.sample_rate)
    }
}

/// Receives decoded frames as they arrive.
pub trait AudioSink {
    fn write(&mut self, frame: &AudioFrame) -> Result<()>;

    /// Called once the stream ends or the time limit is reached.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects everything in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    samples: Vec<f32>,
    frames: usize,
    channels: Option<u16>,
    sample_rate: Option<u32>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channels(&self) -> Option<u16> {
        self.channels
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl AudioSink for BufferSink {
    fn write(&mut self, frame: &AudioFrame) -> Result<()> {
        self.samples.extend_from_slice(&frame.samples);
        self.frames += 1;
        self.channels = Some(frame.channels);
        self.sample_rate = Some(frame.sample_rate);
        Ok(())
    }
}

/// Streams frames into a 16-bit WAV file.
pub struct WavSink {
    path: PathBuf,
    spec: WavSpec,
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl WavSink {
    pub fn create(path: impl AsRef<Path>, channels: u16, sample_rate: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(&path, spec)?;
        Ok(Self {
            path,
            spec,
            writer: Some(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header and close the file.
    pub fn finalize(mut self) -> Result<PathBuf> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(self.path.clone())
    }
}

impl AudioSink for WavSink {
    fn write(&mut self, frame: &AudioFrame) -> Result<()> {
        if frame.channels != self.spec.channels || frame.sample_rate != self.spec.sample_rate {
            return Err(GeminiError::AudioError(format!(
                "frame is {} Hz x{} but {} was opened as {} Hz x{}",
                frame.sample_rate,
                frame.channels,
                self.path.display(),
                self.spec.sample_rate,
                self.spec.channels
            )));
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| GeminiError::AudioError("WAV sink already finalized".to_string()))?;
        for sample in &frame.samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for WavSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavSink")
            .field("path", &self.path)
            .field("spec", &self.spec)
            .finish()
    }
}
