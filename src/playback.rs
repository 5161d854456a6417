//! Playback on the default output device (feature `playback`).

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::error::{GeminiError, Result};
use crate::music::{AudioFrame, AudioSink};

fn open_default() -> Result<OutputStream> {
    OutputStreamBuilder::open_default_stream()
        .map_err(|e| GeminiError::AudioError(format!("failed to open audio output: {e}")))
}

/// Play interleaved samples and block until they finish.
pub fn play_pcm(samples: &[f32], channels: u16, sample_rate: u32) -> Result<()> {
    let stream = open_default()?;
    let sink = Sink::connect_new(stream.mixer());
    sink.append(SamplesBuffer::new(channels, sample_rate, samples.to_vec()));
    sink.sleep_until_end();
    Ok(())
}

/// Queues streamed music frames on the default output device.
pub struct Speaker {
    // Dropping the stream stops the sink.
    _stream: OutputStream,
    sink: Sink,
}

impl Speaker {
    pub fn open() -> Result<Self> {
        let stream = open_default()?;
        let sink = Sink::connect_new(stream.mixer());
        Ok(Self {
            _stream: stream,
            sink,
        })
    }

    pub fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume);
    }

    /// Block until everything queued has played.
    pub fn wait(&self) {
        self.sink.sleep_until_end();
    }
}

impl AudioSink for Speaker {
    fn write(&mut self, frame: &AudioFrame) -> Result<()> {
        self.sink.append(SamplesBuffer::new(
            frame.channels,
            frame.sample_rate,
            frame.samples.clone(),
        ));
        Ok(())
    }
}

impl std::fmt::Debug for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Speaker")
            .field("queued", &self.sink.len())
            .finish()
    }
}
