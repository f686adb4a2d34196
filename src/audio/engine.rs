use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};

use super::RenderLoop;

/// Audio engine driving a [`RenderLoop`] from the default output device
pub struct AudioEngine {
    _stream: Stream,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioEngine {
    /// Open the default output device and start rendering. The render loop
    /// is switched to the device's sample rate before it moves to the
    /// audio thread.
    pub fn new(mut render: RenderLoop) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No output device available")?;

        let config = device.default_output_config()?;
        let sample_format = config.sample_format();
        let config: StreamConfig = config.into();
        render.set_sample_rate(config.sample_rate.0);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, render)?,
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, render)?,
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, render)?,
            format => anyhow::bail!("Unsupported sample format: {:?}", format),
        };

        stream.play()?;
        tracing::info!(
            "audio output running at {} Hz, {} channels",
            config.sample_rate.0,
            config.channels
        );

        Ok(Self {
            _stream: stream,
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        })
    }

    /// Build the audio stream for a specific sample format
    fn build_stream<T>(device: &Device, config: &StreamConfig, mut render: RenderLoop) -> Result<Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                render.process_commands();

                for frame in data.chunks_mut(channels) {
                    let (left, right) = render.next_frame();
                    // Left to ch0, right to ch1, mono fallback for others
                    for (ch, channel_sample) in frame.iter_mut().enumerate() {
                        let sample = match ch {
                            0 => left,
                            1 => right,
                            _ => (left + right) * 0.5,
                        };
                        *channel_sample = T::from_sample(sample.clamp(-1.0, 1.0));
                    }
                }
            },
            |err| {
                tracing::error!("audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}
