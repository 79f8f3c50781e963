//! Microphone capture (CPAL input device → SPSC ring).
//!
//! The capture callback down-mixes each frame to mono and pushes it into a
//! lock-free ring; the returned [`RingWaveform`] is polled from another thread.
//! Dropping the [`MicrophoneCapture`] closes the device.

use crate::error::{Error, Result};
use crate::source::RingWaveform;

#[cfg(feature = "cpal")]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` due to platform internals. The engine keeps the
/// capture behind a mutex and drops it in place on dispose.
#[cfg(feature = "cpal")]
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: see `StreamHandle`; the stream is never accessed concurrently.
#[cfg(feature = "cpal")]
unsafe impl Send for StreamHandle {}

/// An open microphone stream.
pub struct MicrophoneCapture {
    device_name: String,
    sample_rate: f64,
    #[cfg(feature = "cpal")]
    _stream: StreamHandle,
}

impl MicrophoneCapture {
    /// Open an input device (`None` = host default) and start capturing.
    ///
    /// `waveform_size` is the block the returned source hands out per poll.
    pub fn open(device_index: Option<usize>, waveform_size: usize) -> Result<(Self, RingWaveform)> {
        #[cfg(feature = "cpal")]
        {
            open_device(device_index, waveform_size)
        }
        #[cfg(not(feature = "cpal"))]
        {
            let _ = (device_index, waveform_size);
            Err(Error::MicrophoneUnavailable(
                "built without the `cpal` feature".into(),
            ))
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Input device names, prefixed with their index.
    pub fn list_devices() -> Result<Vec<String>> {
        #[cfg(feature = "cpal")]
        {
            cpal::default_host()
                .input_devices()?
                .enumerate()
                .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
                .collect()
        }
        #[cfg(not(feature = "cpal"))]
        {
            Err(Error::MicrophoneUnavailable(
                "built without the `cpal` feature".into(),
            ))
        }
    }
}

#[cfg(feature = "cpal")]
fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.input_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::MicrophoneUnavailable(format!(
                    "Input device index {i} out of range ({count} available)"
                ))
            })
        }
        None => host
            .default_input_device()
            .ok_or_else(|| Error::MicrophoneUnavailable("No input device available".into())),
    }
}

#[cfg(feature = "cpal")]
fn open_device(
    device_index: Option<usize>,
    waveform_size: usize,
) -> Result<(MicrophoneCapture, RingWaveform)> {
    use ringbuf::{traits::Split, HeapRb};

    let device = get_device(device_index)?;
    let device_name = device.name()?;
    let config = device.default_input_config()?;
    let sample_rate = config.sample_rate().0 as f64;

    // Half a second of backlog, never less than a few poll blocks
    let capacity = (sample_rate as usize / 2).max(waveform_size * 4);
    let (producer, consumer) = HeapRb::<f32>::new(capacity).split();

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), producer)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), producer)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), producer)?,
        format => {
            return Err(Error::MicrophoneUnavailable(format!(
                "Unsupported sample format: {format:?}"
            )));
        }
    };
    stream.play()?;

    tracing::info!(device = %device_name, sample_rate, "microphone opened");
    Ok((
        MicrophoneCapture {
            device_name,
            sample_rate,
            _stream: StreamHandle(stream),
        },
        RingWaveform::new(consumer, waveform_size),
    ))
}

#[cfg(feature = "cpal")]
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: ringbuf::HeapProd<f32>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    use cpal::Sample;
    use ringbuf::traits::Producer;

    let channels = (config.channels as usize).max(1);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            for frame in data.chunks(channels) {
                let sum: f32 = frame.iter().map(|s| s.to_sample::<f32>()).sum();
                // Full ring means the poller stalled; drop the sample
                let _ = producer.try_push(sum / frame.len() as f32);
            }
        },
        |err| tracing::error!(%err, "microphone stream error"),
        None,
    )?;

    Ok(stream)
}
