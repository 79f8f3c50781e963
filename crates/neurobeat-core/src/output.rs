//! Audio output: a CPAL device stream or a headless sink rendered on demand.
//!
//! Both backends drive the same [`AudioRenderer`], which fills interleaved
//! stereo `f32` frames. The headless backend holds the renderer until
//! [`AudioOutput::render_offline`] pulls frames from it, which is how tests
//! and machines without an audio device exercise the synthesis path.

use crate::{Error, Result};
use tracing::{debug, info};

#[cfg(feature = "cpal")]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Fills interleaved stereo frames. Called on the audio thread.
pub trait AudioRenderer: Send {
    fn render(&mut self, output: &mut [f32]);
}

/// Where rendered audio goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioBackend {
    /// A CPAL output device; `None` selects the host default.
    Cpal { device_index: Option<usize> },
    /// No device. Audio is rendered only through `render_offline`.
    #[default]
    Headless,
}

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` due to platform internals. The stream is only
/// reached through `AudioOutput`, which the engine keeps behind a mutex, and
/// it is dropped in place when the output stops.
#[cfg(feature = "cpal")]
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: see `StreamHandle`; the stream is never accessed concurrently.
#[cfg(feature = "cpal")]
unsafe impl Send for StreamHandle {}

pub struct AudioOutput {
    backend: AudioBackend,
    sample_rate: f64,
    channels: usize,
    is_running: bool,
    headless_renderer: Option<Box<dyn AudioRenderer>>,
    #[cfg(feature = "cpal")]
    _stream: Option<StreamHandle>,
}

impl AudioOutput {
    /// Open `backend`. Headless outputs run at `sample_rate`; device outputs
    /// use the device's default configuration.
    pub fn open(backend: AudioBackend, sample_rate: f64) -> Result<Self> {
        let (sample_rate, channels) = match backend {
            AudioBackend::Headless => (sample_rate, 2),
            AudioBackend::Cpal { device_index } => open_device(device_index)?,
        };

        debug!(?backend, sample_rate, channels, "audio output opened");
        Ok(Self {
            backend,
            sample_rate,
            channels,
            is_running: false,
            headless_renderer: None,
            #[cfg(feature = "cpal")]
            _stream: None,
        })
    }

    /// Start pulling audio from `renderer`. No-op if already running.
    pub fn start(&mut self, renderer: Box<dyn AudioRenderer>) -> Result<()> {
        if self.is_running {
            return Ok(());
        }

        match self.backend {
            AudioBackend::Headless => {
                self.headless_renderer = Some(renderer);
            }
            #[cfg(feature = "cpal")]
            AudioBackend::Cpal { device_index } => {
                let stream = start_stream(device_index, renderer)?;
                self._stream = Some(StreamHandle(stream));
            }
            #[cfg(not(feature = "cpal"))]
            AudioBackend::Cpal { .. } => {
                drop(renderer);
                return Err(cpal_disabled());
            }
        }

        self.is_running = true;
        info!(backend = ?self.backend, "audio output started");
        Ok(())
    }

    /// Release the stream (or the headless renderer). Idempotent.
    pub fn stop(&mut self) {
        if !self.is_running {
            return;
        }
        self.headless_renderer = None;
        #[cfg(feature = "cpal")]
        {
            self._stream = None;
        }
        self.is_running = false;
        info!("audio output stopped");
    }

    /// Render `frames` stereo frames from the headless renderer.
    ///
    /// Returns `None` for device outputs or when not running.
    pub fn render_offline(&mut self, frames: usize) -> Option<Vec<f32>> {
        let renderer = self.headless_renderer.as_mut()?;
        let mut buffer = vec![0.0f32; frames * 2];
        renderer.render(&mut buffer);
        Some(buffer)
    }

    pub fn backend(&self) -> AudioBackend {
        self.backend
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Output device names, prefixed with their index.
    pub fn list_devices() -> Result<Vec<String>> {
        #[cfg(feature = "cpal")]
        {
            cpal::default_host()
                .output_devices()?
                .enumerate()
                .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
                .collect()
        }
        #[cfg(not(feature = "cpal"))]
        {
            Err(cpal_disabled())
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(not(feature = "cpal"))]
fn cpal_disabled() -> Error {
    Error::BackendUnavailable("built without the `cpal` feature".into())
}

#[cfg(not(feature = "cpal"))]
fn open_device(_device_index: Option<usize>) -> Result<(f64, usize)> {
    Err(cpal_disabled())
}

#[cfg(feature = "cpal")]
fn open_device(device_index: Option<usize>) -> Result<(f64, usize)> {
    let device = get_device(device_index)?;
    let config = device.default_output_config()?;
    Ok((config.sample_rate().0 as f64, config.channels() as usize))
}

#[cfg(feature = "cpal")]
fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::InvalidDevice(format!("Device index {i} out of range ({count} available)"))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".into())),
    }
}

#[cfg(feature = "cpal")]
fn start_stream(
    device_index: Option<usize>,
    renderer: Box<dyn AudioRenderer>,
) -> Result<cpal::Stream> {
    let device = get_device(device_index)?;
    let config = device.default_output_config()?;

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), renderer)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), renderer)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), renderer)?,
        format => {
            return Err(Error::InvalidConfig(format!(
                "Unsupported sample format: {format:?}"
            )));
        }
    };

    stream.play()?;
    Ok(stream)
}

#[cfg(feature = "cpal")]
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: Box<dyn AudioRenderer>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;

    // Grows on the first callback, then stable
    let mut stereo = Vec::<f32>::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let frames = data.len() / channels;
                let needed = frames * 2;
                if stereo.len() < needed {
                    stereo.resize(needed, 0.0);
                }
                stereo[..needed].fill(0.0);
                renderer.render(&mut stereo[..needed]);
                write_output(data, channels, &stereo);
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        |err| tracing::error!(%err, "audio output stream error"),
        None,
    )?;

    Ok(stream)
}

/// Convert stereo f32 to the device format; channels past the second get silence.
#[cfg(feature = "cpal")]
#[inline]
fn write_output<T: cpal::SizedSample + cpal::FromSample<f32>>(
    data: &mut [T],
    channels: usize,
    stereo: &[f32],
) {
    for (i, sample) in data.iter_mut().enumerate() {
        let frame = i / channels;
        let ch = i % channels;
        let value = match (channels, ch) {
            (1, _) => (stereo[frame * 2] + stereo[frame * 2 + 1]) * 0.5,
            (_, 0 | 1) => stereo[frame * 2 + ch],
            _ => 0.0,
        };
        *sample = T::from_sample(value);
    }
}

#[cfg(feature = "cpal")]
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
