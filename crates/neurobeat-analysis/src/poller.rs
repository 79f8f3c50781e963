//! Voice polling loop.
//!
//! [`VoiceSampler`] pairs a waveform source with its read buffer; one
//! [`poll`](VoiceSampler::poll) reads the newest block into the monitor.
//! [`VoicePoller`] runs that on its own thread at display-refresh cadence,
//! independent of the transport: stopping one never stops the other.

use crate::error::Result;
use crate::monitor::VoiceMonitor;
use crate::source::WaveformSource;
use neurobeat_core::AtomicFlag;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

pub struct VoiceSampler {
    source: Box<dyn WaveformSource>,
    buffer: Vec<f32>,
}

impl VoiceSampler {
    pub fn new(source: Box<dyn WaveformSource>, waveform_size: usize) -> Self {
        Self {
            source,
            buffer: vec![0.0; waveform_size.max(1)],
        }
    }

    /// Read the latest block into `monitor`. Returns `true` on an onset.
    pub fn poll(&mut self, monitor: &VoiceMonitor) -> bool {
        let read = self.source.read_latest(&mut self.buffer);
        if read == 0 {
            return false;
        }
        monitor.process_waveform(&self.buffer[..read])
    }
}

/// Background thread polling a [`VoiceSampler`]. Dropping it stops the thread.
pub struct VoicePoller {
    running: Arc<AtomicFlag>,
    thread_handle: Option<JoinHandle<()>>,
}

impl VoicePoller {
    pub fn spawn(
        monitor: Arc<VoiceMonitor>,
        mut sampler: VoiceSampler,
        interval: Duration,
    ) -> Result<Self> {
        let running = Arc::new(AtomicFlag::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("neurobeat-voice".into())
            .spawn(move || {
                while thread_running.get() {
                    sampler.poll(&monitor);
                    thread::park_timeout(interval);
                }
                // Sampler (and its source) is released here
            })?;

        debug!(?interval, "voice poller started");
        Ok(Self {
            running,
            thread_handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop polling and wait for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        let Some(handle) = self.thread_handle.take() else {
            return;
        };
        self.running.set(false);
        handle.thread().unpark();

        if handle.thread().id() != thread::current().id() {
            let _ = handle.join();
        }
        debug!("voice poller stopped");
    }
}

impl Drop for VoicePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
