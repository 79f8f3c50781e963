//! Waveform sources polled by the voice monitor.
//!
//! A source hands out the most recent block of mono samples, like an
//! oscilloscope tap: older audio that was never polled is discarded.

use ringbuf::{
    traits::{Consumer, Observer, Split},
    HeapCons, HeapProd, HeapRb,
};

/// Supplies the latest mono samples.
pub trait WaveformSource: Send {
    /// Fill `out` with the most recent samples, oldest first.
    ///
    /// Returns how many samples were written (`0` if nothing is available yet).
    fn read_latest(&mut self, out: &mut [f32]) -> usize;
}

impl<F> WaveformSource for F
where
    F: FnMut(&mut [f32]) -> usize + Send,
{
    fn read_latest(&mut self, out: &mut [f32]) -> usize {
        self(out)
    }
}

/// Latest-window view over an SPSC ring fed by a capture callback.
pub struct RingWaveform {
    consumer: HeapCons<f32>,
    // Circular window of the newest samples
    window: Vec<f32>,
    write_pos: usize,
    filled: usize,
    drain_buf: Vec<f32>,
}

/// Create a producer/source pair. `ring_capacity` bounds the unread backlog;
/// `window` is the block size handed to the monitor.
pub fn waveform_ring(ring_capacity: usize, window: usize) -> (HeapProd<f32>, RingWaveform) {
    let (producer, consumer) = HeapRb::<f32>::new(ring_capacity.max(1)).split();
    (producer, RingWaveform::new(consumer, window))
}

impl RingWaveform {
    pub fn new(consumer: HeapCons<f32>, window: usize) -> Self {
        let window = window.max(1);
        Self {
            consumer,
            window: vec![0.0; window],
            write_pos: 0,
            filled: 0,
            drain_buf: vec![0.0; 1024],
        }
    }

    fn drain(&mut self) {
        while self.consumer.occupied_len() > 0 {
            let read = self.consumer.pop_slice(&mut self.drain_buf);
            if read == 0 {
                break;
            }
            for &sample in &self.drain_buf[..read] {
                self.window[self.write_pos] = sample;
                self.write_pos = (self.write_pos + 1) % self.window.len();
            }
            self.filled = (self.filled + read).min(self.window.len());
        }
    }
}

impl WaveformSource for RingWaveform {
    fn read_latest(&mut self, out: &mut [f32]) -> usize {
        self.drain();

        let count = self.filled.min(out.len());
        let len = self.window.len();
        // Oldest of the `count` newest samples
        let start = (self.write_pos + len - count) % len;
        for (i, slot) in out[..count].iter_mut().enumerate() {
            *slot = self.window[(start + i) % len];
        }
        count
    }
}
