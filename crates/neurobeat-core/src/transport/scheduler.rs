//! Scheduler thread driving a [`TransportClock`].
//!
//! The thread blocks on a control channel with a timeout equal to the time
//! left until the next beat. Transport mutations send `Wake` so the wait is
//! recomputed immediately; `Shutdown` (or a dropped sender) ends the loop.

use super::clock::TransportClock;
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

/// Control messages for the scheduler thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMsg {
    Wake,
    Shutdown,
}

/// Owns the scheduler thread. Dropping it shuts the thread down.
pub struct Scheduler {
    transport: Arc<TransportClock>,
    command_tx: Sender<SchedulerMsg>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the scheduler thread for `transport`.
    pub fn spawn(transport: Arc<TransportClock>) -> Result<Self> {
        let (command_tx, command_rx) = unbounded();
        transport.attach_waker(command_tx.clone());

        let thread_transport = Arc::clone(&transport);
        let spawned = thread::Builder::new()
            .name("neurobeat-transport".into())
            .spawn(move || scheduler_loop(thread_transport, command_rx));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                transport.detach_waker();
                return Err(e.into());
            }
        };

        debug!("transport scheduler started");
        Ok(Self {
            transport,
            command_tx,
            thread_handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the thread and wait for it, unless called from the scheduler
    /// thread itself (e.g. from inside a beat observer).
    pub fn shutdown(&mut self) {
        let Some(handle) = self.thread_handle.take() else {
            return;
        };
        self.transport.detach_waker();
        let _ = self.command_tx.send(SchedulerMsg::Shutdown);

        if handle.thread().id() != thread::current().id() {
            let _ = handle.join();
        }
        debug!("transport scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn scheduler_loop(transport: Arc<TransportClock>, command_rx: Receiver<SchedulerMsg>) {
    loop {
        let received = match transport.poll() {
            Some(next) => {
                let wait = (next - transport.now()).max(0.0);
                trace!(wait, "scheduler waiting for next beat");
                command_rx.recv_timeout(Duration::from_secs_f64(wait))
            }
            None => command_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(SchedulerMsg::Wake) | Err(RecvTimeoutError::Timeout) => {}
            Ok(SchedulerMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
