//! Posting work onto the UI thread.
//!
//! The worker never calls back into UI code directly. It hands closures to a
//! [`Dispatcher`], which arranges for them to run on the thread that owns the
//! host's main loop.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// A unit of work to run on the UI thread
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Schedules jobs on the UI thread
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: UiJob);
}

/// Create a channel-backed dispatcher and the loop that drains it.
///
/// Whichever thread owns the [`UiLoop`] acts as the UI thread.
pub fn channel() -> (ChannelDispatcher, UiLoop) {
    let (tx, rx) = mpsc::channel();
    (ChannelDispatcher { tx }, UiLoop { rx })
}

/// Sending half returned by [`channel`]
#[derive(Clone)]
pub struct ChannelDispatcher {
    tx: Sender<UiJob>,
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, job: UiJob) {
        if self.tx.send(job).is_err() {
            tracing::warn!("UI loop is gone, dropping job");
        }
    }
}

/// Receiving half returned by [`channel`]
pub struct UiLoop {
    rx: Receiver<UiJob>,
}

impl UiLoop {
    /// Run every job already posted. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            count += 1;
        }
        count
    }

    /// Wait up to `timeout` for one job and run it
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(job) => {
                job();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

/// Dispatches through an idle source on the default GLib main context
#[cfg(feature = "glib-loop")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GlibDispatcher;

#[cfg(feature = "glib-loop")]
impl Dispatcher for GlibDispatcher {
    fn dispatch(&self, job: UiJob) {
        glib::idle_add_once(job);
    }
}
