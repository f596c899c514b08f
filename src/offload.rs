// SPDX-License-Identifier: GPL-3.0-only

//! Single-flight offloading of per-frame work to a background context
//!
//! Unlike a work queue, the scheduler deliberately sheds load: while the
//! background context is busy, further offload calls are dropped, not
//! queued. Under sustained overload the offloaded unit runs at a reduced,
//! self-throttled rate while the synchronous path continues at the full
//! input rate.

use crate::constants::offload::WORKER_THREAD_NAME;
use crate::errors::{CameraError, CameraResult, CaptureFailure};
use crate::frame::Frame;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// A unit of work operating on a frame in the background context
pub type OffloadUnit = Box<dyn FnOnce(&Frame) -> CameraResult<()> + Send + 'static>;

/// Where errors raised inside an offloaded unit are surfaced
///
/// The session installs its general error channel here, so background
/// failures arrive through the same path as synchronous ones.
pub type ErrorSink = Arc<dyn Fn(CameraError) + Send + Sync>;

/// Outcome of an offload call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffloadDisposition {
    /// The unit was dispatched to the background context
    Scheduled,
    /// The context was busy; the unit was dropped without running
    Dropped,
}

struct OffloadJob {
    frame: Frame,
    unit: OffloadUnit,
}

/// Single-flight scheduler for background frame work
///
/// At most one offloaded unit is in flight at any time. The busy flag is
/// claimed before dispatch and cleared after the unit completes, even when
/// the unit fails or panics. There is no cancellation: a dispatched unit
/// always runs to completion.
pub struct OffloadScheduler {
    busy: Arc<AtomicBool>,
    sender: Option<mpsc::UnboundedSender<OffloadJob>>,
    worker: Option<JoinHandle<()>>,
}

impl OffloadScheduler {
    /// Spawn the background worker
    ///
    /// Errors (and panics) from offloaded units are reported through
    /// `errors`; the worker itself never dies from a failing unit.
    pub fn new(errors: ErrorSink) -> Self {
        let busy = Arc::new(AtomicBool::new(false));
        let (sender, mut receiver) = mpsc::unbounded_channel::<OffloadJob>();

        let worker_busy = Arc::clone(&busy);
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                debug!("Offload worker started");
                while let Some(job) = receiver.blocking_recv() {
                    let OffloadJob { frame, unit } = job;

                    match catch_unwind(AssertUnwindSafe(|| unit(&frame))) {
                        Ok(Ok(())) => trace!("Offloaded unit completed"),
                        Ok(Err(error)) => errors(error),
                        Err(panic) => errors(CameraError::CaptureFailed(CaptureFailure {
                            message: format!(
                                "offloaded frame unit panicked: {}",
                                panic_message(&panic)
                            ),
                            cause: None,
                        })),
                    }

                    // Drop the extra reference first, then free the context
                    // for new calls.
                    if let Err(error) = frame.release() {
                        warn!(error = %error, "Offload worker could not release its frame");
                    }
                    worker_busy.store(false, Ordering::SeqCst);
                }
                debug!("Offload worker exiting");
            })
            .expect("failed to spawn offload worker thread");

        Self {
            busy,
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Whether an offloaded unit is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Offload `unit` to the background context, bound to `frame`
    ///
    /// Returns immediately in all cases; the caller never blocks.
    ///
    /// If the context is busy the call is dropped: the unit never runs and
    /// the frame's reference count is untouched. Otherwise an extra
    /// reference is taken on the frame, held until the unit completes
    /// (success, error or panic).
    pub fn offload(&self, frame: &Frame, unit: OffloadUnit) -> CameraResult<OffloadDisposition> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!("Offload context busy; dropping call");
            return Ok(OffloadDisposition::Dropped);
        }

        if let Err(error) = frame.acquire() {
            self.busy.store(false, Ordering::SeqCst);
            return Err(error);
        }

        let job = OffloadJob {
            frame: frame.clone(),
            unit,
        };
        let sender = self.sender.as_ref().expect("sender lives until drop");
        if let Err(mpsc::error::SendError(job)) = sender.send(job) {
            // Worker already gone (scheduler shutting down); undo our claim.
            warn!("Offload worker unavailable; dropping call");
            if let Err(error) = job.frame.release() {
                warn!(error = %error, "Could not release frame after failed dispatch");
            }
            self.busy.store(false, Ordering::SeqCst);
            return Ok(OffloadDisposition::Dropped);
        }

        Ok(OffloadDisposition::Scheduled)
    }
}

impl Drop for OffloadScheduler {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain in-flight work and exit.
        self.sender.take();
        if let Some(handle) = self.worker.take() {
            debug!("Waiting for offload worker to finish");
            if handle.join().is_err() {
                warn!("Offload worker panicked during shutdown");
            }
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
