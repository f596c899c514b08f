// SPDX-License-Identifier: GPL-3.0-only

//! Video recording lifecycle
//!
//! Governs a single recording session: Idle → Recording ⇄ Paused → Idle,
//! terminated by the device's one completion callback (finish, fault or
//! cancel). Recording with flash enables a torch override that is cleared
//! exactly once when the session terminates, before either completion
//! handler runs, so the torch is never observably stuck on past session end.

use crate::device::{
    CaptureDevice, Flash, RecordVideoOptions, RecordingCompletion, TorchMode, VideoFile,
};
use crate::errors::{CameraError, CameraResult};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// State of the video recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// No recording session active
    #[default]
    Idle,
    /// Actively recording
    Recording,
    /// Recording paused, resumable
    Paused,
}

impl RecordingState {
    /// Whether a recording session exists (recording or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, RecordingState::Recording | RecordingState::Paused)
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "idle"),
            RecordingState::Recording => write!(f, "recording"),
            RecordingState::Paused => write!(f, "paused"),
        }
    }
}

/// Called once with the finished video when a recording succeeds
pub type RecordingFinishedHandler = Box<dyn FnOnce(VideoFile) + Send>;

/// Called once with the error when a recording fails or is canceled
pub type RecordingErrorHandler = Box<dyn FnOnce(CameraError) + Send>;

/// Completion handlers for one recording session
///
/// Both handlers are required; [`VideoRecorder::start`] rejects a session
/// with either missing before any native call is issued.
#[derive(Default)]
pub struct RecordingCallbacks {
    pub on_finished: Option<RecordingFinishedHandler>,
    pub on_error: Option<RecordingErrorHandler>,
}

impl RecordingCallbacks {
    /// Convenience constructor with both handlers present
    pub fn new(
        on_finished: impl FnOnce(VideoFile) + Send + 'static,
        on_error: impl FnOnce(CameraError) + Send + 'static,
    ) -> Self {
        Self {
            on_finished: Some(Box::new(on_finished)),
            on_error: Some(Box::new(on_error)),
        }
    }
}

struct RecorderInner {
    state: RecordingState,
    flash_override_active: bool,
    /// Taken exactly once, by the completion path
    callbacks: Option<(RecordingFinishedHandler, RecordingErrorHandler)>,
    /// Torch state to restore once the override clears
    torch_after: TorchMode,
}

/// The video recording state machine
///
/// Cheap to clone; clones share the same session state, which is also what
/// the completion callback handed to the device holds on to.
#[derive(Clone)]
pub struct VideoRecorder {
    inner: Arc<Mutex<RecorderInner>>,
}

impl Default for VideoRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoRecorder {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecorderInner {
                state: RecordingState::Idle,
                flash_override_active: false,
                callbacks: None,
                torch_after: TorchMode::Off,
            })),
        }
    }

    /// Current state of the recorder
    pub fn state(&self) -> RecordingState {
        self.inner.lock().unwrap().state
    }

    /// Whether the recording-with-flash torch override is active
    pub fn is_flash_override_active(&self) -> bool {
        self.inner.lock().unwrap().flash_override_active
    }

    /// Start a new recording session
    ///
    /// Fails with [`CameraError::InvalidParameter`] if either completion
    /// handler is missing (no native call is issued), and with
    /// [`CameraError::InvalidRecordingState`] if a session is already
    /// active. `torch_after` is the torch state the hosting UI had
    /// configured; it is restored when the flash override clears.
    pub fn start(
        &self,
        device: &Arc<dyn CaptureDevice>,
        options: RecordVideoOptions,
        callbacks: RecordingCallbacks,
        torch_after: TorchMode,
    ) -> CameraResult<()> {
        let (on_finished, on_error) = match (callbacks.on_finished, callbacks.on_error) {
            (Some(finished), Some(error)) => (finished, error),
            _ => {
                return Err(CameraError::InvalidParameter(
                    "the recording-finished and recording-error handlers must both be set"
                        .to_string(),
                ));
            }
        };

        let with_flash = options.flash == Flash::On;
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.state != RecordingState::Idle {
                return Err(CameraError::InvalidRecordingState {
                    operation: "start recording",
                    state: inner.state,
                });
            }

            // The override goes up before the native start call so the very
            // first recorded frames are lit.
            if with_flash {
                inner.flash_override_active = true;
            }
            inner.torch_after = torch_after;
            inner.state = RecordingState::Recording;
            inner.callbacks = Some((on_finished, on_error));
        }

        if with_flash {
            if let Err(fault) = device.set_torch(true) {
                warn!(code = %fault.code, error = %fault.message, "Could not enable torch for recording");
            }
        }

        info!(flash = with_flash, file_type = ?options.file_type, "Starting video recording");
        if let Err(fault) = device.start_video_recording(&options, self.completion(device)) {
            self.rollback_failed_start(device);
            return Err(CameraError::capture_failed("could not start recording", fault));
        }
        Ok(())
    }

    /// Pause the active recording; valid only while recording
    pub fn pause(&self, device: &Arc<dyn CaptureDevice>) -> CameraResult<()> {
        self.expect_state(RecordingState::Recording, "pause recording")?;
        device.pause_video_recording().map_err(CameraError::from)?;

        let mut inner = self.inner.lock().unwrap();
        // The completion may have fired while the native call was in flight
        if inner.state == RecordingState::Recording {
            inner.state = RecordingState::Paused;
            debug!("Recording paused");
        }
        Ok(())
    }

    /// Resume a paused recording; valid only while paused
    pub fn resume(&self, device: &Arc<dyn CaptureDevice>) -> CameraResult<()> {
        self.expect_state(RecordingState::Paused, "resume recording")?;
        device.resume_video_recording().map_err(CameraError::from)?;

        let mut inner = self.inner.lock().unwrap();
        if inner.state == RecordingState::Paused {
            inner.state = RecordingState::Recording;
            debug!("Recording resumed");
        }
        Ok(())
    }

    /// Stop the recording and finalize the file
    ///
    /// Valid while recording or paused. The session terminates when the
    /// device fires the completion callback.
    pub fn stop(&self, device: &Arc<dyn CaptureDevice>) -> CameraResult<()> {
        self.expect_active("stop recording")?;
        info!("Stopping video recording");
        device.stop_video_recording().map_err(CameraError::from)
    }

    /// Abort the recording, deleting the file
    ///
    /// Valid while recording or paused. The completion callback reports
    /// [`CameraError::RecordingCanceled`] to the error handler, so callers
    /// can tell cancellation apart from a genuine fault.
    pub fn cancel(&self, device: &Arc<dyn CaptureDevice>) -> CameraResult<()> {
        self.expect_active("cancel recording")?;
        info!("Canceling video recording");
        device.cancel_video_recording().map_err(CameraError::from)
    }

    fn expect_state(&self, expected: RecordingState, operation: &'static str) -> CameraResult<()> {
        let state = self.inner.lock().unwrap().state;
        if state != expected {
            return Err(CameraError::InvalidRecordingState { operation, state });
        }
        Ok(())
    }

    fn expect_active(&self, operation: &'static str) -> CameraResult<()> {
        let state = self.inner.lock().unwrap().state;
        if !state.is_active() {
            return Err(CameraError::InvalidRecordingState { operation, state });
        }
        Ok(())
    }

    /// Build the one completion callback handed to the device
    fn completion(&self, device: &Arc<dyn CaptureDevice>) -> RecordingCompletion {
        let shared = Arc::clone(&self.inner);
        let device = Arc::clone(device);
        Box::new(move |result: Result<VideoFile, CameraError>| {
            // Terminate the session and clear the override before either
            // handler can observe anything.
            let (callbacks, clear_torch, torch_after) = {
                let mut inner = shared.lock().unwrap();
                let clear_torch = inner.flash_override_active;
                inner.flash_override_active = false;
                inner.state = RecordingState::Idle;
                (inner.callbacks.take(), clear_torch, inner.torch_after)
            };

            if clear_torch {
                if let Err(fault) = device.set_torch(torch_after == TorchMode::On) {
                    warn!(code = %fault.code, error = %fault.message, "Could not restore torch after recording");
                }
            }

            let Some((on_finished, on_error)) = callbacks else {
                warn!("Recording completion fired with no active session");
                return;
            };

            match result {
                Ok(video) => {
                    info!(path = %video.path.display(), "Recording finished");
                    on_finished(video);
                }
                Err(CameraError::RecordingCanceled) => {
                    debug!("Recording canceled");
                    on_error(CameraError::RecordingCanceled);
                }
                Err(error) => {
                    warn!(error = %error, "Recording failed");
                    on_error(error);
                }
            }
        })
    }

    /// Undo the optimistic state changes after a failed native start call
    fn rollback_failed_start(&self, device: &Arc<dyn CaptureDevice>) {
        let (clear_torch, torch_after) = {
            let mut inner = self.inner.lock().unwrap();
            // If the device invoked the completion before failing, there is
            // nothing left to roll back.
            if inner.callbacks.is_none() && inner.state == RecordingState::Idle {
                return;
            }
            let clear_torch = inner.flash_override_active;
            inner.flash_override_active = false;
            inner.state = RecordingState::Idle;
            inner.callbacks = None;
            (clear_torch, inner.torch_after)
        };
        if clear_torch {
            if let Err(fault) = device.set_torch(torch_after == TorchMode::On) {
                warn!(code = %fault.code, error = %fault.message, "Could not restore torch after failed start");
            }
        }
    }
}

impl fmt::Debug for VideoRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("VideoRecorder")
            .field("state", &inner.state)
            .field("flash_override_active", &inner.flash_override_active)
            .finish()
    }
}
