// SPDX-License-Identifier: GPL-3.0-only

//! Camera session facade
//!
//! Composes the runtime core: receives native lifecycle events, updates
//! rotation tracking and the FPS history, drives the recording state
//! machine, runs the configured frame-processing unit against every frame,
//! and forwards capture calls to the external capture device.

mod events;

pub use events::{
    ErrorHandler, EventHandlers, LifecycleHandler, OrientationHandler, RotationHandler,
    ShutterHandler,
};

use crate::config::SessionConfig;
use crate::device::{
    CaptureDevice, CodeFrame, NativeEvent, Photo, PhotoOptions, Point, RecordVideoOptions,
    ScannedCode, SnapshotOptions, TorchMode,
};
use crate::errors::{CameraError, CameraResult};
use crate::fps::FpsSampleHistory;
use crate::frame::Frame;
use crate::offload::{ErrorSink, OffloadScheduler};
use crate::processor::ProcessorSlot;
use crate::recording::{RecordingCallbacks, RecordingState, VideoRecorder};
use crate::orientation::RotationTracker;
use events::EventDispatcher;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Handler for decoded codes, with the originating frame's metadata
pub type CodeScanHandler = Box<dyn Fn(&[ScannedCode], &CodeFrame) + Send + Sync>;

/// The camera session runtime
///
/// Created with the capture device (if one resolved), the hosting UI's
/// notification handlers and a configuration. The host drives it by feeding
/// [`NativeEvent`]s and frames, and calls the capture API; everything
/// outward flows through the registered handlers.
pub struct CameraSession {
    device: Option<Arc<dyn CaptureDevice>>,
    dispatcher: EventDispatcher,
    config: SessionConfig,
    rotation: RotationTracker,
    fps_history: FpsSampleHistory,
    recorder: VideoRecorder,
    offload: Arc<OffloadScheduler>,
    code_scanner: Option<CodeScanHandler>,
    /// What the host configured most recently
    configured_processor: ProcessorSlot,
    /// What is actually running against frames
    attached_processor: ProcessorSlot,
    view_ready: bool,
}

impl CameraSession {
    /// Create a session
    ///
    /// `device` may be absent when no capture device resolved; capture calls
    /// then fail with [`CameraError::DeviceUnavailable`] until one is set.
    pub fn new(
        device: Option<Arc<dyn CaptureDevice>>,
        handlers: EventHandlers,
        config: SessionConfig,
    ) -> Self {
        let dispatcher = EventDispatcher::new(handlers);
        let sink_dispatcher = dispatcher.clone();
        let error_sink: ErrorSink = Arc::new(move |error| sink_dispatcher.error(&error));

        info!(
            has_device = device.is_some(),
            torch = ?config.torch,
            "Creating camera session"
        );

        Self {
            device,
            dispatcher,
            config,
            rotation: RotationTracker::new(),
            fps_history: FpsSampleHistory::new(),
            recorder: VideoRecorder::new(),
            offload: Arc::new(OffloadScheduler::new(error_sink)),
            code_scanner: None,
            configured_processor: ProcessorSlot::None,
            attached_processor: ProcessorSlot::None,
            view_ready: false,
        }
    }

    // ===== Device resolution =====

    /// Attach (or detach) the capture device
    pub fn set_device(&mut self, device: Option<Arc<dyn CaptureDevice>>) {
        info!(has_device = device.is_some(), "Capture device changed");
        self.device = device;
        if self.device.is_some() {
            // Bring the hardware in line with the configured torch state
            if let Err(error) = self.apply_torch() {
                warn!(error = %error, "Could not apply torch state to new device");
            }
        }
    }

    fn device(&self) -> CameraResult<&Arc<dyn CaptureDevice>> {
        self.device.as_ref().ok_or(CameraError::DeviceUnavailable)
    }

    /// The device, requiring the native view to be ready for capture calls
    fn ready_device(&self) -> CameraResult<&Arc<dyn CaptureDevice>> {
        let device = self.device()?;
        if !self.view_ready {
            return Err(CameraError::NativeViewNotReady);
        }
        Ok(device)
    }

    // ===== Native view lifecycle =====

    /// Signal that the native view exists and is ready
    ///
    /// A frame-processing unit configured before readiness is deferred and
    /// attached exactly once here.
    pub fn notify_view_ready(&mut self) {
        if self.view_ready {
            return;
        }
        self.view_ready = true;
        debug!("Native view ready");
        self.reconcile_frame_processor();
    }

    pub fn is_view_ready(&self) -> bool {
        self.view_ready
    }

    // ===== Frame-processing unit =====

    /// Configure the frame-processing unit (or clear it with
    /// [`ProcessorSlot::None`])
    ///
    /// Applied immediately when the native view is ready, deferred until
    /// readiness otherwise. Reconfiguring with the same unit (by identity)
    /// is a no-op.
    pub fn set_frame_processor(&mut self, slot: ProcessorSlot) {
        self.configured_processor = slot;
        if self.view_ready {
            self.reconcile_frame_processor();
        } else {
            debug!(
                kind = self.configured_processor.kind_name(),
                "Frame processor configured before view readiness; deferring"
            );
        }
    }

    fn reconcile_frame_processor(&mut self) {
        if self.configured_processor.same_identity(&self.attached_processor) {
            return;
        }
        if !self.attached_processor.is_none() {
            debug!(
                kind = self.attached_processor.kind_name(),
                "Detaching frame processor"
            );
        }
        self.attached_processor = self.configured_processor.clone();
        if !self.attached_processor.is_none() {
            debug!(
                kind = self.attached_processor.kind_name(),
                "Attaching frame processor"
            );
        }
    }

    /// The scheduler for offloading heavy per-frame work
    ///
    /// Frame-processing units keep a clone and call
    /// [`OffloadScheduler::offload`] from their synchronous `process`.
    pub fn offload_scheduler(&self) -> Arc<OffloadScheduler> {
        Arc::clone(&self.offload)
    }

    // ===== Per-frame path =====

    /// Run the attached frame-processing unit against one captured frame
    ///
    /// The frame arrives holding its implicit synchronous reference, which
    /// is released here exactly once, whether the unit succeeded, failed or
    /// none is attached. Unit errors surface through the error channel; the
    /// capture path itself never stops.
    pub fn handle_frame(&mut self, frame: Frame) {
        if let Some(processor) = self.attached_processor.processor() {
            if let Err(error) = processor.process(&frame) {
                self.dispatcher.error(&error);
            }
        }
        if let Err(error) = frame.release() {
            self.dispatcher.error(&error);
        }
    }

    // ===== Native events =====

    /// Process one native event, in emission order
    pub fn handle_event(&mut self, event: NativeEvent) {
        match event {
            NativeEvent::Initialized => self.dispatcher.initialized(),
            NativeEvent::Started => self.dispatcher.started(),
            NativeEvent::Stopped => self.dispatcher.stopped(),
            NativeEvent::PreviewStarted => self.dispatcher.preview_started(),
            NativeEvent::PreviewStopped => self.dispatcher.preview_stopped(),
            NativeEvent::Shutter(kind) => self.dispatcher.shutter(kind),
            NativeEvent::Error(fault) => {
                let error = CameraError::from(fault);
                self.dispatcher.error(&error);
            }
            NativeEvent::OutputOrientationChanged(orientation) => {
                let emitted = self.rotation.set_output_orientation(orientation);
                self.dispatcher.output_orientation_changed(orientation);
                if let Some(rotation) = emitted {
                    self.dispatcher.ui_rotation_changed(rotation);
                }
            }
            NativeEvent::PreviewOrientationChanged(orientation) => {
                let emitted = self.rotation.set_preview_orientation(orientation);
                self.dispatcher.preview_orientation_changed(orientation);
                if let Some(rotation) = emitted {
                    self.dispatcher.ui_rotation_changed(rotation);
                }
            }
            NativeEvent::AverageFpsChanged(fps) => {
                if self.config.enable_fps_history {
                    self.fps_history.push(fps);
                }
            }
            NativeEvent::CodeScanned { codes, frame } => match &self.code_scanner {
                Some(handler) => handler(&codes, &frame),
                None => trace!(count = codes.len(), "Codes scanned with no scanner registered"),
            },
        }
    }

    /// Register (or clear) the code-scan handler
    pub fn set_code_scanner(&mut self, handler: Option<CodeScanHandler>) {
        self.code_scanner = handler;
    }

    // ===== Capture API =====

    /// Take a single photo
    pub fn take_photo(&self, options: &PhotoOptions) -> CameraResult<Photo> {
        let device = self.ready_device()?;
        device
            .take_photo(options)
            .map_err(|fault| CameraError::capture_failed("could not capture photo", fault))
    }

    /// Grab the current preview frame as an image
    pub fn take_snapshot(&self, options: &SnapshotOptions) -> CameraResult<Photo> {
        let device = self.ready_device()?;
        device
            .take_snapshot(options)
            .map_err(|fault| CameraError::capture_failed("could not capture snapshot", fault))
    }

    /// Focus the camera on a point in view coordinates
    pub fn focus(&self, point: Point) -> CameraResult<()> {
        let device = self.ready_device()?;
        device
            .focus(point)
            .map_err(|fault| CameraError::capture_failed("could not focus", fault))
    }

    /// Start a video recording
    ///
    /// Both completion handlers are required; see
    /// [`VideoRecorder::start`] for the full contract.
    pub fn start_recording(
        &self,
        options: RecordVideoOptions,
        callbacks: RecordingCallbacks,
    ) -> CameraResult<()> {
        let device = self.ready_device()?;
        self.recorder.start(device, options, callbacks, self.config.torch)
    }

    /// Pause the active recording
    pub fn pause_recording(&self) -> CameraResult<()> {
        let device = self.ready_device()?;
        self.recorder.pause(device)
    }

    /// Resume a paused recording
    pub fn resume_recording(&self) -> CameraResult<()> {
        let device = self.ready_device()?;
        self.recorder.resume(device)
    }

    /// Stop the active recording and finalize the file
    pub fn stop_recording(&self) -> CameraResult<()> {
        let device = self.ready_device()?;
        self.recorder.stop(device)
    }

    /// Abort the active recording; the error handler receives
    /// [`CameraError::RecordingCanceled`]
    pub fn cancel_recording(&self) -> CameraResult<()> {
        let device = self.ready_device()?;
        self.recorder.cancel(device)
    }

    // ===== State accessors =====

    pub fn recording_state(&self) -> RecordingState {
        self.recorder.state()
    }

    /// Whether the recording-with-flash torch override is active
    pub fn is_flash_override_active(&self) -> bool {
        self.recorder.is_flash_override_active()
    }

    /// The torch state the device should be in right now
    pub fn effective_torch(&self) -> TorchMode {
        if self.recorder.is_flash_override_active() {
            TorchMode::On
        } else {
            self.config.torch
        }
    }

    /// Change the user-requested torch state and push it to the device
    pub fn set_torch_mode(&mut self, torch: TorchMode) -> CameraResult<()> {
        self.config.torch = torch;
        self.apply_torch()
    }

    fn apply_torch(&self) -> CameraResult<()> {
        let device = self.device()?;
        device
            .set_torch(self.effective_torch() == TorchMode::On)
            .map_err(|fault| CameraError::capture_failed("could not switch torch", fault))
    }

    /// The rotation the hosting UI should currently apply to overlays
    pub fn ui_rotation(&self) -> u16 {
        self.rotation.ui_rotation()
    }

    /// The retained average-FPS samples, oldest-first
    pub fn fps_history(&self) -> &FpsSampleHistory {
        &self.fps_history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("has_device", &self.device.is_some())
            .field("view_ready", &self.view_ready)
            .field("recording", &self.recorder.state())
            .field("processor", &self.attached_processor)
            .finish()
    }
}
