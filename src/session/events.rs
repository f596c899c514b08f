// SPDX-License-Identifier: GPL-3.0-only

//! Outward notification ports
//!
//! The hosting UI registers handlers by capability at session construction;
//! unregistered notifications are trace-logged no-ops, except errors, which
//! must always be observable and fall back to an error log.

use crate::errors::CameraError;
use crate::orientation::Orientation;
use crate::device::ShutterKind;
use std::sync::Arc;
use tracing::{error, trace};

/// Handler for session errors
pub type ErrorHandler = Box<dyn Fn(&CameraError) + Send + Sync>;
/// Handler for parameterless lifecycle notifications
pub type LifecycleHandler = Box<dyn Fn() + Send + Sync>;
/// Handler for shutter notifications
pub type ShutterHandler = Box<dyn Fn(ShutterKind) + Send + Sync>;
/// Handler for UI-rotation changes (degrees clockwise)
pub type RotationHandler = Box<dyn Fn(u16) + Send + Sync>;
/// Handler for raw orientation changes
pub type OrientationHandler = Box<dyn Fn(Orientation) + Send + Sync>;

/// The notification surface the hosting UI can subscribe to
///
/// Every field is optional; construct with struct-update syntax over
/// [`Default`] and register only the capabilities the UI cares about.
#[derive(Default)]
pub struct EventHandlers {
    pub on_error: Option<ErrorHandler>,
    pub on_initialized: Option<LifecycleHandler>,
    pub on_started: Option<LifecycleHandler>,
    pub on_stopped: Option<LifecycleHandler>,
    pub on_preview_started: Option<LifecycleHandler>,
    pub on_preview_stopped: Option<LifecycleHandler>,
    pub on_shutter: Option<ShutterHandler>,
    pub on_ui_rotation_changed: Option<RotationHandler>,
    pub on_output_orientation_changed: Option<OrientationHandler>,
    pub on_preview_orientation_changed: Option<OrientationHandler>,
}

/// Shared dispatcher over the registered handlers
///
/// Cloneable and thread-safe so the recording completion path and the
/// offload worker can surface errors through the same channel as the
/// synchronous path.
#[derive(Clone)]
pub(crate) struct EventDispatcher {
    handlers: Arc<EventHandlers>,
}

impl EventDispatcher {
    pub fn new(handlers: EventHandlers) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    /// Deliver an error; never dropped silently
    pub fn error(&self, error: &CameraError) {
        match &self.handlers.on_error {
            Some(handler) => handler(error),
            None => error!(error = %error, "Camera session error (no error handler registered)"),
        }
    }

    pub fn initialized(&self) {
        Self::forward("initialized", &self.handlers.on_initialized);
    }

    pub fn started(&self) {
        Self::forward("started", &self.handlers.on_started);
    }

    pub fn stopped(&self) {
        Self::forward("stopped", &self.handlers.on_stopped);
    }

    pub fn preview_started(&self) {
        Self::forward("preview-started", &self.handlers.on_preview_started);
    }

    pub fn preview_stopped(&self) {
        Self::forward("preview-stopped", &self.handlers.on_preview_stopped);
    }

    pub fn shutter(&self, kind: ShutterKind) {
        match &self.handlers.on_shutter {
            Some(handler) => handler(kind),
            None => trace!(kind = ?kind, "No handler registered for shutter event"),
        }
    }

    pub fn ui_rotation_changed(&self, rotation: u16) {
        match &self.handlers.on_ui_rotation_changed {
            Some(handler) => handler(rotation),
            None => trace!(rotation, "No handler registered for UI rotation change"),
        }
    }

    pub fn output_orientation_changed(&self, orientation: Orientation) {
        match &self.handlers.on_output_orientation_changed {
            Some(handler) => handler(orientation),
            None => trace!(%orientation, "No handler registered for output orientation change"),
        }
    }

    pub fn preview_orientation_changed(&self, orientation: Orientation) {
        match &self.handlers.on_preview_orientation_changed {
            Some(handler) => handler(orientation),
            None => trace!(%orientation, "No handler registered for preview orientation change"),
        }
    }

    fn forward(name: &'static str, handler: &Option<LifecycleHandler>) {
        match handler {
            Some(handler) => handler(),
            None => trace!(event = name, "No handler registered for camera event"),
        }
    }
}
