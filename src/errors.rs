// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera session core

use crate::recording::RecordingState;
use std::fmt;

/// Result type alias using CameraError
pub type CameraResult<T> = Result<T, CameraError>;

/// Main error type for session-level operations
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No capture device has been resolved for the session
    DeviceUnavailable,
    /// Missing required callbacks or malformed options
    InvalidParameter(String),
    /// Frame reference-count misuse (acquire/release on a released frame)
    InvalidFrameState(String),
    /// Capture call issued before the native view exists
    NativeViewNotReady,
    /// Device-reported capture fault, with the native cause preserved
    CaptureFailed(CaptureFailure),
    /// The recording was canceled by the caller
    RecordingCanceled,
    /// Recording lifecycle call issued in the wrong state
    InvalidRecordingState {
        /// The operation that was attempted (e.g. "pause recording")
        operation: &'static str,
        /// The state the recorder was in at the time
        state: RecordingState,
    },
}

/// A capture fault normalized at the session boundary
///
/// Wraps the human-readable message together with the underlying
/// device-reported fault (if any), so callers can walk the cause chain
/// via [`std::error::Error::source`].
#[derive(Debug, Clone)]
pub struct CaptureFailure {
    /// What failed, from the session's perspective
    pub message: String,
    /// The device-reported fault that caused it
    pub cause: Option<DeviceFault>,
}

/// An error reported by the capture device itself
///
/// Devices report a stable machine-readable code (e.g. "capture/no-data")
/// alongside a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFault {
    /// Device-reported error code
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl DeviceFault {
    /// Create a new device fault
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl CameraError {
    /// Wrap a device fault as a capture failure, preserving the cause
    pub fn capture_failed(message: impl Into<String>, cause: DeviceFault) -> Self {
        CameraError::CaptureFailed(CaptureFailure {
            message: message.into(),
            cause: Some(cause),
        })
    }

    /// The device-reported fault underlying this error, if any
    pub fn device_fault(&self) -> Option<&DeviceFault> {
        match self {
            CameraError::CaptureFailed(failure) => failure.cause.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DeviceUnavailable => write!(f, "No capture device available"),
            CameraError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            CameraError::InvalidFrameState(msg) => write!(f, "Invalid frame state: {}", msg),
            CameraError::NativeViewNotReady => write!(f, "The native camera view is not ready"),
            CameraError::CaptureFailed(failure) => write!(f, "Capture failed: {}", failure),
            CameraError::RecordingCanceled => write!(f, "The recording was canceled"),
            CameraError::InvalidRecordingState { operation, state } => {
                write!(f, "Cannot {} while the recorder is {}", operation, state)
            }
        }
    }
}

impl fmt::Display for CaptureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(fault) => write!(f, "{} ({})", self.message, fault),
            None => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CameraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CameraError::CaptureFailed(failure) => failure
                .cause
                .as_ref()
                .map(|fault| fault as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl std::error::Error for DeviceFault {}

impl From<DeviceFault> for CameraError {
    fn from(fault: DeviceFault) -> Self {
        CameraError::CaptureFailed(CaptureFailure {
            message: fault.message.clone(),
            cause: Some(fault),
        })
    }
}
