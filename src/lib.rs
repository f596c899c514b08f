// SPDX-License-Identifier: GPL-3.0-only

//! Camera session runtime core
//!
//! This library mediates between a UI-facing camera component and an
//! underlying native capture device. It owns the parts with real
//! invariants - frame lifetime, single-flight offloading, rotation
//! derivation, the recording lifecycle - and treats everything
//! side-effecting (hardware, files, permissions) as external collaborators
//! behind the [`CaptureDevice`] port.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: The facade composing the runtime; hosts drive it with
//!   native events and frames
//! - [`frame`]: Reference-counted frame handles and buffer reclaim
//! - [`offload`]: Single-flight scheduling of background frame work
//! - [`orientation`]: Orientation state and UI-rotation derivation
//! - [`recording`]: The video recording state machine and torch override
//! - [`device`]: The capture device port and native event stream
//! - [`processor`]: Frame-processing unit traits and the processor slot
//! - [`fps`]: Bounded average-FPS sample history
//! - [`config`]: Session configuration
//! - [`errors`]: The error taxonomy
//!
//! # Example
//!
//! ```ignore
//! let mut session = CameraSession::new(Some(device), handlers, SessionConfig::default());
//! session.notify_view_ready();
//! let photo = session.take_photo(&PhotoOptions::default())?;
//! ```

pub mod config;
pub mod constants;
pub mod device;
pub mod errors;
pub mod fps;
pub mod frame;
pub mod offload;
pub mod orientation;
pub mod processor;
pub mod recording;
pub mod session;

// Re-export commonly used types
pub use config::SessionConfig;
pub use device::{
    CaptureDevice, Flash, NativeEvent, Photo, PhotoOptions, Point, RecordVideoOptions,
    SnapshotOptions, TorchMode, VideoFile,
};
pub use errors::{CameraError, CameraResult, DeviceFault};
pub use fps::FpsSampleHistory;
pub use frame::{BufferReclaim, Frame, FrameBuffer, PixelFormat};
pub use offload::{OffloadDisposition, OffloadScheduler};
pub use orientation::{Orientation, RotationTracker};
pub use processor::{FrameProcessor, ProcessorSlot};
pub use recording::{RecordingCallbacks, RecordingState, VideoRecorder};
pub use session::{CameraSession, EventHandlers};
