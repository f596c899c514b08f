// SPDX-License-Identifier: GPL-3.0-only

//! Capture device abstraction
//!
//! The session core never talks to camera hardware, the file system or any
//! network service itself. Everything side-effecting goes through the
//! [`CaptureDevice`] trait, and everything the device observes comes back as
//! a [`NativeEvent`] stream plus a frame stream handled by the session.

use crate::errors::{CameraError, DeviceFault};
use crate::orientation::Orientation;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Flash behaviour for a single capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flash {
    /// Flash stays off
    #[default]
    Off,
    /// Flash fires for the capture; for video this enables the torch for
    /// the whole recording
    On,
}

/// Continuous torch state requested by the hosting UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TorchMode {
    #[default]
    Off,
    On,
}

/// A point in the camera view's coordinate system
///
/// `(0, 0)` is top left; `(view width, view height)` is bottom right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Options for a single photo capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoOptions {
    pub flash: Flash,
    /// Play the platform shutter sound on capture
    pub enable_shutter_sound: bool,
}

impl Default for PhotoOptions {
    fn default() -> Self {
        Self {
            flash: Flash::Off,
            enable_shutter_sound: true,
        }
    }
}

/// Options for a preview snapshot (a grab of the current preview frame,
/// cheaper than a full photo capture)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotOptions {
    /// JPEG quality, 0-100
    pub quality: u8,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self { quality: 100 }
    }
}

/// Container format for recorded video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoFileType {
    #[default]
    Mp4,
    Mov,
}

impl VideoFileType {
    pub fn extension(&self) -> &'static str {
        match self {
            VideoFileType::Mp4 => "mp4",
            VideoFileType::Mov => "mov",
        }
    }
}

/// Relative bit-rate selector for video recording
///
/// Scales whatever absolute bit rate the device considers normal for the
/// active format, so callers can trade quality against file size without
/// knowing resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BitRate {
    ExtraLow,
    Low,
    #[default]
    Normal,
    High,
    ExtraHigh,
}

impl BitRate {
    /// Multiplier applied to the device's default bit rate
    pub fn multiplier(&self) -> f64 {
        match self {
            BitRate::ExtraLow => 0.6,
            BitRate::Low => 0.8,
            BitRate::Normal => 1.0,
            BitRate::High => 1.2,
            BitRate::ExtraHigh => 1.4,
        }
    }
}

/// Options for starting a video recording
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordVideoOptions {
    pub flash: Flash,
    pub file_type: VideoFileType,
    pub bit_rate: BitRate,
}

/// A captured photo, written by the device to a temporary file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Whether the image is mirrored (front cameras)
    pub is_mirrored: bool,
}

/// A finished video recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub duration: Duration,
    pub width: u32,
    pub height: u32,
}

/// What triggered a shutter event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShutterKind {
    Photo,
    Snapshot,
}

/// Kind of machine-readable code detected in the frame stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeKind {
    Qr,
    Ean13,
    Code128,
    DataMatrix,
    Unknown,
}

/// Bounding box of a detected code, in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One code detected by the device's code scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedCode {
    pub kind: CodeKind,
    /// Decoded payload; absent when the code was located but not decodable
    pub value: Option<String>,
    pub bounds: Option<CodeBounds>,
}

/// Metadata of the frame a code scan originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFrame {
    pub width: u32,
    pub height: u32,
}

/// Events emitted by the native capture device
///
/// The session consumes these in emission order and forwards them to the
/// hosting UI's registered handlers.
#[derive(Debug, Clone)]
pub enum NativeEvent {
    /// The device finished configuring itself
    Initialized,
    /// The capture session started streaming
    Started,
    /// The capture session stopped streaming
    Stopped,
    /// The preview stream became visible
    PreviewStarted,
    /// The preview stream went away
    PreviewStopped,
    /// A photo or snapshot capture fired
    Shutter(ShutterKind),
    /// A device error with no direct caller (e.g. fault during idle preview)
    Error(DeviceFault),
    /// The orientation of the encoded output changed
    OutputOrientationChanged(Orientation),
    /// The orientation of the preview stream changed
    PreviewOrientationChanged(Orientation),
    /// A new rolling average of the device frame rate
    AverageFpsChanged(f64),
    /// The device's code scanner found codes in a frame
    CodeScanned {
        codes: Vec<ScannedCode>,
        frame: CodeFrame,
    },
}

/// Completion callback for a video recording
///
/// The device invokes it exactly once per recording: with the finished
/// [`VideoFile`] on success, or with an error - [`CameraError::RecordingCanceled`]
/// when the recording was canceled, so callers can tell cancellation apart
/// from a genuine fault.
pub type RecordingCompletion = Box<dyn FnOnce(Result<VideoFile, CameraError>) + Send>;

/// The native capture device the session drives
///
/// Every method may fail with a device-reported [`DeviceFault`] on
/// hardware or permission problems; the session normalizes those into
/// [`CameraError`] at its boundary.
pub trait CaptureDevice: Send + Sync {
    /// Take a single photo and write it to a temporary file
    fn take_photo(&self, options: &PhotoOptions) -> Result<Photo, DeviceFault>;

    /// Grab the current preview frame as an image
    fn take_snapshot(&self, options: &SnapshotOptions) -> Result<Photo, DeviceFault>;

    /// Start a video recording
    ///
    /// The device holds on to `completion` and invokes it exactly once when
    /// the recording terminates: after [`CaptureDevice::stop_video_recording`],
    /// after [`CaptureDevice::cancel_video_recording`], or on a device fault
    /// mid-recording.
    fn start_video_recording(
        &self,
        options: &RecordVideoOptions,
        completion: RecordingCompletion,
    ) -> Result<(), DeviceFault>;

    /// Pause the active recording
    fn pause_video_recording(&self) -> Result<(), DeviceFault>;

    /// Resume a paused recording
    fn resume_video_recording(&self) -> Result<(), DeviceFault>;

    /// Stop the active recording and finalize the file
    fn stop_video_recording(&self) -> Result<(), DeviceFault>;

    /// Abort the active recording, deleting the file
    ///
    /// The pending completion callback reports
    /// [`CameraError::RecordingCanceled`].
    fn cancel_video_recording(&self) -> Result<(), DeviceFault>;

    /// Focus the camera on a point in view coordinates
    fn focus(&self, point: Point) -> Result<(), DeviceFault>;

    /// Switch the continuous torch light on or off
    fn set_torch(&self, enabled: bool) -> Result<(), DeviceFault>;
}
