// SPDX-License-Identifier: GPL-3.0-only

//! Reference-counted camera frame handles
//!
//! A [`Frame`] is a handle to one captured image buffer, owned jointly by the
//! synchronous render path and any outstanding asynchronous consumer. The
//! buffer is returned to the capture device exactly once, on the reference
//! count's 1 → 0 transition.

use crate::errors::{CameraError, CameraResult};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;
use tracing::trace;

/// Pixel format of a captured frame
///
/// The session core never touches pixel data itself; the format travels with
/// the buffer so frame-processing units know how to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    Rgba,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    Nv12,
    /// I420 - Planar 4:2:0 (separate Y, U, V planes)
    I420,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    Yuyv,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Average bytes per pixel (accounting for chroma subsampling)
    pub fn bytes_per_pixel(&self) -> f32 {
        match self {
            Self::Rgba => 4.0,
            Self::Nv12 | Self::I420 => 1.5,
            Self::Yuyv => 2.0,
            Self::Gray8 => 1.0,
        }
    }
}

/// One captured image buffer as handed out by the capture device
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Device-assigned buffer identifier
    pub id: u64,
    /// Pixel data (shared, never copied by the core)
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

/// Port through which buffers are returned to the capture device
///
/// The device (or its buffer pool) implements this so it can reuse or
/// dispose the buffer once the last frame reference is gone.
pub trait BufferReclaim: Send + Sync {
    /// Take the buffer back for reuse or disposal
    fn reclaim(&self, buffer: FrameBuffer);
}

struct FrameShared {
    buffer: FrameBuffer,
    /// Outstanding references; the buffer is reclaimed on the 1 → 0 transition
    ref_count: AtomicU32,
    /// Set exactly once, when the count reaches zero
    released: AtomicBool,
    reclaim: Arc<dyn BufferReclaim>,
}

/// Reference-counted handle to one captured frame
///
/// Cloning the handle is cheap and does NOT change the reference count;
/// consumers that outlive the current call must pair [`Frame::acquire`] with
/// exactly one later [`Frame::release`]. The synchronous per-frame consumer
/// never calls either - it runs under the implicit reference the frame is
/// created with, which the session releases after the call returns.
#[derive(Clone)]
pub struct Frame {
    shared: Arc<FrameShared>,
}

impl Frame {
    /// Wrap a device buffer in a new frame handle
    ///
    /// The frame starts with a reference count of one: the implicit
    /// reference held for the duration of the synchronous processing call.
    pub fn new(buffer: FrameBuffer, reclaim: Arc<dyn BufferReclaim>) -> Self {
        Self {
            shared: Arc::new(FrameShared {
                buffer,
                ref_count: AtomicU32::new(1),
                released: AtomicBool::new(false),
                reclaim,
            }),
        }
    }

    /// The underlying buffer
    pub fn buffer(&self) -> &FrameBuffer {
        &self.shared.buffer
    }

    pub fn width(&self) -> u32 {
        self.shared.buffer.width
    }

    pub fn height(&self) -> u32 {
        self.shared.buffer.height
    }

    /// Current reference count (diagnostic; racy by nature)
    pub fn ref_count(&self) -> u32 {
        self.shared.ref_count.load(Ordering::SeqCst)
    }

    /// Whether the buffer has been returned to the device
    pub fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::SeqCst)
    }

    /// Take an additional reference on the frame
    ///
    /// Must be paired with exactly one later [`Frame::release`]. Fails with
    /// [`CameraError::InvalidFrameState`] if the buffer has already been
    /// returned to the device - the count never resurrects from zero, even
    /// when an acquire races a concurrent release.
    pub fn acquire(&self) -> CameraResult<()> {
        let mut current = self.shared.ref_count.load(Ordering::SeqCst);
        loop {
            if current == 0 {
                return Err(CameraError::InvalidFrameState(format!(
                    "acquire on released frame (buffer {})",
                    self.shared.buffer.id
                )));
            }
            match self.shared.ref_count.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    trace!(
                        buffer = self.shared.buffer.id,
                        refs = current + 1,
                        "Frame reference acquired"
                    );
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Drop one reference on the frame
    ///
    /// On the 1 → 0 transition the buffer is handed back to the device's
    /// reclaim port, exactly once. Releasing a frame whose count is already
    /// zero fails with [`CameraError::InvalidFrameState`].
    pub fn release(&self) -> CameraResult<()> {
        let mut current = self.shared.ref_count.load(Ordering::SeqCst);
        loop {
            if current == 0 {
                return Err(CameraError::InvalidFrameState(format!(
                    "release on released frame (buffer {})",
                    self.shared.buffer.id
                )));
            }
            match self.shared.ref_count.compare_exchange(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    if current == 1 {
                        // Only one thread can win the 1 -> 0 exchange, so the
                        // reclaim below runs exactly once per frame.
                        self.shared.released.store(true, Ordering::SeqCst);
                        trace!(
                            buffer = self.shared.buffer.id,
                            "Last frame reference dropped; reclaiming buffer"
                        );
                        self.shared.reclaim.reclaim(self.shared.buffer.clone());
                    } else {
                        trace!(
                            buffer = self.shared.buffer.id,
                            refs = current - 1,
                            "Frame reference released"
                        );
                    }
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("buffer", &self.shared.buffer.id)
            .field("width", &self.shared.buffer.width)
            .field("height", &self.shared.buffer.height)
            .field("refs", &self.ref_count())
            .field("released", &self.is_released())
            .finish()
    }
}
