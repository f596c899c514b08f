// SPDX-License-Identifier: GPL-3.0-only

//! Frame-processing units and the session's processor slot
//!
//! A frame-processing unit runs synchronously against every captured frame.
//! Heavy work belongs in an offloaded unit scheduled through the
//! [`OffloadScheduler`](crate::offload::OffloadScheduler) instead.

use crate::errors::CameraResult;
use crate::frame::Frame;
use std::fmt;
use std::sync::Arc;

/// A unit of per-frame work
///
/// `process` is called on the synchronous capture path under the frame's
/// implicit reference; implementations must not call
/// [`Frame::release`](crate::frame::Frame::release) on it. To keep the frame
/// beyond the call, schedule work through the offload scheduler, which
/// manages its own reference.
pub trait FrameProcessor: Send + Sync {
    fn process(&self, frame: &Frame) -> CameraResult<()>;
}

/// The configured frame-processing unit, tagged by kind
///
/// The session compares the configured slot against the currently attached
/// one by identity (variant plus pointer) to decide when to detach and
/// re-attach, instead of scattering ad hoc identity checks.
#[derive(Clone, Default)]
pub enum ProcessorSlot {
    /// No processing unit configured
    #[default]
    None,
    /// A plain analysis unit
    Function(Arc<dyn FrameProcessor>),
    /// A unit that also draws onto the preview canvas
    Drawable(Arc<dyn FrameProcessor>),
}

impl ProcessorSlot {
    pub fn is_none(&self) -> bool {
        matches!(self, ProcessorSlot::None)
    }

    /// The processing unit, regardless of kind
    pub fn processor(&self) -> Option<&Arc<dyn FrameProcessor>> {
        match self {
            ProcessorSlot::None => None,
            ProcessorSlot::Function(p) | ProcessorSlot::Drawable(p) => Some(p),
        }
    }

    /// Whether two slots hold the very same unit
    ///
    /// Same variant and same allocation; a unit moved between the function
    /// and drawable kinds counts as a different unit.
    pub fn same_identity(&self, other: &ProcessorSlot) -> bool {
        match (self, other) {
            (ProcessorSlot::None, ProcessorSlot::None) => true,
            (ProcessorSlot::Function(a), ProcessorSlot::Function(b))
            | (ProcessorSlot::Drawable(a), ProcessorSlot::Drawable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Short kind label for logging
    pub fn kind_name(&self) -> &'static str {
        match self {
            ProcessorSlot::None => "none",
            ProcessorSlot::Function(_) => "function",
            ProcessorSlot::Drawable(_) => "drawable",
        }
    }
}

impl fmt::Debug for ProcessorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessorSlot::{}", self.kind_name())
    }
}
