// SPDX-License-Identifier: GPL-3.0-only

//! Session configuration

use crate::device::TorchMode;
use serde::{Deserialize, Serialize};

/// Configuration the hosting UI applies to a camera session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Torch state requested by the user; overridden to on while a
    /// recording with flash is active
    pub torch: TorchMode,
    /// Collect average-FPS samples for the frame-rate display
    pub enable_fps_history: bool,
    /// Upper frame-rate bound, used only for display derivation
    pub max_fps: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            torch: TorchMode::Off,
            enable_fps_history: false,
            max_fps: None,
        }
    }
}
