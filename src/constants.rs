// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

/// Maximum number of average-FPS samples kept in the session history
///
/// Matches the number of bars the hosting UI can display; older samples
/// are evicted oldest-first once the history is full.
pub const MAX_FPS_SAMPLES: usize = 30;

/// Offload worker constants
pub mod offload {
    /// Thread name for the background offload worker
    pub const WORKER_THREAD_NAME: &str = "camera-offload";
}
