// SPDX-License-Identifier: GPL-3.0-only

//! Orientation types and UI-rotation tracking
//!
//! The capture device reports two orientations: the orientation of the
//! encoded output stream and the orientation of the live preview stream.
//! The tracker derives from them the single rotation the hosting UI should
//! apply to overlay content, and suppresses redundant notifications so the
//! UI does not relayout on every preview frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical orientation, device-relative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Device upright
    #[default]
    Portrait,
    /// Device rotated 90° clockwise
    LandscapeLeft,
    /// Device upside down
    PortraitUpsideDown,
    /// Device rotated 270° clockwise
    LandscapeRight,
}

impl Orientation {
    /// Rotation in degrees (clockwise) relative to portrait
    pub fn rotation_degrees(&self) -> u16 {
        match self {
            Orientation::Portrait => 0,
            Orientation::LandscapeLeft => 90,
            Orientation::PortraitUpsideDown => 180,
            Orientation::LandscapeRight => 270,
        }
    }

    /// Create an orientation from an integer degree value (normalised to 0-360)
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Orientation::LandscapeLeft,
            180 => Orientation::PortraitUpsideDown,
            270 => Orientation::LandscapeRight,
            _ => Orientation::Portrait,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::LandscapeLeft => write!(f, "landscape-left"),
            Orientation::PortraitUpsideDown => write!(f, "portrait-upside-down"),
            Orientation::LandscapeRight => write!(f, "landscape-right"),
        }
    }
}

/// Derives the UI rotation from output and preview orientation
///
/// Both orientations are unset at session start and treated as portrait
/// until the device reports them. Emission is edge-triggered: a setter
/// returns the recomputed rotation only when it differs from the last value
/// it returned, so feeding the identical orientation pair twice yields
/// exactly one notification.
#[derive(Debug, Default)]
pub struct RotationTracker {
    output_orientation: Option<Orientation>,
    preview_orientation: Option<Orientation>,
    last_emitted: Option<u16>,
}

impl RotationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The orientation of the encoded output, if reported yet
    pub fn output_orientation(&self) -> Option<Orientation> {
        self.output_orientation
    }

    /// The orientation of the live preview stream, if reported yet
    pub fn preview_orientation(&self) -> Option<Orientation> {
        self.preview_orientation
    }

    /// The rotation (degrees clockwise) the hosting UI should apply
    pub fn ui_rotation(&self) -> u16 {
        let output = self.output_orientation.unwrap_or_default().rotation_degrees() as i32;
        let preview = self.preview_orientation.unwrap_or_default().rotation_degrees() as i32;
        (output - preview).rem_euclid(360) as u16
    }

    /// Record a new output orientation
    ///
    /// Returns the new UI rotation if it changed since the last emission.
    pub fn set_output_orientation(&mut self, orientation: Orientation) -> Option<u16> {
        self.output_orientation = Some(orientation);
        self.maybe_emit()
    }

    /// Record a new preview orientation
    ///
    /// Returns the new UI rotation if it changed since the last emission.
    pub fn set_preview_orientation(&mut self, orientation: Orientation) -> Option<u16> {
        self.preview_orientation = Some(orientation);
        self.maybe_emit()
    }

    fn maybe_emit(&mut self) -> Option<u16> {
        let rotation = self.ui_rotation();
        if self.last_emitted == Some(rotation) {
            return None;
        }
        self.last_emitted = Some(rotation);
        Some(rotation)
    }
}
