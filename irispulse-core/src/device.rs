//! VR device boundary
//!
//! Platform VR runtime bindings implement [`PoseDevice`] to feed raw tracking
//! state into the engine. The engine never talks to device globals directly;
//! everything flows through this polling interface.

use crate::error::Result;
use crate::math::{Pose, Vec2};

/// Raw controller sample as read from the platform runtime.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawControllerData {
    pub pose: Pose,
    pub primary_button: bool,
    pub secondary_button: bool,
    /// Trigger pull, nominally 0..1 but unclamped at this layer
    pub trigger: f32,
    /// Grip squeeze, nominally 0..1 but unclamped at this layer
    pub grip: f32,
    /// Thumbstick deflection, nominally -1..1 per axis
    pub thumbstick: Vec2,
}

/// One raw tracking sample: head pose plus both controllers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawPoseData {
    pub head: Pose,
    pub controllers: [RawControllerData; 2],
}

/// Index into the controller pair of a [`RawPoseData`] sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left = 0,
    Right = 1,
}

/// Polling interface supplied by platform VR runtime bindings.
///
/// `poll` may block, bounded by the configured poll timeout, after which the
/// implementation must return `IrisPulseError::DeviceUnavailable` rather than
/// stalling the frame loop.
pub trait PoseDevice: Send {
    /// Read the current tracking state of the headset and controllers.
    fn poll(&mut self) -> Result<RawPoseData>;
}
