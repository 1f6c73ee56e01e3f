//! Pose sampling and zero-velocity hold
//!
//! The sampler polls the VR device once per frame and normalizes the result
//! into an immutable [`PoseSnapshot`]. The snapshot is cached for the rest of
//! the frame so the simulation step and the audio mixer see identical
//! tracking state. When the device is unavailable the last successful sample
//! is held with zero velocity; the frame proceeds instead of aborting.

use crate::device::{PoseDevice, RawControllerData, RawPoseData};
use crate::error::IrisPulseError;
use crate::math::{Pose, Vec2};
use std::time::Duration;

/// Normalized controller state carried in a [`PoseSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerState {
    pub pose: Pose,
    pub primary_button: bool,
    pub secondary_button: bool,
    /// Trigger pull clamped to 0..1
    pub trigger: f32,
    /// Grip squeeze clamped to 0..1
    pub grip: f32,
    /// Thumbstick deflection clamped to -1..1 per axis
    pub thumbstick: Vec2,
}

impl ControllerState {
    fn from_raw(raw: RawControllerData) -> Self {
        Self {
            pose: raw.pose,
            primary_button: raw.primary_button,
            secondary_button: raw.secondary_button,
            trigger: raw.trigger.clamp(0.0, 1.0),
            grip: raw.grip.clamp(0.0, 1.0),
            thumbstick: raw.thumbstick.clamp(Vec2::splat(-1.0), Vec2::splat(1.0)),
        }
    }
}

/// Immutable tracking snapshot; the authoritative input to one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSnapshot {
    /// Simulated time at which the snapshot was captured
    pub timestamp: Duration,
    /// Frame the snapshot belongs to
    pub frame: u64,
    pub head: Pose,
    pub controllers: [ControllerState; 2],
    /// False when the device was unavailable and the pose is a held copy of
    /// the last successful sample
    pub tracked: bool,
}

/// Samples the VR device once per frame.
pub struct PoseSampler {
    device: Box<dyn PoseDevice>,
    cached: Option<PoseSnapshot>,
    held: RawPoseData,
}

impl PoseSampler {
    pub fn new(device: Box<dyn PoseDevice>) -> Self {
        Self {
            device,
            cached: None,
            held: RawPoseData::default(),
        }
    }

    /// Capture the snapshot for `frame`. Repeated calls within the same frame
    /// return the cached snapshot without touching the device again, so every
    /// consumer of the frame observes identical tracking state.
    pub fn sample(&mut self, frame: u64, timestamp: Duration) -> PoseSnapshot {
        if let Some(cached) = self.cached {
            if cached.frame == frame {
                return cached;
            }
        }

        let (raw, tracked) = match self.device.poll() {
            Ok(raw) => {
                self.held = raw;
                (raw, true)
            }
            Err(IrisPulseError::DeviceUnavailable) => (self.held, false),
            Err(err) => {
                log::error!("device poll failed: {}", err);
                (self.held, false)
            }
        };

        let snapshot = PoseSnapshot {
            timestamp,
            frame,
            head: raw.head,
            controllers: [
                ControllerState::from_raw(raw.controllers[0]),
                ControllerState::from_raw(raw.controllers[1]),
            ],
            tracked,
        };
        self.cached = Some(snapshot);
        snapshot
    }

    /// The raw pose that would be substituted on the next device failure.
    pub fn held_pose(&self) -> &RawPoseData {
        &self.held
    }
}
