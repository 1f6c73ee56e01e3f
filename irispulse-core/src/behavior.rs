//! Entity behaviors
//!
//! A behavior maps an entity's committed transform to the next one, once per
//! simulation step. Behaviors must be deterministic in their inputs: the same
//! transform and context sequence has to reproduce the same output sequence,
//! so recorded sessions replay bit-identically.

use crate::math::{Pose, Quat, Transform, Vec3};
use thiserror::Error;

/// Error raised by a behavior update. The owning entity is frozen and the
/// step continues with the remaining entities.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct BehaviorError(pub String);

/// Per-step context passed to every behavior update.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorCtx<'a> {
    /// Simulated seconds covered by this step (not wall clock)
    pub dt: f32,
    /// Total simulated seconds since the loop started
    pub elapsed: f32,
    /// Frame the step belongs to
    pub frame: u64,
    /// Head pose captured for this frame
    pub head: &'a Pose,
}

/// Behavior applied to an entity each simulation step.
pub trait Behavior: Send {
    /// Produce the entity's next transform from the committed one. Returning
    /// an error freezes the entity; it does not stop the step.
    fn update(
        &mut self,
        current: Transform,
        ctx: &BehaviorCtx<'_>,
    ) -> Result<Transform, BehaviorError>;
}

/// Rotates the entity around a fixed axis at a constant angular rate.
#[derive(Debug, Clone)]
pub struct Spin {
    pub axis: Vec3,
    /// Radians per simulated second
    pub rate: f32,
}

impl Behavior for Spin {
    fn update(
        &mut self,
        current: Transform,
        ctx: &BehaviorCtx<'_>,
    ) -> Result<Transform, BehaviorError> {
        let axis = self.axis.try_normalize().ok_or_else(|| {
            BehaviorError(format!("spin axis is degenerate: {:?}", self.axis))
        })?;
        let step = Quat::from_axis_angle(axis, self.rate * ctx.dt);
        Ok(Transform {
            rotation: (step * current.rotation).normalize(),
            ..current
        })
    }
}

/// Circles the entity around a center point in the horizontal plane.
///
/// The position is a closed-form function of elapsed simulated time, so the
/// orbit does not accumulate floating-point drift across steps.
#[derive(Debug, Clone)]
pub struct Orbit {
    pub center: Vec3,
    pub radius: f32,
    /// Radians per simulated second
    pub angular_rate: f32,
    /// Angle offset at elapsed time zero
    pub phase: f32,
}

impl Behavior for Orbit {
    fn update(
        &mut self,
        current: Transform,
        ctx: &BehaviorCtx<'_>,
    ) -> Result<Transform, BehaviorError> {
        let angle = self.phase + self.angular_rate * ctx.elapsed;
        let position = self.center
            + Vec3::new(angle.cos() * self.radius, 0.0, angle.sin() * self.radius);
        Ok(Transform { position, ..current })
    }
}

/// Keeps the entity at a fixed offset in the head's local frame, for
/// HUD-style anchors that travel with the wearer.
#[derive(Debug, Clone)]
pub struct HeadFollow {
    /// Offset in head-local coordinates
    pub offset: Vec3,
}

impl Behavior for HeadFollow {
    fn update(
        &mut self,
        current: Transform,
        ctx: &BehaviorCtx<'_>,
    ) -> Result<Transform, BehaviorError> {
        Ok(Transform {
            position: ctx.head.position + ctx.head.rotation * self.offset,
            rotation: ctx.head.rotation,
            ..current
        })
    }
}
