//! Math types for IrisPulse

pub use glam::{Quat, Vec2, Vec3};

/// A position and orientation in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * (-Vec3::Z)
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.position.distance(other.position)
    }

    pub fn look_at(&mut self, target: Vec3, _up: Option<Vec3>) {
        let forward = (target - self.position).normalize();
        self.rotation = Quat::from_rotation_arc(Vec3::Z, -forward);
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Position, orientation and scale of an entity in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn from_pose(pose: Pose) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation,
            scale: Vec3::ONE,
        }
    }

    /// The position/orientation part of this transform, dropping scale.
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_pose_basis() {
        let pose = Pose::identity();
        assert_eq!(pose.forward(), -Vec3::Z);
        assert_eq!(pose.up(), Vec3::Y);
        assert_eq!(pose.right(), Vec3::X);
    }

    #[test]
    fn look_at_faces_target() {
        let mut pose = Pose::from_position(Vec3::new(0.0, 0.0, 5.0));
        pose.look_at(Vec3::ZERO, None);
        let forward = pose.forward();
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(forward.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn transform_pose_drops_scale() {
        let transform = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::IDENTITY,
            Vec3::splat(2.0),
        );
        let pose = transform.pose();
        assert_eq!(pose.position, Vec3::new(1.0, 2.0, 3.0));
    }
}
