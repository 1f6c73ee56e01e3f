//! Entity and scene store
//!
//! `IrisPulseWorld` exclusively owns every entity; the rest of the engine
//! refers to them through [`EntityId`] handles. Transform writes are staged
//! and only become visible when the simulation step commits, so readers
//! within a step always observe the state the previous completed step left
//! behind.

use crate::behavior::Behavior;
use crate::config::EmitterConfig;
use crate::error::{IrisPulseError, Result};
use crate::math::{Pose, Transform, Vec3};
use std::collections::HashMap;

/// Lightweight, type-safe handle for entities.
///
/// Returned when spawning an entity into the world. Handles stay unique for
/// the lifetime of the world; a despawned entity's handle is never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

pub(crate) struct Entity {
    /// Transform committed by the last completed step; what readers see
    pub(crate) committed: Transform,
    /// Write staged during the current step, applied on commit
    pub(crate) staged: Option<Transform>,
    pub(crate) behaviors: Vec<Box<dyn Behavior>>,
    pub(crate) emitter: EmitterConfig,
    /// Set when a behavior failed; the transform is frozen from then on
    pub(crate) inert: bool,
}

/// Derived from the head pose each frame; consumed read-only by the mixer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerState {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

impl ListenerState {
    pub fn from_pose(pose: Pose) -> Self {
        Self {
            position: pose.position,
            forward: pose.forward(),
            up: pose.up(),
            right: pose.right(),
        }
    }
}

impl Default for ListenerState {
    fn default() -> Self {
        Self::from_pose(Pose::identity())
    }
}

/// One audible entity captured at the Stepping→Mixing barrier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    pub entity: EntityId,
    pub position: Vec3,
    pub gain: f32,
    pub ref_distance: f32,
    pub tone_hz: f32,
}

/// Immutable capture of all audible entities, taken after the step commits.
/// The mixer works from this copy and never touches the live store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmitterSnapshot {
    pub emitters: Vec<Emitter>,
}

impl EmitterSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Committed scene state handed to the renderer each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableSceneSnapshot {
    pub frame: u64,
    pub listener: ListenerState,
    /// Live entities and their committed transforms, in creation order
    pub entities: Vec<(EntityId, Transform)>,
}

/// Main world object owning all entities and the listener.
pub struct IrisPulseWorld {
    entities: HashMap<EntityId, Entity>,
    /// Live handles in creation order; iteration order is deterministic
    order: Vec<EntityId>,
    next_entity_id: u64,
    listener_pose: Pose,
}

impl IrisPulseWorld {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            order: Vec::new(),
            next_entity_id: 0,
            listener_pose: Pose::identity(),
        }
    }

    /// Create an entity with the given transform and return its handle.
    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities.insert(
            id,
            Entity {
                committed: transform,
                staged: None,
                behaviors: Vec::new(),
                emitter: EmitterConfig::Silent,
                inert: false,
            },
        );
        self.order.push(id);
        id
    }

    /// Destroy an entity. Fails with `UnknownHandle` if the entity was never
    /// created or is already destroyed; callers are expected to check.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        if self.entities.remove(&id).is_none() {
            return Err(IrisPulseError::UnknownHandle(id));
        }
        self.order.retain(|other| *other != id);
        Ok(())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live handles in creation order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    /// The committed transform of an entity, i.e. the state as of the last
    /// completed step.
    pub fn transform(&self, id: EntityId) -> Result<Transform> {
        self.entities
            .get(&id)
            .map(|entity| entity.committed)
            .ok_or(IrisPulseError::UnknownHandle(id))
    }

    /// Stage a transform write. The write replaces any previously staged one
    /// atomically and becomes visible to readers when the current step
    /// commits, never earlier.
    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> Result<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(IrisPulseError::UnknownHandle(id))?;
        entity.staged = Some(transform);
        Ok(())
    }

    /// Apply all staged transform writes. The simulation step calls this at
    /// the end of each advance, before mixing begins.
    pub fn commit_transforms(&mut self) {
        for entity in self.entities.values_mut() {
            if let Some(staged) = entity.staged.take() {
                entity.committed = staged;
            }
        }
    }

    /// Append a behavior to an entity; behaviors run in insertion order.
    pub fn push_behavior(&mut self, id: EntityId, behavior: Box<dyn Behavior>) -> Result<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(IrisPulseError::UnknownHandle(id))?;
        entity.behaviors.push(behavior);
        Ok(())
    }

    /// Configure how the entity contributes to the audio mix.
    pub fn set_emitter(&mut self, id: EntityId, emitter: EmitterConfig) -> Result<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(IrisPulseError::UnknownHandle(id))?;
        entity.emitter = emitter;
        Ok(())
    }

    pub fn emitter(&self, id: EntityId) -> Result<EmitterConfig> {
        self.entities
            .get(&id)
            .map(|entity| entity.emitter)
            .ok_or(IrisPulseError::UnknownHandle(id))
    }

    /// True once a behavior failure froze this entity.
    pub fn is_inert(&self, id: EntityId) -> Result<bool> {
        self.entities
            .get(&id)
            .map(|entity| entity.inert)
            .ok_or(IrisPulseError::UnknownHandle(id))
    }

    /// Update the listener from the head pose captured this frame.
    pub fn set_listener_pose(&mut self, pose: Pose) {
        self.listener_pose = pose;
    }

    /// The listener state derived from the current head pose.
    pub fn listener(&self) -> ListenerState {
        ListenerState::from_pose(self.listener_pose)
    }

    /// Capture the audible entities from committed state, in creation order.
    pub fn emitter_snapshot(&self) -> EmitterSnapshot {
        let mut emitters = Vec::new();
        for id in &self.order {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            if let EmitterConfig::Spatial {
                gain,
                ref_distance,
                tone_hz,
            } = entity.emitter
            {
                emitters.push(Emitter {
                    entity: *id,
                    position: entity.committed.position,
                    gain,
                    ref_distance,
                    tone_hz,
                });
            }
        }
        EmitterSnapshot { emitters }
    }

    /// Capture the committed scene for the renderer handoff.
    pub fn renderable_snapshot(&self, frame: u64) -> RenderableSceneSnapshot {
        let entities = self
            .order
            .iter()
            .filter_map(|id| {
                self.entities
                    .get(id)
                    .map(|entity| (*id, entity.committed))
            })
            .collect();
        RenderableSceneSnapshot {
            frame,
            listener: self.listener(),
            entities,
        }
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }
}

impl Default for IrisPulseWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroyed_handle_always_fails() {
        let mut world = IrisPulseWorld::new();
        let id = world.spawn(Transform::identity());
        world.despawn(id).unwrap();

        assert!(matches!(
            world.transform(id),
            Err(IrisPulseError::UnknownHandle(_))
        ));
        assert!(matches!(
            world.despawn(id),
            Err(IrisPulseError::UnknownHandle(_))
        ));
        assert!(matches!(
            world.set_transform(id, Transform::identity()),
            Err(IrisPulseError::UnknownHandle(_))
        ));
    }

    #[test]
    fn iteration_keeps_creation_order_across_despawn() {
        let mut world = IrisPulseWorld::new();
        let a = world.spawn(Transform::identity());
        let b = world.spawn(Transform::identity());
        let c = world.spawn(Transform::identity());

        world.despawn(b).unwrap();
        let d = world.spawn(Transform::identity());

        assert_eq!(world.entity_ids(), vec![a, c, d]);
    }

    #[test]
    fn staged_writes_invisible_until_commit() {
        let mut world = IrisPulseWorld::new();
        let id = world.spawn(Transform::from_position(Vec3::ZERO));

        let moved = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        world.set_transform(id, moved).unwrap();
        assert_eq!(world.transform(id).unwrap().position, Vec3::ZERO);

        world.commit_transforms();
        assert_eq!(world.transform(id).unwrap(), moved);
    }

    #[test]
    fn emitter_snapshot_skips_silent_entities() {
        let mut world = IrisPulseWorld::new();
        let quiet = world.spawn(Transform::identity());
        let loud = world.spawn(Transform::from_position(Vec3::new(0.0, 0.0, -2.0)));
        world
            .set_emitter(loud, EmitterConfig::spatial_with_falloff(0.8, 1.5))
            .unwrap();

        let snapshot = world.emitter_snapshot();
        assert_eq!(snapshot.emitters.len(), 1);
        assert_eq!(snapshot.emitters[0].entity, loud);
        assert_eq!(snapshot.emitters[0].gain, 0.8);
        assert!(world.emitter(quiet).unwrap() == EmitterConfig::Silent);
    }

    #[test]
    fn snapshot_reflects_committed_positions_only() {
        let mut world = IrisPulseWorld::new();
        let id = world.spawn(Transform::from_position(Vec3::new(5.0, 0.0, 0.0)));
        world
            .set_emitter(id, EmitterConfig::spatial(1.0))
            .unwrap();
        world
            .set_transform(id, Transform::from_position(Vec3::new(9.0, 0.0, 0.0)))
            .unwrap();

        let snapshot = world.emitter_snapshot();
        assert_eq!(snapshot.emitters[0].position.x, 5.0);
    }
}
