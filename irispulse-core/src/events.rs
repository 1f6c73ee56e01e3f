//! Event types for IrisPulse

use crate::world::EntityId;
use std::time::Duration;

/// Telemetry and lifecycle events emitted over the engine's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum IrisPulseEvent {
    /// A frame exceeded its budget but was presented anyway.
    DeadlineMissed {
        frame: u64,
        budget: Duration,
        elapsed: Duration,
    },
    /// The audio output callback ran out of mixed blocks and played silence.
    UnderrunDetected { frames: usize },
    /// The VR device stopped answering polls; tracking holds the last pose.
    DeviceLost { frame: u64 },
    /// The VR device resumed after a loss.
    DeviceRecovered { frame: u64 },
    /// An entity's behavior failed; its transform is frozen from now on.
    EntityFrozen { entity: EntityId, error: String },
    EngineStarted,
    EngineStopped,
}

impl IrisPulseEvent {
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Self::EntityFrozen { entity, .. } => Some(*entity),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::DeadlineMissed { .. }
                | Self::UnderrunDetected { .. }
                | Self::DeviceLost { .. }
                | Self::EntityFrozen { .. }
        )
    }
}
