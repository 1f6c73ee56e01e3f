//! Error types for IrisPulse

use crate::behavior::BehaviorError;
use crate::world::EntityId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrisPulseError {
    /// The VR device did not answer the poll; tracking degrades to the
    /// last-known pose instead of aborting the frame.
    #[error("VR device unavailable")]
    DeviceUnavailable,

    /// The referenced entity does not exist (never created, or destroyed).
    #[error("unknown entity handle: {0}")]
    UnknownHandle(EntityId),

    /// A behavior update failed; the entity is frozen and the step continues.
    #[error("behavior failed: {0}")]
    Behavior(#[from] BehaviorError),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, IrisPulseError>;
