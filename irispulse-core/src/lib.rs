//! # IrisPulse Core
//!
//! A real-time frame orchestration and spatial audio engine for VR in Rust.
//!
//! IrisPulse drives the per-frame pipeline of a VR application: it samples
//! headset and controller poses, advances deterministic entity logic, mixes
//! spatial audio against the listener derived from the head pose, and hands
//! the committed scene to a renderer, all under a per-frame budget with
//! graceful degradation when the device drops out or a deadline slips.
//!
//! ## Architecture
//!
//! - **Frame thread**: owns the [`FrameOrchestrator`] and the world; runs
//!   Sampling → Stepping → Mixing → Presenting in strict sequence.
//! - **Audio thread**: the [`IrisPulseEngine`] drains mixed blocks from a
//!   bounded queue inside the device callback, playing silence on a starve.
//!
//! ## Quick Start
//!
//! ```no_run
//! use irispulse_core::*;
//!
//! struct MyHeadset;
//! impl PoseDevice for MyHeadset {
//!     fn poll(&mut self) -> Result<RawPoseData> {
//!         Ok(RawPoseData::default())
//!     }
//! }
//!
//! struct MyRenderer;
//! impl Renderer for MyRenderer {
//!     fn submit_frame(&mut self, _snapshot: &RenderableSceneSnapshot) {}
//! }
//!
//! let desc = IrisPulseWorldDesc::default();
//! let mut orchestrator =
//!     FrameOrchestrator::new(desc.clone(), Box::new(MyHeadset), Box::new(MyRenderer));
//!
//! // Populate the world before entering the hot loop.
//! let chime = orchestrator.world_mut().spawn(Transform::from_position(Vec3::new(2.0, 0.0, 0.0)));
//! orchestrator.world_mut().set_emitter(chime, EmitterConfig::spatial(0.8))?;
//!
//! // Wire the audio output to the orchestrator's block queue.
//! let mut engine =
//!     IrisPulseEngine::new(desc, orchestrator.audio_queue(), orchestrator.event_sender())?;
//! engine.start()?;
//!
//! // Drive frames until the stop signal is raised from elsewhere.
//! orchestrator.run();
//! engine.stop()?;
//! # Ok::<(), IrisPulseError>(())
//! ```

pub mod behavior;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame;
pub mod math;
pub mod mixer;
pub mod sampler;
pub mod step;
pub mod world;

pub use behavior::{Behavior, BehaviorCtx, BehaviorError, HeadFollow, Orbit, Spin};
pub use config::{EmitterConfig, IrisPulseWorldDesc};
pub use device::{Hand, PoseDevice, RawControllerData, RawPoseData};
pub use engine::{BufferQueue, IrisPulseEngine};
pub use error::{IrisPulseError, Result};
pub use events::IrisPulseEvent;
pub use frame::{FrameOrchestrator, FramePhase, Renderer};
pub use math::{Pose, Quat, Transform, Vec2, Vec3};
pub use mixer::{AudioBuffer, AudioMixer};
pub use sampler::{ControllerState, PoseSampler, PoseSnapshot};
pub use step::{SimulationStep, StepOutcome};
pub use world::{
    Emitter, EmitterSnapshot, EntityId, IrisPulseWorld, ListenerState, RenderableSceneSnapshot,
};
