//! Frame orchestration
//!
//! The orchestrator owns the frame-driving loop: it samples the VR device,
//! advances the simulation, schedules audio mixing, and hands the committed
//! scene to the renderer. Phases run strictly in sequence within a frame,
//! writes commit at the Stepping→Mixing barrier, and a missed deadline is
//! reported but never drops the presentation: the loop favors visible
//! continuity over catching up.

use crate::config::IrisPulseWorldDesc;
use crate::device::PoseDevice;
use crate::engine::BufferQueue;
use crate::events::IrisPulseEvent;
use crate::mixer::AudioMixer;
use crate::sampler::PoseSampler;
use crate::step::SimulationStep;
use crate::world::{IrisPulseWorld, RenderableSceneSnapshot};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Phases of one frame, strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Sampling,
    Stepping,
    Mixing,
    Presenting,
}

/// Renderer boundary: receives the committed scene once per frame.
///
/// `submit_frame` may block until the previous present retires; together
/// with the device poll it is one of the two blocking points of the loop.
pub trait Renderer: Send {
    fn submit_frame(&mut self, snapshot: &RenderableSceneSnapshot);
}

/// Top-level driver sequencing Sampling → Stepping → Mixing → Presenting.
pub struct FrameOrchestrator {
    desc: IrisPulseWorldDesc,
    sampler: PoseSampler,
    world: IrisPulseWorld,
    step: SimulationStep,
    mixer: AudioMixer,
    renderer: Box<dyn Renderer>,
    audio_queue: Arc<BufferQueue>,
    events: Sender<IrisPulseEvent>,
    events_rx: Receiver<IrisPulseEvent>,
    stop: Arc<AtomicBool>,
    phase: FramePhase,
    frame: u64,
    /// Simulated clock advanced one budget per frame
    sim_time: Duration,
    /// Audio frames owed to the output, in samples at the world rate
    audio_debt: f64,
    device_tracked: bool,
}

impl FrameOrchestrator {
    pub fn new(
        desc: IrisPulseWorldDesc,
        device: Box<dyn PoseDevice>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let (events, events_rx) = unbounded();
        let audio_queue = Arc::new(BufferQueue::new(desc.max_queued_blocks));
        Self {
            sampler: PoseSampler::new(device),
            world: IrisPulseWorld::new(),
            step: SimulationStep::new(),
            mixer: AudioMixer::new(&desc),
            renderer,
            audio_queue,
            events,
            events_rx,
            stop: Arc::new(AtomicBool::new(false)),
            phase: FramePhase::Idle,
            frame: 0,
            sim_time: Duration::ZERO,
            audio_debt: 0.0,
            device_tracked: true,
            desc,
        }
    }

    pub fn world(&self) -> &IrisPulseWorld {
        &self.world
    }

    /// Mutable world access for game logic between frames (spawn/despawn
    /// stay outside the hot loop).
    pub fn world_mut(&mut self) -> &mut IrisPulseWorld {
        &mut self.world
    }

    /// Queue of mixed blocks; hand this to the audio output engine.
    pub fn audio_queue(&self) -> Arc<BufferQueue> {
        self.audio_queue.clone()
    }

    /// Receiver for telemetry and lifecycle events.
    pub fn events(&self) -> Receiver<IrisPulseEvent> {
        self.events_rx.clone()
    }

    /// Sender side of the event channel, for collaborators that report
    /// telemetry of their own (e.g. the audio output engine).
    pub fn event_sender(&self) -> Sender<IrisPulseEvent> {
        self.events.clone()
    }

    /// Raise this flag to end the loop at the next phase boundary.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run one frame through all phases.
    ///
    /// Returns false when the stop signal was observed at a phase boundary;
    /// mid-phase work always completes first, so the store is never left
    /// with a half-applied step.
    pub fn run_frame(&mut self) -> bool {
        if self.should_stop() {
            self.phase = FramePhase::Idle;
            return false;
        }

        let frame_start = Instant::now();
        let budget = self.desc.frame_budget();
        let dt = budget.as_secs_f32();
        self.frame += 1;

        // Sampling: one device poll, cached for the rest of the frame. A
        // failed poll degrades to the held pose; the frame goes on.
        self.phase = FramePhase::Sampling;
        let snapshot = self.sampler.sample(self.frame, self.sim_time);
        if snapshot.tracked != self.device_tracked {
            self.device_tracked = snapshot.tracked;
            let event = if snapshot.tracked {
                IrisPulseEvent::DeviceRecovered { frame: self.frame }
            } else {
                IrisPulseEvent::DeviceLost { frame: self.frame }
            };
            let _ = self.events.send(event);
        }
        self.world.set_listener_pose(snapshot.head);
        if self.should_stop() {
            self.phase = FramePhase::Idle;
            return false;
        }

        // Stepping: advance entity logic against last step's commits.
        self.phase = FramePhase::Stepping;
        let outcome = self.step.advance(&mut self.world, dt, &snapshot);
        for (entity, error) in outcome.frozen {
            let _ = self.events.send(IrisPulseEvent::EntityFrozen {
                entity,
                error: error.to_string(),
            });
        }
        if self.should_stop() {
            self.phase = FramePhase::Idle;
            return false;
        }

        // Mixing: the step has committed, so the capture is consistent.
        // Audio runs on its own cadence; mix as many blocks as the frame
        // interval owes the output.
        self.phase = FramePhase::Mixing;
        let listener = self.world.listener();
        let emitters = self.world.emitter_snapshot();
        self.audio_debt += f64::from(self.desc.sample_rate) * f64::from(dt);
        while self.audio_debt >= self.desc.block_size as f64 {
            let buffer = self.mixer.produce_buffer(&listener, &emitters);
            if self.audio_queue.push(buffer) {
                log::debug!("audio queue full, dropped oldest pending block");
            }
            self.audio_debt -= self.desc.block_size as f64;
        }
        if self.should_stop() {
            self.phase = FramePhase::Idle;
            return false;
        }

        // Presenting: hand off whatever is ready. Exceeding the budget is
        // telemetry, not a reason to withhold the frame.
        self.phase = FramePhase::Presenting;
        let elapsed = frame_start.elapsed();
        if elapsed > budget {
            log::warn!(
                "frame {} missed its {:?} budget ({:?} elapsed)",
                self.frame,
                budget,
                elapsed
            );
            let _ = self.events.send(IrisPulseEvent::DeadlineMissed {
                frame: self.frame,
                budget,
                elapsed,
            });
        }
        let scene = self.world.renderable_snapshot(self.frame);
        self.renderer.submit_frame(&scene);

        self.sim_time += budget;
        self.phase = FramePhase::Idle;
        true
    }

    /// Drive frames until the stop signal is raised.
    pub fn run(&mut self) {
        let _ = self.events.send(IrisPulseEvent::EngineStarted);
        while self.run_frame() {}
        let _ = self.events.send(IrisPulseEvent::EngineStopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Orbit;
    use crate::config::EmitterConfig;
    use crate::device::{PoseDevice, RawPoseData};
    use crate::error::{IrisPulseError, Result};
    use crate::math::{Pose, Transform, Vec3};
    use std::sync::Mutex;

    struct StaticDevice {
        head: Pose,
        fail: bool,
    }

    impl PoseDevice for StaticDevice {
        fn poll(&mut self) -> Result<RawPoseData> {
            if self.fail {
                return Err(IrisPulseError::DeviceUnavailable);
            }
            Ok(RawPoseData {
                head: self.head,
                ..Default::default()
            })
        }
    }

    /// Poll that overshoots any reasonable budget.
    struct SlowDevice;

    impl PoseDevice for SlowDevice {
        fn poll(&mut self) -> Result<RawPoseData> {
            std::thread::sleep(Duration::from_millis(3));
            Ok(RawPoseData::default())
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Arc<Mutex<Vec<RenderableSceneSnapshot>>>,
    }

    impl Renderer for RecordingRenderer {
        fn submit_frame(&mut self, snapshot: &RenderableSceneSnapshot) {
            self.frames.lock().unwrap().push(snapshot.clone());
        }
    }

    fn desc() -> IrisPulseWorldDesc {
        IrisPulseWorldDesc {
            max_queued_blocks: 64,
            ..Default::default()
        }
    }

    fn orchestrator_with_renderer() -> (FrameOrchestrator, Arc<Mutex<Vec<RenderableSceneSnapshot>>>)
    {
        let renderer = RecordingRenderer::default();
        let frames = renderer.frames.clone();
        let orchestrator = FrameOrchestrator::new(
            desc(),
            Box::new(StaticDevice {
                head: Pose::from_position(Vec3::new(0.0, 1.6, 0.0)),
                fail: false,
            }),
            Box::new(renderer),
        );
        (orchestrator, frames)
    }

    #[test]
    fn frames_present_in_sequence_and_return_to_idle() {
        let (mut orchestrator, frames) = orchestrator_with_renderer();
        let id = orchestrator.world_mut().spawn(Transform::identity());
        orchestrator
            .world_mut()
            .push_behavior(
                id,
                Box::new(Orbit {
                    center: Vec3::ZERO,
                    radius: 1.0,
                    angular_rate: 1.0,
                    phase: 0.0,
                }),
            )
            .unwrap();

        for _ in 0..3 {
            assert!(orchestrator.run_frame());
            assert_eq!(orchestrator.phase(), FramePhase::Idle);
        }

        let presented = frames.lock().unwrap();
        assert_eq!(presented.len(), 3);
        assert_eq!(
            presented.iter().map(|s| s.frame).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // The listener rode along with the head pose.
        assert_eq!(presented[0].listener.position, Vec3::new(0.0, 1.6, 0.0));
    }

    #[test]
    fn audio_blocks_follow_their_own_cadence() {
        let (mut orchestrator, _frames) = orchestrator_with_renderer();
        let queue = orchestrator.audio_queue();

        // At 90 Hz and 48 kHz, each frame owes 533.3 samples; 1024-sample
        // blocks land roughly every other frame.
        for _ in 0..4 {
            orchestrator.run_frame();
        }
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn missed_deadline_still_presents_and_reports() {
        let renderer = RecordingRenderer::default();
        let frames = renderer.frames.clone();
        let mut orchestrator = FrameOrchestrator::new(
            IrisPulseWorldDesc {
                // A 1 kHz refresh leaves a 1 ms budget the slow poll busts.
                refresh_rate: 1000.0,
                max_queued_blocks: 64,
                ..Default::default()
            },
            Box::new(SlowDevice),
            Box::new(renderer),
        );
        let events = orchestrator.events();

        assert!(orchestrator.run_frame());
        assert_eq!(frames.lock().unwrap().len(), 1);

        let missed = events
            .try_iter()
            .any(|event| matches!(event, IrisPulseEvent::DeadlineMissed { frame: 1, .. }));
        assert!(missed);
    }

    /// Device whose availability the test can toggle mid-run.
    struct FlakyDevice {
        head: Pose,
        fail: Arc<AtomicBool>,
    }

    impl PoseDevice for FlakyDevice {
        fn poll(&mut self) -> Result<RawPoseData> {
            if self.fail.load(Ordering::Relaxed) {
                return Err(IrisPulseError::DeviceUnavailable);
            }
            Ok(RawPoseData {
                head: self.head,
                ..Default::default()
            })
        }
    }

    #[test]
    fn device_loss_and_recovery_emit_edges_and_hold_pose() {
        let fail = Arc::new(AtomicBool::new(false));
        let mut orchestrator = FrameOrchestrator::new(
            desc(),
            Box::new(FlakyDevice {
                head: Pose::from_position(Vec3::new(2.0, 0.0, 0.0)),
                fail: fail.clone(),
            }),
            Box::new(RecordingRenderer::default()),
        );
        let events = orchestrator.events();

        assert!(orchestrator.run_frame());
        assert_eq!(
            orchestrator.world().listener().position,
            Vec3::new(2.0, 0.0, 0.0)
        );

        fail.store(true, Ordering::Relaxed);
        assert!(orchestrator.run_frame());
        assert!(orchestrator.run_frame());
        // Tracking holds the last live pose while the device is gone.
        assert_eq!(
            orchestrator.world().listener().position,
            Vec3::new(2.0, 0.0, 0.0)
        );

        fail.store(false, Ordering::Relaxed);
        assert!(orchestrator.run_frame());

        let edges: Vec<_> = events
            .try_iter()
            .filter(|event| {
                matches!(
                    event,
                    IrisPulseEvent::DeviceLost { .. } | IrisPulseEvent::DeviceRecovered { .. }
                )
            })
            .collect();
        assert_eq!(
            edges,
            vec![
                IrisPulseEvent::DeviceLost { frame: 2 },
                IrisPulseEvent::DeviceRecovered { frame: 4 },
            ]
        );
    }

    #[test]
    fn stop_signal_halts_at_phase_boundary() {
        let (mut orchestrator, frames) = orchestrator_with_renderer();
        orchestrator.stop_handle().store(true, Ordering::Relaxed);

        assert!(!orchestrator.run_frame());
        assert_eq!(orchestrator.phase(), FramePhase::Idle);
        assert!(frames.lock().unwrap().is_empty());
    }

    #[test]
    fn run_emits_lifecycle_events() {
        let (mut orchestrator, _frames) = orchestrator_with_renderer();
        let events = orchestrator.events();
        let stop = orchestrator.stop_handle();

        // Stop immediately: run still brackets the loop with lifecycle
        // events.
        stop.store(true, Ordering::Relaxed);
        orchestrator.run();

        let collected: Vec<_> = events.try_iter().collect();
        assert_eq!(collected.first(), Some(&IrisPulseEvent::EngineStarted));
        assert_eq!(collected.last(), Some(&IrisPulseEvent::EngineStopped));
    }
}
