//! Demo scenario: a swaying headset, an orbiting chime and a spinning prop.

use anyhow::Result;
use irispulse_core::{
    EmitterConfig, FrameOrchestrator, HeadFollow, IrisPulseEngine, IrisPulseEvent,
    IrisPulseWorldDesc, Orbit, Pose, PoseDevice, Quat, RawPoseData, Renderer,
    RenderableSceneSnapshot, Spin, Transform, Vec3,
};

/// Simulated headset: the head sways side to side and nods gently. Driven by
/// a tick counter rather than wall clock so runs are reproducible.
struct SwayingHeadset {
    tick: u64,
}

impl PoseDevice for SwayingHeadset {
    fn poll(&mut self) -> irispulse_core::Result<RawPoseData> {
        let t = self.tick as f32 / 90.0;
        self.tick += 1;

        let position = Vec3::new((t * 0.4).sin() * 0.3, 1.6 + (t * 1.1).sin() * 0.05, 0.0);
        let rotation = Quat::from_rotation_y((t * 0.4).sin() * 0.5);
        Ok(RawPoseData {
            head: Pose::new(position, rotation),
            ..Default::default()
        })
    }
}

/// Renderer stand-in that reports the scene once a second.
struct LoggingRenderer;

impl Renderer for LoggingRenderer {
    fn submit_frame(&mut self, snapshot: &RenderableSceneSnapshot) {
        if snapshot.frame % 90 == 0 {
            log::info!(
                "frame {}: {} entities, listener at {:.2?}",
                snapshot.frame,
                snapshot.entities.len(),
                snapshot.listener.position
            );
        }
    }
}

pub fn run(frames: u64) -> Result<()> {
    let desc = IrisPulseWorldDesc::default();
    let mut orchestrator = FrameOrchestrator::new(
        desc.clone(),
        Box::new(SwayingHeadset { tick: 0 }),
        Box::new(LoggingRenderer),
    );

    populate(&mut orchestrator)?;

    // Audio output is best-effort in the demo: on a machine without an
    // output device the frame loop still runs, just silently.
    let mut engine = IrisPulseEngine::new(
        desc,
        orchestrator.audio_queue(),
        orchestrator.event_sender(),
    )?;
    match engine.start() {
        Ok(()) => log::info!("audio engine started"),
        Err(err) => log::warn!("audio output unavailable, running silent: {}", err),
    }

    let events = orchestrator.events();
    log::info!("running {} frames", frames);
    for _ in 0..frames {
        if !orchestrator.run_frame() {
            break;
        }
    }
    engine.stop().ok();

    let mut deadline_misses = 0usize;
    let mut underruns = 0usize;
    let mut frozen = 0usize;
    for event in events.try_iter() {
        match event {
            IrisPulseEvent::DeadlineMissed { .. } => deadline_misses += 1,
            IrisPulseEvent::UnderrunDetected { .. } => underruns += 1,
            IrisPulseEvent::EntityFrozen { entity, error } => {
                frozen += 1;
                log::warn!("entity {} froze: {}", entity, error);
            }
            _ => {}
        }
    }
    log::info!(
        "done: {} frames, {} deadline misses, {} underruns, {} frozen entities",
        orchestrator.frame(),
        deadline_misses,
        underruns,
        frozen
    );

    Ok(())
}

fn populate(orchestrator: &mut FrameOrchestrator) -> Result<()> {
    let world = orchestrator.world_mut();

    let chime = world.spawn(Transform::from_position(Vec3::new(3.0, 1.0, 0.0)));
    world.push_behavior(
        chime,
        Box::new(Orbit {
            center: Vec3::new(0.0, 1.0, 0.0),
            radius: 3.0,
            angular_rate: 0.5,
            phase: 0.0,
        }),
    )?;
    world.set_emitter(
        chime,
        EmitterConfig::spatial_with_falloff(0.6, 1.0).with_tone(523.25),
    )?;

    let hum = world.spawn(Transform::from_position(Vec3::new(0.0, 0.2, -4.0)));
    world.set_emitter(
        hum,
        EmitterConfig::spatial_with_falloff(0.3, 2.0).with_tone(110.0),
    )?;

    let prop = world.spawn(Transform::from_position(Vec3::new(-2.0, 1.5, -2.0)));
    world.push_behavior(
        prop,
        Box::new(Spin {
            axis: Vec3::Y,
            rate: 1.2,
        }),
    )?;

    let hud = world.spawn(Transform::identity());
    world.push_behavior(
        hud,
        Box::new(HeadFollow {
            offset: Vec3::new(0.0, -0.2, -0.8),
        }),
    )?;

    Ok(())
}
