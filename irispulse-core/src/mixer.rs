//! Spatial audio mixing
//!
//! The mixer turns an immutable emitter capture plus the listener state into
//! fixed-size blocks of interleaved samples. It runs on its own cadence,
//! decoupled from the visual frame rate, and never reads the live entity
//! store. Audio asset playback is outside the engine; each emitter
//! synthesizes a steady test tone at its configured frequency, which keeps
//! mixing deterministic and self-contained.

use crate::config::IrisPulseWorldDesc;
use crate::world::{EmitterSnapshot, EntityId, ListenerState};
use std::collections::HashMap;

/// Fixed-size block of interleaved samples. Ownership transfers to the audio
/// output queue once mixed.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    channels: u16,
}

impl AudioBuffer {
    /// A block of `frames` frames of silence.
    pub fn silence(frames: usize, channels: u16) -> Self {
        Self {
            samples: vec![0.0; frames * channels as usize],
            channels,
        }
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Peak absolute amplitude across all channels.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// Mixes emitter captures into output blocks.
pub struct AudioMixer {
    sample_rate: u32,
    block_size: usize,
    channels: u16,
    /// Oscillator phase per emitter, in cycles, for continuity across blocks
    phases: HashMap<EntityId, f32>,
}

impl AudioMixer {
    pub fn new(desc: &IrisPulseWorldDesc) -> Self {
        Self {
            sample_rate: desc.sample_rate,
            block_size: desc.block_size,
            channels: desc.channels,
            phases: HashMap::new(),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Mix one block from the given capture.
    ///
    /// Always returns a buffer of exactly the configured block size; an empty
    /// capture yields silence, not an error. Amplitude follows an inverse
    /// falloff of listener distance per emitter, and stereo placement uses
    /// constant-power panning from the emitter's direction in the listener's
    /// frame.
    pub fn produce_buffer(
        &mut self,
        listener: &ListenerState,
        snapshot: &EmitterSnapshot,
    ) -> AudioBuffer {
        let mut buffer = AudioBuffer::silence(self.block_size, self.channels);

        // Forget oscillators for emitters that left the capture.
        self.phases
            .retain(|id, _| snapshot.emitters.iter().any(|e| e.entity == *id));

        for emitter in &snapshot.emitters {
            let amplitude = emitter.gain * falloff(
                listener.position.distance(emitter.position),
                emitter.ref_distance,
            );
            if amplitude <= 0.0 {
                continue;
            }

            let (left, right) = pan_gains(listener, emitter.position);
            let phase = self.phases.entry(emitter.entity).or_insert(0.0);
            let phase_step = emitter.tone_hz / self.sample_rate as f32;
            let channels = self.channels as usize;

            for frame in 0..self.block_size {
                let sample = (*phase * std::f32::consts::TAU).sin() * amplitude;
                let base = frame * channels;
                if channels >= 2 {
                    buffer.samples[base] += sample * left;
                    buffer.samples[base + 1] += sample * right;
                } else {
                    buffer.samples[base] += sample;
                }
                *phase += phase_step;
                if *phase >= 1.0 {
                    *phase -= 1.0;
                }
            }
        }

        buffer
    }
}

/// Inverse-distance attenuation: unity inside the reference distance, then
/// `ref_distance / distance` beyond it.
fn falloff(distance: f32, ref_distance: f32) -> f32 {
    let reference = ref_distance.max(f32::EPSILON);
    reference / distance.max(reference)
}

/// Constant-power stereo gains from the emitter's direction in the
/// listener's frame. An emitter at the listener's position pans center.
fn pan_gains(listener: &ListenerState, position: glam::Vec3) -> (f32, f32) {
    let lateral = (position - listener.position)
        .try_normalize()
        .map_or(0.0, |direction| direction.dot(listener.right));
    let angle = (lateral.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitterConfig;
    use crate::math::{Pose, Transform, Vec3};
    use crate::world::IrisPulseWorld;

    fn desc() -> IrisPulseWorldDesc {
        IrisPulseWorldDesc {
            block_size: 256,
            ..Default::default()
        }
    }

    fn snapshot_with_emitter(position: Vec3) -> EmitterSnapshot {
        let mut world = IrisPulseWorld::new();
        let id = world.spawn(Transform::from_position(position));
        world
            .set_emitter(id, EmitterConfig::spatial(1.0))
            .unwrap();
        world.emitter_snapshot()
    }

    fn channel_rms(buffer: &AudioBuffer, channel: usize) -> f32 {
        let channels = buffer.channels() as usize;
        let sum: f32 = buffer
            .samples()
            .iter()
            .skip(channel)
            .step_by(channels)
            .map(|s| s * s)
            .sum();
        (sum / buffer.frames() as f32).sqrt()
    }

    #[test]
    fn empty_snapshot_yields_full_length_silence() {
        let mut mixer = AudioMixer::new(&desc());
        let buffer = mixer.produce_buffer(&ListenerState::default(), &EmitterSnapshot::empty());
        assert_eq!(buffer.frames(), 256);
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn closer_emitter_is_louder() {
        // Listener at (0,0,5) facing the origin; identical emitters five and
        // forty-five units away.
        let mut listener_pose = Pose::from_position(Vec3::new(0.0, 0.0, 5.0));
        listener_pose.look_at(Vec3::ZERO, None);
        let listener = ListenerState::from_pose(listener_pose);

        let mut near_mixer = AudioMixer::new(&desc());
        let near = near_mixer.produce_buffer(&listener, &snapshot_with_emitter(Vec3::ZERO));

        let mut far_mixer = AudioMixer::new(&desc());
        let far = far_mixer
            .produce_buffer(&listener, &snapshot_with_emitter(Vec3::new(0.0, 0.0, 50.0)));

        let near_level = channel_rms(&near, 0) + channel_rms(&near, 1);
        let far_level = channel_rms(&far, 0) + channel_rms(&far, 1);
        assert!(near_level > far_level * 2.0);

        // Inverse falloff with ref distance 1: amplitudes scale like 1/d,
        // and both buffers sample the same phase sequence, so the peak
        // ratio equals the distance ratio 45/5.
        approx::assert_relative_eq!(near.peak() / far.peak(), 9.0, epsilon = 1e-3);
    }

    #[test]
    fn emitter_to_the_right_pans_right() {
        let listener = ListenerState::default();
        let mut mixer = AudioMixer::new(&desc());
        let buffer =
            mixer.produce_buffer(&listener, &snapshot_with_emitter(Vec3::new(3.0, 0.0, 0.0)));
        assert!(channel_rms(&buffer, 1) > channel_rms(&buffer, 0) * 2.0);
    }

    #[test]
    fn tone_phase_continues_across_blocks() {
        let listener = ListenerState::default();
        let snapshot = snapshot_with_emitter(Vec3::new(0.0, 0.0, -1.0));
        let mut mixer = AudioMixer::new(&desc());

        let first = mixer.produce_buffer(&listener, &snapshot);
        let second = mixer.produce_buffer(&listener, &snapshot);
        // A 440 Hz tone does not restart at zero phase on the next block.
        assert_ne!(first.samples()[0..8], second.samples()[0..8]);
    }
}
