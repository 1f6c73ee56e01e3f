//! Simulation stepping
//!
//! One `advance` applies every live entity's behaviors exactly once, in
//! creation order, against the transforms committed by the previous step.
//! All writes are staged and committed together at the end of the call, so
//! the mixer and renderer never observe a half-updated world.

use crate::behavior::{BehaviorCtx, BehaviorError};
use crate::sampler::PoseSnapshot;
use crate::world::{EntityId, IrisPulseWorld};

/// What one advance did: how many entities updated and which ones froze.
#[derive(Debug, Default)]
pub struct StepOutcome {
    pub updated: usize,
    pub frozen: Vec<(EntityId, BehaviorError)>,
}

/// Advances game logic by simulated timesteps.
pub struct SimulationStep {
    /// Accumulated simulated seconds, summed in f64 to bound drift
    elapsed: f64,
    steps: u64,
}

impl SimulationStep {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            steps: 0,
        }
    }

    /// Total simulated seconds advanced so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance every live entity once by `dt` simulated seconds.
    ///
    /// `dt` is simulated time, not wall clock; feeding the same snapshot and
    /// dt sequence reproduces the same transform sequence bit for bit. A
    /// behavior failure freezes its entity and is reported in the outcome;
    /// the remaining entities still update.
    pub fn advance(
        &mut self,
        world: &mut IrisPulseWorld,
        dt: f32,
        snapshot: &PoseSnapshot,
    ) -> StepOutcome {
        self.elapsed += f64::from(dt);
        self.steps += 1;

        let ctx = BehaviorCtx {
            dt,
            elapsed: self.elapsed as f32,
            frame: snapshot.frame,
            head: &snapshot.head,
        };

        let mut outcome = StepOutcome::default();
        for id in world.entity_ids() {
            let Some(entity) = world.entity_mut(id) else {
                continue;
            };
            if entity.inert {
                continue;
            }

            let mut next = entity.committed;
            let mut failure = None;
            for behavior in entity.behaviors.iter_mut() {
                match behavior.update(next, &ctx) {
                    Ok(transform) => next = transform,
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }

            match failure {
                Some(err) => {
                    entity.inert = true;
                    entity.staged = None;
                    log::warn!("entity {} behavior failed, freezing: {}", id, err);
                    outcome.frozen.push((id, err));
                }
                None => {
                    entity.staged = Some(next);
                    outcome.updated += 1;
                }
            }
        }

        world.commit_transforms();
        outcome
    }
}

impl Default for SimulationStep {
    fn default() -> Self {
        Self::new()
    }
}
