/// Configuration for how an entity contributes to the audio mix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmitterConfig {
    /// Entity makes no sound
    Silent,
    /// Spatial emitter, mixed relative to the listener with distance falloff
    Spatial {
        /// Amplitude multiplier applied before distance falloff
        gain: f32,
        /// Distance at which falloff begins. Closer than this the emitter
        /// plays at full gain; beyond it amplitude follows an inverse
        /// falloff of distance.
        ref_distance: f32,
        /// Frequency of the emitter's test tone in Hz. Audio asset playback
        /// lives outside the engine, so emitters synthesize a steady tone.
        tone_hz: f32,
    },
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self::Silent
    }
}

impl EmitterConfig {
    /// Create a silent emitter configuration
    pub fn silent() -> Self {
        Self::Silent
    }

    /// Create a spatial emitter with the given gain and default falloff
    pub fn spatial(gain: f32) -> Self {
        Self::Spatial {
            gain,
            ref_distance: 1.0,
            tone_hz: 440.0,
        }
    }

    /// Create a spatial emitter with gain and falloff reference distance
    pub fn spatial_with_falloff(gain: f32, ref_distance: f32) -> Self {
        Self::Spatial {
            gain,
            ref_distance,
            tone_hz: 440.0,
        }
    }

    /// Replace the test tone frequency, keeping gain and falloff
    pub fn with_tone(self, tone_hz: f32) -> Self {
        match self {
            Self::Silent => Self::Silent,
            Self::Spatial {
                gain, ref_distance, ..
            } => Self::Spatial {
                gain,
                ref_distance,
                tone_hz,
            },
        }
    }

    /// Returns true if this entity is audible
    pub fn is_spatial(&self) -> bool {
        matches!(self, Self::Spatial { .. })
    }

    /// Returns the gain if this is a spatial emitter
    pub fn gain(&self) -> Option<f32> {
        match self {
            Self::Spatial { gain, .. } => Some(*gain),
            Self::Silent => None,
        }
    }

    /// Returns the falloff reference distance if this is a spatial emitter
    pub fn ref_distance(&self) -> Option<f32> {
        match self {
            Self::Spatial { ref_distance, .. } => Some(*ref_distance),
            Self::Silent => None,
        }
    }
}
