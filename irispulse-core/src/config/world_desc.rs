use std::time::Duration;

/// Configuration descriptor for an IrisPulse world
#[derive(Debug, Clone)]
pub struct IrisPulseWorldDesc {
    /// Display refresh rate in Hz. One refresh interval is the frame budget
    /// the orchestrator must stay within before presenting.
    pub refresh_rate: f32,
    /// Sample rate for audio mixing
    pub sample_rate: u32,
    /// Number of frames per mixed audio block
    pub block_size: usize,
    /// Number of audio channels (typically 2 for stereo)
    pub channels: u16,
    /// Maximum number of mixed blocks queued ahead of the output device.
    /// When the queue is full the oldest pending block is dropped.
    pub max_queued_blocks: usize,
    /// Upper bound on a single device poll before tracking degrades to the
    /// held pose
    pub poll_timeout: Duration,
}

impl Default for IrisPulseWorldDesc {
    fn default() -> Self {
        Self {
            refresh_rate: 90.0,
            sample_rate: 48000,
            block_size: 1024,
            channels: 2,
            max_queued_blocks: 4,
            poll_timeout: Duration::from_millis(2),
        }
    }
}

impl IrisPulseWorldDesc {
    /// Duration of one visual frame at the configured refresh rate.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.refresh_rate))
    }

    /// Duration of audio covered by one mixed block.
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / f64::from(self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_budget_matches_refresh_rate() {
        let desc = IrisPulseWorldDesc {
            refresh_rate: 100.0,
            ..Default::default()
        };
        assert_eq!(desc.frame_budget(), Duration::from_millis(10));
    }
}
