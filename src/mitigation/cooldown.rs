// Cooldown monitor: per-channel gate on enforcement triggers.
//
// A channel is Armed while its tick counter is zero. An Armed channel whose
// score is strictly above the threshold triggers once and starts Cooling:
// the counter is set to the reset value and every following channel message
// counts it down by one without looking at the score. The counter is driven
// by messages, not wall-clock time.

use std::collections::HashMap;

use tracing::info;

use crate::scoring::policy::Score;

/// What a single channel message did to the channel's cooldown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    /// Armed and at or below threshold; nothing happens.
    Clear,
    /// Armed and above threshold: fire mitigation, cooldown started.
    Triggered,
    /// Cooling down; `remaining` ticks left after this message.
    Cooling { remaining: u32 },
}

pub struct CooldownMonitor {
    threshold: Score,
    reset: u32,
    ticks: HashMap<String, u32>,
}

impl CooldownMonitor {
    pub fn new(threshold: Score, reset: u32) -> Self {
        Self {
            threshold,
            reset,
            ticks: HashMap::new(),
        }
    }

    /// Advance `channel_id` by one message carrying its current score.
    pub fn observe(&mut self, channel_id: &str, score: Score) -> CooldownOutcome {
        let ticks = self.ticks.entry(channel_id.to_string()).or_insert(0);

        if *ticks > 0 {
            *ticks -= 1;
            return CooldownOutcome::Cooling { remaining: *ticks };
        }

        if score > self.threshold {
            *ticks = self.reset;
            info!(
                channel = channel_id,
                score = score.value(),
                threshold = self.threshold.value(),
                cooldown = self.reset,
                "Enforcement threshold crossed"
            );
            return CooldownOutcome::Triggered;
        }

        CooldownOutcome::Clear
    }

    /// Remaining cooldown ticks for a channel (0 = Armed).
    pub fn ticks(&self, channel_id: &str) -> u32 {
        self.ticks.get(channel_id).copied().unwrap_or(0)
    }

    pub fn is_armed(&self, channel_id: &str) -> bool {
        self.ticks(channel_id) == 0
    }
}
