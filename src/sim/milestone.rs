//! One-shot milestone detection on monotonically increasing counters

use serde::{Deserialize, Serialize};

use crate::consts::MILESTONE_STEP;

/// Fires once per multiple-of-100 crossing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneTrigger {
    last_effect_count: u64,
}

impl MilestoneTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted marker so a restart does not re-fire
    pub fn with_last_effect_count(last_effect_count: u64) -> Self {
        Self { last_effect_count }
    }

    pub fn last_effect_count(&self) -> u64 {
        self.last_effect_count
    }

    /// Check the counter after an increment
    ///
    /// Returns the milestone value when it fires; repeated calls with the
    /// same counter never fire twice.
    pub fn observe(&mut self, counter: u64) -> Option<u64> {
        if counter >= MILESTONE_STEP
            && counter % MILESTONE_STEP == 0
            && counter > self.last_effect_count
        {
            self.last_effect_count = counter;
            Some(counter)
        } else {
            None
        }
    }

    /// Callback form of [`observe`](Self::observe)
    pub fn observe_with(&mut self, counter: u64, mut on_milestone: impl FnMut(u64)) {
        if let Some(milestone) = self.observe(counter) {
            on_milestone(milestone);
        }
    }
}
