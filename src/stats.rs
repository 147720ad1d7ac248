//! Interaction counters
//!
//! Taps, full rotations, and spins, plus the milestones already celebrated.
//! Loaded once at startup and written back every few events.

use serde::{Deserialize, Serialize};

use crate::consts::STATS_SAVE_INTERVAL;
use crate::persistence::{KeyValueStore, PersistenceError, StoredValue};

/// Counter kinds that can reach a milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Counter {
    Taps,
    Rotations,
    Spins,
}

impl Counter {
    fn key(self) -> &'static str {
        match self {
            Counter::Taps => "dial_toy_tap_count",
            Counter::Rotations => "dial_toy_rotation_count",
            Counter::Spins => "dial_toy_spin_count",
        }
    }
}

/// Lifetime interaction statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionStats {
    pub tap_count: u64,
    pub rotation_count: u64,
    pub spin_count: u64,
    /// Host timestamp (seconds) of the last counted event
    pub last_interaction: Option<f64>,
    /// Milestones already celebrated (tap or rotation values)
    pub milestones: Vec<u64>,
    /// Events since the last save
    #[serde(skip)]
    unsaved: u64,
}

impl InteractionStats {
    const LAST_KEY: &'static str = "dial_toy_last_interaction";
    const MILESTONES_KEY: &'static str = "dial_toy_milestones";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Taps => self.tap_count,
            Counter::Rotations => self.rotation_count,
            Counter::Spins => self.spin_count,
        }
    }

    /// Increment a counter; returns the new value
    pub fn increment(&mut self, counter: Counter, now: f64) -> u64 {
        let slot = match counter {
            Counter::Taps => &mut self.tap_count,
            Counter::Rotations => &mut self.rotation_count,
            Counter::Spins => &mut self.spin_count,
        };
        *slot += 1;
        let value = *slot;
        self.last_interaction = Some(now);
        self.unsaved += 1;
        value
    }

    pub fn record_milestone(&mut self, value: u64) {
        if !self.milestones.contains(&value) {
            self.milestones.push(value);
        }
    }

    /// Highest celebrated milestone not above `limit`
    pub fn last_milestone_up_to(&self, limit: u64) -> u64 {
        self.milestones
            .iter()
            .copied()
            .filter(|m| *m <= limit)
            .max()
            .unwrap_or(0)
    }

    /// True once enough events piled up to warrant a save
    pub fn save_due(&self) -> bool {
        self.unsaved >= STATS_SAVE_INTERVAL
    }

    /// Load counters from the store; missing keys read as zero
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, PersistenceError> {
        let read = |c: Counter| -> Result<u64, PersistenceError> {
            Ok(store.get_int(c.key())?.unwrap_or(0).max(0) as u64)
        };
        let stats = Self {
            tap_count: read(Counter::Taps)?,
            rotation_count: read(Counter::Rotations)?,
            spin_count: read(Counter::Spins)?,
            last_interaction: store.get_timestamp(Self::LAST_KEY)?,
            milestones: store
                .get_int_list(Self::MILESTONES_KEY)?
                .unwrap_or_default()
                .into_iter()
                .filter(|m| *m > 0)
                .map(|m| m as u64)
                .collect(),
            unsaved: 0,
        };
        log::info!(
            "Loaded stats: {} taps, {} rotations, {} spins",
            stats.tap_count,
            stats.rotation_count,
            stats.spin_count
        );
        Ok(stats)
    }

    /// Load, or start from zero with a warning
    pub fn load_or_default(store: &dyn KeyValueStore) -> Self {
        Self::load(store).unwrap_or_else(|e| {
            log::warn!("Stats unreadable, starting fresh: {}", e);
            Self::new()
        })
    }

    /// Write counters back to the store (best-effort)
    pub fn save(&mut self, store: &mut dyn KeyValueStore) {
        for counter in [Counter::Taps, Counter::Rotations, Counter::Spins] {
            store.set(counter.key(), StoredValue::Int(self.get(counter) as i64));
        }
        if let Some(ts) = self.last_interaction {
            store.set(Self::LAST_KEY, StoredValue::Timestamp(ts));
        }
        store.set(
            Self::MILESTONES_KEY,
            StoredValue::IntList(self.milestones.iter().map(|m| *m as i64).collect()),
        );
        match store.flush() {
            Ok(()) => {
                self.unsaved = 0;
                log::debug!("Stats saved");
            }
            Err(e) => log::warn!("Stats save failed: {}", e),
        }
    }
}
