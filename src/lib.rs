//! Dial Toy - physics-driven fidget dial core
//!
//! Core modules:
//! - `sim`: Rotation simulator, notch detection, milestone counting
//! - `effects`: Fixed-timestep particle engines (fireworks, coin rain, glass crack)
//! - `orchestrator`: Picks which celebration runs when a milestone fires
//! - `feedback`: Haptic/sound request plumbing toward the host
//! - `persistence`: Opaque key-value store for counters and settings
//! - `renderer`: GPU-ready instance data for the host's renderer

pub mod app;
pub mod effects;
pub mod feedback;
pub mod orchestrator;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod stats;

pub use app::DialToy;
pub use settings::{DialMode, EffectMode, Settings};
pub use stats::InteractionStats;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tuning constants
pub mod consts {
    /// Physics and glass-crack timestep (60 Hz)
    pub const PHYSICS_DT: f32 = 1.0 / 60.0;
    /// Fireworks timestep (30 Hz)
    pub const FIREWORKS_DT: f32 = 1.0 / 30.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Largest accepted per-update touch delta (degrees)
    pub const MAX_TOUCH_DELTA: f32 = 30.0;
    /// Touch-derived speed cap (deg/s); one 60 Hz step stays well under half a turn
    pub const MAX_ANGULAR_VELOCITY: f32 = 3600.0;
    /// Fraction of touch velocity kept when the finger lifts
    pub const INERTIA_HANDOFF: f32 = 0.8;
    /// Viscous friction coefficient (1/s)
    pub const FRICTION_COEFFICIENT: f32 = 2.0;
    /// Multiplicative per-tick damping
    pub const DAMPING_FACTOR: f32 = 0.985;
    /// Below this speed (deg/s) a free spin snaps to rest
    pub const REST_VELOCITY: f32 = 0.01;
    /// Speed (deg/s) that maps to full haptic intensity
    pub const HAPTIC_VELOCITY_SCALE: f32 = 800.0;
    pub const HAPTIC_MIN_INTENSITY: f32 = 0.3;
    pub const HAPTIC_MAX_INTENSITY: f32 = 0.8;
    /// Minimum spacing between velocity haptics (seconds)
    pub const HAPTIC_MIN_INTERVAL: f64 = 0.030;

    /// Spacing between staggered notch pulses (seconds)
    pub const NOTCH_STAGGER: f64 = 0.010;
    /// Release speed (deg/s) that counts as a spin
    pub const SPIN_RELEASE_VELOCITY: f32 = 180.0;

    /// Milestones land on multiples of this
    pub const MILESTONE_STEP: u64 = 100;
    /// Stats are written every N counted events
    pub const STATS_SAVE_INTERVAL: u64 = 10;
}

/// Host viewport in points, supplied once per session start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    #[inline]
    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        // iPhone 14 logical size
        Self::new(390.0, 844.0)
    }
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest-path delta from `from` to `to`, in (-180, 180]
#[inline]
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}
