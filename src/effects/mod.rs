//! Celebration effects
//!
//! Three independent particle engines, each the sole owner of its entity
//! collections:
//! - Fireworks (30 Hz): rockets, bursts, flashes
//! - Coin rain (60 Hz): recycled falling coins
//! - Glass crack (60 Hz): growing crack polylines
//!
//! Within a tick every entity is advanced before any is removed.

pub mod coin_rain;
pub mod fireworks;
pub mod glass_crack;
pub mod particle;
pub mod session;

pub use coin_rain::{Coin, CoinRainConfig, CoinRainEngine};
pub use fireworks::{
    Firework, FireworkPhase, FireworksConfig, FireworksEngine, Flash, HeightZone, Spark, ZoneBalancer,
};
pub use glass_crack::{CrackSegment, CrackStep, CrackStyle, GlassCrackConfig, GlassCrackEngine};
pub use particle::{OPACITY_EPSILON, Particle, Rgba};
pub use session::{EffectSession, SessionPhase, SessionTick, Timeline};
