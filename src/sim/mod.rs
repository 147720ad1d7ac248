//! Dial simulation module
//!
//! Everything here is pure and deterministic:
//! - Fixed timestep for the free spin
//! - Explicit timestamps instead of wall-clock reads
//! - No rendering or platform dependencies

pub mod dial;
pub mod milestone;
pub mod notch;

pub use dial::{AngularPhysicsSimulator, AngularState, DialTuning, velocity_intensity};
pub use milestone::MilestoneTrigger;
pub use notch::{NotchCrossingEvent, NotchFeedbackDetector};
