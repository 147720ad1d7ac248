//! Render hand-off
//!
//! The core does not draw. Each frame the host polls the engines for
//! GPU-ready instances and uploads them as-is.

pub mod instance;

pub use instance::{LineVertex, SpriteInstance, SpriteKind};
