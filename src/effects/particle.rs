//! Shared particle type and colour palettes

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opacity at or below which a particle is considered gone
pub const OPACITY_EPSILON: f32 = 0.01;

/// RGBA colour, components in [0, 1]
pub type Rgba = [f32; 4];

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub initial_size: f32,
    pub color: Rgba,
    /// 0-1
    pub opacity: f32,
    /// Degrees
    pub rotation: f32,
    /// Degrees per second
    pub rotation_speed: f32,
    /// Seconds since spawn
    pub life_time: f32,
    pub max_life_time: f32,
}

impl Particle {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, size: f32, color: Rgba, max_life_time: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            size,
            initial_size: size,
            color,
            opacity: 1.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            life_time: 0.0,
            max_life_time,
        }
    }

    /// Fraction of max lifetime used, 0-1
    #[inline]
    pub fn life_fraction(&self) -> f32 {
        if self.max_life_time <= 0.0 {
            1.0
        } else {
            (self.life_time / self.max_life_time).clamp(0.0, 1.0)
        }
    }

    /// Dead particles are dropped at the end of the tick
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.opacity <= OPACITY_EPSILON || self.life_time > self.max_life_time
    }
}

/// Monotonic id source for an engine's entities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> u32 {
        self.next = self.next.wrapping_add(1);
        self.next
    }
}

/// Colour palettes
pub mod palette {
    use super::Rgba;

    pub const FIREWORK: [Rgba; 8] = [
        [1.0, 0.25, 0.3, 1.0],  // red
        [1.0, 0.75, 0.2, 1.0],  // gold
        [0.3, 0.85, 1.0, 1.0],  // cyan
        [0.55, 1.0, 0.35, 1.0], // green
        [0.85, 0.4, 1.0, 1.0],  // violet
        [1.0, 0.5, 0.85, 1.0],  // pink
        [1.0, 1.0, 1.0, 1.0],   // white
        [1.0, 0.55, 0.15, 1.0], // orange
    ];
    pub const ROCKET: Rgba = [1.0, 0.9, 0.7, 1.0];
    pub const FLASH: Rgba = [1.0, 1.0, 0.95, 1.0];
    pub const COIN: Rgba = [1.0, 0.82, 0.2, 1.0];
    pub const COIN_SHADE: Rgba = [0.9, 0.65, 0.1, 1.0];
    pub const CRACK_RADIAL: Rgba = [0.92, 0.96, 1.0, 0.95];
    pub const CRACK_CONNECTIVE: Rgba = [0.8, 0.88, 0.95, 0.7];
}

/// Pick a random colour from a palette
pub fn pick_color(rng: &mut impl Rng, colors: &[Rgba]) -> Rgba {
    colors[rng.random_range(0..colors.len())]
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_by_opacity_or_lifetime() {
        let mut p = Particle::new(1, Vec2::ZERO, Vec2::ZERO, 3.0, palette::FLASH, 1.0);
        assert!(!p.is_expired());
        p.life_time = 1.01;
        assert!(p.is_expired());

        let mut p = Particle::new(2, Vec2::ZERO, Vec2::ZERO, 3.0, palette::FLASH, 1.0);
        p.opacity = 0.005;
        assert!(p.is_expired());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = IdAllocator::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
    }
}
