//! Instance types for 2D sprite and line rendering

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// What a sprite instance should look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SpriteKind {
    Dot = 0,
    Star = 1,
    Flash = 2,
    Coin = 3,
    Rocket = 4,
}

/// One textured quad, screen space (points, y down)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpriteInstance {
    pub center: [f32; 2],
    pub size: f32,
    /// Radians
    pub rotation: f32,
    /// Straight alpha; session fade already folded in
    pub color: [f32; 4],
    pub kind: u32,
    pub _pad: [u32; 3],
}

impl SpriteInstance {
    pub fn new(kind: SpriteKind, center: Vec2, size: f32, rotation_deg: f32, color: [f32; 4], alpha: f32) -> Self {
        Self {
            center: center.to_array(),
            size,
            rotation: rotation_deg.to_radians(),
            color: [color[0], color[1], color[2], (color[3] * alpha).clamp(0.0, 1.0)],
            kind: kind as u32,
            _pad: [0; 3],
        }
    }

    pub fn alpha(&self) -> f32 {
        self.color[3]
    }
}

/// Vertex for line-strip rendering (crack polylines)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 2],
    pub width: f32,
    pub _pad: f32,
    pub color: [f32; 4],
}

impl LineVertex {
    pub fn new(position: Vec2, width: f32, color: [f32; 4], alpha: f32) -> Self {
        Self {
            position: position.to_array(),
            width,
            _pad: 0.0,
            color: [color[0], color[1], color[2], (color[3] * alpha).clamp(0.0, 1.0)],
        }
    }
}
