//! Notch detection: continuous angle in, discrete ticks out

use serde::{Deserialize, Serialize};

use super::dial::velocity_intensity;
use crate::consts::{HAPTIC_MAX_INTENSITY, NOTCH_STAGGER};
use crate::{normalize_degrees, shortest_delta};

/// Result of one angle update that crossed at least one notch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotchCrossingEvent {
    pub velocity_magnitude: f32,
    pub notches_crossed: u32,
    /// +1.0 clockwise, -1.0 counter-clockwise
    pub direction: f32,
}

impl NotchCrossingEvent {
    /// Haptic intensity for each pulse, capped at 0.8
    pub fn intensity(&self) -> f32 {
        velocity_intensity(self.velocity_magnitude).min(HAPTIC_MAX_INTENSITY)
    }

    /// Offsets (seconds) at which each pulse should fire
    pub fn pulse_offsets(&self) -> impl Iterator<Item = f64> {
        (0..self.notches_crossed).map(|i| i as f64 * NOTCH_STAGGER)
    }
}

/// Converts angle updates into notch crossings at a fixed interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotchFeedbackDetector {
    /// Degrees between notches
    interval: f32,
    /// Angle of the last notch that fired
    reference_angle: f32,
}

impl NotchFeedbackDetector {
    pub fn new(interval: f32, start_angle: f32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            reference_angle: normalize_degrees(start_angle),
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn reference_angle(&self) -> f32 {
        self.reference_angle
    }

    /// Switch notch spacing (dial mode change); keeps the reference angle
    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval.max(f32::EPSILON);
    }

    /// Re-anchor without emitting anything (touch start, mode switch)
    pub fn reset(&mut self, angle: f32) {
        self.reference_angle = normalize_degrees(angle);
    }

    /// Feed the latest dial angle
    pub fn update(&mut self, angle: f32, velocity: f32) -> Option<NotchCrossingEvent> {
        let delta = shortest_delta(self.reference_angle, angle);
        let magnitude = delta.abs();
        let half = self.interval / 2.0;
        if magnitude < half {
            return None;
        }

        let notches = ((magnitude + half) / self.interval).floor() as u32;
        if notches == 0 {
            return None;
        }

        let direction = delta.signum();
        self.reference_angle =
            normalize_degrees(self.reference_angle + direction * notches as f32 * self.interval);

        Some(NotchCrossingEvent {
            velocity_magnitude: velocity.abs(),
            notches_crossed: notches,
            direction,
        })
    }
}
