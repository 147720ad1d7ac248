//! Single-axis rotation simulator for the main dial
//!
//! Two modes:
//! - Touch control: the finger owns the angle, velocity is derived from deltas
//! - Free spin: velocity decays under friction + damping at a fixed timestep

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{normalize_degrees, shortest_delta};

/// Rotational state of the dial
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AngularState {
    /// Degrees, always in [0, 360)
    pub angle: f32,
    /// Degrees per second
    pub angular_velocity: f32,
    /// Degrees per second squared (last free-spin tick)
    pub angular_acceleration: f32,
    pub is_under_touch_control: bool,
}

/// Tunables for the free-spin integrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DialTuning {
    pub friction_coefficient: f32,
    pub damping_factor: f32,
    pub rest_velocity: f32,
    pub max_touch_delta: f32,
    /// Touch-derived speed cap (deg/s)
    pub max_velocity: f32,
    pub inertia_handoff: f32,
}

impl Default for DialTuning {
    fn default() -> Self {
        Self {
            friction_coefficient: FRICTION_COEFFICIENT,
            damping_factor: DAMPING_FACTOR,
            rest_velocity: REST_VELOCITY,
            max_touch_delta: MAX_TOUCH_DELTA,
            max_velocity: MAX_ANGULAR_VELOCITY,
            inertia_handoff: INERTIA_HANDOFF,
        }
    }
}

/// Damped rotational mass with a touch override
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngularPhysicsSimulator {
    state: AngularState,
    tuning: DialTuning,
    /// Timestamp of the last touch sample (seconds)
    last_touch_time: f64,
    /// Angle where the current touch began
    touch_reference: f32,
    /// Last clamped touch delta (degrees)
    last_delta: f32,
    /// Most recent touch-derived velocity, used for the inertia handoff
    last_touch_velocity: f32,
    /// Time of the last non-zero haptic intensity
    last_haptic_time: Option<f64>,
    /// Absolute degrees travelled since construction
    total_travel: f64,
}

impl Default for AngularPhysicsSimulator {
    fn default() -> Self {
        Self::new(DialTuning::default())
    }
}

impl AngularPhysicsSimulator {
    pub fn new(tuning: DialTuning) -> Self {
        Self {
            state: AngularState::default(),
            tuning,
            last_touch_time: 0.0,
            touch_reference: 0.0,
            last_delta: 0.0,
            last_touch_velocity: 0.0,
            last_haptic_time: None,
            total_travel: 0.0,
        }
    }

    pub fn state(&self) -> &AngularState {
        &self.state
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.state.angle
    }

    #[inline]
    pub fn velocity(&self) -> f32 {
        self.state.angular_velocity
    }

    #[inline]
    pub fn is_touching(&self) -> bool {
        self.state.is_under_touch_control
    }

    /// Last clamped per-update touch delta
    pub fn last_delta(&self) -> f32 {
        self.last_delta
    }

    pub fn last_touch_velocity(&self) -> f32 {
        self.last_touch_velocity
    }

    pub fn touch_reference(&self) -> f32 {
        self.touch_reference
    }

    /// Total absolute rotation in degrees (touch + free spin)
    pub fn total_travel(&self) -> f64 {
        self.total_travel
    }

    /// Enter touch control at the given angle
    pub fn start_touch(&mut self, initial_angle: f32, now: f64) {
        let angle = normalize_degrees(initial_angle);
        self.state.is_under_touch_control = true;
        self.state.angular_velocity = 0.0;
        self.state.angular_acceleration = 0.0;
        self.state.angle = angle;
        self.touch_reference = angle;
        self.last_touch_time = now;
        self.last_delta = 0.0;
        self.last_touch_velocity = 0.0;
    }

    /// Follow the finger to `new_angle`
    ///
    /// Returns the clamped delta that was applied to velocity derivation.
    pub fn update_touch(&mut self, new_angle: f32, now: f64) -> f32 {
        if !self.state.is_under_touch_control {
            return 0.0;
        }

        let max = self.tuning.max_touch_delta;
        let delta = shortest_delta(self.state.angle, new_angle).clamp(-max, max);
        let dt = (now - self.last_touch_time) as f32;

        // Zero-duration samples keep the previous velocity
        if dt > 0.0 {
            let max_velocity = self.tuning.max_velocity;
            self.state.angular_velocity = (delta / dt).clamp(-max_velocity, max_velocity);
            self.last_touch_velocity = self.state.angular_velocity;
            self.last_touch_time = now;
        }

        self.last_delta = delta;
        self.total_travel += delta.abs() as f64;
        self.state.angle = normalize_degrees(new_angle);
        delta
    }

    /// Release the finger, handing velocity over to the free-spin integrator
    pub fn end_touch(&mut self) {
        if !self.state.is_under_touch_control {
            return;
        }
        self.state.is_under_touch_control = false;
        self.state.angular_velocity = self.last_touch_velocity * self.tuning.inertia_handoff;
        log::debug!(
            "Dial released at {:.1}° with {:.1}°/s",
            self.state.angle,
            self.state.angular_velocity
        );
    }

    /// Advance the free spin by one fixed timestep
    pub fn tick(&mut self, dt: f32) {
        if self.state.is_under_touch_control || dt <= 0.0 {
            return;
        }

        let velocity = self.state.angular_velocity;
        if velocity == 0.0 {
            self.state.angular_acceleration = 0.0;
            return;
        }

        let acceleration = -velocity * self.tuning.friction_coefficient;
        let mut velocity = velocity + acceleration * dt;
        velocity *= self.tuning.damping_factor;
        self.state.angular_acceleration = acceleration;

        if velocity.abs() > self.tuning.rest_velocity {
            let step = velocity * dt;
            self.state.angle = normalize_degrees(self.state.angle + step);
            self.total_travel += step.abs() as f64;
            self.state.angular_velocity = velocity;
        } else {
            self.state.angular_velocity = 0.0;
        }
    }

    /// Haptic strength for the current speed, throttled to one pulse per 30 ms
    ///
    /// Returns 0.0 when throttled or at rest.
    pub fn haptic_intensity_for_velocity(&mut self, now: f64) -> f32 {
        let speed = self.state.angular_velocity.abs();
        if speed <= self.tuning.rest_velocity {
            return 0.0;
        }
        if let Some(last) = self.last_haptic_time {
            if now - last < HAPTIC_MIN_INTERVAL {
                return 0.0;
            }
        }
        self.last_haptic_time = Some(now);
        velocity_intensity(speed)
    }
}

/// Map a speed (deg/s) onto [0.3, 0.8]
#[inline]
pub fn velocity_intensity(speed: f32) -> f32 {
    let t = (speed.abs() / HAPTIC_VELOCITY_SCALE).min(1.0);
    (HAPTIC_MIN_INTENSITY + t * (HAPTIC_MAX_INTENSITY - HAPTIC_MIN_INTENSITY))
        .min(HAPTIC_MAX_INTENSITY)
}
