//! Coin rain engine
//!
//! Coins drop in jittered waves from above the top edge, wobble sideways and
//! spin as they fall. A coin that leaves the bottom is recycled back to the
//! top instead of being removed, so the collection never grows past its cap.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::particle::{IdAllocator, Particle, palette};
use super::session::{EffectSession, SessionTick};
use crate::Viewport;
use crate::feedback::{FeedbackQueue, FeedbackRequest, HapticPattern, SoundEvent};
use crate::renderer::{SpriteInstance, SpriteKind};

/// Coin rain tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinRainConfig {
    pub session_duration: f32,
    /// Fade starts this many seconds before the end
    pub fade_duration: f32,
    pub wave_size: (usize, usize),
    /// Seconds between waves, re-rolled each cycle
    pub wave_interval: (f32, f32),
    pub max_coins: usize,
    /// Points per second
    pub fall_speed: (f32, f32),
    /// Points per second squared
    pub fall_acceleration: (f32, f32),
    pub wobble_amplitude: (f32, f32),
    /// Radians per second
    pub wobble_speed: (f32, f32),
    pub size: (f32, f32),
    /// Chance of a drop sound per wave cycle
    pub drop_sound_chance: f64,
}

impl Default for CoinRainConfig {
    fn default() -> Self {
        Self {
            session_duration: 12.0,
            fade_duration: 3.0,
            wave_size: (8, 15),
            wave_interval: (0.3, 0.8),
            max_coins: 60,
            fall_speed: (150.0, 300.0),
            fall_acceleration: (20.0, 60.0),
            wobble_amplitude: (5.0, 20.0),
            wobble_speed: (2.0, 5.0),
            size: (24.0, 36.0),
            drop_sound_chance: 0.15,
        }
    }
}

impl CoinRainConfig {
    pub fn reduced(mut self) -> Self {
        self.max_coins /= 2;
        self
    }
}

/// A falling coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub particle: Particle,
    /// Horizontal anchor the wobble oscillates around
    pub base_x: f32,
    pub fall_acceleration: f32,
    pub wobble_phase: f32,
    pub wobble_speed: f32,
    pub wobble_amplitude: f32,
    /// Times this coin has been recycled to the top
    pub recycled: u32,
}

/// Coin rain particle engine
#[derive(Debug, Clone)]
pub struct CoinRainEngine {
    config: CoinRainConfig,
    rng: Pcg32,
    ids: IdAllocator,
    session: EffectSession,
    viewport: Viewport,
    coins: Vec<Coin>,
    next_wave_at: f32,
}

impl CoinRainEngine {
    pub fn new(config: CoinRainConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            ids: IdAllocator::default(),
            session: EffectSession::new(),
            viewport: Viewport::default(),
            coins: Vec::new(),
            next_wave_at: 0.0,
        }
    }

    pub fn set_config(&mut self, config: CoinRainConfig) {
        self.config = config;
    }

    pub fn session(&self) -> &EffectSession {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Start a session; an active session is reset and restarted
    pub fn start(&mut self, viewport: Viewport, feedback: &mut FeedbackQueue) {
        if self.session.is_active() {
            log::info!("Coin rain already running, restarting");
        }
        self.coins.clear();
        self.viewport = viewport;
        self.session.begin();
        self.next_wave_at = 0.0;
        feedback.push(FeedbackRequest::Sound(SoundEvent::CoinRain));
        log::info!("Coin rain started ({}x{})", viewport.width, viewport.height);
    }

    /// Soft stop
    pub fn stop(&mut self) {
        if self.session.begin_fade(self.config.fade_duration) {
            log::info!("Coin rain fading out");
        }
    }

    pub fn clear(&mut self) {
        self.session.end();
        self.coins.clear();
    }

    fn roll(rng: &mut Pcg32, range: (f32, f32)) -> f32 {
        if range.1 > range.0 {
            rng.random_range(range.0..range.1)
        } else {
            range.0
        }
    }

    /// Randomize a coin's fall parameters and park it above the top edge
    fn respawn(&mut self, index: usize) {
        let w = self.viewport.width;
        let size = self.coins[index].particle.initial_size;
        let base_x = self.rng.random_range(0.0..w.max(1.0));
        let fall_speed = Self::roll(&mut self.rng, self.config.fall_speed);
        let amplitude = Self::roll(&mut self.rng, self.config.wobble_amplitude);
        let lift = self.rng.random_range(0.0..100.0);

        let coin = &mut self.coins[index];
        coin.base_x = base_x;
        coin.wobble_amplitude = amplitude;
        coin.particle.pos = Vec2::new(base_x, -size - lift);
        coin.particle.vel = Vec2::new(0.0, fall_speed);
        coin.recycled += 1;
    }

    fn spawn_coin(&mut self) {
        let w = self.viewport.width;
        let size = Self::roll(&mut self.rng, self.config.size);
        let base_x = self.rng.random_range(0.0..w.max(1.0));
        let lift = self.rng.random_range(0.0..100.0);
        let fall_speed = Self::roll(&mut self.rng, self.config.fall_speed);
        let shade = if self.rng.random_bool(0.3) {
            palette::COIN_SHADE
        } else {
            palette::COIN
        };

        // Lifetime is governed by the session, not the coin
        let mut particle = Particle::new(
            self.ids.next_id(),
            Vec2::new(base_x, -size - lift),
            Vec2::new(0.0, fall_speed),
            size,
            shade,
            f32::INFINITY,
        );
        particle.rotation = self.rng.random_range(0.0..360.0);
        let spin = self.rng.random_range(90.0..270.0);
        particle.rotation_speed = if self.rng.random_bool(0.5) { spin } else { -spin };

        let coin = Coin {
            particle,
            base_x,
            fall_acceleration: Self::roll(&mut self.rng, self.config.fall_acceleration),
            wobble_phase: self.rng.random_range(0.0..std::f32::consts::TAU),
            wobble_speed: Self::roll(&mut self.rng, self.config.wobble_speed),
            wobble_amplitude: Self::roll(&mut self.rng, self.config.wobble_amplitude),
            recycled: 0,
        };
        self.coins.push(coin);
    }

    fn spawn_wave(&mut self, feedback: &mut FeedbackQueue) {
        let (lo, hi) = self.config.wave_size;
        let wanted = self.rng.random_range(lo..=hi.max(lo));
        let room = self.config.max_coins.saturating_sub(self.coins.len());
        for _ in 0..wanted.min(room) {
            self.spawn_coin();
        }
        if self.rng.random_bool(self.config.drop_sound_chance) {
            feedback.push(FeedbackRequest::Sound(SoundEvent::CoinDrop));
            feedback.push(FeedbackRequest::haptic(HapticPattern::CoinDrop, 0.4));
        }
    }

    /// Advance one 60 Hz step
    pub fn tick(&mut self, dt: f32, feedback: &mut FeedbackQueue) {
        match self.session.tick(dt) {
            SessionTick::Idle => return,
            SessionTick::Finished => {
                log::info!("Coin rain finished");
                self.clear();
                return;
            }
            SessionTick::Live => {}
        }

        let elapsed = self.session.elapsed();
        if !self.session.is_fading() {
            let fade_at = self.config.session_duration - self.config.fade_duration;
            if elapsed >= fade_at {
                self.stop();
            } else if elapsed >= self.next_wave_at {
                self.spawn_wave(feedback);
                self.next_wave_at = elapsed + Self::roll(&mut self.rng, self.config.wave_interval);
            }
        }

        let w = self.viewport.width;
        let h = self.viewport.height;
        let mut fallen = Vec::new();
        for (i, coin) in self.coins.iter_mut().enumerate() {
            let p = &mut coin.particle;
            p.vel.y += coin.fall_acceleration * dt;
            p.pos.y += p.vel.y * dt;
            coin.wobble_phase += coin.wobble_speed * dt;
            let half = p.size / 2.0;
            let x = coin.base_x + coin.wobble_phase.sin() * coin.wobble_amplitude;
            p.pos.x = x.clamp(half, (w - half).max(half));
            p.rotation = (p.rotation + p.rotation_speed * dt).rem_euclid(360.0);
            p.life_time += dt;
            if p.pos.y - half > h {
                fallen.push(i);
            }
        }
        for i in fallen {
            self.respawn(i);
        }
    }

    pub fn sprites(&self, out: &mut Vec<SpriteInstance>) {
        let fade = self.session.opacity();
        for c in &self.coins {
            let p = &c.particle;
            out.push(SpriteInstance::new(SpriteKind::Coin, p.pos, p.size, p.rotation, p.color, p.opacity * fade));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PHYSICS_DT;

    const SCREEN: Viewport = Viewport::new(390.0, 844.0);

    fn started() -> (CoinRainEngine, FeedbackQueue) {
        let mut rain = CoinRainEngine::new(CoinRainConfig::default(), 11);
        let mut feedback = FeedbackQueue::default();
        rain.start(SCREEN, &mut feedback);
        (rain, feedback)
    }

    #[test]
    fn test_first_wave_size() {
        let (mut rain, mut feedback) = started();
        rain.tick(PHYSICS_DT, &mut feedback);
        let n = rain.coins().len();
        assert!((8..=15).contains(&n), "wave of {n}");
        assert!(rain.coins().iter().all(|c| c.particle.pos.y < 0.0));
    }

    #[test]
    fn test_coin_count_bounded_and_recycled() {
        let config = CoinRainConfig {
            session_duration: 600.0,
            ..Default::default()
        };
        let mut rain = CoinRainEngine::new(config, 5);
        let mut feedback = FeedbackQueue::default();
        rain.start(SCREEN, &mut feedback);
        for _ in 0..(120.0 / PHYSICS_DT) as usize {
            rain.tick(PHYSICS_DT, &mut feedback);
            assert!(rain.coins().len() <= 60);
        }
        assert_eq!(rain.coins().len(), 60);
        assert!(rain.coins().iter().any(|c| c.recycled > 0));
    }

    #[test]
    fn test_coins_stay_inside_horizontally() {
        let (mut rain, mut feedback) = started();
        for _ in 0..300 {
            rain.tick(PHYSICS_DT, &mut feedback);
            for c in rain.coins() {
                let half = c.particle.size / 2.0;
                assert!(c.particle.pos.x >= half - 1e-3);
                assert!(c.particle.pos.x <= SCREEN.width - half + 1e-3);
            }
        }
    }

    #[test]
    fn test_session_fades_and_ends_at_twelve_seconds() {
        let (mut rain, mut feedback) = started();
        let mut ticks = 0;
        let mut saw_fade = false;
        while rain.is_active() {
            rain.tick(PHYSICS_DT, &mut feedback);
            if rain.session().is_fading() {
                saw_fade = true;
                assert!(rain.session().elapsed() >= 9.0);
            }
            ticks += 1;
            assert!(ticks < 2000);
        }
        assert!(saw_fade);
        let seconds = ticks as f32 * PHYSICS_DT;
        assert!((11.9..12.2).contains(&seconds), "ended after {seconds}s");
        assert!(rain.coins().is_empty());
    }

    #[test]
    fn test_restart_clears_coins() {
        let (mut rain, mut feedback) = started();
        for _ in 0..120 {
            rain.tick(PHYSICS_DT, &mut feedback);
        }
        assert!(!rain.coins().is_empty());
        rain.start(SCREEN, &mut feedback);
        assert!(rain.coins().is_empty());
    }
}
