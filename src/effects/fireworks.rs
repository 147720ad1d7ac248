//! Fireworks engine
//!
//! Each rocket goes `Launching -> Exploding -> Finished`. Rockets climb under
//! gravity toward a target height picked from one of three vertical zones,
//! then burst into fast radial sparks plus a handful of slow stars.
//!
//! Runs at 30 Hz. A session launches on a fixed cadence, force-stops after
//! 30 seconds and fades out before clearing.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::particle::{IdAllocator, OPACITY_EPSILON, Particle, Rgba, direction, palette, pick_color};
use super::session::{EffectSession, SessionTick};
use crate::Viewport;
use crate::feedback::{FeedbackQueue, FeedbackRequest, HapticPattern, SoundEvent};
use crate::renderer::{SpriteInstance, SpriteKind};

/// Rocket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireworkPhase {
    Launching,
    Exploding,
    Finished,
}

/// Vertical band a rocket aims for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeightZone {
    Top,
    Middle,
    Bottom,
}

impl HeightZone {
    pub const ALL: [HeightZone; 3] = [HeightZone::Top, HeightZone::Middle, HeightZone::Bottom];

    #[inline]
    fn index(self) -> usize {
        match self {
            HeightZone::Top => 0,
            HeightZone::Middle => 1,
            HeightZone::Bottom => 2,
        }
    }

    /// Band as fractions of viewport height, measured from the top
    pub fn band(self) -> (f32, f32) {
        match self {
            HeightZone::Top => (0.12, 0.28),
            HeightZone::Middle => (0.28, 0.45),
            HeightZone::Bottom => (0.45, 0.60),
        }
    }

    /// Weight used once every zone has had its guaranteed visits
    fn weight(self) -> f32 {
        match self {
            HeightZone::Top => 0.4,
            HeightZone::Middle => 0.35,
            HeightZone::Bottom => 0.25,
        }
    }
}

/// Keeps early launches spread across all three zones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneBalancer {
    visits: [u32; 3],
    min_visits: u32,
}

impl ZoneBalancer {
    pub fn new(min_visits: u32) -> Self {
        Self {
            visits: [0; 3],
            min_visits,
        }
    }

    pub fn visits(&self, zone: HeightZone) -> u32 {
        self.visits[zone.index()]
    }

    pub fn reset(&mut self) {
        self.visits = [0; 3];
    }

    /// Under-visited zones first (least visited wins, random tie-break),
    /// weighted random after that
    pub fn pick(&mut self, rng: &mut impl Rng) -> HeightZone {
        let lowest = self.visits.iter().copied().min().unwrap_or(0);
        let zone = if lowest < self.min_visits {
            let candidates: Vec<HeightZone> = HeightZone::ALL
                .into_iter()
                .filter(|z| self.visits[z.index()] == lowest)
                .collect();
            candidates[rng.random_range(0..candidates.len())]
        } else {
            let total: f32 = HeightZone::ALL.iter().map(|z| z.weight()).sum();
            let mut roll = rng.random_range(0.0..total);
            let mut chosen = HeightZone::Bottom;
            for zone in HeightZone::ALL {
                if roll < zone.weight() {
                    chosen = zone;
                    break;
                }
                roll -= zone.weight();
            }
            chosen
        };
        self.record(zone);
        zone
    }

    pub fn record(&mut self, zone: HeightZone) {
        self.visits[zone.index()] += 1;
    }
}

/// Fireworks tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireworksConfig {
    /// Seconds between launch waves
    pub launch_interval: f32,
    /// Upper bound on rockets alive at once
    pub max_concurrent: usize,
    pub session_duration: f32,
    pub fade_duration: f32,
    /// Rockets that never explode are finished after this many seconds
    pub launch_timeout: f32,
    /// Explosion fires within this many points of the target height
    pub height_tolerance: f32,
    /// Seconds between explosion-height checks
    pub check_interval: f32,
    /// Rocket gravity (points/s², +y is down)
    pub gravity: f32,
    /// Per-tick horizontal velocity decay
    pub rocket_drag: f32,
    pub burst_particles: usize,
    pub star_particles: usize,
    pub spark_gravity: f32,
    /// Per-tick velocity decay for sparks
    pub spark_drag: f32,
    /// Each zone gets this many launches before weighting kicks in
    pub min_zone_visits: u32,
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            launch_interval: 1.8,
            max_concurrent: 4,
            session_duration: 30.0,
            fade_duration: 1.5,
            launch_timeout: 6.0,
            height_tolerance: 30.0,
            check_interval: 0.1,
            gravity: 600.0,
            rocket_drag: 0.99,
            burst_particles: 80,
            star_particles: 15,
            spark_gravity: 120.0,
            spark_drag: 0.97,
            min_zone_visits: 2,
        }
    }
}

impl FireworksConfig {
    /// Halved particle counts for reduced motion
    pub fn reduced(mut self) -> Self {
        self.burst_particles /= 2;
        self.star_particles /= 2;
        self
    }
}

/// A rocket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Firework {
    pub id: u32,
    pub phase: FireworkPhase,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub base_size: f32,
    pub color: Rgba,
    pub zone: HeightZone,
    pub target_y: f32,
    /// Seconds since launch
    pub age: f32,
    next_check: f32,
}

/// A post-explosion particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spark {
    pub particle: Particle,
    /// Length of the rapid-expansion phase (seconds)
    pub explosion_time: f32,
    pub is_star: bool,
    /// Rocket that produced it
    pub owner: u32,
}

impl Spark {
    fn update(&mut self, dt: f32, gravity: f32, drag: f32) {
        let p = &mut self.particle;
        p.life_time += dt;

        if p.life_time < self.explosion_time {
            // Rapid expansion: straight-line flight, size grows with elapsed fraction
            let frac = p.life_time / self.explosion_time;
            p.size = p.initial_size * (1.0 + frac);
            p.pos += p.vel * dt;
            return;
        }

        p.vel.y += gravity * dt;
        p.vel *= drag;
        p.pos += p.vel * dt;
        p.rotation += p.rotation_speed * dt;

        let life = p.life_fraction();
        if life > 0.5 {
            p.opacity = ((1.0 - life) / 0.5).clamp(0.0, 1.0);
            p.size = p.initial_size * 2.0 * (0.4 + 0.6 * p.opacity);
        } else {
            p.size = p.initial_size * 2.0;
        }
    }
}

/// Burst flash at an explosion point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub opacity: f32,
    pub age: f32,
}

impl Flash {
    const DURATION: f32 = 0.3;

    fn update(&mut self, dt: f32) {
        self.age += dt;
        self.radius += 240.0 * dt;
        self.opacity = (1.0 - self.age / Self::DURATION).max(0.0);
    }
}

/// Fireworks particle engine
#[derive(Debug, Clone)]
pub struct FireworksEngine {
    config: FireworksConfig,
    rng: Pcg32,
    ids: IdAllocator,
    session: EffectSession,
    viewport: Viewport,
    zones: ZoneBalancer,
    fireworks: Vec<Firework>,
    sparks: Vec<Spark>,
    flashes: Vec<Flash>,
    next_launch_at: f32,
    total_launches: u32,
}

impl FireworksEngine {
    pub fn new(config: FireworksConfig, seed: u64) -> Self {
        let zones = ZoneBalancer::new(config.min_zone_visits);
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            ids: IdAllocator::default(),
            session: EffectSession::new(),
            viewport: Viewport::default(),
            zones,
            fireworks: Vec::new(),
            sparks: Vec::new(),
            flashes: Vec::new(),
            next_launch_at: 0.0,
            total_launches: 0,
        }
    }

    pub fn config(&self) -> &FireworksConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FireworksConfig) {
        self.zones.min_visits = config.min_zone_visits;
        self.config = config;
    }

    pub fn session(&self) -> &EffectSession {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn fireworks(&self) -> &[Firework] {
        &self.fireworks
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    pub fn zones(&self) -> &ZoneBalancer {
        &self.zones
    }

    pub fn total_launches(&self) -> u32 {
        self.total_launches
    }

    /// Nothing alive and no session running
    pub fn is_idle(&self) -> bool {
        !self.session.is_active()
            && self.fireworks.is_empty()
            && self.sparks.is_empty()
            && self.flashes.is_empty()
    }

    /// Start a session; an active session is reset and restarted
    pub fn start(&mut self, viewport: Viewport, feedback: &mut FeedbackQueue) {
        if self.session.is_active() {
            log::info!("Fireworks already running, restarting");
        }
        self.clear();
        self.viewport = viewport;
        self.session.begin();
        self.next_launch_at = 0.0;
        self.run_schedule(feedback);
        log::info!(
            "Fireworks session started ({}x{})",
            viewport.width,
            viewport.height
        );
    }

    /// Soft stop: fade everything out, then clear
    pub fn stop(&mut self) {
        if self.session.begin_fade(self.config.fade_duration) {
            log::info!("Fireworks fading out");
        }
    }

    /// Drop every entity and end the session immediately
    pub fn clear(&mut self) {
        self.session.end();
        self.fireworks.clear();
        self.sparks.clear();
        self.flashes.clear();
        self.zones.reset();
    }

    /// Rockets not yet finished
    fn live_rockets(&self) -> usize {
        self.fireworks
            .iter()
            .filter(|f| f.phase != FireworkPhase::Finished)
            .count()
    }

    /// Launch a rocket; `zone` of `None` lets the balancer choose
    pub fn launch(
        &mut self,
        viewport: Viewport,
        zone: Option<HeightZone>,
        feedback: &mut FeedbackQueue,
    ) -> u32 {
        let zone = match zone {
            Some(z) => {
                self.zones.record(z);
                z
            }
            None => self.zones.pick(&mut self.rng),
        };

        // Burst haptics scale against the launch viewport
        self.viewport = viewport;
        // A host that has not laid out yet reports zero size
        let w = viewport.width.max(1.0);
        let h = viewport.height.max(1.0);
        let (lo, hi) = zone.band();
        let target_y = self.rng.random_range(lo * h..hi * h);

        let start = Vec2::new(self.rng.random_range(0.15 * w..0.85 * w), h - 10.0);
        let climb = (start.y - target_y).max(1.0);
        // Small overshoot so the rocket crosses the target before its apex
        let vy = -(2.0 * self.config.gravity * climb).sqrt() * 1.08;
        let vx = self.rng.random_range(-40.0..40.0);

        let id = self.ids.next_id();
        let base_size = self.rng.random_range(4.0..6.0);
        let color = pick_color(&mut self.rng, &palette::FIREWORK);
        self.fireworks.push(Firework {
            id,
            phase: FireworkPhase::Launching,
            pos: start,
            vel: Vec2::new(vx, vy),
            size: base_size,
            base_size,
            color,
            zone,
            target_y,
            age: 0.0,
            next_check: self.config.check_interval,
        });
        self.total_launches += 1;
        feedback.push(FeedbackRequest::Sound(SoundEvent::FireworkLaunch));
        log::debug!("Firework {} launched toward {:?} (y={:.0})", id, zone, target_y);
        id
    }

    /// Advance one 30 Hz step
    pub fn tick(&mut self, dt: f32, feedback: &mut FeedbackQueue) {
        match self.session.tick(dt) {
            SessionTick::Finished => {
                log::info!("Fireworks session finished");
                self.clear();
                return;
            }
            SessionTick::Live if !self.session.is_fading() => self.run_schedule(feedback),
            _ => {}
        }

        if self.fireworks.is_empty() && self.sparks.is_empty() && self.flashes.is_empty() {
            return;
        }

        // Advance everything first
        let mut bursts = Vec::new();
        for fw in self.fireworks.iter_mut() {
            if fw.phase != FireworkPhase::Launching {
                continue;
            }
            fw.age += dt;
            fw.vel.y += self.config.gravity * dt;
            fw.vel.x *= self.config.rocket_drag;
            fw.pos += fw.vel * dt;
            let speed = fw.vel.length();
            fw.size = fw.base_size * (1.0 - (speed / 2000.0).min(0.5));

            if fw.age >= fw.next_check {
                fw.next_check += self.config.check_interval;
                let near = (fw.pos.y - fw.target_y).abs() <= self.config.height_tolerance;
                let crossed = fw.pos.y <= fw.target_y;
                let off_top = fw.pos.y <= 0.0;
                if near || crossed || off_top {
                    fw.phase = FireworkPhase::Exploding;
                    bursts.push(fw.id);
                    continue;
                }
            }

            if fw.age >= self.config.launch_timeout {
                log::warn!("Firework {} timed out before exploding", fw.id);
                fw.phase = FireworkPhase::Finished;
            }
        }

        let (gravity, drag) = (self.config.spark_gravity, self.config.spark_drag);
        for spark in self.sparks.iter_mut() {
            spark.update(dt, gravity, drag);
        }
        for flash in self.flashes.iter_mut() {
            flash.update(dt);
        }

        for id in bursts {
            self.explode(id, feedback);
        }

        // Then remove
        self.sparks.retain(|s| !s.particle.is_expired());
        self.flashes.retain(|f| f.opacity > OPACITY_EPSILON);
        let sparks = &self.sparks;
        for fw in self.fireworks.iter_mut() {
            if fw.phase == FireworkPhase::Exploding && !sparks.iter().any(|s| s.owner == fw.id) {
                fw.phase = FireworkPhase::Finished;
            }
        }
        self.fireworks
            .retain(|fw| fw.phase != FireworkPhase::Finished || sparks.iter().any(|s| s.owner == fw.id));
    }

    fn run_schedule(&mut self, feedback: &mut FeedbackQueue) {
        let elapsed = self.session.elapsed();
        if elapsed >= self.config.session_duration {
            self.stop();
            return;
        }
        while elapsed >= self.next_launch_at {
            self.next_launch_at += self.config.launch_interval;
            let wave = self.rng.random_range(1..=2usize);
            for _ in 0..wave {
                if self.live_rockets() >= self.config.max_concurrent {
                    break;
                }
                let viewport = self.viewport;
                self.launch(viewport, None, feedback);
            }
        }
    }

    /// Burst a rocket into sparks, stars and a flash
    pub fn explode(&mut self, id: u32, feedback: &mut FeedbackQueue) {
        // The rocket may already be gone (timeout/clear)
        let Some(fw) = self.fireworks.iter_mut().find(|f| f.id == id) else {
            return;
        };
        fw.phase = FireworkPhase::Exploding;
        let origin = fw.pos;
        let color = fw.color;

        let n = self.config.burst_particles;
        for i in 0..n {
            let theta = i as f32 / n as f32 * std::f32::consts::TAU + self.rng.random_range(-0.05..0.05);
            let speed = self.rng.random_range(120.0..280.0);
            let size = self.rng.random_range(1.5..3.0);
            let life = self.rng.random_range(1.2..2.0);
            // Every fourth spark is white-hot
            let tint = if i % 4 == 0 { palette::FLASH } else { color };
            let mut particle = Particle::new(self.ids.next_id(), origin, direction(theta) * speed, size, tint, life);
            particle.rotation_speed = self.rng.random_range(-90.0..90.0);
            self.sparks.push(Spark {
                particle,
                explosion_time: self.rng.random_range(0.08..0.2),
                is_star: false,
                owner: id,
            });
        }

        for _ in 0..self.config.star_particles {
            let theta = self.rng.random_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.random_range(40.0..120.0);
            let size = self.rng.random_range(3.5..5.5);
            let life = self.rng.random_range(1.6..2.4);
            let mut particle = Particle::new(self.ids.next_id(), origin, direction(theta) * speed, size, color, life);
            let spin = self.rng.random_range(180.0..360.0);
            particle.rotation_speed = if self.rng.random_bool(0.5) { spin } else { -spin };
            self.sparks.push(Spark {
                particle,
                explosion_time: self.rng.random_range(0.15..0.3),
                is_star: true,
                owner: id,
            });
        }

        self.flashes.push(Flash {
            id: self.ids.next_id(),
            pos: origin,
            radius: 12.0,
            opacity: 1.0,
            age: 0.0,
        });

        let h = self.viewport.height.max(1.0);
        let height_fraction = (1.0 - origin.y / h).clamp(0.0, 1.0);
        feedback.push(FeedbackRequest::haptic(
            HapticPattern::FireworkBurst,
            0.4 + 0.6 * height_fraction,
        ));
        feedback.push(FeedbackRequest::Sound(SoundEvent::FireworkExplosion));
        log::debug!("Firework {} exploded at ({:.0}, {:.0})", id, origin.x, origin.y);
    }

    /// Renderable instances, session fade applied
    pub fn sprites(&self, out: &mut Vec<SpriteInstance>) {
        let fade = self.session.opacity();
        for fw in self.fireworks.iter().filter(|f| f.phase == FireworkPhase::Launching) {
            out.push(SpriteInstance::new(SpriteKind::Rocket, fw.pos, fw.size, 0.0, palette::ROCKET, fade));
        }
        for s in &self.sparks {
            let p = &s.particle;
            let kind = if s.is_star { SpriteKind::Star } else { SpriteKind::Dot };
            out.push(SpriteInstance::new(kind, p.pos, p.size, p.rotation, p.color, p.opacity * fade));
        }
        for f in &self.flashes {
            out.push(SpriteInstance::new(SpriteKind::Flash, f.pos, f.radius * 2.0, 0.0, palette::FLASH, f.opacity * fade));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FIREWORKS_DT;

    const SCREEN: Viewport = Viewport::new(390.0, 844.0);

    fn engine() -> FireworksEngine {
        FireworksEngine::new(FireworksConfig::default(), 7)
    }

    #[test]
    fn test_top_zone_explodes_within_timeout() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        let id = fx.launch(SCREEN, Some(HeightZone::Top), &mut feedback);

        let mut elapsed = 0.0;
        loop {
            fx.tick(FIREWORKS_DT, &mut feedback);
            elapsed += FIREWORKS_DT;
            let fw = fx.fireworks().iter().find(|f| f.id == id).expect("rocket alive");
            if fw.phase == FireworkPhase::Exploding {
                break;
            }
            assert!(elapsed < 6.0, "never exploded");
        }
        assert_eq!(fx.sparks().len(), 95);
        assert_eq!(fx.sparks().iter().filter(|s| s.is_star).count(), 15);
        assert_eq!(fx.flashes().len(), 1);
    }

    #[test]
    fn test_explosion_near_target_height() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        let id = fx.launch(SCREEN, Some(HeightZone::Middle), &mut feedback);
        let target = fx.fireworks()[0].target_y;
        for _ in 0..180 {
            fx.tick(FIREWORKS_DT, &mut feedback);
            if fx.flashes().len() == 1 {
                break;
            }
        }
        let flash = &fx.flashes()[0];
        assert!(flash.pos.y <= target + 30.0, "exploded too low");
        assert!(fx.sparks().iter().all(|s| s.owner == id));
    }

    #[test]
    fn test_every_particle_expires() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.launch(SCREEN, Some(HeightZone::Bottom), &mut feedback);
        // 6 s timeout + 2.4 s max spark life, with margin
        for _ in 0..(10.0 / FIREWORKS_DT) as usize {
            fx.tick(FIREWORKS_DT, &mut feedback);
        }
        assert!(fx.is_idle());
    }

    #[test]
    fn test_timeout_finishes_stuck_rocket() {
        let config = FireworksConfig {
            gravity: 0.0,
            ..Default::default()
        };
        let mut fx = FireworksEngine::new(config, 1);
        let mut feedback = FeedbackQueue::default();
        fx.launch(SCREEN, Some(HeightZone::Top), &mut feedback);
        // Zero gravity means zero launch speed: the rocket never climbs
        for _ in 0..((6.0 / FIREWORKS_DT) as usize + 2) {
            fx.tick(FIREWORKS_DT, &mut feedback);
        }
        assert!(fx.fireworks().is_empty());
        assert!(fx.sparks().is_empty());
    }

    #[test]
    fn test_zone_balancer_visits_each_zone() {
        let mut zones = ZoneBalancer::new(2);
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..6 {
            zones.pick(&mut rng);
        }
        for zone in HeightZone::ALL {
            assert_eq!(zones.visits(zone), 2);
        }
        for _ in 0..30 {
            zones.pick(&mut rng);
        }
        let total: u32 = HeightZone::ALL.iter().map(|z| zones.visits(*z)).sum();
        assert_eq!(total, 36);
    }

    #[test]
    fn test_session_respects_concurrency_and_duration() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.start(SCREEN, &mut feedback);
        let mut ticks = 0;
        while fx.is_active() {
            fx.tick(FIREWORKS_DT, &mut feedback);
            assert!(fx.live_rockets() <= 4);
            ticks += 1;
            assert!(ticks < 2000, "session never ended");
        }
        let seconds = ticks as f32 * FIREWORKS_DT;
        assert!((31.0..32.5).contains(&seconds), "ended after {seconds}s");
        assert!(fx.fireworks().is_empty() && fx.sparks().is_empty());
        assert!(fx.total_launches() > 10);
    }

    #[test]
    fn test_restart_resets_state() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.start(SCREEN, &mut feedback);
        for _ in 0..90 {
            fx.tick(FIREWORKS_DT, &mut feedback);
        }
        assert!(!fx.fireworks().is_empty() || !fx.sparks().is_empty());
        fx.start(SCREEN, &mut feedback);
        assert!(fx.sparks().is_empty());
        assert!(fx.flashes().is_empty());
        // Only the opening wave, all still climbing
        assert!((1..=2).contains(&fx.fireworks().len()));
        assert!(fx.fireworks().iter().all(|f| f.age == 0.0));
        assert_eq!(fx.session().elapsed(), 0.0);
    }

    #[test]
    fn test_stop_fades_then_clears() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.start(SCREEN, &mut feedback);
        for _ in 0..60 {
            fx.tick(FIREWORKS_DT, &mut feedback);
        }
        fx.stop();
        fx.stop();
        assert!(fx.session().is_fading());
        for _ in 0..50 {
            fx.tick(FIREWORKS_DT, &mut feedback);
        }
        assert!(fx.is_idle());
    }

    #[test]
    fn test_no_launches_after_stop() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.start(SCREEN, &mut feedback);
        for _ in 0..30 {
            fx.tick(FIREWORKS_DT, &mut feedback);
        }
        let launched = fx.total_launches();
        fx.stop();
        // The 1.8 s wave falls inside the 1.5 s fade
        for _ in 0..90 {
            fx.tick(FIREWORKS_DT, &mut feedback);
            assert_eq!(fx.total_launches(), launched);
        }
        assert!(!fx.is_active());
        assert!(fx.is_idle());
    }

    #[test]
    fn test_zero_viewport_does_not_panic() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.start(Viewport::new(0.0, 0.0), &mut feedback);
        assert!(fx.total_launches() >= 1);
        for _ in 0..(8.0 / FIREWORKS_DT) as usize {
            fx.tick(FIREWORKS_DT, &mut feedback);
        }
        assert!(fx.fireworks().iter().all(|f| f.pos.is_finite()));
    }

    #[test]
    fn test_burst_haptic_uses_launch_viewport() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        let tall = Viewport::new(390.0, 2000.0);
        fx.launch(tall, Some(HeightZone::Top), &mut feedback);
        for _ in 0..180 {
            fx.tick(FIREWORKS_DT, &mut feedback);
            if !fx.flashes().is_empty() {
                break;
            }
        }
        let mut sink = crate::feedback::RecordingSink::new();
        feedback.flush(0.0, &mut sink);
        let (_, intensity) = sink
            .haptics()
            .find(|(p, _)| *p == HapticPattern::FireworkBurst)
            .expect("burst haptic");
        // Top band of a 2000 pt screen sits above 70% height
        assert!(intensity > 0.8, "intensity {intensity}");
    }
}
