//! Glass crack engine
//!
//! An impact spawns a batch of jagged radial cracks from a point plus a web
//! of connective cracks between neighbouring radials. Every segment waits
//! out its own start delay, then grows along its polyline until fully drawn.
//!
//! A full trigger runs three impacts on a fixed timeline and auto-stops.
//! Batches stack; nothing is cleared until the session ends.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::particle::{direction, palette};
use super::session::{EffectSession, SessionTick, Timeline};
use crate::Viewport;
use crate::feedback::{FeedbackQueue, FeedbackRequest, HapticPattern, SoundEvent};
use crate::renderer::LineVertex;

/// Crack family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrackStyle {
    /// Spoke from the impact point
    Radial,
    /// Web strand between two spokes
    Connective,
}

/// One crack, drawn progressively along its polyline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrackSegment {
    pub polyline: Vec<Vec2>,
    pub width: f32,
    pub style: CrackStyle,
    /// Fraction drawn, 0-1
    pub progress: f32,
    /// Progress added per tick once the delay has elapsed
    pub growth_speed: f32,
    /// Seconds to wait before growing
    pub start_delay: f32,
    /// Concentric level (0 for radials)
    pub level: u32,
    /// Impact that produced it
    pub impact: u32,
}

impl CrackSegment {
    fn update(&mut self, dt: f32) {
        if self.start_delay > 0.0 {
            self.start_delay = (self.start_delay - dt).max(0.0);
            return;
        }
        if self.progress < 1.0 {
            self.progress = (self.progress + self.growth_speed).min(1.0);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Drawn prefix of the polyline, interpolating into the current edge
    pub fn visible_points(&self) -> Vec<Vec2> {
        let n = self.polyline.len();
        if n < 2 || self.progress <= 0.0 {
            return Vec::new();
        }
        let t = self.progress.clamp(0.0, 1.0) * (n - 1) as f32;
        let whole = t.floor() as usize;
        let mut points: Vec<Vec2> = self.polyline[..=whole.min(n - 1)].to_vec();
        if whole < n - 1 {
            let frac = t - whole as f32;
            if frac > 0.0 {
                points.push(self.polyline[whole].lerp(self.polyline[whole + 1], frac));
            }
        }
        points
    }
}

/// Timeline actions for a crack session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrackStep {
    Impact,
    Stop,
}

/// Glass crack tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlassCrackConfig {
    /// Impact offsets from session start (seconds)
    pub impact_times: Vec<f32>,
    pub session_duration: f32,
    pub fade_duration: f32,
    pub radial_count: (u32, u32),
    pub connective_levels: (u32, u32),
    /// Only neighbours closer than this (degrees) get a web
    pub max_web_gap: f32,
    pub connective_chance: f64,
    /// Points per jag subdivision
    pub jag_spacing: f32,
    /// Max perpendicular-ish offset for interior jag points
    pub jag_offset: f32,
    /// Impacts land inside this fraction of the viewport edge
    pub safe_inset: f32,
}

impl Default for GlassCrackConfig {
    fn default() -> Self {
        Self {
            impact_times: vec![0.0, 5.5, 11.0],
            session_duration: 18.0,
            fade_duration: 2.0,
            radial_count: (7, 12),
            connective_levels: (5, 9),
            max_web_gap: 100.0,
            connective_chance: 0.8,
            jag_spacing: 25.0,
            jag_offset: 6.0,
            safe_inset: 0.15,
        }
    }
}

impl GlassCrackConfig {
    pub fn reduced(mut self) -> Self {
        self.connective_levels = (
            (self.connective_levels.0 / 2).max(1),
            (self.connective_levels.1 / 2).max(1),
        );
        self
    }
}

/// Glass crack particle engine
#[derive(Debug, Clone)]
pub struct GlassCrackEngine {
    config: GlassCrackConfig,
    rng: Pcg32,
    session: EffectSession,
    viewport: Viewport,
    segments: Vec<CrackSegment>,
    impacts: Vec<Vec2>,
    timeline: Timeline<CrackStep>,
}

impl GlassCrackEngine {
    pub fn new(config: GlassCrackConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            session: EffectSession::new(),
            viewport: Viewport::default(),
            segments: Vec::new(),
            impacts: Vec::new(),
            timeline: Timeline::new(),
        }
    }

    pub fn set_config(&mut self, config: GlassCrackConfig) {
        self.config = config;
    }

    pub fn session(&self) -> &EffectSession {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn segments(&self) -> &[CrackSegment] {
        &self.segments
    }

    /// Impact points of the current session, in order
    pub fn impacts(&self) -> &[Vec2] {
        &self.impacts
    }

    /// Full three-impact sequence
    ///
    /// Ignored while a session is active. Returns whether it started.
    pub fn trigger(&mut self, viewport: Viewport, feedback: &mut FeedbackQueue) -> bool {
        if self.session.is_active() {
            log::debug!("Glass crack already active, trigger ignored");
            return false;
        }
        self.begin(viewport);
        let mut timeline = Timeline::from_steps(
            self.config
                .impact_times
                .iter()
                .map(|&t| (t, CrackStep::Impact)),
        );
        timeline.add(self.config.session_duration, CrackStep::Stop);
        self.timeline = timeline;
        // Impacts at t=0 land immediately
        self.run_timeline(feedback);
        log::info!("Glass crack session started");
        true
    }

    /// One impact at `point` (random safe point if `None`)
    ///
    /// Starts a session when idle; when one is running the batch layers on
    /// top of it. Only refused while fading out.
    pub fn trigger_single_impact(
        &mut self,
        viewport: Viewport,
        point: Option<Vec2>,
        feedback: &mut FeedbackQueue,
    ) -> bool {
        if self.session.is_fading() {
            return false;
        }
        if !self.session.is_active() {
            self.begin(viewport);
            self.timeline = Timeline::from_steps([(self.config.session_duration, CrackStep::Stop)]);
        }
        let point = point.unwrap_or_else(|| self.random_impact_point());
        self.impact(point, feedback);
        true
    }

    fn begin(&mut self, viewport: Viewport) {
        self.segments.clear();
        self.impacts.clear();
        self.viewport = viewport;
        self.session.begin();
    }

    /// Soft stop
    pub fn stop(&mut self) {
        if self.session.begin_fade(self.config.fade_duration) {
            log::info!("Glass crack fading out");
        }
    }

    pub fn clear(&mut self) {
        self.session.end();
        self.timeline.clear();
        self.segments.clear();
        self.impacts.clear();
    }

    fn random_impact_point(&mut self) -> Vec2 {
        let inset = self.config.safe_inset.clamp(0.0, 0.49);
        let w = self.viewport.width.max(1.0);
        let h = self.viewport.height.max(1.0);
        Vec2::new(
            self.rng.random_range(inset * w..(1.0 - inset) * w),
            self.rng.random_range(inset * h..(1.0 - inset) * h),
        )
    }

    fn run_timeline(&mut self, feedback: &mut FeedbackQueue) {
        if self.session.is_fading() {
            return;
        }
        for step in self.timeline.advance(self.session.elapsed()) {
            // A Stop earlier in this batch ends the run
            if !self.session.is_active() || self.session.is_fading() {
                break;
            }
            match step {
                CrackStep::Impact => {
                    let point = self.random_impact_point();
                    self.impact(point, feedback);
                }
                CrackStep::Stop => self.stop(),
            }
        }
    }

    /// Advance one 60 Hz step
    pub fn tick(&mut self, dt: f32, feedback: &mut FeedbackQueue) {
        match self.session.tick(dt) {
            SessionTick::Idle => return,
            SessionTick::Finished => {
                log::info!("Glass crack finished");
                self.clear();
                return;
            }
            SessionTick::Live => self.run_timeline(feedback),
        }

        for seg in self.segments.iter_mut() {
            seg.update(dt);
        }
    }

    /// Jagged polyline from `a` to `b`; endpoints are exact
    fn jagged_line(&mut self, a: Vec2, b: Vec2) -> Vec<Vec2> {
        let distance = a.distance(b);
        let pieces = ((distance / self.config.jag_spacing) as usize).max(2);
        let offset = self.config.jag_offset;
        let mut points = Vec::with_capacity(pieces + 1);
        points.push(a);
        for i in 1..pieces {
            let t = i as f32 / pieces as f32;
            let jitter = Vec2::new(
                self.rng.random_range(-offset..=offset),
                self.rng.random_range(-offset..=offset),
            );
            points.push(a.lerp(b, t) + jitter);
        }
        points.push(b);
        points
    }

    /// Spawn one batch of cracks radiating from `point`
    pub fn impact(&mut self, point: Vec2, feedback: &mut FeedbackQueue) {
        let impact_id = self.impacts.len() as u32;
        self.impacts.push(point);

        let (lo, hi) = self.config.radial_count;
        let count = self.rng.random_range(lo..=hi.max(lo)) as usize;
        let reach = self.viewport.min_side();

        let mut spokes: Vec<(f32, f32)> = (0..count)
            .map(|_| {
                let angle = self.rng.random_range(0.0..360.0f32);
                let length = self.rng.random_range(0.45..0.9) * reach;
                (angle, length)
            })
            .collect();
        spokes.sort_by(|a, b| a.0.total_cmp(&b.0));

        let before = self.segments.len();
        for &(angle, length) in &spokes {
            let end = point + direction(angle.to_radians()) * length;
            let polyline = self.jagged_line(point, end);
            self.segments.push(CrackSegment {
                polyline,
                width: self.rng.random_range(1.5..3.0),
                style: CrackStyle::Radial,
                progress: 0.0,
                growth_speed: self.rng.random_range(0.04..0.07),
                start_delay: self.rng.random_range(0.0..0.12),
                level: 0,
                impact: impact_id,
            });
        }

        for i in 0..spokes.len() {
            let (a_angle, a_len) = spokes[i];
            let (b_angle, b_len) = spokes[(i + 1) % spokes.len()];
            let gap = (b_angle - a_angle).rem_euclid(360.0);
            if gap >= self.config.max_web_gap || gap == 0.0 {
                continue;
            }
            let (lo, hi) = self.config.connective_levels;
            let levels = self.rng.random_range(lo..=hi.max(lo));
            let dir_a = direction(a_angle.to_radians());
            let dir_b = direction(b_angle.to_radians());
            let span = a_len.min(b_len);
            for level in 1..=levels {
                if !self.rng.random_bool(self.config.connective_chance) {
                    continue;
                }
                let r = level as f32 / (levels + 1) as f32 * span;
                let polyline = self.jagged_line(point + dir_a * r, point + dir_b * r);
                // Outer rings wait longer so the web spreads outward
                let start_delay = 0.15 + level as f32 * 0.08 + self.rng.random_range(0.0..0.1);
                self.segments.push(CrackSegment {
                    polyline,
                    width: self.rng.random_range(0.6..1.2),
                    style: CrackStyle::Connective,
                    progress: 0.0,
                    growth_speed: self.rng.random_range(0.05..0.09),
                    start_delay,
                    level,
                    impact: impact_id,
                });
            }
        }

        feedback.push(FeedbackRequest::haptic(HapticPattern::GlassImpact, 1.0));
        feedback.push(FeedbackRequest::Sound(SoundEvent::GlassCrack));
        log::debug!(
            "Impact {} at ({:.0}, {:.0}): {} radials, {} segments",
            impact_id,
            point.x,
            point.y,
            count,
            self.segments.len() - before
        );
    }

    /// Visible crack strips, one `Vec` per segment, session fade applied
    pub fn crack_lines(&self) -> Vec<Vec<LineVertex>> {
        let fade = self.session.opacity();
        self.segments
            .iter()
            .filter_map(|seg| {
                let points = seg.visible_points();
                if points.len() < 2 {
                    return None;
                }
                let color = match seg.style {
                    CrackStyle::Radial => palette::CRACK_RADIAL,
                    CrackStyle::Connective => palette::CRACK_CONNECTIVE,
                };
                Some(
                    points
                        .into_iter()
                        .map(|p| LineVertex::new(p, seg.width, color, fade))
                        .collect(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PHYSICS_DT;

    const SCREEN: Viewport = Viewport::new(390.0, 844.0);

    fn engine() -> GlassCrackEngine {
        GlassCrackEngine::new(GlassCrackConfig::default(), 21)
    }

    fn run(engine: &mut GlassCrackEngine, seconds: f32, feedback: &mut FeedbackQueue) {
        for _ in 0..(seconds / PHYSICS_DT).round() as usize {
            engine.tick(PHYSICS_DT, feedback);
        }
    }

    #[test]
    fn test_impact_batch_shape() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.viewport = SCREEN;
        fx.impact(Vec2::new(195.0, 422.0), &mut feedback);

        let radials: Vec<_> = fx.segments().iter().filter(|s| s.style == CrackStyle::Radial).collect();
        assert!((7..=12).contains(&radials.len()));
        // Seven or more spokes always leave at least one gap under 100 degrees
        assert!(fx.segments().iter().any(|s| s.style == CrackStyle::Connective));
        for seg in fx.segments() {
            assert_eq!(seg.progress, 0.0);
            assert!(seg.polyline.len() >= 3);
            if seg.style == CrackStyle::Connective {
                assert!((1..=9).contains(&seg.level));
            }
        }
        for r in &radials {
            assert_eq!(r.polyline[0], Vec2::new(195.0, 422.0));
        }
    }

    #[test]
    fn test_connective_delay_grows_with_level() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.viewport = SCREEN;
        fx.impact(Vec2::new(195.0, 422.0), &mut feedback);
        for seg in fx.segments().iter().filter(|s| s.style == CrackStyle::Connective) {
            let min = 0.15 + seg.level as f32 * 0.08;
            assert!(seg.start_delay >= min && seg.start_delay < min + 0.1);
        }
    }

    #[test]
    fn test_segments_grow_to_completion() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        assert!(fx.trigger_single_impact(SCREEN, Some(Vec2::new(100.0, 300.0)), &mut feedback));
        run(&mut fx, 3.0, &mut feedback);
        assert!(fx.segments().iter().all(|s| s.is_complete()));
        assert!(fx.crack_lines().len() == fx.segments().len());
    }

    #[test]
    fn test_three_impacts_on_schedule() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        assert!(fx.trigger(SCREEN, &mut feedback));
        assert_eq!(fx.impacts().len(), 1);
        run(&mut fx, 5.0, &mut feedback);
        assert_eq!(fx.impacts().len(), 1);
        run(&mut fx, 1.0, &mut feedback);
        assert_eq!(fx.impacts().len(), 2);
        let after_two = fx.segments().len();
        run(&mut fx, 5.5, &mut feedback);
        assert_eq!(fx.impacts().len(), 3);
        // Batches layer; earlier ones are kept
        assert!(fx.segments().len() > after_two);

        for p in fx.impacts() {
            assert!(p.x >= 0.15 * SCREEN.width && p.x <= 0.85 * SCREEN.width);
            assert!(p.y >= 0.15 * SCREEN.height && p.y <= 0.85 * SCREEN.height);
        }
    }

    #[test]
    fn test_auto_stop_and_fade() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.trigger(SCREEN, &mut feedback);
        run(&mut fx, 17.9, &mut feedback);
        assert!(fx.is_active() && !fx.session().is_fading());
        run(&mut fx, 0.2, &mut feedback);
        assert!(fx.session().is_fading());
        run(&mut fx, 2.0, &mut feedback);
        assert!(!fx.is_active());
        assert!(fx.segments().is_empty());
    }

    #[test]
    fn test_retrigger_while_active_is_ignored() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.trigger(SCREEN, &mut feedback);
        run(&mut fx, 1.0, &mut feedback);
        let before: Vec<_> = fx.segments().iter().map(|s| s.polyline.clone()).collect();
        assert!(!fx.trigger(SCREEN, &mut feedback));
        let after: Vec<_> = fx.segments().iter().map(|s| s.polyline.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(fx.session().generation(), 1);
    }

    #[test]
    fn test_single_impact_layers_on_active_session() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.trigger(SCREEN, &mut feedback);
        let before = fx.segments().len();
        assert!(fx.trigger_single_impact(SCREEN, None, &mut feedback));
        assert!(fx.segments().len() > before);
        assert_eq!(fx.impacts().len(), 2);

        fx.stop();
        assert!(!fx.trigger_single_impact(SCREEN, None, &mut feedback));
    }

    #[test]
    fn test_stop_cancels_scheduled_impacts() {
        let mut fx = engine();
        let mut feedback = FeedbackQueue::default();
        fx.trigger(SCREEN, &mut feedback);
        assert_eq!(fx.impacts().len(), 1);
        let mut sink = crate::feedback::RecordingSink::new();
        feedback.flush(0.0, &mut sink);

        fx.stop();
        run(&mut fx, 1.9, &mut feedback);
        assert!(fx.session().is_fading());
        assert_eq!(fx.impacts().len(), 1);

        // Well past the 5.5 s impact
        run(&mut fx, 6.1, &mut feedback);
        assert!(!fx.is_active());
        assert!(fx.impacts().is_empty());
        let mut sink = crate::feedback::RecordingSink::new();
        feedback.flush(f64::INFINITY, &mut sink);
        assert_eq!(sink.count_haptic(HapticPattern::GlassImpact), 0);
    }

    #[test]
    fn test_visible_points_interpolate() {
        let seg = CrackSegment {
            polyline: vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)],
            width: 1.0,
            style: CrackStyle::Radial,
            progress: 0.75,
            growth_speed: 0.1,
            start_delay: 0.0,
            level: 0,
            impact: 0,
        };
        let pts = seg.visible_points();
        assert_eq!(pts.len(), 3);
        assert!((pts[2].x - 15.0).abs() < 1e-4);
    }
}
