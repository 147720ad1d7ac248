//! Composition root
//!
//! `DialToy` owns every component and threads them together:
//! touch -> simulator -> notch detector -> feedback, counters -> milestones
//! -> orchestrator -> effect engines. The host calls `frame` once per display
//! refresh and polls `sprites`/`crack_lines` to draw.

use glam::Vec2;

use crate::Viewport;
use crate::consts::*;
use crate::effects::{CoinRainEngine, FireworksEngine, GlassCrackEngine};
use crate::feedback::{FeedbackQueue, FeedbackRequest, FeedbackSink, HapticPattern, SoundEvent};
use crate::orchestrator::{Celebration, EffectEngines, EffectOrchestrator};
use crate::persistence::KeyValueStore;
use crate::renderer::{LineVertex, SpriteInstance};
use crate::settings::{DialMode, EffectMode, Settings};
use crate::sim::{AngularPhysicsSimulator, MilestoneTrigger, NotchFeedbackDetector};
use crate::stats::{Counter, InteractionStats};

/// Longest frame gap fed to the simulation (seconds)
const MAX_FRAME_DT: f32 = 0.1;

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct FixedStep {
    dt: f32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(dt: f32) -> Self {
        Self { dt, accumulator: 0.0 }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Add frame time and return how many steps to run
    pub fn steps(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);
        let mut steps = 0;
        while self.accumulator >= self.dt && steps < MAX_SUBSTEPS {
            self.accumulator -= self.dt;
            steps += 1;
        }
        // Drop the backlog instead of spiralling
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(self.dt);
        }
        steps
    }
}

/// The whole dial toy core
pub struct DialToy {
    settings: Settings,
    store: Box<dyn KeyValueStore>,
    stats: InteractionStats,
    dial: AngularPhysicsSimulator,
    notches: NotchFeedbackDetector,
    tap_milestones: MilestoneTrigger,
    rotation_milestones: MilestoneTrigger,
    engines: EffectEngines,
    orchestrator: EffectOrchestrator,
    feedback: FeedbackQueue,
    physics_clock: FixedStep,
    fireworks_clock: FixedStep,
    last_frame: Option<f64>,
    /// Dial travel already converted into rotation counts
    counted_travel: f64,
    last_celebration: Option<Celebration>,
}

impl DialToy {
    /// Load settings and counters from `store` and wire everything up
    pub fn new(store: Box<dyn KeyValueStore>, viewport: Viewport, seed: u64) -> Self {
        let settings = Settings::load(store.as_ref());
        let stats = InteractionStats::load_or_default(store.as_ref());
        let tap_milestones =
            MilestoneTrigger::with_last_effect_count(stats.last_milestone_up_to(stats.tap_count));
        let rotation_milestones = MilestoneTrigger::with_last_effect_count(
            stats.last_milestone_up_to(stats.rotation_count),
        );

        log::info!(
            "Dial toy ready: {} mode, {}° notches",
            settings.effect_mode.as_str(),
            settings.dial_mode.notch_interval()
        );

        Self {
            engines: EffectEngines::new(&settings, seed),
            orchestrator: EffectOrchestrator::new(settings.effect_mode, viewport),
            feedback: FeedbackQueue::new(settings.feedback_gate()),
            notches: NotchFeedbackDetector::new(settings.dial_mode.notch_interval(), 0.0),
            dial: AngularPhysicsSimulator::default(),
            physics_clock: FixedStep::new(PHYSICS_DT),
            fireworks_clock: FixedStep::new(FIREWORKS_DT),
            last_frame: None,
            counted_travel: 0.0,
            last_celebration: None,
            tap_milestones,
            rotation_milestones,
            settings,
            stats,
            store,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &InteractionStats {
        &self.stats
    }

    pub fn dial(&self) -> &AngularPhysicsSimulator {
        &self.dial
    }

    pub fn fireworks(&self) -> &FireworksEngine {
        &self.engines.fireworks
    }

    pub fn coin_rain(&self) -> &CoinRainEngine {
        &self.engines.coin_rain
    }

    pub fn glass_crack(&self) -> &GlassCrackEngine {
        &self.engines.glass_crack
    }

    pub fn last_celebration(&self) -> Option<Celebration> {
        self.last_celebration
    }

    pub fn pending_feedback(&self) -> usize {
        self.feedback.len()
    }

    // === Configuration ===

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.orchestrator.set_viewport(viewport);
    }

    pub fn set_effect_mode(&mut self, mode: EffectMode) {
        self.settings.effect_mode = mode;
        self.orchestrator.set_mode(mode);
        self.settings.save(self.store.as_mut());
    }

    pub fn set_dial_mode(&mut self, mode: DialMode) {
        self.settings.dial_mode = mode;
        self.notches.set_interval(mode.notch_interval());
        self.notches.reset(self.dial.angle());
        self.settings.save(self.store.as_mut());
    }

    /// Replace all settings at once
    pub fn update_settings(&mut self, settings: Settings) {
        self.orchestrator.set_mode(settings.effect_mode);
        self.notches.set_interval(settings.dial_mode.notch_interval());
        self.feedback.set_gate(settings.feedback_gate());
        self.engines.apply_settings(&settings);
        self.settings = settings;
        self.settings.save(self.store.as_mut());
    }

    // === Input ===

    pub fn touch_began(&mut self, angle: f32, now: f64) {
        self.dial.start_touch(angle, now);
        self.notches.reset(self.dial.angle());
    }

    pub fn touch_moved(&mut self, angle: f32, now: f64) {
        self.dial.update_touch(angle, now);
        self.detect_notches(now);
        self.count_rotations(now);
    }

    pub fn touch_ended(&mut self, now: f64) {
        self.dial.end_touch();
        if self.dial.velocity().abs() >= SPIN_RELEASE_VELOCITY {
            self.stats.increment(Counter::Spins, now);
            self.maybe_save();
        }
    }

    pub fn tap(&mut self, now: f64) {
        let count = self.stats.increment(Counter::Taps, now);
        self.feedback.push(FeedbackRequest::haptic(HapticPattern::Tap, 0.6));
        self.feedback.push(FeedbackRequest::Sound(SoundEvent::Tap));
        if let Some(milestone) = self.tap_milestones.observe(count) {
            self.celebrate(milestone);
        }
        self.maybe_save();
    }

    /// Start coin rain directly
    pub fn start_coin_rain(&mut self) {
        self.last_celebration =
            Some(self.orchestrator.start(EffectMode::CoinRain, &mut self.engines, &mut self.feedback));
    }

    /// Manual single glass impact
    pub fn glass_impact(&mut self, point: Option<Vec2>) -> bool {
        let viewport = self.orchestrator.viewport();
        self.engines
            .glass_crack
            .trigger_single_impact(viewport, point, &mut self.feedback)
    }

    /// Fade out whatever is playing
    pub fn stop_effects(&mut self) {
        self.engines.stop_all();
    }

    /// App moved to background: persist and drop pending feedback
    pub fn enter_background(&mut self) {
        self.stats.save(self.store.as_mut());
        self.feedback.clear();
        log::info!("Entered background, stats saved");
    }

    // === Frame loop ===

    /// Advance all clocks to `now` and deliver due feedback
    pub fn frame(&mut self, now: f64, sink: &mut dyn FeedbackSink) {
        let frame_dt = match self.last_frame {
            Some(last) => (now - last) as f32,
            None => 0.0,
        };
        self.last_frame = Some(now);

        for _ in 0..self.physics_clock.steps(frame_dt) {
            if !self.dial.is_touching() {
                let before = self.dial.angle();
                self.dial.tick(PHYSICS_DT);
                if self.dial.angle() != before {
                    self.detect_notches(now);
                }
            }
            self.engines.glass_crack.tick(PHYSICS_DT, &mut self.feedback);
            self.engines.coin_rain.tick(PHYSICS_DT, &mut self.feedback);
        }
        for _ in 0..self.fireworks_clock.steps(frame_dt) {
            self.engines.fireworks.tick(FIREWORKS_DT, &mut self.feedback);
        }

        self.count_rotations(now);
        self.feedback.flush(now, sink);
    }

    fn detect_notches(&mut self, now: f64) {
        let Some(event) = self.notches.update(self.dial.angle(), self.dial.velocity()) else {
            return;
        };
        // Throttled: sounds still play, haptics skip this crossing
        let gate = self.dial.haptic_intensity_for_velocity(now);
        let intensity = event.intensity();
        for offset in event.pulse_offsets() {
            self.feedback
                .schedule(now + offset, FeedbackRequest::Sound(SoundEvent::Notch));
            if gate > 0.0 {
                self.feedback.schedule(
                    now + offset,
                    FeedbackRequest::haptic(HapticPattern::NotchTick, intensity),
                );
            }
        }
    }

    fn count_rotations(&mut self, now: f64) {
        while self.dial.total_travel() - self.counted_travel >= 360.0 {
            self.counted_travel += 360.0;
            let count = self.stats.increment(Counter::Rotations, now);
            if let Some(milestone) = self.rotation_milestones.observe(count) {
                self.celebrate(milestone);
            }
            self.maybe_save();
        }
    }

    fn celebrate(&mut self, milestone: u64) {
        self.stats.record_milestone(milestone);
        let result = self
            .orchestrator
            .celebrate(milestone, &mut self.engines, &mut self.feedback);
        self.last_celebration = Some(result);
        self.stats.save(self.store.as_mut());
    }

    fn maybe_save(&mut self) {
        if self.stats.save_due() {
            self.stats.save(self.store.as_mut());
        }
    }

    // === Render polling ===

    pub fn sprites(&self) -> Vec<SpriteInstance> {
        self.engines.sprites()
    }

    pub fn crack_lines(&self) -> Vec<Vec<LineVertex>> {
        self.engines.crack_lines()
    }

    pub fn effects_active(&self) -> bool {
        self.engines.any_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::RecordingSink;
    use crate::persistence::{MemoryStore, StoredValue};

    fn toy() -> DialToy {
        DialToy::new(Box::new(MemoryStore::new()), Viewport::default(), 42)
    }

    #[test]
    fn test_fixed_step_caps_substeps() {
        let mut clock = FixedStep::new(PHYSICS_DT);
        assert_eq!(clock.steps(0.0), 0);
        assert_eq!(clock.steps(PHYSICS_DT * 3.5), 3);
        // A long stall is clamped, not replayed
        assert!(clock.steps(5.0) <= MAX_SUBSTEPS);
    }

    #[test]
    fn test_drag_emits_notch_feedback() {
        let mut toy = toy();
        let mut sink = RecordingSink::new();
        toy.frame(0.0, &mut sink);
        toy.touch_began(0.0, 0.0);
        // 60 degrees in 6 degree steps at 60 Hz = 360 deg/s
        for i in 1..=10 {
            let t = i as f64 / 60.0;
            toy.touch_moved(i as f32 * 6.0, t);
            toy.frame(t, &mut sink);
        }
        toy.frame(1.0, &mut sink);
        assert_eq!(sink.count_sound(SoundEvent::Notch), 5);
        assert!(sink.count_haptic(HapticPattern::NotchTick) >= 1);
        assert!(sink.haptics().all(|(_, i)| i <= 0.8 || i == 1.0));
    }

    #[test]
    fn test_hundredth_tap_starts_fireworks() {
        let mut toy = toy();
        let mut sink = RecordingSink::new();
        for i in 0..99 {
            toy.tap(i as f64 * 0.1);
        }
        assert!(!toy.fireworks().is_active());
        toy.tap(10.0);
        assert!(toy.fireworks().is_active());
        assert_eq!(
            toy.last_celebration(),
            Some(Celebration::Started(EffectMode::Fireworks))
        );
        toy.frame(10.0, &mut sink);
        assert_eq!(sink.count_sound(SoundEvent::Milestone), 1);
        assert_eq!(toy.stats().milestones, vec![100]);
    }

    #[test]
    fn test_fling_counts_spin_and_coasts_to_rest() {
        let mut toy = toy();
        let mut sink = RecordingSink::new();
        toy.frame(0.0, &mut sink);
        toy.touch_began(0.0, 0.0);
        toy.touch_moved(25.0, 0.02);
        toy.touch_ended(0.02);
        assert_eq!(toy.stats().spin_count, 1);

        let mut t = 0.02;
        while toy.dial().velocity() != 0.0 {
            t += 1.0 / 60.0;
            toy.frame(t, &mut sink);
            assert!(t < 30.0);
        }
        // 1000 deg/s after handoff coasts roughly 330 degrees
        assert!(sink.count_sound(SoundEvent::Notch) > 20);
    }

    #[test]
    fn test_burst_release_notches_track_travel() {
        let mut toy = toy();
        let mut sink = RecordingSink::new();
        toy.frame(0.0, &mut sink);
        toy.touch_began(0.0, 0.0);
        // Two samples 1 ms apart
        toy.touch_moved(30.0, 0.001);
        toy.touch_ended(0.001);

        let mut t = 0.001;
        while toy.dial().velocity() != 0.0 {
            t += 1.0 / 60.0;
            toy.frame(t, &mut sink);
            assert!(t < 30.0);
        }
        toy.frame(t + 1.0, &mut sink);
        let expected = toy.dial().total_travel() / 12.0;
        let notches = sink.count_sound(SoundEvent::Notch) as f64;
        assert!((notches - expected).abs() <= 2.0, "{notches} notches for {expected:.1} expected");
    }

    #[test]
    fn test_full_turn_counts_rotation() {
        let mut toy = toy();
        toy.touch_began(0.0, 0.0);
        for i in 1..=20 {
            toy.touch_moved(i as f32 * 20.0, i as f64 * 0.02);
        }
        assert_eq!(toy.stats().rotation_count, 1);
        toy.touch_ended(0.4);
        // 1000 deg/s release also counts as a spin
        assert_eq!(toy.stats().spin_count, 1);
    }

    #[test]
    fn test_counts_resume_from_store() {
        let mut store = MemoryStore::new();
        store.set("dial_toy_tap_count", StoredValue::Int(199));
        store.set("dial_toy_milestones", StoredValue::IntList(vec![100]));
        let mut toy = DialToy::new(Box::new(store), Viewport::default(), 1);
        assert_eq!(toy.stats().tap_count, 199);
        toy.tap(0.0);
        assert_eq!(toy.stats().milestones, vec![100, 200]);
    }

    #[test]
    fn test_glass_mode_milestone_and_manual_impact() {
        let mut toy = toy();
        toy.set_effect_mode(EffectMode::GlassCrack);
        for i in 0..100 {
            toy.tap(i as f64);
        }
        assert!(toy.glass_crack().is_active());
        let impacts = toy.glass_crack().impacts().len();
        assert!(toy.glass_impact(Some(Vec2::new(100.0, 100.0))));
        assert_eq!(toy.glass_crack().impacts().len(), impacts + 1);
    }
}
