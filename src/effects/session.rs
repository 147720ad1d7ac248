//! Session lifecycle and timed choreography
//!
//! Multi-second effects are a list of `(delay, action)` steps evaluated
//! against elapsed session time each tick. Stopping flips `is_active`, so no
//! step can fire after teardown.

use serde::{Deserialize, Serialize};

/// A step scheduled relative to session start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedStep<A> {
    pub at: f32,
    pub action: A,
    fired: bool,
}

/// Ordered list of timed steps; each fires exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline<A> {
    steps: Vec<TimedStep<A>>,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<A: Clone> Timeline<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: impl IntoIterator<Item = (f32, A)>) -> Self {
        let mut timeline = Self::new();
        for (at, action) in steps {
            timeline.add(at, action);
        }
        timeline
    }

    /// Insert a step, keeping the list sorted by time (stable for ties)
    pub fn add(&mut self, at: f32, action: A) {
        let idx = self.steps.partition_point(|s| s.at <= at);
        self.steps.insert(
            idx,
            TimedStep {
                at,
                action,
                fired: false,
            },
        );
    }

    /// Collect every step due at `elapsed` that has not fired yet
    pub fn advance(&mut self, elapsed: f32) -> Vec<A> {
        let mut due = Vec::new();
        for step in self.steps.iter_mut() {
            if step.at > elapsed {
                break;
            }
            if !step.fired {
                step.fired = true;
                due.push(step.action.clone());
            }
        }
        due
    }

    pub fn pending(&self) -> usize {
        self.steps.iter().filter(|s| !s.fired).count()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }
}

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Nothing running
    Idle,
    /// Effect running at full opacity
    Running,
    /// Soft stop in progress
    FadingOut { remaining: f32, duration: f32 },
}

/// What a session tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTick {
    /// Not active, nothing to do
    Idle,
    /// Still running or fading
    Live,
    /// Fade finished this tick; the owner must clear its collections
    Finished,
}

/// Lifecycle of one effect run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSession {
    phase: SessionPhase,
    /// Seconds since the session started
    elapsed: f32,
    /// Global opacity multiplier for everything the session owns
    opacity: f32,
    /// Sessions started on this instance
    generation: u32,
}

impl Default for EffectSession {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            elapsed: 0.0,
            opacity: 1.0,
            generation: 0,
        }
    }
}

impl EffectSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, SessionPhase::Idle)
    }

    #[inline]
    pub fn is_fading(&self) -> bool {
        matches!(self.phase, SessionPhase::FadingOut { .. })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Start (or restart) the session clock
    pub fn begin(&mut self) {
        self.phase = SessionPhase::Running;
        self.elapsed = 0.0;
        self.opacity = 1.0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Soft stop: ramp opacity to zero over `duration`
    ///
    /// Returns false when already idle or already fading.
    pub fn begin_fade(&mut self, duration: f32) -> bool {
        match self.phase {
            SessionPhase::Running => {
                let duration = duration.max(0.0);
                self.phase = SessionPhase::FadingOut {
                    remaining: duration,
                    duration,
                };
                true
            }
            SessionPhase::Idle | SessionPhase::FadingOut { .. } => false,
        }
    }

    /// Hard stop with no fade
    pub fn end(&mut self) {
        self.phase = SessionPhase::Idle;
        self.opacity = 1.0;
    }

    /// Advance the clock and fade ramp
    pub fn tick(&mut self, dt: f32) -> SessionTick {
        match self.phase {
            SessionPhase::Idle => SessionTick::Idle,
            SessionPhase::Running => {
                self.elapsed += dt;
                SessionTick::Live
            }
            SessionPhase::FadingOut {
                remaining,
                duration,
            } => {
                self.elapsed += dt;
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.end();
                    SessionTick::Finished
                } else {
                    self.opacity = if duration > 0.0 {
                        (remaining / duration).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    self.phase = SessionPhase::FadingOut {
                        remaining,
                        duration,
                    };
                    SessionTick::Live
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_fires_each_step_once() {
        let mut timeline = Timeline::from_steps([(5.5, 'b'), (0.0, 'a'), (11.0, 'c')]);
        assert_eq!(timeline.advance(0.0), vec!['a']);
        assert!(timeline.advance(1.0).is_empty());
        assert_eq!(timeline.advance(12.0), vec!['b', 'c']);
        assert!(timeline.advance(20.0).is_empty());
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn test_fade_runs_to_finished() {
        let mut session = EffectSession::new();
        assert_eq!(session.tick(0.1), SessionTick::Idle);

        session.begin();
        assert!(session.is_active());
        assert!(session.begin_fade(1.0));
        // Second stop while fading is a no-op
        assert!(!session.begin_fade(1.0));

        let mut ticks = 0;
        loop {
            ticks += 1;
            match session.tick(0.1) {
                SessionTick::Finished => break,
                SessionTick::Live => assert!(session.opacity() < 1.0),
                SessionTick::Idle => panic!("went idle without finishing"),
            }
        }
        assert!((9..=11).contains(&ticks));
        assert!(!session.is_active());
        assert!(!session.begin_fade(1.0));
    }

    #[test]
    fn test_begin_resets_clock() {
        let mut session = EffectSession::new();
        session.begin();
        session.tick(3.0);
        session.begin();
        assert_eq!(session.elapsed(), 0.0);
        assert_eq!(session.generation(), 2);
    }
}
