//! Milestone celebration dispatch
//!
//! Picks which engine runs for a milestone and hands it the viewport.
//! Re-trigger behaviour is left to each engine: fireworks and coin rain
//! restart, glass crack ignores triggers while active.

use serde::{Deserialize, Serialize};

use crate::Viewport;
use crate::effects::{CoinRainEngine, FireworksEngine, GlassCrackEngine};
use crate::feedback::{FeedbackQueue, FeedbackRequest, HapticPattern, SoundEvent};
use crate::renderer::{LineVertex, SpriteInstance};
use crate::settings::{EffectMode, Settings};

/// The three effect engines, owned together by the app
#[derive(Debug, Clone)]
pub struct EffectEngines {
    pub fireworks: FireworksEngine,
    pub coin_rain: CoinRainEngine,
    pub glass_crack: GlassCrackEngine,
}

impl EffectEngines {
    pub fn new(settings: &Settings, seed: u64) -> Self {
        Self {
            fireworks: FireworksEngine::new(settings.fireworks_config(), seed),
            coin_rain: CoinRainEngine::new(settings.coin_rain_config(), seed.wrapping_add(1)),
            glass_crack: GlassCrackEngine::new(settings.glass_crack_config(), seed.wrapping_add(2)),
        }
    }

    /// Re-derive tuning after a settings change
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.fireworks.set_config(settings.fireworks_config());
        self.coin_rain.set_config(settings.coin_rain_config());
        self.glass_crack.set_config(settings.glass_crack_config());
    }

    pub fn any_active(&self) -> bool {
        self.fireworks.is_active() || self.coin_rain.is_active() || self.glass_crack.is_active()
    }

    /// Sprite instances from every engine, back to front
    pub fn sprites(&self) -> Vec<SpriteInstance> {
        let mut out = Vec::new();
        self.coin_rain.sprites(&mut out);
        self.fireworks.sprites(&mut out);
        out
    }

    pub fn crack_lines(&self) -> Vec<Vec<LineVertex>> {
        self.glass_crack.crack_lines()
    }

    /// Soft-stop everything
    pub fn stop_all(&mut self) {
        self.fireworks.stop();
        self.coin_rain.stop();
        self.glass_crack.stop();
    }
}

/// What a celebration request turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Celebration {
    Started(EffectMode),
    Restarted(EffectMode),
    /// Engine refused (glass crack already running)
    Ignored(EffectMode),
}

/// Chooses the engine for a milestone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectOrchestrator {
    mode: EffectMode,
    viewport: Viewport,
}

impl EffectOrchestrator {
    pub fn new(mode: EffectMode, viewport: Viewport) -> Self {
        Self { mode, viewport }
    }

    pub fn mode(&self) -> EffectMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EffectMode) {
        self.mode = mode;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Start the selected effect for `milestone`
    pub fn celebrate(
        &self,
        milestone: u64,
        engines: &mut EffectEngines,
        feedback: &mut FeedbackQueue,
    ) -> Celebration {
        log::info!("Milestone {} reached, celebrating with {}", milestone, self.mode.as_str());
        feedback.push(FeedbackRequest::haptic(HapticPattern::Milestone, 1.0));
        feedback.push(FeedbackRequest::Sound(SoundEvent::Milestone));
        self.start(self.mode, engines, feedback)
    }

    /// Start a specific effect regardless of the selected mode
    pub fn start(
        &self,
        mode: EffectMode,
        engines: &mut EffectEngines,
        feedback: &mut FeedbackQueue,
    ) -> Celebration {
        match mode {
            EffectMode::Fireworks => {
                let was_active = engines.fireworks.is_active();
                engines.fireworks.start(self.viewport, feedback);
                if was_active { Celebration::Restarted(mode) } else { Celebration::Started(mode) }
            }
            EffectMode::CoinRain => {
                let was_active = engines.coin_rain.is_active();
                engines.coin_rain.start(self.viewport, feedback);
                if was_active { Celebration::Restarted(mode) } else { Celebration::Started(mode) }
            }
            EffectMode::GlassCrack => {
                if engines.glass_crack.trigger(self.viewport, feedback) {
                    Celebration::Started(mode)
                } else {
                    Celebration::Ignored(mode)
                }
            }
        }
    }
}
