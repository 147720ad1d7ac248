//! User settings and preferences
//!
//! Persisted as a single JSON payload in the key-value store.

use serde::{Deserialize, Serialize};

use crate::effects::{CoinRainConfig, FireworksConfig, GlassCrackConfig};
use crate::feedback::FeedbackGate;
use crate::persistence::{KeyValueStore, StoredValue};

/// Which celebration plays at a milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EffectMode {
    #[default]
    Fireworks,
    GlassCrack,
    CoinRain,
}

impl EffectMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMode::Fireworks => "Fireworks",
            EffectMode::GlassCrack => "Glass Crack",
            EffectMode::CoinRain => "Coin Rain",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "fireworks" => Some(EffectMode::Fireworks),
            "glasscrack" | "glass" => Some(EffectMode::GlassCrack),
            "coinrain" | "coins" => Some(EffectMode::CoinRain),
            _ => None,
        }
    }
}

/// Notch spacing of the main dial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DialMode {
    /// 30 notches per turn
    #[default]
    Fine,
    /// 16 notches per turn
    Coarse,
}

impl DialMode {
    /// Degrees between notches
    pub fn notch_interval(&self) -> f32 {
        match self {
            DialMode::Fine => 12.0,
            DialMode::Coarse => 22.5,
        }
    }
}

/// Settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub effect_mode: EffectMode,
    pub dial_mode: DialMode,

    // === Feedback ===
    pub haptics_enabled: bool,
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,

    // === Accessibility ===
    /// Halve particle counts
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            effect_mode: EffectMode::Fireworks,
            dial_mode: DialMode::Fine,

            haptics_enabled: true,
            sound_enabled: true,
            master_volume: 0.8,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Store key
    const STORAGE_KEY: &'static str = "dial_toy_settings";

    pub fn feedback_gate(&self) -> FeedbackGate {
        FeedbackGate {
            haptics_enabled: self.haptics_enabled,
            sound_enabled: self.sound_enabled,
            volume: self.master_volume.clamp(0.0, 1.0),
        }
    }

    pub fn fireworks_config(&self) -> FireworksConfig {
        let config = FireworksConfig::default();
        if self.reduced_motion { config.reduced() } else { config }
    }

    pub fn coin_rain_config(&self) -> CoinRainConfig {
        let config = CoinRainConfig::default();
        if self.reduced_motion { config.reduced() } else { config }
    }

    pub fn glass_crack_config(&self) -> GlassCrackConfig {
        let config = GlassCrackConfig::default();
        if self.reduced_motion { config.reduced() } else { config }
    }

    /// Load settings, falling back to defaults on missing or corrupt data
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get_text(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring settings: {}", e),
        }
        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to the store
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => {
                store.set(Self::STORAGE_KEY, StoredValue::Text(json));
                match store.flush() {
                    Ok(()) => log::info!("Settings saved"),
                    Err(e) => log::warn!("Settings not flushed: {}", e),
                }
            }
            Err(e) => log::warn!("Settings not saved: {}", e),
        }
    }
}
